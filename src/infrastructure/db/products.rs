use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::{Pool, QueryBuilder, Sqlite};
use std::str::FromStr;

use super::{CatalogStore, ConflictPolicy, SearchQuery, UpdateOutcome};
use crate::domain::error::{AppError, Result};
use crate::domain::product::{ProductRecord, ProductUpdate};

pub struct SqliteCatalogRepository {
    pool: Pool<Sqlite>,
}

impl SqliteCatalogRepository {
    pub async fn init(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to parse connection string: {}", e))
            })?
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect: {}", e)))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS products (
                SKU TEXT PRIMARY KEY,
                ITEMS_NAME TEXT NOT NULL,
                CATEGORY TEXT,
                BRAND_NAME TEXT,
                VARIANT_NAME TEXT,
                PRICE REAL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create table: {}", e)))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalogRepository {
    async fn upsert(&self, records: &[ProductRecord], policy: ConflictPolicy) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "INSERT INTO products (SKU, ITEMS_NAME, CATEGORY, BRAND_NAME, VARIANT_NAME, PRICE) ",
        );
        builder.push_values(records, |mut b, record| {
            b.push_bind(&record.sku)
                .push_bind(&record.items_name)
                .push_bind(&record.category)
                .push_bind(&record.brand_name)
                .push_bind(&record.variant_name)
                .push_bind(record.price);
        });
        match policy {
            ConflictPolicy::IgnoreExisting => {
                builder.push(" ON CONFLICT(SKU) DO NOTHING");
            }
            ConflictPolicy::Overwrite => {
                builder.push(
                    " ON CONFLICT(SKU) DO UPDATE SET \
                     ITEMS_NAME = excluded.ITEMS_NAME, \
                     CATEGORY = excluded.CATEGORY, \
                     BRAND_NAME = excluded.BRAND_NAME, \
                     VARIANT_NAME = excluded.VARIANT_NAME, \
                     PRICE = excluded.PRICE",
                );
            }
        }

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Bulk insert failed: {}", e)))?;
        Ok(result.rows_affected())
    }

    async fn insert(&self, record: &ProductRecord) -> Result<()> {
        let result = sqlx::query(
            "INSERT INTO products (SKU, ITEMS_NAME, CATEGORY, BRAND_NAME, VARIANT_NAME, PRICE)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.sku)
        .bind(&record.items_name)
        .bind(&record.category)
        .bind(&record.brand_name)
        .bind(&record.variant_name)
        .bind(record.price)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(
                AppError::ValidationError(format!("SKU '{}' already exists", record.sku)),
            ),
            Err(e) => Err(AppError::DatabaseError(format!("Insert failed: {}", e))),
        }
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<ProductRecord>> {
        let entities: Vec<ProductEntity> = match query {
            SearchQuery::All => {
                sqlx::query_as("SELECT * FROM products ORDER BY SKU")
                    .fetch_all(&self.pool)
                    .await
            }
            SearchQuery::Term(term) => {
                let pattern = format!("%{}%", term);
                sqlx::query_as(
                    "SELECT * FROM products
                     WHERE SKU LIKE ?1 OR ITEMS_NAME LIKE ?1
                     ORDER BY SKU",
                )
                .bind(pattern)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| AppError::DatabaseError(format!("Search failed: {}", e)))?;

        Ok(entities.into_iter().map(|e| e.into()).collect())
    }

    async fn get(&self, sku: &str) -> Result<Option<ProductRecord>> {
        sqlx::query_as::<_, ProductEntity>("SELECT * FROM products WHERE SKU = ?")
            .bind(sku)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Lookup failed: {}", e)))
            .map(|entity| entity.map(|e| e.into()))
    }

    async fn exists(&self, sku: &str) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM products WHERE SKU = ?")
            .bind(sku)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Existence check failed: {}", e)))?;
        Ok(row.is_some())
    }

    async fn update_by_key(&self, sku: &str, update: &ProductUpdate) -> Result<UpdateOutcome> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE products SET ");
        let mut first = true;
        let mut push_field = |builder: &mut QueryBuilder<Sqlite>, name: &str| {
            if !first {
                builder.push(", ");
            }
            first = false;
            builder.push(name).push(" = ");
        };

        if let Some(items_name) = &update.items_name {
            push_field(&mut builder, "ITEMS_NAME");
            builder.push_bind(items_name);
        }
        if let Some(category) = &update.category {
            push_field(&mut builder, "CATEGORY");
            builder.push_bind(category.clone());
        }
        if let Some(brand_name) = &update.brand_name {
            push_field(&mut builder, "BRAND_NAME");
            builder.push_bind(brand_name.clone());
        }
        if let Some(variant_name) = &update.variant_name {
            push_field(&mut builder, "VARIANT_NAME");
            builder.push_bind(variant_name.clone());
        }
        if let Some(price) = &update.price {
            push_field(&mut builder, "PRICE");
            builder.push_bind(*price);
        }
        if first {
            return Err(AppError::ValidationError(
                "Update contains no fields".to_string(),
            ));
        }

        builder.push(" WHERE SKU = ").push_bind(sku);
        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Update failed: {}", e)))?;

        if result.rows_affected() == 0 {
            // Zero matches is ambiguous: either the key is absent or the
            // store considered the row untouched. Tell the two apart.
            return if self.exists(sku).await? {
                Ok(UpdateOutcome::Unchanged)
            } else {
                Ok(UpdateOutcome::NotFound)
            };
        }

        match self.get(sku).await? {
            Some(record) => Ok(UpdateOutcome::Updated(record)),
            None => Ok(UpdateOutcome::NotFound),
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProductEntity {
    #[sqlx(rename = "SKU")]
    sku: String,
    #[sqlx(rename = "ITEMS_NAME")]
    items_name: String,
    #[sqlx(rename = "CATEGORY")]
    category: Option<String>,
    #[sqlx(rename = "BRAND_NAME")]
    brand_name: Option<String>,
    #[sqlx(rename = "VARIANT_NAME")]
    variant_name: Option<String>,
    #[sqlx(rename = "PRICE")]
    price: Option<f64>,
}

impl From<ProductEntity> for ProductRecord {
    fn from(e: ProductEntity) -> Self {
        Self {
            sku: e.sku,
            items_name: e.items_name,
            category: e.category,
            brand_name: e.brand_name,
            variant_name: e.variant_name,
            price: e.price,
        }
    }
}
