//! # Product Repository
//!
//! SQLite storage for products, their variants and the product log.
//!
//! ## Tables
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  products ───────────────┐        product_log (append-only)             │
//! │  id, namespace, title,   │        namespace, product_id, ts_micros,     │
//! │  price_cents, stock,     │        event, data (JSON), user_id           │
//! │  status, sku, medias,    │              ▲                               │
//! │  deleted_at ← soft delete│              │ one row per mutation,         │
//! │                          │              │ same transaction              │
//! │  product_variants ◄──────┘              │                               │
//! │  product_id, position, ... ─────────────┘                               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every mutation runs in one transaction together with its log row, so the
//! log never disagrees with the table it describes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use shopfront_catalog::context::RequestContext;
use shopfront_catalog::ports::{ProductRepository, RepositoryError};
use shopfront_core::money::Money;
use shopfront_core::types::{
    Product, ProductEvent, ProductFilter, ProductLogEvent, ProductLogFilter, ProductVariant,
};

use crate::error::{DbError, DbResult};

const PRODUCT_COLUMNS: &str = "id, namespace, title, price_cents, stock, status, sku, medias, \
                               created_at, updated_at, deleted_at";

const VARIANT_COLUMNS: &str = "id, product_id, namespace, title, price_cents, stock, medias, \
                               short_desc, html_desc, text_desc, created_at, updated_at";

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    namespace: String,
    title: String,
    price_cents: i64,
    stock: i64,
    status: String,
    sku: String,
    medias: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl ProductRow {
    fn into_product(self, variants: Vec<ProductVariant>) -> DbResult<Product> {
        Ok(Product {
            id: parse_uuid("products.id", &self.id)?,
            namespace: self.namespace,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
            title: self.title,
            price: Money::from_cents(self.price_cents),
            stock: self.stock,
            status: self.status,
            sku: self.sku,
            medias: decode_medias("products.medias", &self.medias)?,
            variants,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct VariantRow {
    id: String,
    product_id: String,
    namespace: String,
    title: String,
    price_cents: i64,
    stock: i64,
    medias: String,
    short_desc: String,
    html_desc: String,
    text_desc: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<VariantRow> for ProductVariant {
    type Error = DbError;

    fn try_from(row: VariantRow) -> DbResult<Self> {
        Ok(ProductVariant {
            id: parse_uuid("product_variants.id", &row.id)?,
            namespace: row.namespace,
            created_at: row.created_at,
            updated_at: row.updated_at,
            product_id: parse_uuid("product_variants.product_id", &row.product_id)?,
            title: row.title,
            price: Money::from_cents(row.price_cents),
            stock: row.stock,
            medias: decode_medias("product_variants.medias", &row.medias)?,
            short_desc: row.short_desc,
            html_desc: row.html_desc,
            text_desc: row.text_desc,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LogRow {
    namespace: String,
    product_id: String,
    ts_micros: i64,
    event: String,
    data: String,
    user_id: String,
}

impl TryFrom<LogRow> for ProductLogEvent {
    type Error = DbError;

    fn try_from(row: LogRow) -> DbResult<Self> {
        Ok(ProductLogEvent {
            namespace: row.namespace,
            product_id: parse_uuid("product_log.product_id", &row.product_id)?,
            timestamp: DateTime::from_timestamp_micros(row.ts_micros)
                .ok_or_else(|| DbError::decode("product_log.ts_micros", row.ts_micros))?,
            event: row
                .event
                .parse::<ProductEvent>()
                .map_err(|e| DbError::decode("product_log.event", e))?,
            data: serde_json::from_str(&row.data)
                .map_err(|e| DbError::decode("product_log.data", e))?,
            user_id: parse_uuid("product_log.user_id", &row.user_id)?,
        })
    }
}

fn parse_uuid(column: &'static str, raw: &str) -> DbResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| DbError::decode(column, e))
}

fn encode_medias(medias: &[Uuid]) -> DbResult<String> {
    serde_json::to_string(medias).map_err(|e| DbError::Internal(e.to_string()))
}

fn decode_medias(column: &'static str, raw: &str) -> DbResult<Vec<Uuid>> {
    serde_json::from_str(raw).map_err(|e| DbError::decode(column, e))
}

fn snapshot(product: &Product) -> DbResult<serde_json::Value> {
    serde_json::to_value(product).map_err(|e| DbError::Internal(e.to_string()))
}

// =============================================================================
// Repository
// =============================================================================

/// SQLite-backed [`ProductRepository`].
#[derive(Debug, Clone)]
pub struct SqliteProductRepository {
    pool: SqlitePool,
}

impl SqliteProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteProductRepository { pool }
    }

    /// Inserts a product with its variants, logged as `product.created`.
    pub async fn insert_product(&self, user: Uuid, namespace: &str, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, namespace, "Inserting product");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO products (
                id, namespace, title, price_cents, stock, status, sku, medias,
                created_at, updated_at, deleted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, NULL)
            "#,
        )
        .bind(product.id.to_string())
        .bind(namespace)
        .bind(&product.title)
        .bind(product.price.cents())
        .bind(product.stock)
        .bind(&product.status)
        .bind(&product.sku)
        .bind(encode_medias(&product.medias)?)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await?;

        insert_variants(&mut tx, namespace, product).await?;
        write_log(&mut tx, namespace, product.id, ProductEvent::Created, &snapshot(product)?, user).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Replaces a live product's fields and variants, logged as `product.updated`.
    /// `created_at` is kept from the stored row.
    pub async fn update_product(&self, user: Uuid, namespace: &str, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, namespace, "Updating product");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE products SET
                title = ?3,
                price_cents = ?4,
                stock = ?5,
                status = ?6,
                sku = ?7,
                medias = ?8,
                updated_at = ?9
            WHERE id = ?1 AND namespace = ?2 AND deleted_at IS NULL
            "#,
        )
        .bind(product.id.to_string())
        .bind(namespace)
        .bind(&product.title)
        .bind(product.price.cents())
        .bind(product.stock)
        .bind(&product.status)
        .bind(&product.sku)
        .bind(encode_medias(&product.medias)?)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product.id));
        }

        sqlx::query("DELETE FROM product_variants WHERE product_id = ?1")
            .bind(product.id.to_string())
            .execute(&mut *tx)
            .await?;
        insert_variants(&mut tx, namespace, product).await?;
        write_log(&mut tx, namespace, product.id, ProductEvent::Updated, &snapshot(product)?, user).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Marks a live product as deleted.
    pub async fn soft_delete(&self, user: Uuid, namespace: &str, id: Uuid) -> DbResult<()> {
        debug!(%id, namespace, "Soft-deleting product");

        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET deleted_at = ?3, updated_at = ?3
            WHERE id = ?1 AND namespace = ?2 AND deleted_at IS NULL
            "#,
        )
        .bind(id.to_string())
        .bind(namespace)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        write_log(&mut tx, namespace, id, ProductEvent::Deleted, &json!({ "id": id }), user).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Clears `deleted_at`. Restoring a live product is a conflict.
    pub async fn undelete(&self, user: Uuid, namespace: &str, id: Uuid) -> DbResult<()> {
        debug!(%id, namespace, "Restoring product");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE products SET deleted_at = NULL, updated_at = ?3
            WHERE id = ?1 AND namespace = ?2 AND deleted_at IS NOT NULL
            "#,
        )
        .bind(id.to_string())
        .bind(namespace)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let exists: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE id = ?1 AND namespace = ?2")
                    .bind(id.to_string())
                    .bind(namespace)
                    .fetch_one(&mut *tx)
                    .await?;
            return Err(if exists > 0 {
                DbError::Conflict(format!("product {} is not deleted", id))
            } else {
                DbError::not_found("Product", id)
            });
        }

        write_log(&mut tx, namespace, id, ProductEvent::Restored, &json!({ "id": id }), user).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Products in `namespace` matching `filter`, oldest first.
    pub async fn find_products(&self, namespace: &str, filter: &ProductFilter) -> DbResult<Vec<Product>> {
        let mut qb: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM products WHERE namespace = ", PRODUCT_COLUMNS));
        qb.push_bind(namespace);

        if !filter.include_deleted {
            qb.push(" AND deleted_at IS NULL");
        }
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        if !filter.ids.is_empty() {
            qb.push(" AND id IN (");
            let mut ids = qb.separated(", ");
            for id in &filter.ids {
                ids.push_bind(id.to_string());
            }
            ids.push_unseparated(")");
        }
        qb.push(" ORDER BY created_at, id");
        if let Some(limit) = filter.limit {
            qb.push(" LIMIT ").push_bind(i64::from(limit));
        }

        let rows: Vec<ProductRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        debug!(count = rows.len(), namespace, "Products found");

        let mut products = Vec::with_capacity(rows.len());
        for row in rows {
            let variants = self.load_variants(&row.id).await?;
            products.push(row.into_product(variants)?);
        }
        Ok(products)
    }

    /// A live product by id.
    pub async fn get_product(&self, namespace: &str, id: Uuid) -> DbResult<Product> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {} FROM products WHERE id = ?1 AND namespace = ?2 AND deleted_at IS NULL",
            PRODUCT_COLUMNS
        ))
        .bind(id.to_string())
        .bind(namespace)
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or_else(|| DbError::not_found("Product", id))?;
        let variants = self.load_variants(&row.id).await?;
        row.into_product(variants)
    }

    /// Log rows matching `filter`, oldest first, paged by offset/limit.
    pub async fn product_log(&self, filter: &ProductLogFilter) -> DbResult<Vec<ProductLogEvent>> {
        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            "SELECT namespace, product_id, ts_micros, event, data, user_id \
             FROM product_log WHERE namespace = ",
        );
        qb.push_bind(&filter.namespace);

        if !filter.product_ids.is_empty() {
            qb.push(" AND product_id IN (");
            let mut ids = qb.separated(", ");
            for id in &filter.product_ids {
                ids.push_bind(id.to_string());
            }
            ids.push_unseparated(")");
        }
        if !filter.events.is_empty() {
            qb.push(" AND event IN (");
            let mut events = qb.separated(", ");
            for event in &filter.events {
                events.push_bind(event.as_str());
            }
            events.push_unseparated(")");
        }
        if !filter.user_ids.is_empty() {
            qb.push(" AND user_id IN (");
            let mut users = qb.separated(", ");
            for id in &filter.user_ids {
                users.push_bind(id.to_string());
            }
            users.push_unseparated(")");
        }
        if let Some(start) = filter.start {
            qb.push(" AND ts_micros >= ").push_bind(start.timestamp_micros());
        }
        if let Some(end) = filter.end {
            qb.push(" AND ts_micros < ").push_bind(end.timestamp_micros());
        }

        // LIMIT -1 means unbounded in SQLite; OFFSET needs a LIMIT.
        qb.push(" ORDER BY ts_micros, id LIMIT ")
            .push_bind(filter.limit.map_or(-1, i64::from))
            .push(" OFFSET ")
            .push_bind(i64::from(filter.offset));

        let rows: Vec<LogRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(ProductLogEvent::try_from).collect()
    }

    /// Adds `delta` to stock, flooring at zero and saturating at `i64::MAX`.
    /// Returns the new level.
    ///
    /// SQLite promotes an overflowing `stock + delta` to REAL, so the sum is
    /// computed here. The first statement takes the write lock before the
    /// current level is read.
    pub async fn add_stock(&self, user: Uuid, namespace: &str, id: Uuid, delta: i64) -> DbResult<i64> {
        debug!(%id, namespace, delta, "Adjusting stock");

        let mut tx = self.pool.begin().await?;

        let current: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products SET updated_at = ?3
            WHERE id = ?1 AND namespace = ?2 AND deleted_at IS NULL
            RETURNING stock
            "#,
        )
        .bind(id.to_string())
        .bind(namespace)
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await?;

        let current = current.ok_or_else(|| DbError::not_found("Product", id))?;
        let stock = current.saturating_add(delta).max(0);

        sqlx::query("UPDATE products SET stock = ?2 WHERE id = ?1")
            .bind(id.to_string())
            .bind(stock)
            .execute(&mut *tx)
            .await?;

        write_log(
            &mut tx,
            namespace,
            id,
            ProductEvent::StockUpdate,
            &json!({ "delta": delta, "stock": stock }),
            user,
        )
        .await?;
        tx.commit().await?;
        Ok(stock)
    }

    /// Number of live products in `namespace`.
    pub async fn count(&self, namespace: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE namespace = ?1 AND deleted_at IS NULL",
        )
        .bind(namespace)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn load_variants(&self, product_id: &str) -> DbResult<Vec<ProductVariant>> {
        let rows: Vec<VariantRow> = sqlx::query_as(&format!(
            "SELECT {} FROM product_variants WHERE product_id = ?1 ORDER BY position",
            VARIANT_COLUMNS
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ProductVariant::try_from).collect()
    }
}

async fn insert_variants(conn: &mut SqliteConnection, namespace: &str, product: &Product) -> DbResult<()> {
    for (position, variant) in product.variants.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO product_variants (
                id, product_id, namespace, position, title, price_cents, stock, medias,
                short_desc, html_desc, text_desc, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(variant.id.to_string())
        .bind(product.id.to_string())
        .bind(namespace)
        .bind(position as i64)
        .bind(&variant.title)
        .bind(variant.price.cents())
        .bind(variant.stock)
        .bind(encode_medias(&variant.medias)?)
        .bind(&variant.short_desc)
        .bind(&variant.html_desc)
        .bind(&variant.text_desc)
        .bind(variant.created_at)
        .bind(variant.updated_at)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn write_log(
    conn: &mut SqliteConnection,
    namespace: &str,
    product_id: Uuid,
    event: ProductEvent,
    data: &serde_json::Value,
    user: Uuid,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO product_log (namespace, product_id, ts_micros, event, data, user_id)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(namespace)
    .bind(product_id.to_string())
    .bind(Utc::now().timestamp_micros())
    .bind(event.as_str())
    .bind(data.to_string())
    .bind(user.to_string())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

// =============================================================================
// Port Implementation
// =============================================================================

#[async_trait]
impl ProductRepository for SqliteProductRepository {
    async fn create(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        product: &Product,
    ) -> Result<(), RepositoryError> {
        Ok(self.insert_product(ctx.caller_or_nil(), namespace, product).await?)
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        product: &Product,
    ) -> Result<(), RepositoryError> {
        Ok(self.update_product(ctx.caller_or_nil(), namespace, product).await?)
    }

    async fn delete(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        id: Uuid,
    ) -> Result<(), RepositoryError> {
        Ok(self.soft_delete(ctx.caller_or_nil(), namespace, id).await?)
    }

    async fn restore(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        id: Uuid,
    ) -> Result<(), RepositoryError> {
        Ok(self.undelete(ctx.caller_or_nil(), namespace, id).await?)
    }

    async fn find(
        &self,
        _ctx: &RequestContext,
        namespace: &str,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, RepositoryError> {
        Ok(self.find_products(namespace, filter).await?)
    }

    async fn get_by_id(
        &self,
        _ctx: &RequestContext,
        namespace: &str,
        id: Uuid,
    ) -> Result<Product, RepositoryError> {
        Ok(self.get_product(namespace, id).await?)
    }

    async fn get_product_log(
        &self,
        _ctx: &RequestContext,
        filter: &ProductLogFilter,
    ) -> Result<Vec<ProductLogEvent>, RepositoryError> {
        Ok(self.product_log(filter).await?)
    }

    async fn adjust_stock(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        id: Uuid,
        delta: i64,
    ) -> Result<i64, RepositoryError> {
        Ok(self.add_stock(ctx.caller_or_nil(), namespace, id, delta).await?)
    }
}
