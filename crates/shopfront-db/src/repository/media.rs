//! Media metadata storage. Products only hold media ids; this table is what
//! those ids are checked against.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use shopfront_catalog::context::RequestContext;
use shopfront_catalog::ports::{MediaError, MediaRepository, MediaResolver};
use shopfront_core::types::Media;

use crate::error::{DbError, DbResult};

#[derive(Debug, sqlx::FromRow)]
struct MediaRow {
    id: String,
    namespace: String,
    filename: String,
    url: String,
    media_type: String,
    size: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<MediaRow> for Media {
    type Error = DbError;

    fn try_from(row: MediaRow) -> DbResult<Self> {
        Ok(Media {
            id: Uuid::parse_str(&row.id).map_err(|e| DbError::decode("media.id", e))?,
            namespace: row.namespace,
            created_at: row.created_at,
            updated_at: row.updated_at,
            filename: row.filename,
            url: row.url,
            media_type: row.media_type,
            size: row.size,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SqliteMediaRepository {
    pool: SqlitePool,
}

impl SqliteMediaRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteMediaRepository { pool }
    }

    pub async fn insert(&self, media: &Media) -> DbResult<()> {
        self.insert_in(&media.namespace, media).await
    }

    /// Inserts `media` under `namespace`, whatever its own field says.
    async fn insert_in(&self, namespace: &str, media: &Media) -> DbResult<()> {
        debug!(id = %media.id, namespace, "Inserting media");

        sqlx::query(
            r#"
            INSERT INTO media (id, namespace, filename, url, media_type, size, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(media.id.to_string())
        .bind(namespace)
        .bind(&media.filename)
        .bind(&media.url)
        .bind(&media.media_type)
        .bind(media.size)
        .bind(media.created_at)
        .bind(media.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Media `id` in `namespace`, if any.
    pub async fn get(&self, namespace: &str, id: Uuid) -> DbResult<Option<Media>> {
        let row: Option<MediaRow> = sqlx::query_as(
            r#"
            SELECT id, namespace, filename, url, media_type, size, created_at, updated_at
            FROM media WHERE id = ?1 AND namespace = ?2
            "#,
        )
        .bind(id.to_string())
        .bind(namespace)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Media::try_from).transpose()
    }

    pub async fn list(&self, namespace: &str) -> DbResult<Vec<Media>> {
        let rows: Vec<MediaRow> = sqlx::query_as(
            r#"
            SELECT id, namespace, filename, url, media_type, size, created_at, updated_at
            FROM media WHERE namespace = ?1 ORDER BY created_at, id
            "#,
        )
        .bind(namespace)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Media::try_from).collect()
    }
}

#[async_trait]
impl MediaResolver for SqliteMediaRepository {
    async fn get_by_id(
        &self,
        _ctx: &RequestContext,
        namespace: &str,
        id: Uuid,
    ) -> Result<Media, MediaError> {
        self.get(namespace, id).await?.ok_or(MediaError::NotFound(id))
    }
}

#[async_trait]
impl MediaRepository for SqliteMediaRepository {
    async fn save(
        &self,
        _ctx: &RequestContext,
        namespace: &str,
        media: &Media,
    ) -> Result<(), MediaError> {
        Ok(self.insert_in(namespace, media).await?)
    }
}
