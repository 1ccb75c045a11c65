//! Local draft store
//!
//! One lead draft per device, kept in the fixed slot `"current"` of a SQLite file so it
//! survives restarts. A draft holds the validated form, the pictures still waiting for upload
//! and, once the server has created the lead, its id and picture token. The summed size of the
//! queued pictures never exceeds the configured quota.

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use leadcap_core::constants::DRAFT_SLOT;
use leadcap_core::models::CreateLeadRequest;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::types::Json;
use uuid::Uuid;

use crate::error::DraftStoreError;

/// Picture queued in the draft
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub id: Uuid,
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Picture about to be queued; the store assigns its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewImage {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeadDraft {
    pub form: CreateLeadRequest,
    pub images: Vec<ImageRecord>,
    pub created_at: DateTime<Utc>,
    pub lead_id: Option<Uuid>,
    pub picture_token: Option<String>,
}

impl LeadDraft {
    /// Draft for a form that has not reached the server yet.
    pub fn new(form: CreateLeadRequest) -> Self {
        Self {
            form,
            images: Vec::new(),
            created_at: Utc::now(),
            lead_id: None,
            picture_token: None,
        }
    }

    /// Draft for a lead the server has already created.
    pub fn created(form: CreateLeadRequest, lead_id: Uuid, picture_token: String) -> Self {
        Self {
            lead_id: Some(lead_id),
            picture_token: Some(picture_token),
            ..Self::new(form)
        }
    }

    /// Remote identity, only when both halves are present.
    pub fn identity(&self) -> Option<(Uuid, &str)> {
        match (self.lead_id, self.picture_token.as_deref()) {
            (Some(id), Some(token)) if !token.is_empty() => Some((id, token)),
            _ => None,
        }
    }

    pub fn image_bytes(&self) -> u64 {
        self.images.iter().map(|i| i.bytes.len() as u64).sum()
    }
}

#[async_trait]
pub trait DraftRepository: Send + Sync {
    /// Overwrite or create the draft. Nothing is written when its images exceed the quota.
    async fn save(&self, draft: &LeadDraft) -> Result<(), DraftStoreError>;

    /// Queue images behind the existing ones, keeping identity and creation time.
    async fn append_images(&self, images: Vec<NewImage>) -> Result<LeadDraft, DraftStoreError>;

    async fn get(&self) -> Result<Option<LeadDraft>, DraftStoreError>;

    async fn clear(&self) -> Result<(), DraftStoreError>;

    /// Drop one image after the server confirmed it. Unknown ids are ignored.
    async fn remove_image(&self, image_id: Uuid) -> Result<(), DraftStoreError>;

    async fn set_identity(&self, lead_id: Uuid, picture_token: &str)
        -> Result<(), DraftStoreError>;
}

#[derive(Debug, sqlx::FromRow)]
struct DraftRow {
    form: Json<CreateLeadRequest>,
    created_at_ms: i64,
    lead_id: Option<String>,
    picture_token: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct ImageRow {
    id: String,
    file_name: String,
    mime_type: String,
    bytes: Vec<u8>,
}

fn parse_uuid(value: &str) -> Result<Uuid, DraftStoreError> {
    Uuid::parse_str(value).map_err(|e| DraftStoreError::Corrupt(format!("{}: {}", value, e)))
}

impl TryFrom<ImageRow> for ImageRecord {
    type Error = DraftStoreError;

    fn try_from(row: ImageRow) -> Result<Self, Self::Error> {
        Ok(ImageRecord {
            id: parse_uuid(&row.id)?,
            file_name: row.file_name,
            mime_type: row.mime_type,
            bytes: row.bytes,
        })
    }
}

/// Draft store backed by SQLite
#[derive(Clone)]
pub struct SqliteDraftRepository {
    pool: SqlitePool,
    quota_bytes: u64,
}

impl SqliteDraftRepository {
    /// Open (or create) the draft database file and bring its schema up to date.
    pub async fn open(path: impl AsRef<Path>, quota_bytes: u64) -> Result<Self, DraftStoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true)
            .foreign_keys(true);

        // A single writer keeps SQLite from reporting SQLITE_BUSY between our own transactions
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Self::with_pool(pool, quota_bytes).await
    }

    /// Database that lives as long as the returned repository.
    pub async fn in_memory(quota_bytes: u64) -> Result<Self, DraftStoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::with_pool(pool, quota_bytes).await
    }

    async fn with_pool(pool: SqlitePool, quota_bytes: u64) -> Result<Self, DraftStoreError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool, quota_bytes })
    }

    /// Upper bound on queued image bytes.
    pub fn quota_bytes(&self) -> u64 {
        self.quota_bytes
    }

    /// Close the pool so the database file is released.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn check_quota(&self, attempted: u64) -> Result<(), DraftStoreError> {
        if attempted > self.quota_bytes {
            tracing::warn!(attempted, quota = self.quota_bytes, "Draft quota exceeded");
            return Err(DraftStoreError::QuotaExceeded {
                attempted,
                quota: self.quota_bytes,
            });
        }
        Ok(())
    }
}

async fn insert_image(
    conn: &mut sqlx::SqliteConnection,
    position: i64,
    image: &ImageRecord,
) -> Result<(), DraftStoreError> {
    sqlx::query(
        r#"
        INSERT INTO draft_images (id, slot, position, file_name, mime_type, bytes)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(image.id.to_string())
    .bind(DRAFT_SLOT)
    .bind(position)
    .bind(&image.file_name)
    .bind(&image.mime_type)
    .bind(&image.bytes)
    .execute(conn)
    .await?;
    Ok(())
}

#[async_trait]
impl DraftRepository for SqliteDraftRepository {
    async fn save(&self, draft: &LeadDraft) -> Result<(), DraftStoreError> {
        self.check_quota(draft.image_bytes())?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM draft_images WHERE slot = ?")
            .bind(DRAFT_SLOT)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO drafts (slot, form, created_at_ms, lead_id, picture_token)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (slot) DO UPDATE SET
                form = excluded.form,
                created_at_ms = excluded.created_at_ms,
                lead_id = excluded.lead_id,
                picture_token = excluded.picture_token
            "#,
        )
        .bind(DRAFT_SLOT)
        .bind(Json(&draft.form))
        .bind(draft.created_at.timestamp_millis())
        .bind(draft.lead_id.map(|id| id.to_string()))
        .bind(draft.picture_token.as_deref())
        .execute(&mut *tx)
        .await?;

        for (position, image) in draft.images.iter().enumerate() {
            insert_image(&mut tx, position as i64, image).await?;
        }

        tx.commit().await?;

        tracing::debug!(
            images = draft.images.len(),
            has_identity = draft.identity().is_some(),
            "Draft saved"
        );
        Ok(())
    }

    async fn append_images(&self, images: Vec<NewImage>) -> Result<LeadDraft, DraftStoreError> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM drafts WHERE slot = ?")
            .bind(DRAFT_SLOT)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(DraftStoreError::NoDraftFound);
        }

        let (stored_bytes, next_position): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(LENGTH(bytes)), 0), COALESCE(MAX(position) + 1, 0)
            FROM draft_images WHERE slot = ?
            "#,
        )
        .bind(DRAFT_SLOT)
        .fetch_one(&mut *tx)
        .await?;

        let added: u64 = images.iter().map(|i| i.bytes.len() as u64).sum();
        // Dropping `tx` on the error path rolls back; the draft stays as it was
        self.check_quota(stored_bytes as u64 + added)?;

        for (offset, image) in images.into_iter().enumerate() {
            let record = ImageRecord {
                id: Uuid::new_v4(),
                file_name: image.file_name,
                mime_type: image.mime_type,
                bytes: image.bytes,
            };
            insert_image(&mut tx, next_position + offset as i64, &record).await?;
        }

        tx.commit().await?;

        self.get().await?.ok_or(DraftStoreError::NoDraftFound)
    }

    async fn get(&self) -> Result<Option<LeadDraft>, DraftStoreError> {
        let row = sqlx::query_as::<_, DraftRow>(
            "SELECT form, created_at_ms, lead_id, picture_token FROM drafts WHERE slot = ?",
        )
        .bind(DRAFT_SLOT)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let images = sqlx::query_as::<_, ImageRow>(
            r#"
            SELECT id, file_name, mime_type, bytes
            FROM draft_images WHERE slot = ?
            ORDER BY position
            "#,
        )
        .bind(DRAFT_SLOT)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(ImageRecord::try_from)
        .collect::<Result<Vec<_>, _>>()?;

        let created_at = Utc
            .timestamp_millis_opt(row.created_at_ms)
            .single()
            .ok_or_else(|| DraftStoreError::Corrupt("created_at out of range".to_string()))?;

        Ok(Some(LeadDraft {
            form: row.form.0,
            images,
            created_at,
            lead_id: row.lead_id.as_deref().map(parse_uuid).transpose()?,
            picture_token: row.picture_token,
        }))
    }

    async fn clear(&self) -> Result<(), DraftStoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM draft_images WHERE slot = ?")
            .bind(DRAFT_SLOT)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM drafts WHERE slot = ?")
            .bind(DRAFT_SLOT)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::debug!("Draft cleared");
        Ok(())
    }

    async fn remove_image(&self, image_id: Uuid) -> Result<(), DraftStoreError> {
        sqlx::query("DELETE FROM draft_images WHERE slot = ? AND id = ?")
            .bind(DRAFT_SLOT)
            .bind(image_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_identity(
        &self,
        lead_id: Uuid,
        picture_token: &str,
    ) -> Result<(), DraftStoreError> {
        let result =
            sqlx::query("UPDATE drafts SET lead_id = ?, picture_token = ? WHERE slot = ?")
                .bind(lead_id.to_string())
                .bind(picture_token)
                .bind(DRAFT_SLOT)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DraftStoreError::NoDraftFound);
        }
        Ok(())
    }
}
