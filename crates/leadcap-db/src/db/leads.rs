use async_trait::async_trait;
use chrono::{DateTime, Utc};
use leadcap_core::models::{Lead, NewLead, PictureMeta, Salutation};
use leadcap_core::AppError;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

/// Lead persistence as seen by the lead service.
#[async_trait]
pub trait LeadRepository: Send + Sync {
    /// Insert a new lead with an empty picture list.
    async fn create(&self, lead: NewLead) -> Result<Lead, AppError>;

    /// Append one picture entry in a single statement. `None` when the lead does not exist.
    async fn append_picture(
        &self,
        lead_id: Uuid,
        picture: &PictureMeta,
    ) -> Result<Option<Lead>, AppError>;

    async fn get(&self, lead_id: Uuid) -> Result<Option<Lead>, AppError>;
}

/// Repository for leads backed by PostgreSQL
#[derive(Clone)]
pub struct PgLeadRepository {
    pool: PgPool,
}

impl PgLeadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const LEAD_COLUMNS: &str = "id, salutation, first_name, last_name, postal_code, email, phone, \
     newsletter_single_opt_in, pictures, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct LeadRow {
    id: Uuid,
    salutation: String,
    first_name: String,
    last_name: String,
    postal_code: String,
    email: String,
    phone: String,
    newsletter_single_opt_in: bool,
    pictures: Json<Vec<PictureMeta>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<LeadRow> for Lead {
    type Error = AppError;

    fn try_from(row: LeadRow) -> Result<Self, Self::Error> {
        let salutation: Salutation = row.salutation.parse().map_err(AppError::Internal)?;
        Ok(Lead {
            id: row.id,
            salutation,
            first_name: row.first_name,
            last_name: row.last_name,
            postal_code: row.postal_code,
            email: row.email,
            phone: row.phone,
            newsletter_single_opt_in: row.newsletter_single_opt_in,
            pictures: row.pictures.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl LeadRepository for PgLeadRepository {
    async fn create(&self, lead: NewLead) -> Result<Lead, AppError> {
        // Use dynamic SQLx queries to avoid requiring DATABASE_URL/sqlx prepare
        let row = sqlx::query_as::<_, LeadRow>(&format!(
            r#"
            INSERT INTO leads (
                id, salutation, first_name, last_name, postal_code,
                email, phone, newsletter_single_opt_in
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            LEAD_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(lead.salutation.as_str())
        .bind(&lead.first_name)
        .bind(&lead.last_name)
        .bind(&lead.postal_code)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(lead.newsletter_single_opt_in)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(lead_id = %row.id, "Lead inserted");

        row.try_into()
    }

    async fn append_picture(
        &self,
        lead_id: Uuid,
        picture: &PictureMeta,
    ) -> Result<Option<Lead>, AppError> {
        // One UPDATE per picture keeps concurrent attaches for the same lead lock-free
        let row = sqlx::query_as::<_, LeadRow>(&format!(
            r#"
            UPDATE leads
            SET pictures = pictures || jsonb_build_array($2::jsonb), updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            LEAD_COLUMNS
        ))
        .bind(lead_id)
        .bind(Json(picture))
        .fetch_optional(&self.pool)
        .await?;

        row.map(Lead::try_from).transpose()
    }

    async fn get(&self, lead_id: Uuid) -> Result<Option<Lead>, AppError> {
        let row = sqlx::query_as::<_, LeadRow>(&format!(
            "SELECT {} FROM leads WHERE id = $1",
            LEAD_COLUMNS
        ))
        .bind(lead_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Lead::try_from).transpose()
    }
}
