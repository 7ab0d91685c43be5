// Profile persistence behind a narrow save/find seam. Postgres when a
// DATABASE_URL is configured, an in-process map otherwise; handlers never
// know which one they are talking to.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::models::candidate::{CandidateProfile, CandidateRow};

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn save(&self, profile: &CandidateProfile) -> Result<()>;

    /// Looks up one profile within a tenant. A matching id under a different
    /// tenant is a miss.
    async fn find(&self, tenant_id: &str, id: Uuid) -> Result<Option<CandidateProfile>>;

    /// Fetches the given profiles within a tenant. Unknown ids are skipped;
    /// no order is guaranteed.
    async fn find_many(&self, tenant_id: &str, ids: &[Uuid]) -> Result<Vec<CandidateProfile>>;

    fn backend_name(&self) -> &'static str;
}

/// Creates the Postgres connection pool used by the repository.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(database_url)
        .await?;
    info!("Database connection pool established");
    Ok(pool)
}

pub struct PgProfileRepository {
    pool: PgPool,
}

impl PgProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileRepository for PgProfileRepository {
    async fn save(&self, profile: &CandidateProfile) -> Result<()> {
        let source_tags: Vec<String> =
            profile.source_tags.iter().map(|kind| kind.as_str().to_string()).collect();

        sqlx::query(
            r#"
            INSERT INTO candidate_profiles
                (id, tenant_id, name, email, phone, skills, experience_years,
                 education, professional_summary, "current_role", location,
                 source_tags, degraded, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(profile.id)
        .bind(&profile.tenant_id)
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&profile.phone)
        .bind(&profile.skills)
        .bind(profile.experience_years as i32)
        .bind(&profile.education)
        .bind(&profile.professional_summary)
        .bind(&profile.current_role)
        .bind(&profile.location)
        .bind(&source_tags)
        .bind(profile.degraded)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, tenant_id: &str, id: Uuid) -> Result<Option<CandidateProfile>> {
        let row: Option<CandidateRow> = sqlx::query_as(
            "SELECT * FROM candidate_profiles WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CandidateProfile::from))
    }

    async fn find_many(&self, tenant_id: &str, ids: &[Uuid]) -> Result<Vec<CandidateProfile>> {
        let rows: Vec<CandidateRow> = sqlx::query_as(
            "SELECT * FROM candidate_profiles WHERE tenant_id = $1 AND id = ANY($2)",
        )
        .bind(tenant_id)
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CandidateProfile::from).collect())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

/// Keyed by (tenant, id). Used when no database is configured, and in tests.
#[derive(Default)]
pub struct InMemoryProfileRepository {
    profiles: RwLock<HashMap<(String, Uuid), CandidateProfile>>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn save(&self, profile: &CandidateProfile) -> Result<()> {
        let mut profiles = self.profiles.write().await;
        profiles.insert((profile.tenant_id.clone(), profile.id), profile.clone());
        Ok(())
    }

    async fn find(&self, tenant_id: &str, id: Uuid) -> Result<Option<CandidateProfile>> {
        let profiles = self.profiles.read().await;
        Ok(profiles.get(&(tenant_id.to_string(), id)).cloned())
    }

    async fn find_many(&self, tenant_id: &str, ids: &[Uuid]) -> Result<Vec<CandidateProfile>> {
        let profiles = self.profiles.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| profiles.get(&(tenant_id.to_string(), *id)).cloned())
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
