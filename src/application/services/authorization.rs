//! IdTag registry and authorization lookups

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::domain::{AuthorizationResult, DomainError, DomainResult, IdTag, RepositoryProvider};

pub struct AuthorizationService {
    repos: Arc<dyn RepositoryProvider>,
}

impl AuthorizationService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    /// Absent tags are Invalid. Blocked beats expired.
    pub async fn authorize(&self, id_tag: &str) -> DomainResult<AuthorizationResult> {
        let result = match self.repos.id_tags().find_by_id_tag(id_tag).await? {
            Some(tag) => tag.authorize_at(Utc::now()),
            None => AuthorizationResult::invalid(),
        };
        debug!(id_tag, status = %result.status, "Authorization lookup");
        Ok(result)
    }

    pub async fn add_id_tag(&self, tag: IdTag) -> DomainResult<()> {
        info!(id_tag = tag.id_tag.as_str(), "IdTag added");
        self.repos.id_tags().save(tag).await
    }

    pub async fn block_id_tag(&self, id_tag: &str) -> DomainResult<()> {
        let mut tag = self
            .repos
            .id_tags()
            .find_by_id_tag(id_tag)
            .await?
            .ok_or_else(|| DomainError::not_found("IdTag", "id_tag", id_tag))?;
        tag.blocked = true;
        self.repos.id_tags().save(tag).await?;
        info!(id_tag, "IdTag blocked");
        Ok(())
    }

    pub async fn list_id_tags(&self) -> DomainResult<Vec<IdTag>> {
        self.repos.id_tags().find_all().await
    }
}
