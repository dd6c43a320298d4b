//! IdTag repository interface

use async_trait::async_trait;

use super::model::IdTag;
use crate::shared::DomainResult;

#[async_trait]
pub trait IdTagRepository: Send + Sync {
    async fn find_by_id_tag(&self, id_tag: &str) -> DomainResult<Option<IdTag>>;

    /// Insert or replace
    async fn save(&self, id_tag: IdTag) -> DomainResult<()>;

    async fn find_all(&self) -> DomainResult<Vec<IdTag>>;
}
