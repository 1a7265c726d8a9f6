use async_trait::async_trait;

use crate::domain::category::Category;
use crate::domain::error::DomainError;

#[async_trait]
pub(crate) trait CategoryRepository: Send + Sync {
    async fn find_published_by_slug(&self, slug: &str) -> Result<Option<Category>, DomainError>;
    async fn category_exists(&self, id: i64) -> Result<bool, DomainError>;
    async fn location_exists(&self, id: i64) -> Result<bool, DomainError>;
}
