pub mod fake;
pub mod sheet;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Registration, ReviewStatus};

/// Tabular persistence for registrations. The backing store only offers
/// whole-row CRUD, so category filtering scans the full result set here.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Append a fully assembled registration. The caller stamps id, date and
    /// initial status before handing the record over.
    async fn create(&self, registration: Registration) -> Result<Registration>;

    async fn list(&self) -> Result<Vec<Registration>>;

    async fn list_by_category(&self, category: &str) -> Result<Vec<Registration>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|r| r.category == category)
            .collect())
    }

    async fn get(&self, id: Uuid) -> Result<Registration>;

    /// Status and note are applied together; there is no partial update.
    async fn update_status(
        &self,
        id: Uuid,
        status: ReviewStatus,
        note: Option<String>,
    ) -> Result<Registration>;

    async fn delete(&self, id: Uuid) -> Result<()>;
}
