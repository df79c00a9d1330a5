use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{Registration, ReviewStatus};
use crate::record_store::RecordStore;

/// In-memory `RecordStore` for tests. Supports a switchable failure mode so
/// callers can exercise the error paths.
#[derive(Clone, Default)]
pub struct FakeRecordStore {
    rows: Arc<Mutex<Vec<Registration>>>,
    fail: Arc<Mutex<bool>>,
}

impl FakeRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with an unknown backend error.
    pub async fn fail_all(&self) {
        *self.fail.lock().await = true;
    }

    /// Snapshot of the stored registrations, in insertion order.
    pub async fn records(&self) -> Vec<Registration> {
        self.rows.lock().await.clone()
    }

    async fn check_failure(&self) -> Result<()> {
        if *self.fail.lock().await {
            return Err(StorageError::Unknown("fake record store failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for FakeRecordStore {
    async fn create(&self, registration: Registration) -> Result<Registration> {
        self.check_failure().await?;
        self.rows.lock().await.push(registration.clone());
        Ok(registration)
    }

    async fn list(&self) -> Result<Vec<Registration>> {
        self.check_failure().await?;
        Ok(self.rows.lock().await.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Registration> {
        self.check_failure().await?;
        self.rows
            .lock()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ReviewStatus,
        note: Option<String>,
    ) -> Result<Registration> {
        self.check_failure().await?;
        let mut rows = self.rows.lock().await;
        let row = rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StorageError::NotFound)?;
        row.status = status;
        row.note = note;
        Ok(row.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.check_failure().await?;
        let mut rows = self.rows.lock().await;
        let before = rows.len();
        rows.retain(|r| r.id != id);
        if rows.len() == before {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
