use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::auth::TokenProvider;
use crate::error::{Result, StorageError};
use crate::models::{Registration, ReviewStatus};
use crate::record_store::RecordStore;

/// Registration store backed by an external tabular service. One registration
/// is one row; columns are addressed by name. The stable `id` column, not the
/// backend row id, is the key exposed to callers, so reordering or interleaved
/// deletes in the backing table cannot redirect an update to the wrong record.
pub struct SheetRecordStore {
    base_url: String,
    table_id: String,
    client: reqwest::Client,
    auth: Arc<TokenProvider>,
}

#[derive(Debug, Deserialize)]
struct RowsResponse {
    rows: Vec<Row>,
}

#[derive(Debug, Deserialize)]
struct Row {
    row_id: String,
    values: Value,
}

#[derive(Debug, Deserialize)]
struct CreatedRow {
    #[allow(dead_code)]
    row_id: String,
}

impl SheetRecordStore {
    pub fn new(base_url: String, table_id: String, auth: Arc<TokenProvider>) -> Self {
        Self {
            base_url,
            table_id,
            client: reqwest::Client::new(),
            auth,
        }
    }

    fn rows_url(&self) -> String {
        format!("{}/v1/tables/{}/rows", self.base_url, self.table_id)
    }

    fn row_url(&self, row_id: &str) -> String {
        format!("{}/{}", self.rows_url(), row_id)
    }

    async fn fetch_rows(&self) -> Result<Vec<Row>> {
        let token = self.auth.bearer().await?;
        let response = self
            .client
            .get(self.rows_url())
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::from_status(status, &body));
        }

        let rows: RowsResponse = response.json().await?;
        Ok(rows.rows)
    }

    /// Resolve the backend row holding the registration with the given id.
    async fn find_row(&self, id: Uuid) -> Result<(String, Registration)> {
        for row in self.fetch_rows().await? {
            let registration = registration_from_values(&row.values)?;
            if registration.id == id {
                return Ok((row.row_id, registration));
            }
        }
        Err(StorageError::NotFound)
    }
}

fn registration_to_values(registration: &Registration) -> Value {
    json!({
        "id": registration.id.to_string(),
        "name": registration.name,
        "unit": registration.unit,
        "phone": registration.phone,
        "category": registration.category,
        "submitted_on": registration.submitted_on.to_string(),
        "status": registration.status.as_str(),
        "note": registration.note,
    })
}

fn registration_from_values(values: &Value) -> Result<Registration> {
    serde_json::from_value(values.clone())
        .map_err(|e| StorageError::Unknown(format!("malformed row in table: {}", e)))
}

#[async_trait]
impl RecordStore for SheetRecordStore {
    async fn create(&self, registration: Registration) -> Result<Registration> {
        let token = self.auth.bearer().await?;
        let response = self
            .client
            .post(self.rows_url())
            .bearer_auth(token)
            .json(&json!({ "values": registration_to_values(&registration) }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::from_status(status, &body));
        }

        let _created: CreatedRow = response.json().await?;
        tracing::info!(id = %registration.id, category = %registration.category, "registration persisted");
        Ok(registration)
    }

    async fn list(&self) -> Result<Vec<Registration>> {
        self.fetch_rows()
            .await?
            .iter()
            .map(|row| registration_from_values(&row.values))
            .collect()
    }

    async fn get(&self, id: Uuid) -> Result<Registration> {
        let (_, registration) = self.find_row(id).await?;
        Ok(registration)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ReviewStatus,
        note: Option<String>,
    ) -> Result<Registration> {
        let (row_id, mut registration) = self.find_row(id).await?;

        let token = self.auth.bearer().await?;
        let response = self
            .client
            .patch(self.row_url(&row_id))
            .bearer_auth(token)
            .json(&json!({
                "values": {
                    "status": status.as_str(),
                    "note": note,
                }
            }))
            .send()
            .await?;

        let http_status = response.status();
        if !http_status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::from_status(http_status, &body));
        }

        registration.status = status;
        registration.note = note;
        Ok(registration)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let (row_id, _) = self.find_row(id).await?;

        let token = self.auth.bearer().await?;
        let response = self
            .client
            .delete(self.row_url(&row_id))
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::from_status(status, &body));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn row_values_round_trip() {
        let registration = Registration {
            id: Uuid::new_v4(),
            name: "Tim A".to_string(),
            unit: Some("Unit X".to_string()),
            phone: "081111111111".to_string(),
            category: "Gobak Sodor".to_string(),
            submitted_on: NaiveDate::from_ymd_opt(2026, 8, 17).unwrap(),
            status: ReviewStatus::Pending,
            note: None,
        };

        let values = registration_to_values(&registration);
        let parsed = registration_from_values(&values).unwrap();

        assert_eq!(parsed.id, registration.id);
        assert_eq!(parsed.name, registration.name);
        assert_eq!(parsed.submitted_on, registration.submitted_on);
        assert_eq!(parsed.status, ReviewStatus::Pending);
    }

    #[test]
    fn malformed_row_is_classified() {
        let err = registration_from_values(&json!({"id": "not-a-uuid"})).unwrap_err();
        assert!(matches!(err, StorageError::Unknown(_)));
    }
}
