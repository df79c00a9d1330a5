use std::collections::BTreeMap;

use chrono::Utc;
use storage::RecordStore;
use storage::dto::registration::{
    CategoryCount, CreateRegistrationRequest, StatsResponse, StatusBreakdown, UpdateStatusRequest,
};
use storage::error::{Result, StorageError};
use storage::models::{Registration, ReviewStatus};
use uuid::Uuid;

/// Create a registration. The server assigns the id, stamps today's date and
/// forces the initial status to pending; nothing the client sends can
/// override those.
pub async fn create_registration(
    store: &dyn RecordStore,
    request: &CreateRegistrationRequest,
) -> Result<Registration> {
    let registration = Registration {
        id: Uuid::new_v4(),
        name: request.name.clone(),
        unit: request.unit.clone(),
        phone: request.phone.clone(),
        category: request.category.clone(),
        submitted_on: Utc::now().date_naive(),
        status: ReviewStatus::Pending,
        note: None,
    };

    store.create(registration).await
}

/// List all registrations, or only those in one category.
pub async fn list_registrations(
    store: &dyn RecordStore,
    category: Option<&str>,
) -> Result<Vec<Registration>> {
    match category {
        Some(category) => store.list_by_category(category).await,
        None => store.list().await,
    }
}

pub async fn get_registration(store: &dyn RecordStore, id: Uuid) -> Result<Registration> {
    store.get(id).await
}

/// Apply a review decision. Status and note land together; an invalid status
/// never reaches the store.
pub async fn update_status(
    store: &dyn RecordStore,
    id: Uuid,
    request: &UpdateStatusRequest,
) -> Result<Registration> {
    let status: ReviewStatus = request.status.parse().map_err(StorageError::BadRequest)?;
    store.update_status(id, status, request.note.clone()).await
}

pub async fn delete_registration(store: &dyn RecordStore, id: Uuid) -> Result<()> {
    store.delete(id).await
}

/// Per-category and per-status counts over the full record scan.
pub async fn registration_stats(store: &dyn RecordStore) -> Result<StatsResponse> {
    let registrations = store.list().await?;

    let mut by_category: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_status = StatusBreakdown {
        pending: 0,
        approved: 0,
        rejected: 0,
    };

    for registration in &registrations {
        *by_category.entry(registration.category.clone()).or_default() += 1;
        match registration.status {
            ReviewStatus::Pending => by_status.pending += 1,
            ReviewStatus::Approved => by_status.approved += 1,
            ReviewStatus::Rejected => by_status.rejected += 1,
        }
    }

    Ok(StatsResponse {
        total: registrations.len(),
        by_category: by_category
            .into_iter()
            .map(|(category, count)| CategoryCount { category, count })
            .collect(),
        by_status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::record_store::fake::FakeRecordStore;

    fn create_request(name: &str, category: &str) -> CreateRegistrationRequest {
        CreateRegistrationRequest {
            name: name.to_string(),
            unit: Some("Unit X".to_string()),
            phone: "081111111111".to_string(),
            category: category.to_string(),
        }
    }

    #[tokio::test]
    async fn create_stamps_server_fields() {
        let store = FakeRecordStore::new();

        let created = create_registration(&store, &create_request("Tim A", "Gobak Sodor"))
            .await
            .unwrap();

        assert_eq!(created.status, ReviewStatus::Pending);
        assert_eq!(created.submitted_on, Utc::now().date_naive());
        assert!(created.note.is_none());

        let records = store.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, created.id);
        assert_eq!(records[0].status, ReviewStatus::Pending);
    }

    #[tokio::test]
    async fn list_filters_by_category() {
        let store = FakeRecordStore::new();
        create_registration(&store, &create_request("Tim A", "Gobak Sodor"))
            .await
            .unwrap();
        create_registration(&store, &create_request("Tim B", "Panjat Pinang"))
            .await
            .unwrap();

        let all = list_registrations(&store, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let filtered = list_registrations(&store, Some("Gobak Sodor")).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "Tim A");

        let none = list_registrations(&store, Some("Balap Karung")).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn update_applies_status_and_note_together() {
        let store = FakeRecordStore::new();
        let created = create_registration(&store, &create_request("Tim A", "Gobak Sodor"))
            .await
            .unwrap();

        let updated = update_status(
            &store,
            created.id,
            &UpdateStatusRequest {
                status: "approved".to_string(),
                note: Some("well organized".to_string()),
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.status, ReviewStatus::Approved);
        assert_eq!(updated.note.as_deref(), Some("well organized"));
    }

    #[tokio::test]
    async fn invalid_status_leaves_the_record_unchanged() {
        let store = FakeRecordStore::new();
        let created = create_registration(&store, &create_request("Tim A", "Gobak Sodor"))
            .await
            .unwrap();

        let err = update_status(
            &store,
            created.id,
            &UpdateStatusRequest {
                status: "archived".to_string(),
                note: None,
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, StorageError::BadRequest(_)));
        let records = store.records().await;
        assert_eq!(records[0].status, ReviewStatus::Pending);
    }

    #[tokio::test]
    async fn delete_removes_the_record_everywhere() {
        let store = FakeRecordStore::new();
        let created = create_registration(&store, &create_request("Tim A", "Gobak Sodor"))
            .await
            .unwrap();

        delete_registration(&store, created.id).await.unwrap();

        assert!(list_registrations(&store, None).await.unwrap().is_empty());
        assert!(
            list_registrations(&store, Some("Gobak Sodor"))
                .await
                .unwrap()
                .is_empty()
        );
        assert!(matches!(
            get_registration(&store, created.id).await.unwrap_err(),
            StorageError::NotFound
        ));
    }

    #[tokio::test]
    async fn stats_count_by_category_and_status() {
        let store = FakeRecordStore::new();
        let first = create_registration(&store, &create_request("Tim A", "Gobak Sodor"))
            .await
            .unwrap();
        create_registration(&store, &create_request("Tim B", "Gobak Sodor"))
            .await
            .unwrap();
        create_registration(&store, &create_request("Tim C", "Panjat Pinang"))
            .await
            .unwrap();

        update_status(
            &store,
            first.id,
            &UpdateStatusRequest {
                status: "rejected".to_string(),
                note: None,
            },
        )
        .await
        .unwrap();

        let stats = registration_stats(&store).await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_status.pending, 2);
        assert_eq!(stats.by_status.rejected, 1);
        assert_eq!(stats.by_status.approved, 0);
        assert_eq!(
            stats
                .by_category
                .iter()
                .find(|c| c.category == "Gobak Sodor")
                .unwrap()
                .count,
            2
        );
    }
}
