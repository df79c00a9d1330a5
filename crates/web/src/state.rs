use std::sync::Arc;

use storage::auth::{Credentials, TokenProvider};
use storage::blob_store::drive::DriveBlobStore;
use storage::record_store::sheet::SheetRecordStore;
use storage::services::UploadService;
use storage::{BlobStore, RecordStore};

use crate::config::Config;
use crate::error::WebError;

/// Shared application state. Adapters are constructed once at boot and
/// injected into handlers; a missing configuration group leaves its slot
/// empty, and handlers turn that into a not-configured error per request.
#[derive(Clone)]
pub struct AppState {
    record_store: Option<Arc<dyn RecordStore>>,
    upload_service: Option<Arc<UploadService>>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        let record_store = config.record_store.as_ref().map(|c| {
            let auth = Arc::new(TokenProvider::new(
                c.auth_url.clone(),
                Credentials {
                    account_id: c.account_id.clone(),
                    private_key: c.private_key.clone(),
                },
            ));
            Arc::new(SheetRecordStore::new(
                c.base_url.clone(),
                c.table_id.clone(),
                auth,
            )) as Arc<dyn RecordStore>
        });

        let upload_service = config.blob_store.as_ref().map(|c| {
            let auth = Arc::new(TokenProvider::new(
                c.auth_url.clone(),
                Credentials {
                    account_id: c.account_id.clone(),
                    private_key: c.private_key.clone(),
                },
            ));
            let store =
                Arc::new(DriveBlobStore::new(c.base_url.clone(), auth)) as Arc<dyn BlobStore>;
            Arc::new(UploadService::new(store, c.root_folder_id.clone()))
        });

        Self {
            record_store,
            upload_service,
        }
    }

    /// Explicit constructor for tests and alternative wiring.
    pub fn new(
        record_store: Option<Arc<dyn RecordStore>>,
        upload_service: Option<Arc<UploadService>>,
    ) -> Self {
        Self {
            record_store,
            upload_service,
        }
    }

    pub fn records(&self) -> Result<Arc<dyn RecordStore>, WebError> {
        self.record_store.clone().ok_or(WebError::NotConfigured)
    }

    pub fn uploads(&self) -> Result<Arc<UploadService>, WebError> {
        self.upload_service.clone().ok_or(WebError::NotConfigured)
    }

    pub fn has_record_store(&self) -> bool {
        self.record_store.is_some()
    }

    pub fn has_upload_service(&self) -> bool {
        self.upload_service.is_some()
    }
}
