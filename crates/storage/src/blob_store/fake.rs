use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;

use crate::blob_store::BlobStore;
use crate::error::{Result, StorageError};
use crate::models::StoredFile;

#[derive(Debug, Clone)]
pub struct FakeFile {
    pub name: String,
    pub parent: String,
    pub mime_type: String,
    pub content: Bytes,
    pub size: u64,
}

#[derive(Debug, Clone)]
struct FakeFolder {
    id: String,
    name: String,
    parent: String,
}

#[derive(Default)]
struct Inner {
    folders: Vec<FakeFolder>,
    files: HashMap<String, FakeFile>,
    next_id: u64,
    calls: u64,
    fail_names_containing: Option<String>,
}

/// In-memory `BlobStore` for tests: a flat folder list, a file map, a call
/// counter to prove "no remote calls were made", and a name-matching failure
/// injector for exercising the compensating-cleanup path.
#[derive(Clone, Default)]
pub struct FakeBlobStore {
    inner: Arc<Mutex<Inner>>,
}

impl FakeBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of operations issued against the fake.
    pub async fn call_count(&self) -> u64 {
        self.inner.lock().await.calls
    }

    pub async fn folder_count(&self) -> usize {
        self.inner.lock().await.folders.len()
    }

    pub async fn files(&self) -> Vec<(String, FakeFile)> {
        let inner = self.inner.lock().await;
        let mut files: Vec<_> = inner
            .files
            .iter()
            .map(|(id, f)| (id.clone(), f.clone()))
            .collect();
        files.sort_by(|a, b| a.0.cmp(&b.0));
        files
    }

    /// Fail any `create_file` whose name contains the given fragment.
    pub async fn fail_files_containing(&self, fragment: &str) {
        self.inner.lock().await.fail_names_containing = Some(fragment.to_string());
    }

    /// Simulate the client completing a resumable session by recording the
    /// transferred byte count on the file object.
    pub async fn complete_resumable(&self, file_id: &str, size: u64) {
        if let Some(file) = self.inner.lock().await.files.get_mut(file_id) {
            file.size = size;
        }
    }
}

impl Inner {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }
}

#[async_trait]
impl BlobStore for FakeBlobStore {
    async fn find_folder(&self, name: &str, parent: &str) -> Result<Option<String>> {
        let mut inner = self.inner.lock().await;
        inner.calls += 1;
        Ok(inner
            .folders
            .iter()
            .find(|f| f.name == name && f.parent == parent)
            .map(|f| f.id.clone()))
    }

    async fn create_folder(&self, name: &str, parent: &str) -> Result<String> {
        let mut inner = self.inner.lock().await;
        inner.calls += 1;
        let id = inner.next_id("folder");
        inner.folders.push(FakeFolder {
            id: id.clone(),
            name: name.to_string(),
            parent: parent.to_string(),
        });
        Ok(id)
    }

    async fn create_file(
        &self,
        name: &str,
        parent: &str,
        content: Bytes,
        mime_type: &str,
    ) -> Result<StoredFile> {
        let mut inner = self.inner.lock().await;
        inner.calls += 1;

        if let Some(fragment) = inner.fail_names_containing.clone() {
            if name.contains(&fragment) {
                return Err(StorageError::Unknown(format!(
                    "injected failure for '{}'",
                    name
                )));
            }
        }

        let id = inner.next_id("file");
        let size = content.len() as u64;
        inner.files.insert(
            id.clone(),
            FakeFile {
                name: name.to_string(),
                parent: parent.to_string(),
                mime_type: mime_type.to_string(),
                content,
                size,
            },
        );
        Ok(StoredFile {
            id: id.clone(),
            name: name.to_string(),
            size,
            web_view_link: Some(format!("https://blobs.example/view/{}", id)),
        })
    }

    async fn create_resumable(
        &self,
        name: &str,
        parent: &str,
        mime_type: &str,
        _size: u64,
    ) -> Result<(String, String)> {
        let mut inner = self.inner.lock().await;
        inner.calls += 1;
        let id = inner.next_id("file");
        inner.files.insert(
            id.clone(),
            FakeFile {
                name: name.to_string(),
                parent: parent.to_string(),
                mime_type: mime_type.to_string(),
                content: Bytes::new(),
                size: 0,
            },
        );
        let session_url = format!("https://blobs.example/sessions/{}", id);
        Ok((id, session_url))
    }

    async fn get_file(&self, id: &str) -> Result<StoredFile> {
        let mut inner = self.inner.lock().await;
        inner.calls += 1;
        let file = inner.files.get(id).ok_or(StorageError::NotFound)?;
        Ok(StoredFile {
            id: id.to_string(),
            name: file.name.clone(),
            size: file.size,
            web_view_link: Some(format!("https://blobs.example/view/{}", id)),
        })
    }

    async fn delete_file(&self, id: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.calls += 1;
        inner
            .files
            .remove(id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }
}
