pub mod drive;
pub mod fake;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::models::StoredFile;

/// Folder mimetype used by the hierarchical blob store.
pub const FOLDER_MIME: &str = "application/vnd.folder";

/// Hierarchical blob storage: folders by name under a parent, file objects
/// under folders, and a resumable variant that hands the byte transfer to the
/// client via a session URL.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Exact-name lookup under a parent, folders only, non-trashed.
    async fn find_folder(&self, name: &str, parent: &str) -> Result<Option<String>>;

    async fn create_folder(&self, name: &str, parent: &str) -> Result<String>;

    async fn create_file(
        &self,
        name: &str,
        parent: &str,
        content: Bytes,
        mime_type: &str,
    ) -> Result<StoredFile>;

    /// Create an empty file object and open a resumable upload session for
    /// it. Returns the new file id and the session URL the client must stream
    /// bytes to.
    async fn create_resumable(
        &self,
        name: &str,
        parent: &str,
        mime_type: &str,
        size: u64,
    ) -> Result<(String, String)>;

    async fn get_file(&self, id: &str) -> Result<StoredFile>;

    /// Used only as a compensating action when a later step of an upload
    /// sequence fails.
    async fn delete_file(&self, id: &str) -> Result<()>;
}
