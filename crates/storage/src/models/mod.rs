pub mod registration;
pub mod upload;

pub use registration::{Registration, ReviewStatus};
pub use upload::{StoredFile, UploadMetadata, UploadReceipt, UploadSession};
