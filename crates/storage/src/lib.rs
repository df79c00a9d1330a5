pub mod auth;
pub mod blob_store;
pub mod dto;
pub mod error;
pub mod models;
pub mod record_store;
pub mod services;

pub use blob_store::BlobStore;
pub use record_store::RecordStore;
