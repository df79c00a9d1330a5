pub mod registration;
pub mod upload;
