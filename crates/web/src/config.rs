use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub record_store: Option<RecordStoreConfig>,
    pub blob_store: Option<BlobStoreConfig>,
}

#[derive(Debug, Clone)]
pub struct RecordStoreConfig {
    pub base_url: String,
    pub table_id: String,
    pub auth_url: String,
    pub account_id: String,
    pub private_key: String,
}

#[derive(Debug, Clone)]
pub struct BlobStoreConfig {
    pub base_url: String,
    pub root_folder_id: String,
    pub auth_url: String,
    pub account_id: String,
    pub private_key: String,
}

impl Config {
    /// Host and port are required. The two store configurations are optional
    /// groups: if any value of a group is missing the group is absent, the
    /// server still boots, and the affected endpoints answer with a
    /// not-configured error instead of crashing.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: std::env::var("HOST").context("Cannot load HOST env variable")?,
            port: std::env::var("PORT")
                .context("Cannot load PORT env variable")?
                .parse()
                .context("PORT must be a number")?,
            record_store: Self::record_store_from_env(),
            blob_store: Self::blob_store_from_env(),
        })
    }

    fn record_store_from_env() -> Option<RecordStoreConfig> {
        Some(RecordStoreConfig {
            base_url: env_opt("RECORD_STORE_URL")?,
            table_id: env_opt("RECORD_STORE_TABLE_ID")?,
            auth_url: env_opt("SERVICE_AUTH_URL")?,
            account_id: env_opt("SERVICE_ACCOUNT_ID")?,
            private_key: env_opt("SERVICE_ACCOUNT_KEY")?,
        })
    }

    fn blob_store_from_env() -> Option<BlobStoreConfig> {
        Some(BlobStoreConfig {
            base_url: env_opt("BLOB_STORE_URL")?,
            root_folder_id: env_opt("BLOB_STORE_ROOT_FOLDER_ID")?,
            auth_url: env_opt("SERVICE_AUTH_URL")?,
            account_id: env_opt("SERVICE_ACCOUNT_ID")?,
            private_key: env_opt("SERVICE_ACCOUNT_KEY")?,
        })
    }
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
