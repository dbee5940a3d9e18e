use std::env;
use std::path::PathBuf;

use crate::error::{IngestError, Result};

pub const DEFAULT_DATABASE_URL: &str =
    "https://nongkiyuk-6763e-default-rtdb.asia-southeast1.firebasedatabase.app/";
pub const DEFAULT_CREDENTIALS_PATH: &str = "serviceAccountKey.json";
pub const DEFAULT_DATASETS_DIR: &str = "datasets";

/// Everything the pipeline reads from the environment.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub google_maps_api_key: String,
    pub apify_api_key: String,
    pub firebase_database_url: String,
    pub firebase_credentials: PathBuf,
    pub datasets_dir: PathBuf,
}

impl IngestConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required =
            |name: &str| get(name).ok_or_else(|| IngestError::MissingEnv(name.to_string()));

        Ok(Self {
            google_maps_api_key: required("GOOGLE_MAPS_API_KEY")?,
            apify_api_key: required("APIFY_API_KEY")?,
            firebase_database_url: get("FIREBASE_DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            firebase_credentials: get("FIREBASE_CREDENTIALS")
                .unwrap_or_else(|| DEFAULT_CREDENTIALS_PATH.to_string())
                .into(),
            datasets_dir: get("DATASETS_DIR")
                .unwrap_or_else(|| DEFAULT_DATASETS_DIR.to_string())
                .into(),
        })
    }
}
