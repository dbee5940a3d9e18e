use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One item of an actor dataset, kept as raw JSON so every field the scraper
/// returns survives the round trip to disk and to the database.
pub type ScrapedRecord = Map<String, Value>;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PlaceReference {
    pub place_id: String,
    pub maps_url: String,
}

/// The subset of a Google service-account key file needed to mint access tokens.
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceAccountKey {
    pub project_id: Option<String>,
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}
