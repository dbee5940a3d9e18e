// Google Places "Find Place" service module
// Turns a free-text place name into a canonical Google Maps URL

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use shared_types::PlaceReference;

use crate::error::{IngestError, Result};

pub const FIND_PLACE_URL: &str =
    "https://maps.googleapis.com/maps/api/place/findplacefromtext/json";
const MAPS_PLACE_URL_PREFIX: &str = "https://www.google.com/maps/place/?q=place_id:";

/// Fixed parameters of the find-place request. Only the text input and the key vary per call.
#[derive(Debug, Clone)]
pub struct PlaceSearchQuery {
    pub endpoint: String,
    /// Always `textquery`: the input is a name, not a phone number.
    pub input_type: &'static str,
    /// Comma separated field mask. Only the place id is needed to build a maps URL.
    pub fields: &'static str,
}

impl Default for PlaceSearchQuery {
    fn default() -> Self {
        Self {
            endpoint: FIND_PLACE_URL.to_string(),
            input_type: "textquery",
            fields: "place_id",
        }
    }
}

impl PlaceSearchQuery {
    pub fn query_params<'a>(
        &'a self,
        input: &'a str,
        api_key: &'a str,
    ) -> [(&'static str, &'a str); 4] {
        [
            ("input", input),
            ("inputtype", self.input_type),
            ("fields", self.fields),
            ("key", api_key),
        ]
    }
}

#[async_trait]
pub trait PlaceResolver: Send + Sync {
    async fn resolve(&self, place_name: &str) -> Result<PlaceReference>;
}

pub struct GooglePlacesClient {
    client: Client,
    api_key: String,
    query: PlaceSearchQuery,
}

impl GooglePlacesClient {
    pub fn new(client: Client, api_key: String) -> Self {
        Self {
            client,
            api_key,
            query: PlaceSearchQuery::default(),
        }
    }
}

#[async_trait]
impl PlaceResolver for GooglePlacesClient {
    async fn resolve(&self, place_name: &str) -> Result<PlaceReference> {
        resolve_place(&self.client, &self.query, &self.api_key, place_name).await
    }
}

/// Look up `place_name` and return a reference to the first candidate
pub async fn resolve_place(
    client: &Client,
    query: &PlaceSearchQuery,
    api_key: &str,
    place_name: &str,
) -> Result<PlaceReference> {
    tracing::debug!(endpoint = %query.endpoint, place_name, "searching for place");

    let response = client
        .get(&query.endpoint)
        .query(&query.query_params(place_name, api_key)[..])
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(IngestError::from_response("Google Places", response).await);
    }

    let body: Value = response.json().await?;
    place_reference_from_response(&body, place_name)
}

pub fn place_reference_from_response(body: &Value, place_name: &str) -> Result<PlaceReference> {
    let first = body
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .ok_or_else(|| IngestError::PlaceNotFound(place_name.to_string()))?;

    let place_id = first
        .get("place_id")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            IngestError::MalformedResponse(format!(
                "first candidate for '{}' has no place_id",
                place_name
            ))
        })?;

    Ok(PlaceReference {
        place_id: place_id.to_string(),
        maps_url: maps_url_for(place_id),
    })
}

pub fn maps_url_for(place_id: &str) -> String {
    format!("{}{}", MAPS_PLACE_URL_PREFIX, place_id)
}
