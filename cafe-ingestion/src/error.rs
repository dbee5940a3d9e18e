use thiserror::Error;

pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("{0} environment variable must be set")]
    MissingEnv(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} API error {status}: {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("No place found for name: {0}")]
    PlaceNotFound(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Apify run {run_id} finished with status {status}")]
    ActorRun { run_id: String, status: String },

    #[error("Scrape returned no items")]
    EmptyScrapeResult,

    #[error("Invalid credentials: {0}")]
    Credentials(String),

    #[error("Failed to sign token assertion: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl IngestError {
    /// Builds an [`IngestError::Api`] from a non-success response, consuming its body.
    pub(crate) async fn from_response(service: &'static str, response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        match response.text().await {
            Ok(body) => IngestError::Api {
                service,
                status,
                body,
            },
            Err(e) => IngestError::Http(e),
        }
    }
}
