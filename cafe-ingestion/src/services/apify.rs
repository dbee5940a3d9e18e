// Apify API Service Module
// Starts an actor run, waits for it to finish and reads back its dataset

use std::time::Duration;

use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::ScrapedRecord;

use crate::error::{IngestError, Result};

pub const APIFY_API_BASE: &str = "https://api.apify.com/v2";

/// Google Maps scraper actor (compass/crawler-google-places)
pub const GOOGLE_MAPS_SCRAPER_ACTOR: &str = "nwua9Gu5YrADL7ZDj";

/// Longest wait the run endpoint allows per request
const WAIT_FOR_FINISH_SECS: u64 = 60;

// ============================================================================
// Actor input
// ============================================================================

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct StartUrl {
    pub url: String,
}

/// Run input for the Google Maps scraper. One place, no reviews, one image.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GoogleMapsScraperInput {
    pub deeper_city_scrape: bool,
    pub include_web_results: bool,
    pub language: String,
    pub max_crawled_places_per_search: u32,
    pub max_images: u32,
    pub max_questions: u32,
    pub max_reviews: u32,
    pub only_data_from_search_page: bool,
    pub scrape_directories: bool,
    pub scrape_response_from_owner_text: bool,
    pub scrape_review_id: bool,
    pub scrape_review_url: bool,
    pub scrape_reviewer_id: bool,
    pub scrape_reviewer_name: bool,
    pub scrape_reviewer_url: bool,
    pub skip_closed_places: bool,
    pub start_urls: Vec<StartUrl>,
    pub reviews_sort: String,
    pub reviews_filter_string: String,
    pub search_matching: String,
    pub place_minimum_stars: String,
    pub all_places_no_search_action: String,
}

impl GoogleMapsScraperInput {
    pub fn for_url(url: &str) -> Self {
        Self {
            deeper_city_scrape: false,
            include_web_results: false,
            language: "en".to_string(),
            max_crawled_places_per_search: 50,
            max_images: 1,
            max_questions: 0,
            max_reviews: 0,
            only_data_from_search_page: false,
            scrape_directories: false,
            scrape_response_from_owner_text: true,
            scrape_review_id: true,
            scrape_review_url: true,
            scrape_reviewer_id: true,
            scrape_reviewer_name: true,
            scrape_reviewer_url: true,
            skip_closed_places: false,
            start_urls: vec![StartUrl {
                url: url.to_string(),
            }],
            reviews_sort: "newest".to_string(),
            reviews_filter_string: String::new(),
            search_matching: "all".to_string(),
            place_minimum_stars: String::new(),
            all_places_no_search_action: String::new(),
        }
    }
}

// ============================================================================
// Actor runner
// ============================================================================

#[async_trait]
pub trait ActorRunner: Send + Sync {
    /// Run `actor_id` to completion and return every item of its default dataset.
    async fn run_actor(&self, actor_id: &str, input: &Value) -> Result<Vec<ScrapedRecord>>;
}

#[derive(Deserialize)]
struct ApifyRunResponse {
    data: ApifyRunData,
}

#[derive(Deserialize)]
struct ApifyRunData {
    id: String,
    #[serde(rename = "defaultDatasetId")]
    default_dataset_id: String,
    status: String,
}

pub fn is_terminal_status(status: &str) -> bool {
    matches!(status, "SUCCEEDED" | "FAILED" | "ABORTED" | "TIMED-OUT")
}

/// Clears the wait spinner however the polling loop exits.
struct SpinnerGuard(ProgressBar);

impl SpinnerGuard {
    fn start() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(120));
        Self(spinner)
    }
}

impl Drop for SpinnerGuard {
    fn drop(&mut self) {
        self.0.finish_and_clear();
    }
}

pub struct ApifyClient {
    client: Client,
    token: String,
    base_url: String,
}

impl ApifyClient {
    pub fn new(client: Client, token: String) -> Self {
        Self::with_base_url(client, token, APIFY_API_BASE.to_string())
    }

    pub fn with_base_url(client: Client, token: String, base_url: String) -> Self {
        Self {
            client,
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn start_run(&self, actor_id: &str, input: &Value) -> Result<ApifyRunData> {
        let url = format!("{}/acts/{}/runs", self.base_url, actor_id);
        tracing::debug!(%url, "starting actor run");

        let response = self
            .client
            .post(&url)
            .query(&[("token", self.token.as_str())])
            .json(input)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IngestError::from_response("Apify", response).await);
        }

        let run: ApifyRunResponse = response.json().await?;
        Ok(run.data)
    }

    async fn wait_for_run(&self, run: ApifyRunData) -> Result<ApifyRunData> {
        let url = format!("{}/actor-runs/{}", self.base_url, run.id);
        let wait = WAIT_FOR_FINISH_SECS.to_string();

        let spinner = SpinnerGuard::start();

        let mut run = run;
        while !is_terminal_status(&run.status) {
            spinner.0.set_message(format!("Apify run {} is {}", run.id, run.status));

            let response = self
                .client
                .get(&url)
                .query(&[("token", self.token.as_str()), ("waitForFinish", wait.as_str())])
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(IngestError::from_response("Apify", response).await);
            }

            let status: ApifyRunResponse = response.json().await?;
            run = status.data;
            tracing::debug!(run_id = %run.id, status = %run.status, "polled actor run");
        }
        drop(spinner);

        Ok(run)
    }

    async fn dataset_items(&self, dataset_id: &str) -> Result<Vec<ScrapedRecord>> {
        let url = format!("{}/datasets/{}/items", self.base_url, dataset_id);

        let response = self
            .client
            .get(&url)
            .query(&[("token", self.token.as_str()), ("format", "json")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IngestError::from_response("Apify", response).await);
        }

        let response_text = response.text().await?;
        parse_dataset_items(&response_text)
    }
}

#[async_trait]
impl ActorRunner for ApifyClient {
    async fn run_actor(&self, actor_id: &str, input: &Value) -> Result<Vec<ScrapedRecord>> {
        println!("🚀 Starting Apify run...");
        let run = self.start_run(actor_id, input).await?;
        println!("✅ Run started: {}", run.id);

        let run = self.wait_for_run(run).await?;
        if run.status != "SUCCEEDED" {
            return Err(IngestError::ActorRun {
                run_id: run.id,
                status: run.status,
            });
        }
        println!("✅ Run completed successfully!");

        println!("📥 Fetching results from dataset...");
        let items = self.dataset_items(&run.default_dataset_id).await?;
        tracing::info!(run_id = %run.id, items = items.len(), "read actor dataset");

        Ok(items)
    }
}

pub fn parse_dataset_items(response_text: &str) -> Result<Vec<ScrapedRecord>> {
    serde_json::from_str(response_text).map_err(|e| {
        let preview: String = response_text.chars().take(500).collect();
        IngestError::MalformedResponse(format!(
            "Failed to parse dataset response: {}. Preview: {}",
            e, preview
        ))
    })
}
