use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use shared_types::ScrapedRecord;

use crate::error::{IngestError, Result};
use crate::services::apify::{ActorRunner, GoogleMapsScraperInput, GOOGLE_MAPS_SCRAPER_ACTOR};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[/\\:*?"<>|]"#).expect("valid regex"));

#[derive(Debug)]
pub struct ScrapeOutcome {
    /// Last item of the dataset, handed on to enrichment
    pub last_item: ScrapedRecord,
    pub message: String,
    pub written: Vec<PathBuf>,
}

/// File name for an item: title without whitespace, unsafe characters replaced.
pub fn dataset_file_name(item: &ScrapedRecord) -> String {
    let title = item.get("title").and_then(Value::as_str).unwrap_or_default();
    let compact = WHITESPACE.replace_all(title, "");
    let safe = UNSAFE_FILENAME_CHARS.replace_all(&compact, "_");

    if safe.is_empty() {
        "untitled.json".to_string()
    } else {
        format!("{}.json", safe)
    }
}

/// Write every item to `<dir>/<file name>.json`, overwriting earlier runs.
pub fn persist_items(dir: &Path, items: Vec<ScrapedRecord>) -> Result<ScrapeOutcome> {
    if items.is_empty() {
        return Err(IngestError::EmptyScrapeResult);
    }
    fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(items.len());
    let mut last_item = None;
    for item in items {
        let path = dir.join(dataset_file_name(&item));
        fs::write(&path, serde_json::to_vec(&item)?)?;
        tracing::debug!(path = %path.display(), "saved scraped item");

        written.push(path);
        last_item = Some(item);
    }

    let last_item = last_item.ok_or(IngestError::EmptyScrapeResult)?;
    let last_path = written.last().map(|p| p.display().to_string()).unwrap_or_default();

    Ok(ScrapeOutcome {
        last_item,
        message: format!("Gathered data saved into {}", last_path),
        written,
    })
}

/// Scrape one Google Maps URL and save the results under `datasets_dir`
pub async fn scrape_place(
    runner: &dyn ActorRunner,
    maps_url: &str,
    datasets_dir: &Path,
) -> Result<ScrapeOutcome> {
    let input = serde_json::to_value(GoogleMapsScraperInput::for_url(maps_url))?;
    let items = runner.run_actor(GOOGLE_MAPS_SCRAPER_ACTOR, &input).await?;
    println!("📥 Retrieved {} items from Apify", items.len());

    persist_items(datasets_dir, items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    fn record(value: Value) -> ScrapedRecord {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    struct FixedDataset {
        items: Vec<ScrapedRecord>,
        seen: Mutex<Vec<(String, Value)>>,
    }

    #[async_trait]
    impl ActorRunner for FixedDataset {
        async fn run_actor(&self, actor_id: &str, input: &Value) -> Result<Vec<ScrapedRecord>> {
            self.seen
                .lock()
                .unwrap()
                .push((actor_id.to_string(), input.clone()));
            Ok(self.items.clone())
        }
    }

    #[test]
    fn file_name_strips_whitespace() {
        let item = record(json!({ "title": "Kopi  Kenangan\tSenopati" }));
        assert_eq!(dataset_file_name(&item), "KopiKenanganSenopati.json");
    }

    #[test]
    fn file_name_replaces_path_separators() {
        let item = record(json!({ "title": "Cafe A/B: Roastery" }));
        assert_eq!(dataset_file_name(&item), "CafeA_B_Roastery.json");
    }

    #[test]
    fn file_name_falls_back_without_title() {
        assert_eq!(dataset_file_name(&record(json!({ "price": "$" }))), "untitled.json");
        assert_eq!(dataset_file_name(&record(json!({ "title": "  " }))), "untitled.json");
    }

    #[test]
    fn writes_one_file_per_item() {
        let dir = tempfile::tempdir().unwrap();
        let datasets = dir.path().join("datasets");
        let items = vec![
            record(json!({ "title": "Kopi Nako", "price": "Rp 25–50K", "reviewsCount": 812 })),
            record(json!({ "title": "Toko Kopi Tuku", "description": null })),
            record(json!({ "title": "Filosofi Kopi", "categories": ["Coffee shop"] })),
        ];

        let outcome = persist_items(&datasets, items.clone()).unwrap();

        assert_eq!(outcome.written.len(), 3);
        assert_eq!(fs::read_dir(&datasets).unwrap().count(), 3);
        for (item, path) in items.iter().zip(&outcome.written) {
            assert_eq!(path.parent().unwrap(), datasets.as_path());
            let saved: ScrapedRecord =
                serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
            assert_eq!(&saved, item);
        }
        assert_eq!(datasets.join("TokoKopiTuku.json"), outcome.written[1]);

        let last_path = datasets.join("FilosofiKopi.json");
        assert_eq!(outcome.last_item, items[2]);
        assert!(outcome.message.contains(&last_path.display().to_string()));
    }

    #[test]
    fn rerun_overwrites_same_title() {
        let dir = tempfile::tempdir().unwrap();
        persist_items(dir.path(), vec![record(json!({ "title": "Kopi Nako", "rank": 1 }))])
            .unwrap();
        let outcome =
            persist_items(dir.path(), vec![record(json!({ "title": "Kopi Nako", "rank": 2 }))])
                .unwrap();

        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
        let saved: Value =
            serde_json::from_str(&fs::read_to_string(&outcome.written[0]).unwrap()).unwrap();
        assert_eq!(saved["rank"], 2);
    }

    #[test]
    fn empty_dataset_is_an_explicit_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = persist_items(dir.path(), Vec::new()).unwrap_err();

        assert!(matches!(err, IngestError::EmptyScrapeResult));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn scrape_place_sends_maps_url_to_actor() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FixedDataset {
            items: vec![record(json!({ "title": "Kopi Nako" }))],
            seen: Mutex::new(Vec::new()),
        };
        let url = "https://www.google.com/maps/place/?q=place_id:abc";

        let outcome = scrape_place(&runner, url, dir.path()).await.unwrap();

        let seen = runner.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, GOOGLE_MAPS_SCRAPER_ACTOR);
        assert_eq!(seen[0].1["startUrls"][0]["url"], url);
        assert_eq!(outcome.last_item["title"], "Kopi Nako");
    }
}
