use std::path::PathBuf;

use crate::actions::enrich::process_and_store;
use crate::actions::scrape_place::scrape_place;
use crate::console::FieldSupplier;
use crate::error::Result;
use crate::services::apify::ActorRunner;
use crate::services::firebase::StoreHandle;
use crate::services::google_places::PlaceResolver;

pub struct Pipeline {
    pub resolver: Box<dyn PlaceResolver>,
    pub runner: Box<dyn ActorRunner>,
    pub store: StoreHandle,
    pub datasets_dir: PathBuf,
}

impl Pipeline {
    /// Resolve, scrape, enrich and store one place. Returns the database key of the new record.
    pub async fn run(&self, place_name: &str, supplier: &mut dyn FieldSupplier) -> Result<String> {
        let place = self.resolver.resolve(place_name).await?;
        println!("{}", place.maps_url);
        tracing::info!(place_id = %place.place_id, "resolved place");

        println!("Sending Data....");
        let outcome =
            scrape_place(self.runner.as_ref(), &place.maps_url, &self.datasets_dir).await?;
        println!("{}", outcome.message);

        process_and_store(&self.store, outcome.last_item, supplier).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::enrich::tests::{CannedAnswers, MemorySink};
    use crate::error::IngestError;
    use crate::services::google_places::maps_url_for;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use shared_types::{PlaceReference, ScrapedRecord};
    use std::sync::{Arc, Mutex};

    struct KnownPlaces;

    #[async_trait]
    impl PlaceResolver for KnownPlaces {
        async fn resolve(&self, place_name: &str) -> Result<PlaceReference> {
            match place_name {
                "Kopi Nako" => Ok(PlaceReference {
                    place_id: "ChIJnako".to_string(),
                    maps_url: maps_url_for("ChIJnako"),
                }),
                other => Err(IngestError::PlaceNotFound(other.to_string())),
            }
        }
    }

    struct EchoActor {
        items: Vec<ScrapedRecord>,
        urls: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl ActorRunner for EchoActor {
        async fn run_actor(&self, _actor_id: &str, input: &Value) -> Result<Vec<ScrapedRecord>> {
            let url = input["startUrls"][0]["url"].as_str().unwrap_or_default();
            self.urls.lock().unwrap().push(url.to_string());
            Ok(self.items.clone())
        }
    }

    fn build_pipeline(
        items: Vec<ScrapedRecord>,
        dir: PathBuf,
    ) -> (Pipeline, MemorySink, Arc<Mutex<Vec<String>>>) {
        let sink = MemorySink::default();
        let urls = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline {
            resolver: Box::new(KnownPlaces),
            runner: Box::new(EchoActor {
                items,
                urls: Arc::clone(&urls),
            }),
            store: StoreHandle::new(sink.clone()),
            datasets_dir: dir,
        };
        (pipeline, sink, urls)
    }

    fn record(value: Value) -> ScrapedRecord {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn stores_last_scraped_item_with_answers() {
        let dir = tempfile::tempdir().unwrap();
        let items = vec![
            record(json!({ "title": "Kopi Nako Cikini", "price": "Rp 25–50K" })),
            record(json!({ "title": "Kopi Nako" })),
        ];
        let (pipeline, sink, urls) = build_pipeline(items, dir.path().join("datasets"));
        let mut answers = CannedAnswers::new(&["wifi, parking", "10000", "cozy spot"]);

        let key = pipeline.run("Kopi Nako", &mut answers).await.unwrap();

        assert_eq!(key, "-Nkey1");
        assert_eq!(
            *urls.lock().unwrap(),
            ["https://www.google.com/maps/place/?q=place_id:ChIJnako"]
        );
        assert!(dir.path().join("datasets/KopiNakoCikini.json").exists());
        assert!(dir.path().join("datasets/KopiNako.json").exists());

        let pushed = sink.pushed.lock().unwrap();
        assert_eq!(pushed.len(), 1);
        let (path, stored) = &pushed[0];
        assert_eq!(path, "/cafe");
        assert_eq!(stored["title"], "Kopi Nako");
        assert_eq!(stored["amenities"], json!(["wifi", "parking"]));
        assert_eq!(stored["price"], "10000");
        assert_eq!(stored["description"], "cozy spot");
    }

    #[tokio::test]
    async fn unknown_place_stops_before_scraping() {
        let dir = tempfile::tempdir().unwrap();
        let (pipeline, sink, urls) = build_pipeline(Vec::new(), dir.path().to_path_buf());
        let mut answers = CannedAnswers::new(&[]);

        let err = pipeline.run("Warung Hilang", &mut answers).await.unwrap_err();

        assert_eq!(err.to_string(), "No place found for name: Warung Hilang");
        assert!(urls.lock().unwrap().is_empty());
        assert!(sink.pushed.lock().unwrap().is_empty());
        assert!(!pipeline.store.is_initialized());
    }

    #[tokio::test]
    async fn empty_scrape_never_reaches_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let (pipeline, sink, _urls) = build_pipeline(Vec::new(), dir.path().to_path_buf());
        let mut answers = CannedAnswers::new(&["wifi"]);

        let err = pipeline.run("Kopi Nako", &mut answers).await.unwrap_err();

        assert!(matches!(err, IngestError::EmptyScrapeResult));
        assert!(answers.asked.is_empty());
        assert!(sink.pushed.lock().unwrap().is_empty());
    }
}
