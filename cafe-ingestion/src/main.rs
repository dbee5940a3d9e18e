use anyhow::{bail, Context};
use dotenv::dotenv;
use reqwest::Client;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cafe_ingestion::actions::pipeline::Pipeline;
use cafe_ingestion::config::IngestConfig;
use cafe_ingestion::console::{
    clear_screen, press_enter_to_continue, ConsolePrompt, FieldSupplier,
};
use cafe_ingestion::services::apify::ApifyClient;
use cafe_ingestion::services::firebase::{FirebaseConnector, StoreHandle};
use cafe_ingestion::services::google_places::GooglePlacesClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,cafe_ingestion=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = IngestConfig::from_env()?;
    let client = Client::builder()
        .build()
        .context("failed to build HTTP client")?;

    let pipeline = Pipeline {
        resolver: Box::new(GooglePlacesClient::new(
            client.clone(),
            config.google_maps_api_key.clone(),
        )),
        runner: Box::new(ApifyClient::new(client.clone(), config.apify_api_key.clone())),
        store: StoreHandle::new(FirebaseConnector::new(
            client,
            config.firebase_credentials.clone(),
            config.firebase_database_url.clone(),
        )),
        datasets_dir: config.datasets_dir.clone(),
    };

    let mut console = ConsolePrompt;
    let place = console.supply("Enter Your Place: ")?;
    let place = place.trim();
    if place.is_empty() {
        bail!("place name must not be empty");
    }

    let key = pipeline.run(place, &mut console).await?;
    tracing::info!(%key, "ingestion finished");

    press_enter_to_continue(&mut console)?;
    clear_screen()?;
    Ok(())
}
