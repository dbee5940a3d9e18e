pub mod enrich;
pub mod pipeline;
pub mod scrape_place;
