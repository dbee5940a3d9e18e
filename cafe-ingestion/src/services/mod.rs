pub mod apify;
pub mod firebase;
pub mod google_places;
