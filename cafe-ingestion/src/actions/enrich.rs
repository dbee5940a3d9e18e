use serde_json::Value;
use shared_types::ScrapedRecord;

use crate::console::FieldSupplier;
use crate::error::Result;
use crate::services::firebase::StoreHandle;

pub const CAFE_COLLECTION: &str = "/cafe";

const AMENITIES_PROMPT: &str = "Input amenities (comma separated): ";
const PRICE_PROMPT: &str = "Price is empty. Enter price: ";
const DESCRIPTION_PROMPT: &str = "Description is empty. Enter description: ";

fn record_title(record: &ScrapedRecord) -> &str {
    record.get("title").and_then(Value::as_str).unwrap_or_default()
}

/// A field is blank when it is missing or holds a falsy value:
/// null, `false`, zero, or an empty string, array or object.
fn is_blank(record: &ScrapedRecord, field: &str) -> bool {
    match record.get(field) {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(fields)) => fields.is_empty(),
    }
}

pub fn parse_amenities(input: &str) -> Vec<String> {
    input.split(',').map(|a| a.trim().to_string()).collect()
}

/// Ask the operator for amenities, plus price and description when the scrape left them blank.
pub fn enrich_record(
    mut record: ScrapedRecord,
    supplier: &mut dyn FieldSupplier,
) -> Result<ScrapedRecord> {
    println!("\nProcessing: {}", record_title(&record));

    let amenities = parse_amenities(&supplier.supply(AMENITIES_PROMPT)?);
    record.insert("amenities".to_string(), Value::from(amenities));

    if is_blank(&record, "price") {
        let price = supplier.supply(PRICE_PROMPT)?;
        record.insert("price".to_string(), Value::String(price));
    }
    if is_blank(&record, "description") {
        let description = supplier.supply(DESCRIPTION_PROMPT)?;
        record.insert("description".to_string(), Value::String(description));
    }

    Ok(record)
}

/// Push an enriched record under the cafe collection, connecting first if needed
pub async fn store_record(store: &StoreHandle, record: &ScrapedRecord) -> Result<String> {
    let sink = store.initialize()?;
    let key = sink.push(CAFE_COLLECTION, record).await?;

    tracing::info!(%key, collection = CAFE_COLLECTION, "stored record");
    println!("'{}' stored in Firebase.\n", record_title(record));
    Ok(key)
}

pub async fn process_and_store(
    store: &StoreHandle,
    record: ScrapedRecord,
    supplier: &mut dyn FieldSupplier,
) -> Result<String> {
    let enriched = enrich_record(record, supplier)?;
    store_record(store, &enriched).await
}
