use crate::record::CatalogRecord;
use std::path::Path;

/// Convert a result set to CSV
///
/// Produces a `code,description,price` header followed by one row per
/// record. Fields containing commas are wrapped in double quotes so the
/// output reads back through [`crate::loader::parse_catalog`].
///
/// # Arguments
/// * `records` - Rows to export, in display order
///
/// # Returns
/// * `String` - CSV content
///
/// # Examples
/// ```
/// use catalog_lookup::downloader::to_csv;
/// use catalog_lookup::record::CatalogRecord;
///
/// let csv = to_csv(&[CatalogRecord::create("A1", "Widget, Deluxe", 10.5)]);
/// assert_eq!(csv, "code,description,price\nA1,\"Widget, Deluxe\",10.5\n");
/// ```
pub fn to_csv(records: &[CatalogRecord]) -> String {
    let mut csv_content = String::from("code,description,price\n");

    for record in records {
        csv_content.push_str(&escape_field(&record.code));
        csv_content.push(',');
        csv_content.push_str(&escape_field(&record.description));
        csv_content.push(',');
        csv_content.push_str(&record.price.to_string());
        csv_content.push('\n');
    }

    csv_content
}

/// Write a result set to a CSV file
pub fn save_csv(records: &[CatalogRecord], filepath: impl AsRef<Path>) -> std::io::Result<()> {
    std::fs::write(filepath, to_csv(records))
}

// Quotes are dropped by the reader, so there is nothing to double here
fn escape_field(value: &str) -> String {
    if value.contains(',') {
        format!("\"{}\"", value)
    } else {
        value.to_string()
    }
}
