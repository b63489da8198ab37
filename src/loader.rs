use crate::error::LookupError;
use crate::record::CatalogRecord;
use lazy_static::lazy_static;
use log::{debug, info};
use regex::Regex;

lazy_static! {
    static ref PRICE_STRIP_REGEX: Regex = Regex::new(r"[^0-9.\-]").unwrap();
    static ref PRICE_PREFIX_REGEX: Regex =
        Regex::new(r"^-?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)").unwrap();
}

/// Parse the catalog feed into records
///
/// The first line is a header and is skipped. Every other line is split as a
/// CSV row and mapped by position: column 0 is the code, column 1 the
/// description and column 2 the price. Rows without a code are dropped.
///
/// # Arguments
/// * `text` - Raw feed contents
///
/// # Returns
/// * `Result<Vec<CatalogRecord>, LookupError>` - Records in feed order, or a
///   `Format` error when there is no data row at all
///
/// # Examples
/// ```
/// use catalog_lookup::loader::parse_catalog;
///
/// let records = parse_catalog("code,description,price\nA1,Widget,10.50").unwrap();
/// assert_eq!(records[0].code, "A1");
/// assert_eq!(records[0].price, 10.5);
/// ```
pub fn parse_catalog(text: &str) -> Result<Vec<CatalogRecord>, LookupError> {
    let lines: Vec<&str> = text
        .trim()
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();

    if lines.len() < 2 {
        return Err(LookupError::Format(
            "CSV appears to be empty or invalid".to_string(),
        ));
    }

    let mut records = Vec::with_capacity(lines.len() - 1);
    let mut dropped = 0usize;

    for line in &lines[1..] {
        match parse_record(line) {
            Some(record) => records.push(record),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!("dropped {} catalog rows without an item code", dropped);
    }
    info!("parsed {} catalog records", records.len());

    Ok(records)
}

/// Map one data line to a record, or `None` when it has no code
pub fn parse_record(line: &str) -> Option<CatalogRecord> {
    let fields = parse_csv_row(line);
    let field = |i: usize| -> String {
        fields
            .get(i)
            .map(|f| f.replace('"', "").trim().to_string())
            .unwrap_or_default()
    };

    let code = field(0);
    if code.is_empty() {
        return None;
    }

    Some(CatalogRecord {
        code,
        description: field(1),
        price: parse_price(&field(2)),
    })
}

/// Split a CSV line into trimmed fields
///
/// A double quote toggles quoted mode and commas only separate fields outside
/// quotes. Doubled quotes inside a quoted field are not treated as escapes.
pub fn parse_csv_row(line: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current_field = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                result.push(current_field.trim().to_string());
                current_field.clear();
            }
            _ => current_field.push(c),
        }
    }

    // Add the last field
    result.push(current_field.trim().to_string());

    result
}

/// Parse list price text
///
/// Everything except digits, `.` and `-` is stripped, then the longest
/// leading decimal number is read. Anything unreadable becomes `0`.
pub fn parse_price(raw: &str) -> f64 {
    let stripped = PRICE_STRIP_REGEX.replace_all(raw, "");

    let value = PRICE_PREFIX_REGEX
        .find(&stripped)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0);

    if value.is_finite() && value != 0.0 {
        value
    } else {
        0.0
    }
}
