//! Query filtering and ordering over a loaded catalog.
//!
//! Everything here is a pure function of its inputs so results can be
//! recomputed from `(catalog, query, sort)` whenever one of them changes.

use crate::record::{CatalogRecord, SortField, SortSpec};
use log::debug;
use std::cmp::Ordering;

/// Split a query into lowercase terms, dropping empty tokens
pub fn tokenize(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(|term| term.to_lowercase())
        .collect()
}

/// True when every term is found in the code or the description
pub fn matches(record: &CatalogRecord, terms: &[String]) -> bool {
    let code = record.code.to_lowercase();
    let description = record.description.to_lowercase();

    terms
        .iter()
        .all(|term| code.contains(term.as_str()) || description.contains(term.as_str()))
}

/// Records matching the query, in catalog order
///
/// An empty or whitespace-only query matches nothing.
pub fn filter<'a>(records: &'a [CatalogRecord], query: &str) -> Vec<&'a CatalogRecord> {
    let terms = tokenize(query);
    if terms.is_empty() {
        return Vec::new();
    }

    let found: Vec<&CatalogRecord> = records.iter().filter(|r| matches(r, &terms)).collect();
    debug!(
        "query {:?} matched {} of {} records",
        terms,
        found.len(),
        records.len()
    );
    found
}

/// Compare two records on one field, ascending
pub fn compare(a: &CatalogRecord, b: &CatalogRecord, field: SortField) -> Ordering {
    match field {
        SortField::Price => sort_price(a.price).total_cmp(&sort_price(b.price)),
        SortField::Code => a.code.to_lowercase().cmp(&b.code.to_lowercase()),
        SortField::Description => a
            .description
            .to_lowercase()
            .cmp(&b.description.to_lowercase()),
    }
}

// NaN never comes out of the parser, but records can be built by hand.
// Adding 0.0 folds -0.0 into 0.0 so the two tie.
fn sort_price(price: f64) -> f64 {
    if price.is_nan() { 0.0 } else { price + 0.0 }
}

/// Stable sort by the active field and direction
pub fn sort_records(records: &mut [&CatalogRecord], spec: SortSpec) {
    records.sort_by(|a, b| {
        let ord = compare(a, b, spec.field);
        if spec.ascending { ord } else { ord.reverse() }
    });
}

/// Filter then sort, returning owned rows ready for display
pub fn lookup(records: &[CatalogRecord], query: &str, spec: SortSpec) -> Vec<CatalogRecord> {
    let mut found = filter(records, query);
    sort_records(&mut found, spec);
    found.into_iter().cloned().collect()
}
