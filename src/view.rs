use crate::record::{CatalogRecord, SortField, SortSpec};
use crate::search::lookup;
use serde::Serialize;

pub const SEARCH_TIPS: [&str; 4] = [
    "Search for any part of the item code or description",
    "Use multiple words to narrow results (e.g., \"Stonehenge 320\")",
    "All search terms must match for a result to appear",
    "Sort results by item code, description or list price",
];

pub const NO_RESULTS_HINT: &str = "Try broadening your search terms or check spelling";

pub const SEARCH_SUGGESTIONS: [&str; 4] = ["paper", "envelope", "cardstock", "bond"];

/// What the lookup screen should show
///
/// Variants are listed in priority order: a load in progress wins over an
/// error, an error over a missing query, and so on.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum LookupView {
    Loading,
    Error { message: String },
    NoQuery,
    NoResults { query: String },
    Results {
        query: String,
        sort: SortSpec,
        items: Vec<CatalogRecord>,
    },
}

impl LookupView {
    pub fn name(&self) -> &'static str {
        match self {
            LookupView::Loading => "loading",
            LookupView::Error { .. } => "error",
            LookupView::NoQuery => "no-query",
            LookupView::NoResults { .. } => "no-results",
            LookupView::Results { .. } => "results",
        }
    }

    pub fn items(&self) -> &[CatalogRecord] {
        match self {
            LookupView::Results { items, .. } => items,
            _ => &[],
        }
    }
}

/// Derive the screen state from the loader flags and the session inputs
pub fn derive_view(
    loading: bool,
    error: Option<&str>,
    query: &str,
    records: &[CatalogRecord],
    sort: SortSpec,
) -> LookupView {
    if loading {
        return LookupView::Loading;
    }
    if let Some(message) = error {
        return LookupView::Error {
            message: message.to_string(),
        };
    }
    if query.trim().is_empty() {
        return LookupView::NoQuery;
    }

    let items = lookup(records, query, sort);
    if items.is_empty() {
        LookupView::NoResults {
            query: query.to_string(),
        }
    } else {
        LookupView::Results {
            query: query.to_string(),
            sort,
            items,
        }
    }
}

pub fn format_price(price: f64) -> String {
    format!("${:.2}", price)
}

fn header_label(field: SortField, sort: SortSpec) -> String {
    if sort.field != field {
        return field.label().to_string();
    }
    let arrow = if sort.ascending { "↑" } else { "↓" };
    format!("{} {}", field.label(), arrow)
}

fn column_width<'a>(header: &str, cells: impl Iterator<Item = &'a str>) -> usize {
    cells
        .map(|c| c.chars().count())
        .fold(header.chars().count(), usize::max)
}

/// Render a result set as an aligned text table
pub fn render_table(items: &[CatalogRecord], sort: SortSpec) -> String {
    let headers = [
        header_label(SortField::Code, sort),
        header_label(SortField::Description, sort),
        header_label(SortField::Price, sort),
    ];
    let prices: Vec<String> = items.iter().map(|r| format_price(r.price)).collect();

    let code_w = column_width(&headers[0], items.iter().map(|r| r.code.as_str()));
    let desc_w = column_width(&headers[1], items.iter().map(|r| r.description.as_str()));
    let price_w = column_width(&headers[2], prices.iter().map(|p| p.as_str()));

    let mut out = String::new();
    out.push_str(&format!(
        "{:<code_w$}  {:<desc_w$}  {:>price_w$}\n",
        headers[0], headers[1], headers[2]
    ));
    out.push_str(&format!(
        "{}  {}  {}\n",
        "-".repeat(code_w),
        "-".repeat(desc_w),
        "-".repeat(price_w)
    ));
    for (record, price) in items.iter().zip(&prices) {
        out.push_str(&format!(
            "{:<code_w$}  {:<desc_w$}  {:>price_w$}\n",
            record.code, record.description, price
        ));
    }
    out
}

/// Full text rendering of a view for terminal output
pub fn render_view(view: &LookupView) -> String {
    match view {
        LookupView::Loading => "Loading product data...\n".to_string(),
        LookupView::Error { message } => format!("{}\n", message),
        LookupView::NoQuery => {
            let mut out = String::from("Search Tips:\n");
            for tip in SEARCH_TIPS {
                out.push_str(&format!("  • {}\n", tip));
            }
            out
        }
        LookupView::NoResults { .. } => format!(
            "No matches found\n{}\nSearch suggestions: {}\n",
            NO_RESULTS_HINT,
            SEARCH_SUGGESTIONS
                .iter()
                .map(|s| format!("\"{}\"", s))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        LookupView::Results { sort, items, .. } => {
            let noun = if items.len() == 1 { "item" } else { "items" };
            format!("{}{} {} found\n", render_table(items, *sort), items.len(), noun)
        }
    }
}
