use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One product row of the catalog
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct CatalogRecord {
    /// Item code, never empty once parsed
    pub code: String,
    pub description: String,
    pub price: f64,
}

impl CatalogRecord {
    pub fn create(code: &str, description: &str, price: f64) -> Self {
        CatalogRecord {
            code: code.to_string(),
            description: description.to_string(),
            price,
        }
    }
}

/// The full set of records loaded for a session
///
/// Built once by the loader and shared read-only afterwards.
#[derive(Clone, Serialize, Debug)]
pub struct Catalog {
    pub records: Vec<CatalogRecord>,
    pub loaded_at: DateTime<Utc>,
}

impl Catalog {
    pub fn new(records: Vec<CatalogRecord>) -> Self {
        Catalog {
            records,
            loaded_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Code,
    Description,
    Price,
}

impl SortField {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "code" => Some(SortField::Code),
            "description" | "desc" => Some(SortField::Description),
            "price" => Some(SortField::Price),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SortField::Code => "code",
            SortField::Description => "description",
            SortField::Price => "price",
        }
    }

    /// Column header label
    pub fn label(&self) -> &'static str {
        match self {
            SortField::Code => "Item Code",
            SortField::Description => "Description",
            SortField::Price => "List Price",
        }
    }
}

/// Active sort column and direction
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub ascending: bool,
}

impl Default for SortSpec {
    fn default() -> Self {
        SortSpec {
            field: SortField::Code,
            ascending: true,
        }
    }
}

impl SortSpec {
    pub fn new(field: SortField, ascending: bool) -> Self {
        SortSpec { field, ascending }
    }

    /// Header click: same field flips direction, another field starts ascending
    pub fn toggle(self, field: SortField) -> Self {
        if self.field == field {
            SortSpec {
                field,
                ascending: !self.ascending,
            }
        } else {
            SortSpec {
                field,
                ascending: true,
            }
        }
    }
}
