use crate::engine::CatalogSource;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Runtime settings shared by the terminal and web front ends
#[derive(Debug, Clone, PartialEq)]
pub struct LookupConfig {
    pub source: CatalogSource,
    pub bind_addr: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        LookupConfig {
            source: CatalogSource::default(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl LookupConfig {
    /// Apply optional command line overrides to the defaults
    pub fn from_overrides(source: Option<&str>, bind_addr: Option<&str>) -> Self {
        let mut config = LookupConfig::default();
        if let Some(location) = source {
            config.source = CatalogSource::parse(location);
        }
        if let Some(addr) = bind_addr {
            config.bind_addr = addr.to_string();
        }
        config
    }
}
