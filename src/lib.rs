/*!
# Catalog Lookup

Product lookup for a paper merchant's published price list, built in Rust.

## Overview

The price list is maintained as a spreadsheet and published as a CSV feed.
This crate fetches that feed once per session, parses it into records, and
answers free-text searches against it with sortable results.

## Architecture

### Loading
- **Catalog Loader** - Fetches the feed (or reads a local CSV file) on the
  first real query; concurrent triggers share one in-flight request and a
  failed load can be retried
- **CSV Reader** - Minimal quoted-field splitter with positional column
  mapping (code, description, list price)

### Searching
- **Search Filter** - Every whitespace-separated term must appear in the item
  code or the description, case-insensitively
- **Sorter** - Stable ordering by code, description or price in either
  direction, with header-click toggling

### Presentation
- **Lookup View** - Loading / error / no-query / no-results / results states
  derived from the loader and the session inputs
- **Text Table** - Aligned table with sort indicators for the terminal
- **Web API** - JSON endpoints over the same engine (feature `web`)

## Modules

- **record**: Catalog records and sort order
- **loader**: Feed parsing
- **search**: Filtering and sorting
- **engine**: Catalog source, one-shot loader and lookup session
- **view**: Presentation states and rendering
- **downloader**: CSV export of result sets
- **config**: Runtime settings
- **error**: Load errors
- **app**: HTTP routes (feature `web`)
*/

pub mod config;
pub mod downloader;
pub mod engine;
pub mod error;
pub mod loader;
pub mod record;
pub mod search;
pub mod view;

#[cfg(feature = "web")]
pub mod app;

/// Re-export everything from these modules to make it easier to use
pub use config::*;
pub use engine::*;
pub use error::*;
pub use record::*;
pub use view::*;
