//! Inventory aggregation and caching
//!
//! The core of the tool: folds discovered resources into a grouped
//! inventory, maintains the on-disk cache, and renders the views the CLI
//! serves.
//!
//! # Module Structure
//!
//! - [`aggregator`] - Folds resource records into the grouped inventory and index
//! - [`cache`] - Time-bounded on-disk cache for both maps
//! - [`route53`] - Address-to-domain-name map used for name-based groups
//! - [`host_vars`] - Flattens one instance into `ec2_*` host variables

pub mod aggregator;
pub mod cache;
pub mod host_vars;
pub mod route53;

pub use aggregator::{to_safe, Aggregator};
pub use cache::{CacheKind, CacheStore};

use anyhow::Result;
use std::collections::BTreeMap;

/// Group name -> endpoints, in discovery order. Duplicates are allowed.
pub type Inventory = BTreeMap<String, Vec<String>>;

/// Endpoint -> (region, resource id). Last write wins on collision.
pub type Index = BTreeMap<String, (String, String)>;

/// Renders the inventory the way the automation tool consumes it: a pretty,
/// key-sorted JSON map, or with `tags_only` just the sorted names of the
/// tag-derived groups (`tag_*` and `first_in_tag_*`).
pub fn format_groups(inventory: &Inventory, tags_only: bool) -> Result<String> {
    let rendered = if tags_only {
        let names: Vec<&String> = inventory.keys().filter(|k| k.contains("tag_")).collect();
        serde_json::to_string_pretty(&names)?
    } else {
        serde_json::to_string_pretty(inventory)?
    };
    Ok(rendered)
}
