//! Compute the IP ranges used by Google APIs and services (every Google range minus the ranges
//! Google Cloud customers can be assigned) and keep an OPNsense network alias in sync with them.
//!
//! The [sync] function runs the whole pipeline from a [Config]; [get_api_ranges], [compute], and
//! [reconcile] expose the individual steps.

/*-------------------------------------------------------------------------------------------------
  Library Modules
-------------------------------------------------------------------------------------------------*/

mod core;
mod firewall;

/*-------------------------------------------------------------------------------------------------
  Library Interface
-------------------------------------------------------------------------------------------------*/

pub use crate::core::config::{Config, ConfigBuilder};
pub use crate::core::errors::{Error, Result};
pub use crate::core::feed::{fetch_feed, FeedSource, HttpFeedSource};
pub use crate::core::json::Feed;
pub use crate::core::prefix_set::PrefixSet;
pub use crate::core::ranges::{compute, get_api_ranges};
pub use crate::core::sync::{sync, sync_with, write_ips_file, SyncReport};
pub use crate::firewall::api::{AliasApi, AliasDefinition, AliasLookup, ApplyResult, FirewallClient, WriteResult};
pub use crate::firewall::reconcile::{reconcile, Outcome};
