//! Continuously harvest marketplace listings and deliver each one once,
//! through a bounded channel, until cancelled.

pub mod config;
pub mod error;
pub mod models;
pub mod parsers;
pub mod pipeline;
pub mod query;
pub mod utils;

#[cfg(test)]
mod testutil;

pub use config::Config;
pub use error::{HarvestError, PriceError};
pub use models::{Listing, ListingId, RawItem};
pub use pipeline::{Harvester, Shutdown};
pub use query::{HtmlPageQuery, PageQuery};
