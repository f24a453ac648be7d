use std::num::ParseIntError;
use thiserror::Error;

/// Errors produced while turning a price fragment into an amount.
#[derive(Debug, Error)]
pub enum PriceError {
    #[error("invalid format or no valid price found: {0:?}")]
    UnrecognizedFormat(String),

    #[error("no currency prefix in price: {0:?}")]
    MissingCurrency(String),

    #[error("invalid price amount {text:?}: {source}")]
    InvalidAmount {
        text: String,
        #[source]
        source: ParseIntError,
    },
}

/// Errors that end a harvesting run.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// A listing card carried a price the parser could not read.
    #[error("failed to extract listing {href}: {source}")]
    Extract {
        href: String,
        #[source]
        source: PriceError,
    },

    /// The page query itself failed.
    #[error("failed to fetch more listings: {0}")]
    Fetch(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<anyhow::Error> for HarvestError {
    fn from(err: anyhow::Error) -> Self {
        HarvestError::Fetch(err.into())
    }
}
