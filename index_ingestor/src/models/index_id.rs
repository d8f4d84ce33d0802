//! Upstream identifier of a market index.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexIdError {
    #[error("Invalid index id '{input}': expected '<exchange-code>.<symbol>'")]
    Format { input: String },

    #[error("Invalid exchange code in '{input}': {message}")]
    Market { input: String, message: String },
}

/// An index identifier in the form `"<exchange-code>.<symbol>"`, e.g. `1.000918`.
///
/// The exchange code is the upstream's numeric market prefix; the symbol is
/// the index code within that market.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IndexId {
    pub market: u8,
    pub symbol: String,
}

impl IndexId {
    pub fn new(market: u8, symbol: impl Into<String>) -> Self {
        Self {
            market,
            symbol: symbol.into(),
        }
    }
}

impl FromStr for IndexId {
    type Err = IndexIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (market, symbol) = trimmed.split_once('.').ok_or_else(|| IndexIdError::Format {
            input: s.to_string(),
        })?;
        if symbol.is_empty() || symbol.contains('.') {
            return Err(IndexIdError::Format {
                input: s.to_string(),
            });
        }
        let market = market.parse::<u8>().map_err(|e| IndexIdError::Market {
            input: s.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::new(market, symbol))
    }
}

impl TryFrom<String> for IndexId {
    type Error = IndexIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<IndexId> for String {
    fn from(id: IndexId) -> Self {
        id.to_string()
    }
}

impl fmt::Display for IndexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.market, self.symbol)
    }
}
