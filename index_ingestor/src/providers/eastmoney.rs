//! Quote-history provider for the Eastmoney kline API.

pub mod params;
pub mod provider;
pub mod response;

pub use provider::EastmoneyProvider;

/// Primary secure endpoint.
pub const KLINE_URL: &str = "https://push2his.eastmoney.com/api/qt/stock/kline/get";

/// Same API over plain HTTP, for networks that break the TLS handshake.
pub const KLINE_URL_PLAIN: &str = "http://push2his.eastmoney.com/api/qt/stock/kline/get";
