//! CSI 300 growth/value style compass.
//!
//! Fetches the two style indices, tracks their close-price ratio against its
//! 20-day moving average, and serves the result as a single HTML page.

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod pipeline;
pub mod present;
pub mod server;
