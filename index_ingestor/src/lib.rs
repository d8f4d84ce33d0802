//! Fetches daily closing-price history for market indices.
//!
//! The crate is split into vendor-agnostic [`models`] and the [`providers`]
//! that talk to a concrete upstream. Every provider call walks a list of
//! candidate endpoints with bounded retries before it gives up, see
//! [`providers::fallback`].

pub mod models;
pub mod providers;
