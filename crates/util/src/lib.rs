//! Shared helpers for the indirect workspace.
//!
//! - `http`: the fetch collaborator used by the `url` provider
//! - `async_runtime`: driving those async fetches from synchronous decoding

pub mod async_runtime;
pub mod http;

pub use async_runtime::block_on_future;
pub use http::{FetchError, FetchedBody, HttpFetchConfig, fetch_bytes};
