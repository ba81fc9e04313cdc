//! Provider registry and resolution strategies.
//!
//! Modules:
//! - `registry`: Name → strategy table, plus the process-wide instance
//! - `literal`: The `static` strategy, which decodes the payload as-is
//! - `url`: The `url` strategy, which fetches the payload's URL and decodes the body
//! - `fetch`: Fetcher trait and default HTTP fetcher used by `url`
//! - `null`: No-op strategy for tests and disabled scenarios

mod fetch;
mod literal;
mod null;
mod registry;
mod url;

use std::{fmt::Debug, io::Read};

use serde::de::DeserializeOwned;
use serde_json::value::RawValue;

use crate::ProviderError;

pub use fetch::{DefaultHttpFetcher, ValueFetcher};
pub use indirect_util::HttpFetchConfig;
pub use literal::StaticProvider;
pub use null::NullProvider;
pub use registry::{ProviderRegistry, global, install};
pub use url::UrlProvider;

/// Provider used when a record omits `provider`; an alias of [`STATIC`].
pub const DEFAULT: &str = "";
/// The payload is the literal value.
pub const STATIC: &str = "static";
/// The payload is a URL whose body is the value.
pub const URL: &str = "url";

/// A named strategy that materializes a raw payload into a destination.
///
/// `data` is the undecoded JSON text of a record's `value` member; an omitted member is
/// presented as `null`. Implementations must leave `destination` untouched when they fail.
pub trait Provider: Send + Sync + Debug {
    fn set(&self, data: &RawValue, destination: &mut dyn Destination) -> Result<(), ProviderError>;
}

/// A typed slot a provider decodes into.
///
/// The slot only changes when decoding succeeds completely.
pub trait Destination {
    fn decode_slice(&mut self, bytes: &[u8]) -> Result<(), serde_json::Error>;
    fn decode_reader(&mut self, reader: &mut dyn Read) -> Result<(), serde_json::Error>;
}

impl<T: DeserializeOwned> Destination for Option<T> {
    fn decode_slice(&mut self, bytes: &[u8]) -> Result<(), serde_json::Error> {
        *self = Some(serde_json::from_slice(bytes)?);
        Ok(())
    }

    fn decode_reader(&mut self, reader: &mut dyn Read) -> Result<(), serde_json::Error> {
        *self = Some(serde_json::from_reader(reader)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_is_untouched_on_failure() {
        let mut slot: Option<u32> = Some(7);
        assert!(slot.decode_slice(b"\"seven\"").is_err());
        assert_eq!(slot, Some(7));

        let mut reader: &[u8] = b"[1, 2";
        let mut list: Option<Vec<u8>> = None;
        assert!(list.decode_reader(&mut reader).is_err());
        assert_eq!(list, None);
    }

    #[test]
    fn destination_decodes_from_slices_and_readers() {
        let mut slot: Option<String> = None;
        slot.decode_slice(br#""banana""#).unwrap();
        assert_eq!(slot.as_deref(), Some("banana"));

        let mut reader: &[u8] = b"[1, 2, 3]";
        let mut list: Option<Vec<u8>> = None;
        list.decode_reader(&mut reader).unwrap();
        assert_eq!(list, Some(vec![1, 2, 3]));
    }
}
