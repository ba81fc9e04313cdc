//! # Indirect Engine
//!
//! Provider-resolved values for serde. Instead of holding a literal, a field holds a tagged
//! record naming a resolution strategy and strategy-specific raw data:
//!
//! ```json
//! { "provider": "url", "value": "http://localhost:8888/settings.json" }
//! ```
//!
//! Decoding looks the strategy up by name and lets it materialize the real value; encoding
//! wraps a value back into the record form with the `static` strategy.
//!
//! ## Usage
//!
//! ```rust
//! use indirect_engine::Value;
//!
//! let port: Value<u16> = serde_json::from_str(r#"{"provider":"static","value":8080}"#)?;
//! assert_eq!(port.value, 8080);
//! assert_eq!(port.provider, "static");
//!
//! let encoded = serde_json::to_string(&Value::with_provider("static", "banana"))?;
//! assert_eq!(encoded, r#"{"provider":"static","value":"banana"}"#);
//! # Ok::<(), serde_json::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - **`provider`**: The [`Provider`] trait, the [`ProviderRegistry`], and the built-in
//!   `static` and `url` strategies
//! - **`value`**: The [`Value`] tagged record and its registry-aware decoding
//! - **`field`**: The [`Field`] adapter that wraps a borrowed field, or a whole structure,
//!   from inside a type's own serde impls
//! - **`error`**: The [`Error`] and [`ProviderError`] taxonomy
//!
//! `Deserialize` impls resolve through the process-wide registry returned by
//! [`provider::global`]. Install a custom one with [`provider::install`] during startup,
//! or pass a registry explicitly with [`ValueSeed`], [`Value::decode_with`] and
//! [`Field::with_registry`].

pub mod error;
pub mod field;
pub mod provider;
pub mod value;

pub use error::{Error, FetchError, ProviderError};
pub use field::Field;
pub use provider::{Destination, Provider, ProviderRegistry};
pub use value::{Value, ValueSeed};
