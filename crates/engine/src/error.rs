//! Error taxonomy for provider resolution.
//!
//! [`ProviderError`] is what a strategy reports from [`Provider::set`](crate::Provider::set).
//! [`Error`] is what callers of [`Value`](crate::Value) and [`Field`](crate::Field) see; each
//! boundary crossed adds context (provider name, field name, raw payload) without changing the
//! underlying kind.

pub use indirect_util::FetchError;
use thiserror::Error;

/// Failure reported by a single provider strategy.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure while encoding or decoding a provider-tagged value.
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed tagged record: {0}")]
    Record(#[source] serde_json::Error),

    #[error("unknown provider: {name}")]
    UnknownProvider { name: String },

    #[error("provider '{provider}' failed: {source}")]
    Provider {
        provider: String,
        #[source]
        source: ProviderError,
    },

    #[error("provider '{provider}' produced no value")]
    Unresolved { provider: String },

    #[error("{name}: {source}\n{payload}")]
    Field {
        name: String,
        payload: String,
        #[source]
        source: Box<Error>,
    },

    #[error("{name}: {source}\n{value}")]
    Encode {
        name: String,
        value: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// The innermost error, looking through field annotations.
    pub fn root(&self) -> &Error {
        match self {
            Error::Field { source, .. } => source.root(),
            other => other,
        }
    }

    /// True when the record named a provider missing from the registry.
    pub fn is_unknown_provider(&self) -> bool {
        matches!(self.root(), Error::UnknownProvider { .. })
    }

    /// True for malformed records, payloads, URL strings and response bodies.
    pub fn is_decode(&self) -> bool {
        matches!(
            self.root(),
            Error::Record(_)
                | Error::Provider {
                    source: ProviderError::Decode(_),
                    ..
                }
        )
    }

    /// True when a value could not be written out as a tagged record.
    pub fn is_encode(&self) -> bool {
        matches!(self.root(), Error::Encode { .. })
    }

    /// True when the `url` strategy could not retrieve its document.
    pub fn is_fetch(&self) -> bool {
        matches!(
            self.root(),
            Error::Provider {
                source: ProviderError::Fetch(_),
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_failure() -> serde_json::Error {
        serde_json::from_str::<u8>("\"nope\"").unwrap_err()
    }

    #[test]
    fn field_annotation_keeps_the_underlying_kind() {
        let error = Error::Field {
            name: "int".into(),
            payload: r#"{"provider":"nope"}"#.into(),
            source: Box::new(Error::UnknownProvider { name: "nope".into() }),
        };
        assert!(error.is_unknown_provider());
        assert!(!error.is_decode());
        assert_eq!(error.to_string(), "int: unknown provider: nope\n{\"provider\":\"nope\"}");
    }

    #[test]
    fn provider_failures_are_classified_by_source() {
        let decode = Error::Provider {
            provider: "static".into(),
            source: ProviderError::Decode(decode_failure()),
        };
        assert!(decode.is_decode());
        assert!(!decode.is_fetch());
        assert!(decode.to_string().starts_with("provider 'static' failed: decode error:"));

        let fetch = Error::Provider {
            provider: "url".into(),
            source: ProviderError::Fetch(FetchError::Status {
                url: "http://localhost/missing".into(),
                status: 404,
            }),
        };
        assert!(fetch.is_fetch());
        assert!(fetch.to_string().contains("returned HTTP 404"));
    }
}
