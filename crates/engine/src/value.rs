//! The tagged `{provider, value}` record.
//!
//! On the wire a [`Value`] looks like:
//!
//! ```json
//! { "provider": "url", "value": "http://localhost:8888/config.json" }
//! ```
//!
//! Decoding looks `provider` up in a [`ProviderRegistry`] and lets that strategy turn the raw
//! `value` into the typed destination. Encoding writes the record back out verbatim; no
//! strategy runs on the way out.

use std::{fmt, marker::PhantomData};

use serde::{
    Deserialize, Deserializer, Serialize,
    de::{DeserializeOwned, DeserializeSeed, Error as _},
};
use serde_json::value::RawValue;
use tracing::debug;

use crate::{
    Error,
    provider::{self, DEFAULT, Destination, ProviderRegistry, STATIC},
};

/// A value together with the name of the provider that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Value<T> {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub provider: String,
    pub value: T,
}

impl<T> Value<T> {
    /// Wraps `value` with the default provider.
    pub fn new(value: T) -> Self {
        Self::with_provider(DEFAULT, value)
    }

    pub fn with_provider(provider: impl Into<String>, value: T) -> Self {
        Self {
            provider: provider.into(),
            value,
        }
    }

    /// The provider name with the default alias spelled out as `static`.
    pub fn effective_provider(&self) -> &str {
        if self.provider == DEFAULT { STATIC } else { self.provider.as_str() }
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: DeserializeOwned> Value<T> {
    /// Decodes a tagged record using the process-wide registry.
    pub fn decode(raw: &[u8]) -> Result<Self, Error> {
        Self::decode_with(provider::global(), raw)
    }

    /// Decodes a tagged record using `registry`.
    ///
    /// A provider that materializes nothing is reported as [`Error::Unresolved`].
    pub fn decode_with(registry: &ProviderRegistry, raw: &[u8]) -> Result<Self, Error> {
        let record = TaggedRecord::parse(raw)?;
        let mut slot: Option<T> = None;
        record.resolve(registry, &mut slot)?;
        let value = slot.ok_or_else(|| Error::Unresolved {
            provider: record.provider.clone(),
        })?;
        Ok(Self {
            provider: record.provider,
            value,
        })
    }

    /// Decodes a tagged record into `self`, using the current value as the starting point.
    ///
    /// When the provider materializes nothing the current value is kept. On error `self` is
    /// left exactly as it was.
    pub fn decode_in_place(&mut self, registry: &ProviderRegistry, raw: &[u8]) -> Result<(), Error> {
        let record = TaggedRecord::parse(raw)?;
        let mut slot: Option<T> = None;
        record.resolve(registry, &mut slot)?;
        if let Some(value) = slot {
            self.value = value;
        }
        self.provider = record.provider;
        Ok(())
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Value<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        ValueSeed::new(provider::global()).deserialize(deserializer)
    }
}

/// Deserializes a [`Value`] against an explicit registry.
///
/// ```rust
/// use serde::de::DeserializeSeed;
/// use indirect_engine::{ValueSeed, provider::ProviderRegistry};
///
/// let registry = ProviderRegistry::with_builtins();
/// let mut deserializer = serde_json::Deserializer::from_str(r#"{"value":[1,2,3]}"#);
/// let value = ValueSeed::<Vec<u8>>::new(&registry).deserialize(&mut deserializer)?;
/// assert_eq!(value.value, vec![1, 2, 3]);
/// # Ok::<(), serde_json::Error>(())
/// ```
pub struct ValueSeed<'r, T> {
    registry: &'r ProviderRegistry,
    marker: PhantomData<fn() -> T>,
}

impl<'r, T> ValueSeed<'r, T> {
    pub fn new(registry: &'r ProviderRegistry) -> Self {
        Self {
            registry,
            marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for ValueSeed<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueSeed").field("registry", self.registry).finish()
    }
}

impl<'de, T: DeserializeOwned> DeserializeSeed<'de> for ValueSeed<'_, T> {
    type Value = Value<T>;

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        let record = TaggedRecord::from_deserializer(deserializer)?;
        let mut slot: Option<T> = None;
        record.resolve(self.registry, &mut slot).map_err(D::Error::custom)?;
        match slot {
            Some(value) => Ok(Value {
                provider: record.provider,
                value,
            }),
            None => Err(D::Error::custom(Error::Unresolved { provider: record.provider })),
        }
    }
}

/// The undecoded shape of a record: the provider name and the raw payload text.
#[derive(Debug, Deserialize)]
pub(crate) struct TaggedRecord {
    #[serde(default)]
    pub(crate) provider: String,
    #[serde(default)]
    pub(crate) value: Option<Box<RawValue>>,
}

impl TaggedRecord {
    pub(crate) fn parse(raw: &[u8]) -> Result<Self, Error> {
        serde_json::from_slice(raw).map_err(Error::Record)
    }

    /// Reads a record from an arbitrary deserializer.
    ///
    /// Input behind `#[serde(flatten)]` or inside an untagged enum is buffered by serde and
    /// can no longer produce raw JSON text, so the payload is taken as a JSON tree and
    /// written back out for the provider.
    pub(crate) fn from_deserializer<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Buffered {
            #[serde(default)]
            provider: String,
            #[serde(default)]
            value: Option<serde_json::Value>,
        }

        let record = Buffered::deserialize(deserializer)?;
        let value = record
            .value
            .map(|value| serde_json::value::to_raw_value(&value))
            .transpose()
            .map_err(D::Error::custom)?;
        Ok(Self {
            provider: record.provider,
            value,
        })
    }

    /// Runs the named provider against the payload, writing into `destination` on success.
    pub(crate) fn resolve(&self, registry: &ProviderRegistry, destination: &mut dyn Destination) -> Result<(), Error> {
        let provider = registry.lookup(&self.provider).ok_or_else(|| Error::UnknownProvider {
            name: self.provider.clone(),
        })?;
        let payload = self.value.as_deref().unwrap_or(RawValue::NULL);
        debug!(provider = %self.provider, payload_len = payload.get().len(), "resolving tagged value");
        provider.set(payload, destination).map_err(|source| Error::Provider {
            provider: self.provider.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;
    use crate::provider::NullProvider;

    #[derive(Debug, Default, Clone, PartialEq, Deserialize)]
    struct S {
        field: String,
    }

    #[test]
    fn new_uses_the_default_provider() {
        let value = Value::new(42);
        assert_eq!(value.provider, DEFAULT);
        assert_eq!(value.effective_provider(), STATIC);
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"{"value":42}"#);
    }

    #[test]
    fn encode_is_verbatim() {
        let value = Value::with_provider("url", "http://localhost:8888");
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"provider":"url","value":"http://localhost:8888"}"#
        );
    }

    #[test]
    fn static_round_trip_preserves_the_value() {
        let original = json!({"a": [1, 2.5, null, true], "b": {"c": "d"}, "e": ""});
        let encoded = serde_json::to_vec(&Value::with_provider(STATIC, &original)).unwrap();
        let decoded: Value<serde_json::Value> = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(decoded.provider, STATIC);
        assert_eq!(decoded.value, original);
    }

    #[test]
    fn omitted_provider_matches_static() {
        let registry = ProviderRegistry::with_builtins();
        let implicit = Value::<BTreeMap<String, u8>>::decode_with(&registry, br#"{"value":{"x":1}}"#).unwrap();
        let explicit =
            Value::<BTreeMap<String, u8>>::decode_with(&registry, br#"{"provider":"static","value":{"x":1}}"#).unwrap();
        assert_eq!(implicit.value, explicit.value);
        assert_eq!(implicit.effective_provider(), explicit.effective_provider());
    }

    #[test]
    fn unknown_provider_is_rejected_without_mutation() {
        let registry = ProviderRegistry::with_builtins();
        let mut value = Value::new(S {
            field: "before".into(),
        });

        let error = value
            .decode_in_place(&registry, br#"{"provider":"unknown","value":{"field":"value"}}"#)
            .unwrap_err();
        assert!(error.is_unknown_provider());
        assert_eq!(value.provider, DEFAULT);
        assert_eq!(value.value.field, "before");

        value
            .decode_in_place(&registry, br#"{"provider":"static","value":{"field":"value"}}"#)
            .unwrap();
        assert_eq!(value.provider, STATIC);
        assert_eq!(value.value.field, "value");
    }

    #[test]
    fn unknown_provider_surfaces_through_serde() {
        let error = serde_json::from_str::<Value<S>>(r#"{"provider":"unknown","value":{"field":"value"}}"#).unwrap_err();
        assert!(error.to_string().contains("unknown provider: unknown"));
    }

    #[test]
    fn failed_decode_leaves_value_untouched() {
        let registry = ProviderRegistry::with_builtins();
        let mut value = Value::with_provider(STATIC, 7_i64);
        let error = value.decode_in_place(&registry, br#"{"value":"seven"}"#).unwrap_err();
        assert!(error.is_decode());
        assert_eq!(value, Value::with_provider(STATIC, 7));

        let error = value.decode_in_place(&registry, b"not json").unwrap_err();
        assert!(matches!(error, Error::Record(_)));
        assert_eq!(value.value, 7);
    }

    #[test]
    fn omitted_value_is_decoded_as_null() {
        let registry = ProviderRegistry::with_builtins();
        let value = Value::<Option<String>>::decode_with(&registry, br#"{"provider":"static"}"#).unwrap();
        assert_eq!(value.value, None);

        let error = Value::<String>::decode_with(&registry, br#"{"provider":"static"}"#).unwrap_err();
        assert!(error.is_decode());
    }

    #[test]
    fn provider_that_sets_nothing_keeps_the_hint() {
        let mut registry = ProviderRegistry::with_builtins();
        registry.register("name", NullProvider);

        let mut value = Value::new(S {
            field: "hint".into(),
        });
        value.decode_in_place(&registry, br#"{"provider":"name","value":{"field":"ignored"}}"#).unwrap();
        assert_eq!(value.provider, "name");
        assert_eq!(value.value.field, "hint");

        let error = Value::<S>::decode_with(&registry, br#"{"provider":"name"}"#).unwrap_err();
        assert!(matches!(error, Error::Unresolved { ref provider } if provider == "name"));
    }

    #[test]
    fn seed_uses_the_injected_registry() {
        let mut registry = ProviderRegistry::new();
        registry.register("literal", crate::provider::StaticProvider);

        let mut deserializer = serde_json::Deserializer::from_str(r#"{"provider":"literal","value":"x"}"#);
        let value = ValueSeed::<String>::new(&registry).deserialize(&mut deserializer).unwrap();
        assert_eq!(value, Value::with_provider("literal", "x".to_string()));

        let mut deserializer = serde_json::Deserializer::from_str(r#"{"value":"x"}"#);
        let error = ValueSeed::<String>::new(&registry).deserialize(&mut deserializer).unwrap_err();
        assert!(error.to_string().contains("unknown provider"));
    }

    #[test]
    fn flattened_values_resolve() {
        #[derive(Debug, Deserialize)]
        struct Limits {
            name: String,
            #[serde(flatten)]
            rest: BTreeMap<String, Value<u32>>,
        }

        let limits: Limits = serde_json::from_str(
            r#"{"name": "burst", "max": {"value": 1}, "min": {"provider": "static", "value": 0}}"#,
        )
        .unwrap();
        assert_eq!(limits.name, "burst");
        assert_eq!(limits.rest["max"], Value::new(1));
        assert_eq!(limits.rest["min"], Value::with_provider(STATIC, 0));
    }

    #[test]
    fn untagged_variants_resolve() {
        #[derive(Debug, PartialEq, Deserialize)]
        #[serde(untagged)]
        enum Port {
            Tagged(Value<u16>),
            Bare(u16),
        }

        let ports: Vec<Port> = serde_json::from_str(r#"[{"value": 80}, 443, {"provider": "static", "value": 8080}]"#).unwrap();
        assert_eq!(
            ports,
            vec![
                Port::Tagged(Value::new(80)),
                Port::Bare(443),
                Port::Tagged(Value::with_provider(STATIC, 8080)),
            ]
        );
    }

    #[test]
    fn nested_values_resolve_in_document_order() {
        #[derive(Debug, Deserialize)]
        struct Settings {
            name: Value<String>,
            ports: Vec<Value<u16>>,
        }

        let settings: Settings = serde_json::from_str(
            r#"{
                "name": {"provider": "static", "value": "api"},
                "ports": [{"value": 80}, {"provider": "", "value": 443}]
            }"#,
        )
        .unwrap();
        assert_eq!(settings.name.value, "api");
        assert_eq!(settings.ports.iter().map(|port| port.value).collect::<Vec<_>>(), vec![80, 443]);
    }
}
