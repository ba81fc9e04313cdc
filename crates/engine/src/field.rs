//! Field adapter for provider-wrapped (de)serialization.
//!
//! A [`Field`] borrows a caller-owned slot and makes it travel as a tagged record. It lets a
//! type opt single fields, or itself as a whole, into the wrapped form from inside its own
//! `Serialize`/`Deserialize` impls. The wrapped type is always encoded and decoded through a
//! separate plain representation (a serde-derived struct with the same fields), never through
//! the impl that created the `Field`, so the hook cannot re-enter itself.
//!
//! Per-field wrapping:
//!
//! ```rust
//! use indirect_engine::Field;
//! use serde::{Serialize, Serializer};
//!
//! struct Endpoint {
//!     host: String,
//!     port: u16,
//! }
//!
//! impl Serialize for Endpoint {
//!     fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
//!         #[derive(Serialize)]
//!         struct Fields<'a> {
//!             host: Field<'a, &'a String>,
//!             port: Field<'a, &'a u16>,
//!         }
//!         Fields {
//!             host: Field::new("host", &self.host),
//!             port: Field::new("port", &self.port),
//!         }
//!         .serialize(serializer)
//!     }
//! }
//!
//! let endpoint = Endpoint { host: "localhost".into(), port: 8888 };
//! assert_eq!(
//!     serde_json::to_string(&endpoint)?,
//!     r#"{"host":{"provider":"static","value":"localhost"},"port":{"provider":"static","value":8888}}"#
//! );
//! # Ok::<(), serde_json::Error>(())
//! ```

use std::{
    fmt::{self, Debug},
    ops::{Deref, DerefMut},
};

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{DeserializeOwned, DeserializeSeed, Error as _},
    ser::{self, Error as _, Impossible},
};
use serde_json::value::RawValue;

use crate::{
    Error, Value,
    provider::{self, ProviderRegistry, STATIC},
    value::TaggedRecord,
};

/// A named, borrowed slot that (de)serializes as a tagged record.
///
/// `R` is `&T` for encoding only, or `&mut T` for encoding and decoding. `name` only
/// appears in error messages.
#[derive(Debug)]
pub struct Field<'a, R> {
    name: &'a str,
    slot: R,
    registry: Option<&'a ProviderRegistry>,
}

impl<'a, R> Field<'a, R> {
    pub fn new(name: &'a str, slot: R) -> Self {
        Self {
            name,
            slot,
            registry: None,
        }
    }

    /// Resolve through `registry` instead of the process-wide one.
    pub fn with_registry(mut self, registry: &'a ProviderRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    fn registry(&self) -> &'a ProviderRegistry {
        self.registry.unwrap_or_else(|| provider::global())
    }
}

impl<R> Field<'_, R>
where
    R: Deref,
    R::Target: Serialize + Debug,
{
    /// True when the slot serializes to `null`; such a field is left out of the record.
    ///
    /// Intended for `#[serde(skip_serializing_if = "Field::is_absent")]` on the parent.
    pub fn is_absent(&self) -> bool {
        serializes_to_null(&*self.slot)
    }

    /// Encodes the slot as `{"provider":"static","value":...}`, or `None` when it is absent.
    pub fn encode(&self) -> Result<Option<Vec<u8>>, Error> {
        if self.is_absent() {
            return Ok(None);
        }
        serde_json::to_vec(&Value::with_provider(STATIC, &*self.slot))
            .map(Some)
            .map_err(|source| Error::Encode {
                name: self.name.to_string(),
                value: format!("{:?}", &*self.slot),
                source,
            })
    }
}

impl<R> Serialize for Field<'_, R>
where
    R: Deref,
    R::Target: Serialize + Debug,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if self.is_absent() {
            return serializer.serialize_none();
        }
        Value::with_provider(STATIC, &*self.slot)
            .serialize(serializer)
            .map_err(|error| S::Error::custom(format_args!("{}: {}\n{:?}", self.name, error, &*self.slot)))
    }
}

impl<R> Field<'_, R>
where
    R: DerefMut,
    R::Target: DeserializeOwned,
{
    /// Resolves a tagged record and writes the result through the slot.
    ///
    /// Empty input or a bare `null` means the field was omitted and leaves the slot alone.
    /// On error the slot is untouched and the error names the field and carries the raw input.
    pub fn decode(&mut self, raw: &[u8]) -> Result<(), Error> {
        let trimmed = raw.trim_ascii();
        if trimmed.is_empty() || trimmed == b"null" {
            return Ok(());
        }
        let mut slot: Option<R::Target> = None;
        TaggedRecord::parse(raw)
            .and_then(|record| record.resolve(self.registry(), &mut slot))
            .map_err(|source| Error::Field {
                name: self.name.to_string(),
                payload: String::from_utf8_lossy(raw).into_owned(),
                source: Box::new(source),
            })?;
        if let Some(value) = slot {
            *self.slot = value;
        }
        Ok(())
    }

    /// Like [`Field::decode`], with `None` standing for an omitted field.
    pub fn decode_raw(&mut self, raw: Option<&RawValue>) -> Result<(), Error> {
        match raw {
            Some(raw) => self.decode(raw.get().as_bytes()),
            None => Ok(()),
        }
    }
}

impl<'de, R> DeserializeSeed<'de> for Field<'_, R>
where
    R: DerefMut,
    R::Target: DeserializeOwned,
{
    type Value = ();

    fn deserialize<D>(mut self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        // A JSON tree rather than raw text, so buffered (`flatten`, untagged) input works too.
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?
            .map(|value| serde_json::value::to_raw_value(&value))
            .transpose()
            .map_err(D::Error::custom)?;
        self.decode_raw(raw.as_deref()).map_err(D::Error::custom)
    }
}

/// True when `value` would be written as JSON `null`.
///
/// Stops at the first token, so containers are never walked.
fn serializes_to_null<T: Serialize + ?Sized>(value: &T) -> bool {
    matches!(value.serialize(NullCheck), Ok(true))
}

struct NullCheck;

/// Short-circuits the check on the first container.
#[derive(Debug)]
struct NotNull;

impl fmt::Display for NotNull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("value is not null")
    }
}

impl std::error::Error for NotNull {}

impl ser::Error for NotNull {
    fn custom<T: fmt::Display>(_msg: T) -> Self {
        NotNull
    }
}

macro_rules! not_null {
    ($($method:ident($ty:ty)),* $(,)?) => {
        $(
            fn $method(self, _: $ty) -> Result<bool, NotNull> {
                Ok(false)
            }
        )*
    };
}

impl Serializer for NullCheck {
    type Ok = bool;
    type Error = NotNull;
    type SerializeSeq = Impossible<bool, NotNull>;
    type SerializeTuple = Impossible<bool, NotNull>;
    type SerializeTupleStruct = Impossible<bool, NotNull>;
    type SerializeTupleVariant = Impossible<bool, NotNull>;
    type SerializeMap = Impossible<bool, NotNull>;
    type SerializeStruct = Impossible<bool, NotNull>;
    type SerializeStructVariant = Impossible<bool, NotNull>;

    not_null! {
        serialize_bool(bool),
        serialize_i8(i8),
        serialize_i16(i16),
        serialize_i32(i32),
        serialize_i64(i64),
        serialize_i128(i128),
        serialize_u8(u8),
        serialize_u16(u16),
        serialize_u32(u32),
        serialize_u64(u64),
        serialize_u128(u128),
        serialize_f32(f32),
        serialize_f64(f64),
        serialize_char(char),
        serialize_str(&str),
        serialize_bytes(&[u8]),
    }

    fn serialize_none(self) -> Result<bool, NotNull> {
        Ok(true)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<bool, NotNull> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<bool, NotNull> {
        Ok(true)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<bool, NotNull> {
        Ok(true)
    }

    fn serialize_unit_variant(self, _name: &'static str, _index: u32, _variant: &'static str) -> Result<bool, NotNull> {
        Ok(false)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(self, _name: &'static str, value: &T) -> Result<bool, NotNull> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<bool, NotNull> {
        Ok(false)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq, NotNull> {
        Err(NotNull)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, NotNull> {
        Err(NotNull)
    }

    fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeTupleStruct, NotNull> {
        Err(NotNull)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, NotNull> {
        Err(NotNull)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, NotNull> {
        Err(NotNull)
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct, NotNull> {
        Err(NotNull)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, NotNull> {
        Err(NotNull)
    }
}
