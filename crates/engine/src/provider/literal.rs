use serde_json::value::RawValue;

use super::{Destination, Provider};
use crate::ProviderError;

/// Uses the payload itself as the value.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticProvider;

impl Provider for StaticProvider {
    fn set(&self, data: &RawValue, destination: &mut dyn Destination) -> Result<(), ProviderError> {
        destination.decode_slice(data.get().as_bytes())?;
        Ok(())
    }
}
