use serde_json::value::RawValue;

use super::{Destination, Provider};
use crate::ProviderError;

/// Accepts any payload and materializes nothing.
///
/// Whatever the destination held before the call is what it holds after.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProvider;

impl Provider for NullProvider {
    fn set(&self, _data: &RawValue, _destination: &mut dyn Destination) -> Result<(), ProviderError> {
        Ok(())
    }
}
