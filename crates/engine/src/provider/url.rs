use std::sync::Arc;

use serde_json::value::RawValue;
use tracing::debug;

use super::{Destination, Provider, ValueFetcher};
use crate::ProviderError;

/// Treats the payload as a URL string and decodes the fetched body as the value.
#[derive(Debug, Clone)]
pub struct UrlProvider {
    fetcher: Arc<dyn ValueFetcher>,
}

impl UrlProvider {
    pub fn new(fetcher: impl ValueFetcher + 'static) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
        }
    }

    pub fn from_shared(fetcher: Arc<dyn ValueFetcher>) -> Self {
        Self { fetcher }
    }
}

impl Provider for UrlProvider {
    fn set(&self, data: &RawValue, destination: &mut dyn Destination) -> Result<(), ProviderError> {
        let url: String = serde_json::from_str(data.get())?;
        debug!(url = %url, "resolving value from url");
        let mut body = self.fetcher.fetch(&url)?;
        destination.decode_reader(&mut body)?;
        Ok(())
    }
}
