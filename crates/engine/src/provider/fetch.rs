use std::{
    fmt::Debug,
    io::{Cursor, Read},
};

use indirect_util::{FetchError, HttpFetchConfig, block_on_future, fetch_bytes};

/// Blocking "GET bytes from URL" capability consumed by the `url` provider.
///
/// The returned reader owns the response body; dropping it releases the body.
pub trait ValueFetcher: Send + Sync + Debug {
    fn fetch(&self, url: &str) -> Result<Box<dyn Read + Send>, FetchError>;
}

/// Fetches over HTTP(S) by driving the async client with [`block_on_future`], so it works
/// both from plain synchronous code and from inside a tokio runtime.
#[derive(Debug, Clone, Default)]
pub struct DefaultHttpFetcher {
    config: HttpFetchConfig,
}

impl DefaultHttpFetcher {
    pub fn new(config: HttpFetchConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Self {
        Self::new(HttpFetchConfig::from_env())
    }

    pub fn config(&self) -> &HttpFetchConfig {
        &self.config
    }
}

impl ValueFetcher for DefaultHttpFetcher {
    fn fetch(&self, url: &str) -> Result<Box<dyn Read + Send>, FetchError> {
        let body = block_on_future(async {
            let client = self.config.build_client()?;
            fetch_bytes(&client, url).await
        })?;
        Ok(Box::new(Cursor::new(body.bytes)))
    }
}
