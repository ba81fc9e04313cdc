use std::fmt;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use tracing::debug;

use super::{DEFAULT, DefaultHttpFetcher, Provider, STATIC, StaticProvider, URL, UrlProvider, ValueFetcher};

static GLOBAL: OnceCell<ProviderRegistry> = OnceCell::new();

/// A table of named provider strategies.
///
/// A registry is populated once during startup and only read afterwards, so lookups take
/// no locks. Names are unique: registering a name twice is a configuration bug and panics.
///
/// ```rust
/// use indirect_engine::provider::{NullProvider, ProviderRegistry};
///
/// let mut registry = ProviderRegistry::with_builtins();
/// registry.register("disabled", NullProvider);
///
/// assert!(registry.contains("static"));
/// assert!(registry.contains("disabled"));
/// ```
#[derive(Default)]
pub struct ProviderRegistry {
    providers: IndexMap<String, Box<dyn Provider>>,
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ProviderRegistry {
    /// An empty registry; not even the default provider is present.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in strategies, fetching over HTTP with settings from the environment.
    pub fn with_builtins() -> Self {
        Self::with_fetcher(DefaultHttpFetcher::from_env())
    }

    /// A registry holding the built-in strategies, with `url` fetching through `fetcher`.
    pub fn with_fetcher(fetcher: impl ValueFetcher + 'static) -> Self {
        let mut registry = Self::new();
        registry.register(DEFAULT, StaticProvider);
        registry.register(STATIC, StaticProvider);
        registry.register(URL, UrlProvider::new(fetcher));
        registry
    }

    /// Adds `provider` under `name`.
    ///
    /// # Panics
    ///
    /// Panics when `name` is already registered.
    pub fn register(&mut self, name: impl Into<String>, provider: impl Provider + 'static) -> &mut Self {
        let name = name.into();
        if self.providers.contains_key(&name) {
            panic!("duplicate provider: {name}");
        }
        debug!(provider = %name, "provider registered");
        self.providers.insert(name, Box::new(provider));
        self
    }

    pub fn lookup(&self, name: &str) -> Option<&dyn Provider> {
        self.providers.get(name).map(|provider| provider.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Makes `registry` the process-wide registry used by `Deserialize` impls.
///
/// Call this once during startup, before any decoding happens. When a registry is already
/// in place (installed earlier, or created on first use by [`global`]) the given one is
/// handed back unchanged.
pub fn install(registry: ProviderRegistry) -> Result<(), ProviderRegistry> {
    GLOBAL.set(registry)
}

/// The process-wide registry, created with [`ProviderRegistry::with_builtins`] on first use
/// unless one was [`install`]ed.
pub fn global() -> &'static ProviderRegistry {
    GLOBAL.get_or_init(ProviderRegistry::with_builtins)
}
