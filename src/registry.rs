//! The API registry, the long-lived root object
//!
//! A registry holds one loader per API name, one shared [`AuthContext`] and a
//! discovery client. Its table only grows: construction binds the bundled
//! catalog, [`ApiRegistry::add_apis`] and [`ApiRegistry::discover_all`] bind
//! more, and a later binding of the same name replaces the earlier one.
//!
//! Asking for an API the registry does not know yields `None` rather than an
//! error, so `registry.api("name").is_some()` works as feature detection.
//! Asking a known API for a version it cannot resolve is an error.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, Weak};

use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::auth::AuthContext;
use crate::config::RegistryOptions;
use crate::discovery::{Discovery, DiscoveryClient};
use crate::endpoint::Endpoint;
use crate::error::{FactoryError, Result};
use crate::factory::EndpointFactory;
use crate::resolver::{ApiCatalog, ApiLoader, bundled_catalog};
use crate::selector::{ClientOptions, VersionSelector};

pub(crate) struct RegistryInner {
    options: RegistryOptions,
    apis: RwLock<ApiCatalog>,
    auth: Arc<AuthContext>,
    discovery: Arc<dyn DiscoveryClient>,
}

/// Root object handing out API clients.
///
/// Cheap to clone; clones share the same table and auth context.
#[derive(Clone)]
pub struct ApiRegistry {
    inner: Arc<RegistryInner>,
}

/// Non-owning reference from an endpoint back to its registry
#[derive(Clone, Default)]
pub struct WeakRegistry(Weak<RegistryInner>);

impl WeakRegistry {
    pub fn upgrade(&self) -> Option<ApiRegistry> {
        self.0.upgrade().map(|inner| ApiRegistry { inner })
    }

    pub fn points_to(&self, registry: &ApiRegistry) -> bool {
        std::ptr::eq(self.0.as_ptr(), Arc::as_ptr(&registry.inner))
    }
}

impl fmt::Debug for WeakRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.0.strong_count() > 0 {
            "bound"
        } else {
            "detached"
        };
        f.debug_tuple("WeakRegistry").field(&state).finish()
    }
}

/// Builder for [`ApiRegistry`]
#[derive(Default)]
pub struct RegistryBuilder {
    options: Option<RegistryOptions>,
    discovery: Option<Arc<dyn DiscoveryClient>>,
    auth: Option<AuthContext>,
    catalog: Option<ApiCatalog>,
}

impl RegistryBuilder {
    pub fn options(mut self, options: RegistryOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn discovery(mut self, discovery: Arc<dyn DiscoveryClient>) -> Self {
        self.discovery = Some(discovery);
        self
    }

    pub fn auth(mut self, auth: AuthContext) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Replace the bundled catalog bound at construction
    pub fn catalog(mut self, catalog: ApiCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn build(self) -> Result<ApiRegistry> {
        let options = self.options.unwrap_or_default();
        let discovery = match self.discovery {
            Some(discovery) => discovery,
            None => {
                let discovery = Discovery::new(&options.discovery)
                    .map_err(|e| FactoryError::config(e.to_string()))?;
                Arc::new(discovery) as Arc<dyn DiscoveryClient>
            }
        };
        let catalog = self
            .catalog
            .unwrap_or_else(|| bundled_catalog(options.apis_dir()));

        let registry = ApiRegistry {
            inner: Arc::new(RegistryInner {
                options,
                apis: RwLock::new(ApiCatalog::new()),
                auth: Arc::new(self.auth.unwrap_or_default()),
                discovery,
            }),
        };
        registry.add_apis(catalog);
        debug!(apis = registry.len(), "Created API registry");
        Ok(registry)
    }
}

impl ApiRegistry {
    /// Registry with default options and the bundled catalog
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn with_options(options: RegistryOptions) -> Result<Self> {
        Self::builder().options(options).build()
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Callable handle for `name`, or `None` when the name is not registered
    pub fn api(&self, name: &str) -> Option<ApiHandle> {
        let loader = self.loader(name)?;
        Some(ApiHandle {
            name: name.to_string(),
            loader,
            registry: self.clone(),
        })
    }

    /// One-shot form of `api(name)?.call(selector)`
    pub fn get(
        &self,
        name: &str,
        selector: impl Into<VersionSelector>,
    ) -> Option<Result<Endpoint>> {
        self.api(name).map(|handle| handle.call(selector))
    }

    pub fn has_api(&self, name: &str) -> bool {
        self.table().contains_key(name)
    }

    /// Registered API names, sorted
    pub fn api_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.table().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }

    /// Bind every `(name, loader)` pair; an existing binding of the same name is replaced
    pub fn add_apis<I>(&self, apis: I)
    where
        I: IntoIterator<Item = (String, Arc<dyn ApiLoader>)>,
    {
        let mut table = self
            .inner
            .apis
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        for (name, loader) in apis {
            table.insert(name, loader);
        }
    }

    /// Shared auth context, fixed for the registry's lifetime
    pub fn auth(&self) -> &Arc<AuthContext> {
        &self.inner.auth
    }

    /// Options as supplied at construction
    pub fn options(&self) -> &RegistryOptions {
        &self.inner.options
    }

    pub fn downgrade(&self) -> WeakRegistry {
        WeakRegistry(Arc::downgrade(&self.inner))
    }

    pub fn ptr_eq(&self, other: &ApiRegistry) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Resolve every API listed at `index_url` and bind them.
    ///
    /// Returns the names that were bound. On failure the table is left exactly
    /// as it was.
    pub async fn discover_all(&self, index_url: &str) -> Result<Vec<String>> {
        info!(source = %index_url, "Fetching discovery index");
        let catalog = self
            .inner
            .discovery
            .resolve_index(index_url)
            .await
            .inspect_err(|e| warn!(source = %index_url, error = %e, "Discovery failed"))?;

        let mut names: Vec<String> = catalog.keys().cloned().collect();
        names.sort();
        self.add_apis(catalog);
        info!(source = %index_url, count = names.len(), "Registered discovered APIs");
        Ok(names)
    }

    /// Build one endpoint from a discovery document with empty options
    pub async fn discover_api(&self, path_or_url: &str) -> Result<Endpoint> {
        self.discover_api_with(path_or_url, ClientOptions::new())
            .await
    }

    /// Build one endpoint from a discovery document (local path or URL)
    pub async fn discover_api_with(
        &self,
        path_or_url: &str,
        options: ClientOptions,
    ) -> Result<Endpoint> {
        info!(source = %path_or_url, "Fetching discovery document");
        let module = self
            .inner
            .discovery
            .resolve_document(path_or_url)
            .await
            .inspect_err(|e| warn!(source = %path_or_url, error = %e, "Discovery failed"))?;

        let endpoint = EndpointFactory::instantiate(self, module.as_ref(), options).map_err(
            |source| FactoryError::construction(module.api_name(), module.version(), source),
        )?;
        info!(
            source = %path_or_url,
            api = %endpoint.name(),
            version = %endpoint.version(),
            "Constructed discovered endpoint"
        );
        Ok(endpoint)
    }

    fn loader(&self, name: &str) -> Option<Arc<dyn ApiLoader>> {
        self.table().get(name).cloned()
    }

    fn table(&self) -> std::sync::RwLockReadGuard<'_, ApiCatalog> {
        self.inner
            .apis
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ApiRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRegistry")
            .field("apis", &self.len())
            .field("options", &self.inner.options)
            .field("auth", &self.inner.auth)
            .finish()
    }
}

/// A registered API, bound to the registry it came from
#[derive(Clone)]
pub struct ApiHandle {
    name: String,
    loader: Arc<dyn ApiLoader>,
    registry: ApiRegistry,
}

impl ApiHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Versions the underlying loader knows about
    pub fn versions(&self) -> Vec<String> {
        self.loader.versions()
    }

    /// Build a fresh endpoint for the selected version
    pub fn call(&self, selector: impl Into<VersionSelector>) -> Result<Endpoint> {
        EndpointFactory::construct(
            &self.registry,
            &self.name,
            self.loader.as_ref(),
            selector.into(),
        )
    }

    /// Build a fresh endpoint from an untyped selector (string or object)
    pub fn call_value(&self, value: JsonValue) -> Result<Endpoint> {
        EndpointFactory::construct_value(&self.registry, &self.name, self.loader.as_ref(), value)
    }
}

impl fmt::Debug for ApiHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiHandle").field("name", &self.name).finish()
    }
}
