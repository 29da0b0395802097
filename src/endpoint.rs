//! Endpoint modules and the client instances they produce
//!
//! An [`EndpointModule`] is the constructible unit for one version of one API.
//! Instantiating it yields an [`EndpointBuilder`]; the factory attaches the
//! registry back-reference and freezes the builder into an [`Endpoint`], which
//! has no mutating API at all.

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::auth::AuthContext;
use crate::descriptor::{ApiDescriptor, MethodDescriptor};
use crate::error::{BoxError, ResolveError};
use crate::registry::{ApiRegistry, WeakRegistry};
use crate::selector::{ClientOptions, PARAMS_KEY, ROOT_URL_KEY};

/// A constructible client type for one (API, version) pair
pub trait EndpointModule: Send + Sync {
    fn api_name(&self) -> &str;

    fn version(&self) -> &str;

    /// Build a client from caller configuration (the `version` key is already gone)
    fn instantiate(&self, options: ClientOptions) -> Result<EndpointBuilder, BoxError>;
}

/// Endpoint module backed by a discovery document
#[derive(Debug, Clone)]
pub struct DescriptorModule {
    descriptor: Arc<ApiDescriptor>,
}

impl DescriptorModule {
    pub fn new(descriptor: ApiDescriptor) -> Self {
        Self {
            descriptor: Arc::new(descriptor),
        }
    }

    pub fn descriptor(&self) -> &Arc<ApiDescriptor> {
        &self.descriptor
    }
}

impl EndpointModule for DescriptorModule {
    fn api_name(&self) -> &str {
        &self.descriptor.name
    }

    fn version(&self) -> &str {
        &self.descriptor.version
    }

    fn instantiate(&self, options: ClientOptions) -> Result<EndpointBuilder, BoxError> {
        if let Some(value) = options.get(ROOT_URL_KEY) {
            let root = value.as_str().ok_or_else(|| ResolveError::InvalidOption {
                key: ROOT_URL_KEY.to_string(),
                message: format!("expected a string, got {value}"),
            })?;
            Url::parse(root).map_err(|e| ResolveError::InvalidOption {
                key: ROOT_URL_KEY.to_string(),
                message: e.to_string(),
            })?;
        }
        if let Some(value) = options.get(PARAMS_KEY) {
            if !value.is_object() {
                return Err(ResolveError::InvalidOption {
                    key: PARAMS_KEY.to_string(),
                    message: format!("expected an object, got {value}"),
                }
                .into());
            }
        }
        Ok(EndpointBuilder::new(Arc::clone(&self.descriptor), options))
    }
}

/// Mutable construction stage of an endpoint
#[derive(Debug)]
pub struct EndpointBuilder {
    descriptor: Arc<ApiDescriptor>,
    options: ClientOptions,
    root: WeakRegistry,
}

impl EndpointBuilder {
    pub fn new(descriptor: Arc<ApiDescriptor>, options: ClientOptions) -> Self {
        Self {
            descriptor,
            options,
            root: WeakRegistry::default(),
        }
    }

    pub(crate) fn attach_root(mut self, root: WeakRegistry) -> Self {
        self.root = root;
        self
    }

    /// Seal the builder. Nothing about the result can change afterwards.
    pub(crate) fn freeze(self) -> Endpoint {
        let base_url = match self.options.root_url() {
            Some(root) => format!("{root}{}", self.descriptor.service_path),
            None => self.descriptor.base_url(),
        };
        Endpoint {
            inner: Arc::new(FrozenEndpoint {
                descriptor: self.descriptor,
                options: self.options,
                base_url,
                root: self.root,
            }),
        }
    }
}

struct FrozenEndpoint {
    descriptor: Arc<ApiDescriptor>,
    options: ClientOptions,
    base_url: String,
    root: WeakRegistry,
}

/// A constructed, immutable API client.
///
/// Cloning shares the same frozen state, so an endpoint can be handed to any
/// number of tasks.
#[derive(Clone)]
pub struct Endpoint {
    inner: Arc<FrozenEndpoint>,
}

impl Endpoint {
    pub fn name(&self) -> &str {
        &self.inner.descriptor.name
    }

    pub fn version(&self) -> &str {
        &self.inner.descriptor.version
    }

    pub fn descriptor(&self) -> &ApiDescriptor {
        &self.inner.descriptor
    }

    /// Configuration this endpoint was built with, minus `version`
    pub fn options(&self) -> &ClientOptions {
        &self.inner.options
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn method(&self, id: &str) -> Option<&MethodDescriptor> {
        self.inner.descriptor.find_method(id)
    }

    pub fn method_ids(&self) -> Vec<String> {
        self.inner.descriptor.method_ids()
    }

    /// Registry that built this endpoint, if it is still alive
    pub fn registry(&self) -> Option<ApiRegistry> {
        self.inner.root.upgrade()
    }

    pub fn is_bound_to(&self, registry: &ApiRegistry) -> bool {
        self.inner.root.points_to(registry)
    }

    /// Shared auth context, reached through the back-reference
    pub fn auth(&self) -> Option<Arc<AuthContext>> {
        self.registry().map(|r| Arc::clone(r.auth()))
    }

    /// True when both handles share the same frozen state
    pub fn ptr_eq(&self, other: &Endpoint) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("name", &self.name())
            .field("version", &self.version())
            .field("base_url", &self.base_url())
            .field("options", &self.inner.options)
            .finish()
    }
}
