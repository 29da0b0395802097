//! Endpoint construction
//!
//! Every client handed out by a registry goes through here: normalize the
//! selector, resolve the module, instantiate it, attach the registry
//! back-reference, freeze.

use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::endpoint::{Endpoint, EndpointModule};
use crate::error::{BoxError, FactoryError, Result};
use crate::registry::ApiRegistry;
use crate::resolver::ApiLoader;
use crate::selector::{ClientOptions, Selection, VersionSelector};

pub struct EndpointFactory;

impl EndpointFactory {
    /// Build a frozen endpoint for `api` from a typed selector
    pub fn construct(
        registry: &ApiRegistry,
        api: &str,
        loader: &dyn ApiLoader,
        selector: VersionSelector,
    ) -> Result<Endpoint> {
        let requested = selector.requested_version();
        let Selection { version, options } = selector
            .normalize()
            .map_err(|e| Self::failed(api, &requested, e.into()))?;

        debug!(api = %api, version = %version, "Resolving endpoint module");
        let module = loader
            .load(&version)
            .map_err(|e| Self::failed(api, &version, e))?;

        let endpoint = Self::instantiate(registry, module.as_ref(), options)
            .map_err(|e| Self::failed(api, &version, e))?;
        debug!(api = %api, version = %version, "Constructed endpoint");
        Ok(endpoint)
    }

    /// Build a frozen endpoint from an untyped selector.
    ///
    /// Fails with [`FactoryError::Argument`] unless `value` is a string or an
    /// object; nothing is resolved in that case.
    pub fn construct_value(
        registry: &ApiRegistry,
        api: &str,
        loader: &dyn ApiLoader,
        value: JsonValue,
    ) -> Result<Endpoint> {
        let selector = VersionSelector::from_value(value).inspect_err(|e| {
            warn!(api = %api, error = %e, "Rejected version selector");
        })?;
        Self::construct(registry, api, loader, selector)
    }

    /// Instantiate a resolved module and seal it with the registry back-reference
    pub(crate) fn instantiate(
        registry: &ApiRegistry,
        module: &dyn EndpointModule,
        options: ClientOptions,
    ) -> std::result::Result<Endpoint, BoxError> {
        let builder = module.instantiate(options)?;
        Ok(builder.attach_root(registry.downgrade()).freeze())
    }

    fn failed(api: &str, version: &str, source: BoxError) -> FactoryError {
        warn!(api = %api, version = %version, error = %source, "Endpoint construction failed");
        FactoryError::construction(api, version, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ApiDescriptor;
    use crate::error::ResolveError;
    use crate::resolver::{ApiCatalog, VersionedModules};
    use serde_json::json;
    use std::error::Error as _;
    use std::sync::Arc;
    use tracing_test::traced_test;

    fn registry() -> ApiRegistry {
        ApiRegistry::builder()
            .catalog(ApiCatalog::new())
            .build()
            .unwrap()
    }

    fn drive() -> VersionedModules {
        VersionedModules::new("drive").with_descriptor(ApiDescriptor::new("drive", "v3"))
    }

    #[test]
    fn test_construct_binds_registry() {
        let registry = registry();
        let endpoint =
            EndpointFactory::construct(&registry, "drive", &drive(), "v3".into()).unwrap();
        assert_eq!(endpoint.version(), "v3");
        assert!(endpoint.is_bound_to(&registry));
        assert!(Arc::ptr_eq(&endpoint.auth().unwrap(), registry.auth()));
    }

    #[test]
    fn test_construct_value_rejects_numbers() {
        let registry = registry();
        let err = EndpointFactory::construct_value(&registry, "drive", &drive(), json!(3))
            .unwrap_err();
        assert!(err.is_argument());
    }

    #[test]
    fn test_missing_version_is_construction_error() {
        let registry = registry();
        let err = EndpointFactory::construct_value(
            &registry,
            "drive",
            &drive(),
            json!({"rootUrl": "http://localhost/"}),
        )
        .unwrap_err();

        assert!(err.is_construction());
        let cause = err.source().unwrap().downcast_ref::<ResolveError>().unwrap();
        assert!(matches!(cause, ResolveError::MissingVersion));
    }

    #[test]
    fn test_instantiation_failure_is_wrapped() {
        let registry = registry();
        let err = EndpointFactory::construct_value(
            &registry,
            "drive",
            &drive(),
            json!({"version": "v3", "rootUrl": "::"}),
        )
        .unwrap_err();

        match err {
            FactoryError::Construction { api, version, .. } => {
                assert_eq!(api, "drive");
                assert_eq!(version, "v3");
            }
            other => panic!("expected construction error, got {other:?}"),
        }
    }

    #[test]
    #[traced_test]
    fn test_unknown_version_is_logged() {
        let registry = registry();
        let result = EndpointFactory::construct(&registry, "drive", &drive(), "v999".into());
        assert!(result.is_err());
        assert!(logs_contain("Endpoint construction failed"));
    }
}
