//! Integration tests for building clients through the bundled catalog

use std::error::Error as _;
use std::path::PathBuf;
use std::sync::Arc;

use apifactory::{
    ApiCatalog, ApiDescriptor, ApiLoader, ApiRegistry, ClientOptions, FactoryError,
    RegistryOptions, ResolveError, VersionedModules,
};
use serde_json::json;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/apis")
}

fn registry() -> ApiRegistry {
    ApiRegistry::with_options(RegistryOptions::new().with_apis_dir(fixtures_dir()))
        .expect("registry builds")
}

#[test]
fn test_string_version_returns_bound_endpoint() {
    let registry = registry();

    for (api, version) in [("drive", "v3"), ("drive", "v2"), ("storage", "v1")] {
        let endpoint = registry
            .api(api)
            .expect("bundled API is registered")
            .call(version)
            .unwrap_or_else(|e| panic!("{api} {version}: {e}"));

        assert_eq!(endpoint.name(), api);
        assert_eq!(endpoint.version(), version);
        assert!(endpoint.is_bound_to(&registry));
        assert!(endpoint.options().is_empty());
    }
}

#[test]
fn test_default_registry_loads_embedded_documents() {
    let registry = ApiRegistry::new().expect("registry builds");
    assert!(registry.options().apis_dir().is_none());

    let drive = registry.api("drive").expect("drive is bundled");
    assert_eq!(drive.versions(), vec!["v2", "v3"]);
    let endpoint = drive.call("v3").unwrap();
    assert_eq!(endpoint.base_url(), "https://www.googleapis.com/drive/v3/");
    assert!(endpoint.is_bound_to(&registry));

    for name in registry.api_names() {
        let handle = registry.api(&name).unwrap();
        let versions = handle.versions();
        assert!(!versions.is_empty(), "{name} has no versions");
        for version in versions {
            let endpoint = handle
                .call(version.as_str())
                .unwrap_or_else(|e| panic!("{name} {version}: {e}"));
            assert_eq!(endpoint.name(), name);
        }
    }
}

#[test]
fn test_options_object_reaches_module_without_version() {
    let registry = registry();
    let endpoint = registry
        .api("drive")
        .unwrap()
        .call_value(json!({
            "version": "v3",
            "rootUrl": "http://localhost:8080/",
            "params": {"quotaUser": "team-a"}
        }))
        .unwrap();

    assert_eq!(endpoint.version(), "v3");
    assert!(!endpoint.options().contains_key("version"));
    assert_eq!(endpoint.options().len(), 2);
    assert_eq!(endpoint.options().params().unwrap()["quotaUser"], "team-a");
    assert_eq!(endpoint.base_url(), "http://localhost:8080/drive/v3/");
}

#[test]
fn test_typed_options_selector() {
    let registry = registry();
    let options = ClientOptions::new().with("version", "v1");
    let endpoint = registry.api("storage").unwrap().call(options).unwrap();

    assert_eq!(endpoint.base_url(), "https://www.googleapis.com/storage/v1/");
    assert_eq!(
        endpoint.method_ids(),
        vec!["storage.buckets.insert", "storage.buckets.list"]
    );
    assert_eq!(endpoint.method("storage.buckets.insert").unwrap().http_method, "POST");
}

#[test]
fn test_unknown_api_is_absent() {
    let registry = registry();
    assert!(registry.api("notanapi").is_none());
    assert!(!registry.has_api("notanapi"));
    assert!(registry.get("notanapi", "v1").is_none());
}

#[test]
fn test_unsupported_selectors_are_argument_errors() {
    let registry = registry();
    let names_before = registry.api_names();
    let drive = registry.api("drive").unwrap();

    for value in [json!(true), json!(3), json!(null), json!(["v3"])] {
        let err = drive.call_value(value).unwrap_err();
        assert!(
            matches!(err, FactoryError::Argument { .. }),
            "unexpected error {err}"
        );
        assert!(err.to_string().contains("Accepts only string or object"));
    }

    assert_eq!(registry.api_names(), names_before);
}

#[test]
fn test_unresolvable_version_is_construction_error() {
    let registry = registry();
    let err = registry.api("drive").unwrap().call("v999").unwrap_err();

    let message = err.to_string();
    assert!(message.contains("drive"));
    assert!(message.contains("v999"));

    match &err {
        FactoryError::Construction { api, version, .. } => {
            assert_eq!(api, "drive");
            assert_eq!(version, "v999");
        }
        other => panic!("expected construction error, got {other:?}"),
    }
    let cause = err.source().expect("cause is kept");
    assert!(!cause.to_string().is_empty());
    assert!(matches!(
        cause.downcast_ref::<ResolveError>(),
        Some(ResolveError::Io { .. })
    ));
}

#[test]
fn test_path_like_version_is_rejected() {
    let registry = registry();
    let err = registry.api("drive").unwrap().call("../drive/v3").unwrap_err();
    assert!(err.is_construction());
    assert!(matches!(
        err.source().and_then(|s| s.downcast_ref::<ResolveError>()),
        Some(ResolveError::InvalidVersion(_))
    ));
}

#[test]
fn test_each_call_builds_a_fresh_endpoint() {
    let registry = registry();
    let drive = registry.api("drive").unwrap();
    let first = drive.call("v3").unwrap();
    let second = drive.call("v3").unwrap();
    assert!(!first.ptr_eq(&second));
}

#[test]
fn test_endpoints_share_the_registry_auth() {
    let registry = registry();
    let drive = registry.get("drive", "v3").unwrap().unwrap();
    let storage = registry.get("storage", "v1").unwrap().unwrap();

    assert!(Arc::ptr_eq(&drive.auth().unwrap(), registry.auth()));
    assert!(Arc::ptr_eq(&storage.auth().unwrap(), registry.auth()));

    registry
        .auth()
        .set_credential(apifactory::Credential::bearer("token-123"));
    assert_eq!(
        drive.auth().unwrap().authorization_header().as_deref(),
        Some("Bearer token-123")
    );
}

#[test]
fn test_add_apis_twice_is_idempotent() {
    let registry = registry();
    let catalog: ApiCatalog = [(
        "someapi".to_string(),
        Arc::new(
            VersionedModules::new("someapi").with_descriptor(ApiDescriptor::new("someapi", "v1")),
        ) as Arc<dyn ApiLoader>,
    )]
    .into_iter()
    .collect();

    registry.add_apis(catalog.clone());
    let names = registry.api_names();
    registry.add_apis(catalog);

    assert_eq!(registry.api_names(), names);
    assert_eq!(registry.api("someapi").unwrap().call("v1").unwrap().name(), "someapi");
    assert_eq!(registry.api("drive").unwrap().call("v3").unwrap().name(), "drive");
}

#[test]
fn test_options_are_kept_verbatim() {
    let mut options = RegistryOptions::new().with_apis_dir(fixtures_dir());
    options.extra.insert("quota_user".to_string(), json!("team-a"));
    let registry = ApiRegistry::with_options(options.clone()).unwrap();
    assert_eq!(registry.options(), &options);
}
