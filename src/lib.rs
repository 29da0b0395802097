//! apifactory
//!
//! Turns a catalog of API descriptions into versioned, immutable client
//! objects that share one authentication context.
//!
//! Clients come from two places:
//!
//! - the bundled catalog, bound when an [`ApiRegistry`] is created and backed
//!   by API documents compiled into the binary: `registry.api("drive")`
//!   followed by `.call("v3")`;
//! - discovery at runtime: [`ApiRegistry::discover_all`] binds every API listed
//!   in a discovery index, [`ApiRegistry::discover_api`] builds one client
//!   straight from a discovery document.
//!
//! ```
//! use apifactory::{ApiRegistry, ClientOptions};
//!
//! # fn main() -> apifactory::Result<()> {
//! let registry = ApiRegistry::new()?;
//! if let Some(drive) = registry.api("drive") {
//!     let client = drive.call(ClientOptions::new().with("version", "v3"))?;
//!     assert_eq!(client.base_url(), "https://www.googleapis.com/drive/v3/");
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod descriptor;
pub mod discovery;
pub mod endpoint;
pub mod error;
pub mod factory;
pub mod registry;
pub mod resolver;
pub mod selector;

// Re-exports
pub use auth::{AuthContext, Credential, CredentialKind};
pub use config::{DiscoveryConfig, RegistryOptions};
pub use descriptor::{ApiDescriptor, MethodDescriptor, ResourceDescriptor};
pub use discovery::{Discovery, DiscoveryClient};
pub use endpoint::{DescriptorModule, Endpoint, EndpointBuilder, EndpointModule};
pub use error::{DiscoveryError, FactoryError, ResolveError, Result};
pub use factory::EndpointFactory;
pub use registry::{ApiHandle, ApiRegistry, RegistryBuilder, WeakRegistry};
pub use resolver::{ApiCatalog, ApiLoader, DirectoryLoader, EmbeddedLoader, VersionedModules};
pub use selector::{ClientOptions, VersionSelector};
