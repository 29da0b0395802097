//! Endpoint module resolution
//!
//! A registry maps each API name to an [`ApiLoader`], which owns the version
//! namespace of that API. Three loaders ship with the crate:
//!
//! - [`VersionedModules`]: modules already in memory (in-process builds and
//!   discovery results).
//! - [`EmbeddedLoader`]: the API documents compiled into the binary from
//!   `apis/<name>/<version>.json` (or `.yaml` / `.yml`).
//! - [`DirectoryLoader`]: the same layout read from a directory at runtime,
//!   used when a registry is given an `apis_dir` override.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use rust_embed::{EmbeddedFile, RustEmbed};

use crate::descriptor::{ApiDescriptor, parse_document};
use crate::endpoint::{DescriptorModule, EndpointModule};
use crate::error::{BoxError, ResolveError};

/// Name → loader mapping used to populate a registry
pub type ApiCatalog = HashMap<String, Arc<dyn ApiLoader>>;

/// Resolves versions of one API to endpoint modules
pub trait ApiLoader: Send + Sync {
    /// Look up the module whose identity equals `version`
    fn load(&self, version: &str) -> Result<Arc<dyn EndpointModule>, BoxError>;

    /// Versions this loader knows about, sorted. Empty when unknown.
    fn versions(&self) -> Vec<String> {
        Vec::new()
    }
}

static VERSION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("version pattern is valid")
});

/// Reject anything that is not a single path-safe segment
pub fn validate_version(version: &str) -> Result<(), ResolveError> {
    if version.is_empty() {
        return Err(ResolveError::MissingVersion);
    }
    if !VERSION_PATTERN.is_match(version) {
        return Err(ResolveError::InvalidVersion(version.to_string()));
    }
    Ok(())
}

/// In-memory version namespace for one API
#[derive(Clone, Default)]
pub struct VersionedModules {
    api: String,
    modules: BTreeMap<String, Arc<dyn EndpointModule>>,
}

impl VersionedModules {
    pub fn new(api: impl Into<String>) -> Self {
        Self {
            api: api.into(),
            modules: BTreeMap::new(),
        }
    }

    /// Add a module under its own version; last write wins
    pub fn insert(&mut self, module: Arc<dyn EndpointModule>) {
        self.modules.insert(module.version().to_string(), module);
    }

    pub fn with(mut self, module: Arc<dyn EndpointModule>) -> Self {
        self.insert(module);
        self
    }

    /// Shorthand for a descriptor-backed module
    pub fn with_descriptor(self, descriptor: ApiDescriptor) -> Self {
        self.with(Arc::new(DescriptorModule::new(descriptor)))
    }

    pub fn api(&self) -> &str {
        &self.api
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl ApiLoader for VersionedModules {
    fn load(&self, version: &str) -> Result<Arc<dyn EndpointModule>, BoxError> {
        validate_version(version)?;
        self.modules.get(version).cloned().ok_or_else(|| {
            ResolveError::UnknownVersion {
                api: self.api.clone(),
                version: version.to_string(),
                available: self.versions(),
            }
            .into()
        })
    }

    fn versions(&self) -> Vec<String> {
        self.modules.keys().cloned().collect()
    }
}

impl fmt::Debug for VersionedModules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionedModules")
            .field("api", &self.api)
            .field("versions", &self.versions())
            .finish()
    }
}

const DOCUMENT_EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

fn has_document_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| DOCUMENT_EXTENSIONS.contains(&ext))
}

/// Parse a bundled document and check it describes `api` at `version`
fn descriptor_module(
    api: &str,
    version: &str,
    content: &str,
    path: &Path,
) -> Result<Arc<dyn EndpointModule>, ResolveError> {
    let value = parse_document(content, &path.to_string_lossy()).map_err(|message| {
        ResolveError::Parse {
            path: path.to_path_buf(),
            message,
        }
    })?;
    let descriptor = ApiDescriptor::from_value(value).map_err(|e| ResolveError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    if descriptor.name != api || descriptor.version != version {
        return Err(ResolveError::Parse {
            path: path.to_path_buf(),
            message: format!(
                "document describes {}(\"{}\")",
                descriptor.name, descriptor.version
            ),
        });
    }

    Ok(Arc::new(DescriptorModule::new(descriptor)))
}

/// API documents compiled into the binary
#[derive(RustEmbed)]
#[folder = "apis/"]
struct BundledDocuments;

/// Version namespace backed by the documents embedded at build time
#[derive(Debug, Clone)]
pub struct EmbeddedLoader {
    api: String,
}

impl EmbeddedLoader {
    pub fn new(api: impl Into<String>) -> Self {
        Self { api: api.into() }
    }

    fn document(&self, version: &str) -> Option<(PathBuf, EmbeddedFile)> {
        DOCUMENT_EXTENSIONS.iter().find_map(|ext| {
            let path = format!("{}/{version}.{ext}", self.api);
            BundledDocuments::get(&path).map(|file| (PathBuf::from(path), file))
        })
    }
}

impl ApiLoader for EmbeddedLoader {
    fn load(&self, version: &str) -> Result<Arc<dyn EndpointModule>, BoxError> {
        validate_version(version)?;

        let (path, file) = self.document(version).ok_or_else(|| ResolveError::UnknownVersion {
            api: self.api.clone(),
            version: version.to_string(),
            available: self.versions(),
        })?;
        tracing::debug!(api = %self.api, path = %path.display(), "Loading embedded API document");

        let content = std::str::from_utf8(&file.data).map_err(|e| ResolveError::Parse {
            path: path.clone(),
            message: e.to_string(),
        })?;
        Ok(descriptor_module(&self.api, version, content, &path)?)
    }

    fn versions(&self) -> Vec<String> {
        let prefix = format!("{}/", self.api);
        let mut versions: Vec<String> = BundledDocuments::iter()
            .filter_map(|file| {
                let path = Path::new(file.strip_prefix(&prefix)?);
                if !has_document_extension(path) {
                    return None;
                }
                path.file_stem()?.to_str().map(str::to_string)
            })
            .collect();
        versions.sort();
        versions.dedup();
        versions
    }
}

/// Version namespace backed by a directory of discovery documents
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    api: String,
    dir: PathBuf,
}

impl DirectoryLoader {
    pub fn new(api: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            api: api.into(),
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn document_path(&self, version: &str) -> Option<PathBuf> {
        DOCUMENT_EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(format!("{version}.{ext}")))
            .find(|path| path.is_file())
    }
}

impl ApiLoader for DirectoryLoader {
    fn load(&self, version: &str) -> Result<Arc<dyn EndpointModule>, BoxError> {
        validate_version(version)?;

        let path = self
            .document_path(version)
            .unwrap_or_else(|| self.dir.join(format!("{version}.json")));
        tracing::debug!(api = %self.api, path = %path.display(), "Loading API document");

        let content = std::fs::read_to_string(&path).map_err(|source| ResolveError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(descriptor_module(&self.api, version, &content, &path)?)
    }

    fn versions(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        let mut versions: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| has_document_extension(path))
            .filter_map(|path| path.file_stem()?.to_str().map(str::to_string))
            .collect();
        versions.sort();
        versions.dedup();
        versions
    }
}

/// Names of the APIs bundled with the registry
pub const BUNDLED_APIS: &[&str] = &[
    "acceleratedmobilepageurl",
    "adexchangebuyer",
    "adexchangebuyer2",
    "adexchangeseller",
    "adexperiencereport",
    "admin",
    "adsense",
    "adsensehost",
    "analytics",
    "analyticsreporting",
    "androidenterprise",
    "androidpublisher",
    "appengine",
    "appsactivity",
    "appstate",
    "bigquery",
    "bigquerydatatransfer",
    "blogger",
    "books",
    "calendar",
    "civicinfo",
    "classroom",
    "cloudbilling",
    "cloudbuild",
    "clouddebugger",
    "clouderrorreporting",
    "cloudfunctions",
    "cloudkms",
    "cloudmonitoring",
    "cloudresourcemanager",
    "cloudtrace",
    "clouduseraccounts",
    "compute",
    "consumersurveys",
    "container",
    "content",
    "customsearch",
    "dataflow",
    "dataproc",
    "datastore",
    "deploymentmanager",
    "dfareporting",
    "discovery",
    "dlp",
    "dns",
    "doubleclickbidmanager",
    "doubleclicksearch",
    "drive",
    "firebasedynamiclinks",
    "firebaserules",
    "fitness",
    "fusiontables",
    "games",
    "gamesConfiguration",
    "gamesManagement",
    "genomics",
    "gmail",
    "groupsmigration",
    "groupssettings",
    "iam",
    "identitytoolkit",
    "kgsearch",
    "language",
    "licensing",
    "logging",
    "manufacturers",
    "mirror",
    "ml",
    "monitoring",
    "oauth2",
    "oslogin",
    "pagespeedonline",
    "partners",
    "people",
    "playmoviespartner",
    "plus",
    "plusDomains",
    "prediction",
    "proximitybeacon",
    "pubsub",
    "qpxExpress",
    "replicapool",
    "replicapoolupdater",
    "reseller",
    "resourceviews",
    "runtimeconfig",
    "safebrowsing",
    "script",
    "searchconsole",
    "servicecontrol",
    "servicemanagement",
    "serviceuser",
    "sheets",
    "siteVerification",
    "slides",
    "sourcerepo",
    "spanner",
    "spectrum",
    "speech",
    "sqladmin",
    "storage",
    "storagetransfer",
    "streetviewpublish",
    "surveys",
    "tagmanager",
    "taskqueue",
    "tasks",
    "toolresults",
    "translate",
    "urlshortener",
    "videointelligence",
    "vision",
    "webfonts",
    "webmasters",
    "youtube",
    "youtubeAnalytics",
    "youtubereporting",
];

/// Bind every bundled API name to its loader.
///
/// Documents come from the binary unless `apis_dir` overrides them, in which
/// case each name reads from `<apis_dir>/<name>/`.
pub fn bundled_catalog(apis_dir: Option<&Path>) -> ApiCatalog {
    BUNDLED_APIS
        .iter()
        .map(|name| {
            let loader: Arc<dyn ApiLoader> = match apis_dir {
                Some(dir) => Arc::new(DirectoryLoader::new(*name, dir.join(name))),
                None => Arc::new(EmbeddedLoader::new(*name)),
            };
            (name.to_string(), loader)
        })
        .collect()
}
