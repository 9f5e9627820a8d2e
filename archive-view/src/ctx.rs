//! Application context.
//!
//! [`ViewContext`] holds everything loaded at startup: the configuration,
//! the schema registry, the document source and the root document. It hands
//! out navigators and fulfils their page requests.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use metainfo_browser::{
    Adaptor, ArchiveContext, Navigator, SchemaRegistry, Value, ViewFlags,
    config::BrowserConfig,
    pager::Direction,
    search::{SearchOption, build_index},
    source::{DocumentSource, JsonFileSource},
    units::UnitContext,
};
use tokio::fs;

/// Config file used when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = ".archive-view.toml";

/// Paths of the files a view is built from.
#[derive(Debug, Clone)]
pub struct PathConfig {
    /// Schema JSON file.
    pub schema: PathBuf,
    /// Archive JSON file.
    pub archive: PathBuf,
    /// Browser config, `.toml` or `.json`. May be absent.
    pub config: PathBuf,
}

/// Everything a view needs, loaded once at startup.
pub struct ViewContext {
    pub config: BrowserConfig,
    pub registry: Arc<SchemaRegistry>,
    /// Where list pages missing from `document` are fetched from.
    pub source: Arc<dyn DocumentSource>,
    pub document: Arc<Value>,
    /// Unit system selected by the config.
    pub units: UnitContext,
}

impl ViewContext {
    /// Load schema, config and archive from disk.
    pub async fn load(paths: &PathConfig, overrides: &DisplayOverrides) -> anyhow::Result<Self> {
        let mut config = BrowserConfig::load(&paths.config)?;
        overrides.apply(&mut config);
        let registry = load_schema(&paths.schema).await?;
        let source: Arc<dyn DocumentSource> = Arc::new(JsonFileSource::new(&paths.archive));
        Self::new(config, registry, source).await
    }

    /// Build a context from already loaded parts.
    pub async fn new(
        config: BrowserConfig,
        registry: Arc<SchemaRegistry>,
        source: Arc<dyn DocumentSource>,
    ) -> anyhow::Result<Self> {
        let units = config.unit_context()?;
        let document = source.load().await.context("failed to load archive")?;
        Ok(Self {
            config,
            registry,
            source,
            document,
            units,
        })
    }

    pub fn flags(&self) -> ViewFlags {
        self.config.display.flags
    }

    pub fn archive(&self) -> ArchiveContext {
        ArchiveContext::new(self.registry.clone(), self.document.clone())
    }

    /// A navigator at the document root.
    pub fn navigator(&self) -> Navigator {
        Navigator::new(Adaptor::root(self.archive()), self.config.pagination)
    }

    pub fn search_index(&self) -> Vec<SearchOption> {
        build_index(&self.registry, &self.document, self.registry.root())
    }

    /// Grow a list window, fetching the newly exposed elements when the
    /// document does not carry them. Keeps fetching while a page moves the
    /// window onto elements that are still missing.
    pub async fn expand(
        &self,
        nav: &mut Navigator,
        lane: usize,
        list: &str,
        direction: Direction,
    ) -> anyhow::Result<()> {
        let mut next = nav.expand(lane, list, direction)?;
        if next.is_none() {
            next = nav.pending_request(lane, list)?;
        }
        while let Some(request) = next {
            let page = self
                .source
                .fetch_page(&request)
                .await
                .with_context(|| format!("failed to fetch {}", request.path))?;
            if page.items.is_empty() {
                warn!("empty page for {} at {}", request.path, request.offset);
                break;
            }
            if !nav.apply_page(&request, page) {
                debug!("page for {} arrived after its lane was closed", request.path);
                break;
            }
            next = nav.pending_request(lane, list)?;
        }
        Ok(())
    }
}

/// Read and resolve a schema file.
pub async fn load_schema(path: &Path) -> anyhow::Result<Arc<SchemaRegistry>> {
    if !path.exists() {
        bail!("Schema file does not exist: {}", path.display());
    }
    let content = fs::read_to_string(path).await?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("invalid JSON in {}", path.display()))?;
    let registry = SchemaRegistry::from_json(&value)
        .with_context(|| format!("failed to load schema {}", path.display()))?;
    Ok(Arc::new(registry))
}

/// Display settings given on the command line, applied over the config.
#[derive(Debug, Clone, Default)]
pub struct DisplayOverrides {
    pub show_code_specific: bool,
    pub show_all_defined: bool,
    pub show_meta: bool,
    pub unit_system: Option<String>,
}

impl DisplayOverrides {
    pub fn apply(&self, config: &mut BrowserConfig) {
        let flags = &mut config.display.flags;
        flags.show_code_specific |= self.show_code_specific;
        flags.show_all_defined |= self.show_all_defined;
        flags.show_meta |= self.show_meta;
        if let Some(system) = &self.unit_system {
            config.display.unit_system = Some(system.clone());
        }
    }
}
