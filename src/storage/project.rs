//! Project layout
//!
//! Resolves the configured relative paths against the project root.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::config::BuildConfig;

/// Requirements file at the project root
pub const REQUIREMENTS_FILE: &str = "requirements.txt";

/// Settings manifest inside the plugin source tree
pub const SETTINGS_FILE: &str = "settings.json";

/// Generated settings page inside the docs source tree
pub const SETTINGS_DOC_FILE: &str = "settingsconf.rst";

/// A plugin project: its root directory plus build configuration
#[derive(Debug, Clone)]
pub struct PluginProject {
    root: PathBuf,
    config: BuildConfig,
}

impl PluginProject {
    /// Creates a project from an explicit root and configuration
    pub fn new(root: impl Into<PathBuf>, config: BuildConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    /// Opens the project at `root`, loading `pave.toml` if present
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let root = root
            .canonicalize()
            .with_context(|| format!("Project root not found: {}", root.display()))?;
        let config = BuildConfig::load(&root)?;

        Ok(Self::new(root, config))
    }

    /// Opens the nearest project at or above the current directory
    ///
    /// Falls back to the current directory when no `pave.toml` is found.
    pub fn open_current() -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        let root = BuildConfig::find_project_root(&cwd).unwrap_or(cwd);

        Self::open(root)
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the configuration
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Resolves a configured path against the project root
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        if relative.is_absolute() {
            relative.to_path_buf()
        } else {
            self.root.join(relative)
        }
    }

    pub fn plugin_name(&self) -> &str {
        &self.config.plugin.name
    }

    pub fn source_dir(&self) -> PathBuf {
        self.resolve(&self.config.plugin.source_dir())
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.resolve(&self.config.plugin.ext_libs())
    }

    pub fn vendored_dir(&self) -> PathBuf {
        self.resolve(&self.config.plugin.ext_src())
    }

    pub fn requirements_file(&self) -> PathBuf {
        self.root.join(REQUIREMENTS_FILE)
    }

    pub fn dev_requirements_file(&self) -> PathBuf {
        self.resolve(&self.config.tools.dev_requirements)
    }

    pub fn settings_manifest(&self) -> PathBuf {
        self.source_dir().join(SETTINGS_FILE)
    }

    pub fn settings_doc(&self) -> PathBuf {
        self.resolve(&self.config.docs.sourcedir).join(SETTINGS_DOC_FILE)
    }

    pub fn docs_root(&self) -> PathBuf {
        self.resolve(&self.config.docs.docroot)
    }

    pub fn docs_build_dir(&self) -> PathBuf {
        self.resolve(&self.config.docs.builddir)
    }

    pub fn package_file(&self) -> PathBuf {
        self.resolve(&self.config.plugin.package_file())
    }
}
