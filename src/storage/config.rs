//! Build configuration
//!
//! Options live in `pave.toml` at the project root. Every key is optional;
//! the defaults describe the templatescreator plugin layout.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the configuration file at the project root
pub const CONFIG_FILE: &str = "pave.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Plugin layout and packaging options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginOptions {
    /// Plugin name; also the archive name and the installed folder name
    pub name: String,

    /// Plugin source tree (defaults to the plugin name)
    pub source_dir: Option<PathBuf>,

    /// Staging directory for installed dependencies
    pub ext_libs: Option<PathBuf>,

    /// Vendored third-party sources
    pub ext_src: Option<PathBuf>,

    /// Directory receiving `<name>.zip`
    pub package_dir: PathBuf,

    /// Test directory names, excluded from packages unless requested
    pub tests: Vec<String>,

    /// Glob patterns for names never packaged
    pub excludes: Vec<String>,
}

impl Default for PluginOptions {
    fn default() -> Self {
        Self {
            name: "templatescreator".to_string(),
            source_dir: None,
            ext_libs: None,
            ext_src: None,
            package_dir: PathBuf::from("."),
            tests: vec!["test".to_string(), "tests".to_string()],
            excludes: vec!["*.pyc".to_string(), ".git".to_string()],
        }
    }
}

impl PluginOptions {
    pub fn source_dir(&self) -> PathBuf {
        self.source_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.name))
    }

    pub fn ext_libs(&self) -> PathBuf {
        self.ext_libs
            .clone()
            .unwrap_or_else(|| self.source_dir().join("ext-libs"))
    }

    pub fn ext_src(&self) -> PathBuf {
        self.ext_src
            .clone()
            .unwrap_or_else(|| self.source_dir().join("ext-src"))
    }

    /// Path of the package archive, relative to the project root
    pub fn package_file(&self) -> PathBuf {
        self.package_dir.join(format!("{}.zip", self.name))
    }
}

/// Sphinx documentation options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsOptions {
    /// Directory the generator runs in
    pub docroot: PathBuf,

    /// Sphinx source directory (receives `settingsconf.rst`)
    pub sourcedir: PathBuf,

    /// Generator output, packaged under `<name>/docs/`
    pub builddir: PathBuf,

    /// Generator command line
    pub builder: Vec<String>,
}

impl Default for DocsOptions {
    fn default() -> Self {
        Self {
            docroot: PathBuf::from("docs"),
            sourcedir: PathBuf::from("docs/source"),
            builddir: PathBuf::from("docs/build"),
            builder: vec!["make".to_string(), "html".to_string()],
        }
    }
}

/// External tool options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolOptions {
    /// Installer command template (placeholders: {staging}, {requirement})
    pub installer: Vec<String>,

    /// Requirements file for the development tools
    pub dev_requirements: PathBuf,
}

impl Default for ToolOptions {
    fn default() -> Self {
        Self {
            installer: vec![
                "pip".to_string(),
                "install".to_string(),
                "--target".to_string(),
                "{staging}".to_string(),
                "{requirement}".to_string(),
            ],
            dev_requirements: PathBuf::from("requirements-dev.txt"),
        }
    }
}

/// Complete build configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BuildConfig {
    pub plugin: PluginOptions,
    pub docs: DocsOptions,
    pub tools: ToolOptions,
}

impl BuildConfig {
    /// Parses and validates configuration text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: BuildConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `pave.toml` from the project root, or defaults if absent
    pub fn load(project_root: &Path) -> Result<Self> {
        let config_path = project_root.join(CONFIG_FILE);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config: {}", config_path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Failed to load config: {}", config_path.display()))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let name = self.plugin.name.trim();
        if name.is_empty() {
            return Err(ConfigError::Invalid("plugin.name must not be empty".to_string()));
        }
        if name.contains(['/', '\\']) {
            return Err(ConfigError::Invalid(format!(
                "plugin.name must be a single path component: {}",
                name
            )));
        }
        if self.docs.builder.is_empty() {
            return Err(ConfigError::Invalid("docs.builder must name a command".to_string()));
        }
        if self.tools.installer.is_empty() {
            return Err(ConfigError::Invalid(
                "tools.installer must name a command".to_string(),
            ));
        }
        Ok(())
    }

    /// Walks up from `start` looking for `pave.toml`
    pub fn find_project_root(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            if current.join(CONFIG_FILE).is_file() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }
}
