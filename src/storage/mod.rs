//! # Storage Layer
//!
//! Locating the plugin project and loading its build configuration.
//!
//! ## Project Files
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Build config | TOML (optional) | `pave.toml` |
//! | Requirements | Text, split by `# test requirements` | `requirements.txt` |
//! | Dev tools | pip requirements | `requirements-dev.txt` |
//! | Settings manifest | JSON array | `{source_dir}/settings.json` |
//!
//! ## Key Types
//!
//! - [`PluginProject`] - Project root plus resolved paths
//! - [`BuildConfig`] - Parsed `pave.toml` with defaults filled in

mod config;
mod project;

pub use config::{BuildConfig, ConfigError, DocsOptions, PluginOptions, ToolOptions, CONFIG_FILE};
pub use project::{PluginProject, REQUIREMENTS_FILE, SETTINGS_DOC_FILE, SETTINGS_FILE};
