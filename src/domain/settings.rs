//! Plugin settings manifest and its reStructuredText reference page
//!
//! The plugin describes its user-facing options in `settings.json`, an
//! array of descriptors carrying at least `group`, `label` and
//! `description`. The docs build turns that manifest into
//! `settingsconf.rst`, one list-table per group.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to parse settings manifest: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A single user-configurable option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingDescriptor {
    pub group: String,
    pub label: String,
    pub description: String,
}

/// Settings grouped by their `group` field, groups in first-seen order
pub type GroupedSettings<'a> = IndexMap<&'a str, Vec<&'a SettingDescriptor>>;

/// Parses the JSON descriptor array
pub fn parse_manifest(json: &str) -> Result<Vec<SettingDescriptor>, SettingsError> {
    Ok(serde_json::from_str(json)?)
}

/// Reads and parses a `settings.json` file
pub fn read_manifest(path: &Path) -> Result<Vec<SettingDescriptor>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings manifest: {}", path.display()))?;

    parse_manifest(&content).with_context(|| format!("Invalid settings manifest: {}", path.display()))
}

/// Groups descriptors, keeping their relative order within each group
pub fn group_settings(settings: &[SettingDescriptor]) -> GroupedSettings<'_> {
    let mut grouped: GroupedSettings<'_> = IndexMap::new();
    for setting in settings {
        grouped.entry(setting.group.as_str()).or_default().push(setting);
    }
    grouped
}

/// Renders the settings reference page
///
/// Labels and descriptions are copied verbatim; text containing RST markup
/// will be interpreted as markup.
pub fn render_settings_doc(settings: &[SettingDescriptor]) -> String {
    let mut doc = String::from(
        "Plugin settings\n===============\n\n\
         The plugin can be adjusted using the following settings, \
         to be found in its settings dialog.\n",
    );

    for (group_name, group) in group_settings(settings) {
        let section_marks = "-".repeat(group_name.chars().count());
        doc.push_str(&format!(
            "\n{group_name}\n{section_marks}\n\n\
             .. list-table::\n   \
             :header-rows: 1\n   \
             :stub-columns: 1\n   \
             :widths: 20 80\n   \
             :class: non-responsive\n\n   \
             * - Option\n     \
             - Description\n"
        ));

        for setting in group {
            doc.push_str(&format!(
                "   * - {}\n     - {}\n",
                setting.label, setting.description
            ));
        }
    }

    doc
}

/// Reads `manifest` and writes the rendered page to `doc_file`
///
/// Returns the number of settings documented.
pub fn write_settings_doc(manifest: &Path, doc_file: &Path) -> Result<usize> {
    let settings = read_manifest(manifest)?;

    if let Some(parent) = doc_file.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(doc_file, render_settings_doc(&settings))
        .with_context(|| format!("Failed to write settings doc: {}", doc_file.display()))?;

    Ok(settings.len())
}
