//! Plugin packaging
//!
//! Produces `<name>.zip` from two trees:
//!
//! - the plugin source tree, filtered by the exclusion set, with entries at
//!   their path relative to the project root;
//! - the built documentation, unfiltered, under `<name>/docs/`.
//!
//! Excluded directories are pruned, so nothing below them is visited.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufWriter, Seek, Write};
use std::path::{Component, Path};

use anyhow::{Context, Result};
use serde::Serialize;
use thiserror::Error;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::domain::ExclusionSet;
use crate::storage::PluginProject;

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("Duplicate archive entry: {0}")]
    DuplicateEntry(String),

    #[error("Path cannot be stored in the archive: {0}")]
    InvalidPath(String),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PackageOptions {
    /// Keep test directories in the archive
    pub include_tests: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackageReport {
    pub archive: String,
    pub entries: Vec<String>,
}

/// Exclusions for a package build: configured patterns plus test dirs
pub fn exclusions(project: &PluginProject, options: PackageOptions) -> Result<ExclusionSet> {
    let plugin = &project.config().plugin;
    let mut set = ExclusionSet::from_patterns(&plugin.excludes)?;

    if !options.include_tests {
        for test_dir in &plugin.tests {
            set.add(test_dir)?;
        }
    }

    Ok(set)
}

/// Writes the plugin archive
///
/// Docs are expected to be built already. On failure the partially written
/// archive stays on disk.
pub fn run(project: &PluginProject, options: PackageOptions) -> Result<PackageReport> {
    let excludes = exclusions(project, options)?;
    let archive_path = project.package_file();

    if let Some(parent) = archive_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let file = File::create(&archive_path)
        .with_context(|| format!("Failed to create archive: {}", archive_path.display()))?;
    let mut archive = PackageArchive::new(BufWriter::new(file));

    add_source_tree(&mut archive, project, &excludes)?;
    add_docs_tree(&mut archive, project)?;

    let entries = archive
        .finish()
        .with_context(|| format!("Failed to finish archive: {}", archive_path.display()))?;
    tracing::info!(archive = %archive_path.display(), entries = entries.len(), "package written");

    Ok(PackageReport {
        archive: archive_path.display().to_string(),
        entries,
    })
}

fn add_source_tree<W: Write + Seek>(
    archive: &mut PackageArchive<W>,
    project: &PluginProject,
    excludes: &ExclusionSet,
) -> Result<()> {
    let source_dir = project.source_dir();

    let walker = WalkDir::new(&source_dir)
        .sort_by_file_name()
        .into_iter()
        // The tree root itself is never filtered
        .filter_entry(|e| e.depth() == 0 || !excludes.is_excluded(&e.file_name().to_string_lossy()));

    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", source_dir.display()))?;
        // Links to directories are listed but not descended
        if entry.file_type().is_dir() || entry.path().is_dir() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(project.root())
            .with_context(|| {
                format!(
                    "Plugin source {} is outside the project root",
                    entry.path().display()
                )
            })?;
        archive.add_file(entry.path(), &archive_name(None, relative)?)?;
    }

    Ok(())
}

fn add_docs_tree<W: Write + Seek>(
    archive: &mut PackageArchive<W>,
    project: &PluginProject,
) -> Result<()> {
    let build_dir = project.docs_build_dir();
    if !build_dir.is_dir() {
        tracing::warn!(dir = %build_dir.display(), "no built docs to package");
        return Ok(());
    }

    let prefix = format!("{}/docs", project.plugin_name());
    for entry in WalkDir::new(&build_dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", build_dir.display()))?;
        if entry.file_type().is_dir() || entry.path().is_dir() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(&build_dir)
            .with_context(|| format!("Unexpected path outside {}", build_dir.display()))?;
        archive.add_file(entry.path(), &archive_name(Some(&prefix), relative)?)?;
    }

    Ok(())
}

/// Joins path components with `/`, optionally under a prefix
pub fn archive_name(prefix: Option<&str>, relative: &Path) -> Result<String, PackageError> {
    let mut parts: Vec<&str> = prefix.into_iter().collect();

    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(
                part.to_str()
                    .ok_or_else(|| PackageError::InvalidPath(relative.display().to_string()))?,
            ),
            Component::CurDir => {}
            _ => return Err(PackageError::InvalidPath(relative.display().to_string())),
        }
    }

    Ok(parts.join("/"))
}

/// Write-once zip archive; each entry name may be written only once
pub struct PackageArchive<W: Write + Seek> {
    writer: ZipWriter<W>,
    options: SimpleFileOptions,
    written: HashSet<String>,
    entries: Vec<String>,
}

impl<W: Write + Seek> PackageArchive<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: ZipWriter::new(inner),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
            written: HashSet::new(),
            entries: Vec::new(),
        }
    }

    /// Streams `path` into the archive as `name`
    pub fn add_file(&mut self, path: &Path, name: &str) -> Result<()> {
        if !self.written.insert(name.to_string()) {
            return Err(PackageError::DuplicateEntry(name.to_string()).into());
        }

        let mut source =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

        self.writer
            .start_file(name, self.options)
            .with_context(|| format!("Failed to add archive entry: {}", name))?;
        io::copy(&mut source, &mut self.writer)
            .with_context(|| format!("Failed to write archive entry: {}", name))?;

        tracing::debug!(entry = name, "archived");
        self.entries.push(name.to_string());
        Ok(())
    }

    /// Writes the central directory; returns the entry names in write order
    pub fn finish(self) -> Result<Vec<String>> {
        let mut inner = self.writer.finish()?;
        inner.flush()?;
        Ok(self.entries)
    }
}
