//! Local deployment into a QGIS profile
//!
//! The plugin source tree is linked (or, without symlink support, copied)
//! to `~/<profile>/python/plugins/<name>`, where QGIS discovers plugins.

use std::fs;
#[cfg(not(unix))]
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::BaseDirs;
use serde::Serialize;
use walkdir::WalkDir;

use crate::storage::PluginProject;

/// QGIS installation channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// QGIS 2 (`~/.qgis2`)
    Stable,
    /// QGIS development builds (`~/.qgis-dev`)
    Dev,
    /// QGIS 3 (`~/.qgis3`)
    V3,
}

impl Profile {
    /// Profile folder under the home directory
    pub fn folder(self) -> &'static str {
        match self {
            Profile::Stable => ".qgis2",
            Profile::Dev => ".qgis-dev",
            Profile::V3 => ".qgis3",
        }
    }
}

/// What the install did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallAction {
    /// A symlink to the source tree was created
    Linked,
    /// Something already exists at the destination; left untouched
    AlreadyPresent,
    /// The source tree was copied over the destination
    Copied,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub action: InstallAction,
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Installs the plugin into `profile` under the user's home directory
pub fn run(project: &PluginProject, profile: Profile) -> Result<InstallReport> {
    let home = BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .context("Could not determine home directory")?;

    install_into(project, &home, profile)
}

/// Installs the plugin into `profile` under `home`
pub fn install_into(project: &PluginProject, home: &Path, profile: Profile) -> Result<InstallReport> {
    let source = project.source_dir();
    let source = source
        .canonicalize()
        .with_context(|| format!("Plugin source not found: {}", source.display()))?;
    let destination = plugin_destination(home, profile, project.plugin_name());

    let action = deploy(&source, &destination)?;
    tracing::info!(?action, source = %source.display(), destination = %destination.display(), "install");

    Ok(InstallReport {
        action,
        source,
        destination,
    })
}

/// `<home>/<profile>/python/plugins/<name>`
pub fn plugin_destination(home: &Path, profile: Profile, plugin_name: &str) -> PathBuf {
    home.join(profile.folder())
        .join("python")
        .join("plugins")
        .join(plugin_name)
}

/// Links `source` at `destination` unless something is already there
#[cfg(unix)]
pub fn deploy(source: &Path, destination: &Path) -> Result<InstallAction> {
    // symlink_metadata also sees dangling links
    if destination.symlink_metadata().is_ok() {
        return Ok(InstallAction::AlreadyPresent);
    }

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    std::os::unix::fs::symlink(source, destination).with_context(|| {
        format!(
            "Failed to link {} to {}",
            destination.display(),
            source.display()
        )
    })?;

    Ok(InstallAction::Linked)
}

/// Replaces `destination` with a fresh copy of `source`
#[cfg(not(unix))]
pub fn deploy(source: &Path, destination: &Path) -> Result<InstallAction> {
    match fs::remove_dir_all(destination) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(e).with_context(|| {
                format!("Failed to remove directory: {}", destination.display())
            })
        }
    }

    copy_tree(source, destination)?;
    Ok(InstallAction::Copied)
}

/// Recursively copies a directory tree
pub fn copy_tree(source: &Path, destination: &Path) -> Result<u64> {
    let mut copied = 0;

    for entry in WalkDir::new(source).follow_links(true) {
        let entry = entry.with_context(|| format!("Failed to walk {}", source.display()))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .with_context(|| format!("Unexpected path outside {}", source.display()))?;
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create directory: {}", target.display()))?;
        } else {
            fs::copy(entry.path(), &target).with_context(|| {
                format!(
                    "Failed to copy {} to {}",
                    entry.path().display(),
                    target.display()
                )
            })?;
            copied += 1;
        }
    }

    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::BuildConfig;
    use tempfile::TempDir;

    fn plugin_project() -> (TempDir, PluginProject) {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("templatescreator");
        fs::create_dir_all(src.join("ui")).unwrap();
        fs::write(src.join("__init__.py"), "").unwrap();
        fs::write(src.join("ui/dialog.ui"), "<ui/>").unwrap();
        let project = PluginProject::new(dir.path().canonicalize().unwrap(), BuildConfig::default());
        (dir, project)
    }

    #[test]
    fn profile_folders() {
        assert_eq!(Profile::Stable.folder(), ".qgis2");
        assert_eq!(Profile::Dev.folder(), ".qgis-dev");
        assert_eq!(Profile::V3.folder(), ".qgis3");
    }

    #[test]
    fn destination_layout() {
        let dst = plugin_destination(Path::new("/home/u"), Profile::V3, "templatescreator");
        assert_eq!(dst, PathBuf::from("/home/u/.qgis3/python/plugins/templatescreator"));
    }

    #[cfg(unix)]
    #[test]
    fn creates_link_when_absent() {
        let (_dir, project) = plugin_project();
        let home = TempDir::new().unwrap();

        let report = install_into(&project, home.path(), Profile::Stable).unwrap();

        assert_eq!(report.action, InstallAction::Linked);
        let dst = home.path().join(".qgis2/python/plugins/templatescreator");
        assert!(dst.symlink_metadata().unwrap().file_type().is_symlink());
        assert_eq!(dst.canonicalize().unwrap(), project.source_dir().canonicalize().unwrap());
        assert!(dst.join("ui/dialog.ui").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn existing_destination_is_left_untouched() {
        let (_dir, project) = plugin_project();
        let home = TempDir::new().unwrap();
        let dst = plugin_destination(home.path(), Profile::Dev, "templatescreator");
        fs::create_dir_all(&dst).unwrap();
        fs::write(dst.join("marker"), "keep").unwrap();

        let report = install_into(&project, home.path(), Profile::Dev).unwrap();

        assert_eq!(report.action, InstallAction::AlreadyPresent);
        assert!(!dst.symlink_metadata().unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(dst.join("marker")).unwrap(), "keep");
    }

    #[cfg(unix)]
    #[test]
    fn second_install_is_a_no_op() {
        let (_dir, project) = plugin_project();
        let home = TempDir::new().unwrap();

        install_into(&project, home.path(), Profile::V3).unwrap();
        let dst = plugin_destination(home.path(), Profile::V3, "templatescreator");
        let target_before = fs::read_link(&dst).unwrap();

        let report = install_into(&project, home.path(), Profile::V3).unwrap();
        assert_eq!(report.action, InstallAction::AlreadyPresent);
        assert_eq!(fs::read_link(&dst).unwrap(), target_before);
    }

    #[cfg(unix)]
    #[test]
    fn dangling_link_counts_as_present() {
        let (_dir, project) = plugin_project();
        let home = TempDir::new().unwrap();
        let dst = plugin_destination(home.path(), Profile::Stable, "templatescreator");
        fs::create_dir_all(dst.parent().unwrap()).unwrap();
        std::os::unix::fs::symlink(home.path().join("gone"), &dst).unwrap();

        let report = install_into(&project, home.path(), Profile::Stable).unwrap();
        assert_eq!(report.action, InstallAction::AlreadyPresent);
    }

    #[test]
    fn missing_source_fails() {
        let dir = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        let project = PluginProject::new(dir.path(), BuildConfig::default());

        let err = install_into(&project, home.path(), Profile::Stable).unwrap_err();
        assert!(err.to_string().contains("Plugin source not found"));
    }

    #[test]
    fn copy_tree_copies_nested_files() {
        let (_dir, project) = plugin_project();
        let target = TempDir::new().unwrap();
        let dst = target.path().join("copy");

        let copied = copy_tree(&project.source_dir(), &dst).unwrap();

        assert_eq!(copied, 2);
        assert_eq!(fs::read_to_string(dst.join("ui/dialog.ui")).unwrap(), "<ui/>");
        assert!(dst.join("__init__.py").is_file());
    }
}
