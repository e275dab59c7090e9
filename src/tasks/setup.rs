//! Dependency installation into the staging directory

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use super::{TaskContext, ToolCommand};
use crate::domain::Requirements;

/// Environment variable pointing the installer at already-staged packages
pub const SEARCH_PATH_VAR: &str = "PYTHONPATH";

const STAGING_PLACEHOLDER: &str = "{staging}";
const REQUIREMENT_PLACEHOLDER: &str = "{requirement}";

#[derive(Debug, Clone, Copy, Default)]
pub struct SetupOptions {
    /// Remove the staging directory before installing
    pub clean: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetupReport {
    pub staging_dir: String,
    pub runtime: Vec<String>,
    pub test: Vec<String>,
}

/// Installs runtime then test requirements into the staging directory
///
/// Stops at the first failing installation.
pub fn run(ctx: &TaskContext<'_>, options: SetupOptions) -> Result<SetupReport> {
    let project = ctx.project;
    let staging = project.staging_dir();

    if options.clean {
        tracing::info!(dir = %staging.display(), "cleaning staging directory");
        remove_dir_if_exists(&staging)?;
    }

    fs::create_dir_all(&staging)
        .with_context(|| format!("Failed to create staging directory: {}", staging.display()))?;
    let staging = staging
        .canonicalize()
        .with_context(|| format!("Failed to resolve staging directory: {}", staging.display()))?;

    let requirements = Requirements::read(&project.requirements_file())?;
    tracing::info!(
        runtime = requirements.runtime.len(),
        test = requirements.test.len(),
        "installing requirements"
    );

    let template = &project.config().tools.installer;
    for requirement in requirements.all() {
        let command = installer_command(template, &staging, requirement)?;
        let outcome = ctx.runner.run(&command)?;
        if !outcome.success() {
            bail!(
                "Failed to install {}: {} ({})",
                requirement,
                command.display(),
                outcome.status_text()
            );
        }
    }

    Ok(SetupReport {
        staging_dir: staging.display().to_string(),
        runtime: requirements.runtime,
        test: requirements.test,
    })
}

/// Expands the installer template for one requirement
///
/// The requirement is appended when the template has no placeholder for it.
pub fn installer_command(
    template: &[String],
    staging: &Path,
    requirement: &str,
) -> Result<ToolCommand> {
    let Some((program, args)) = template.split_first() else {
        bail!("Installer command is empty");
    };

    let staging_str = staging.to_string_lossy();
    let mut expanded: Vec<OsString> = args
        .iter()
        .map(|arg| {
            OsString::from(
                arg.replace(STAGING_PLACEHOLDER, &staging_str)
                    .replace(REQUIREMENT_PLACEHOLDER, requirement),
            )
        })
        .collect();

    if !template.iter().any(|a| a.contains(REQUIREMENT_PLACEHOLDER)) {
        expanded.push(OsString::from(requirement));
    }

    Ok(ToolCommand::new(program.clone())
        .args(expanded)
        .env(SEARCH_PATH_VAR, staging)
        .missing_hint("Install it or set tools.installer in pave.toml."))
}

fn remove_dir_if_exists(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove directory: {}", dir.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{BuildConfig, PluginProject};
    use crate::tasks::runner::testing::RecordingRunner;
    use crate::tasks::RunError;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn project_with_requirements(content: &str) -> (TempDir, PluginProject) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("requirements.txt"), content).unwrap();
        let project = PluginProject::open(dir.path()).unwrap();
        (dir, project)
    }

    #[test]
    fn installs_runtime_then_test_requirements() {
        let (_dir, project) =
            project_with_requirements("reqA\nreqB\n# test requirements\nreqC\n");
        let runner = RecordingRunner::new();
        let ctx = TaskContext::new(&project, &runner);

        let report = run(&ctx, SetupOptions::default()).unwrap();

        assert_eq!(report.runtime, vec!["reqA", "reqB"]);
        assert_eq!(report.test, vec!["reqC"]);

        let staging = project.staging_dir().canonicalize().unwrap();
        let lines = runner.command_lines();
        assert_eq!(
            lines,
            vec![
                format!("pip install --target {} reqA", staging.display()),
                format!("pip install --target {} reqB", staging.display()),
                format!("pip install --target {} reqC", staging.display()),
            ]
        );
    }

    #[test]
    fn passes_search_path_per_command() {
        let (_dir, project) = project_with_requirements("reqA\n# test requirements\n");
        let runner = RecordingRunner::new();
        let ctx = TaskContext::new(&project, &runner);

        run(&ctx, SetupOptions::default()).unwrap();

        let staging = project.staging_dir().canonicalize().unwrap();
        let calls = runner.calls();
        assert_eq!(
            calls[0].env,
            vec![(OsString::from(SEARCH_PATH_VAR), staging.into_os_string())]
        );
    }

    #[test]
    fn clean_removes_previous_staging_contents() {
        let (_dir, project) = project_with_requirements("# test requirements\n");
        let staging = project.staging_dir();
        fs::create_dir_all(staging.join("old_pkg")).unwrap();

        let runner = RecordingRunner::new();
        let ctx = TaskContext::new(&project, &runner);
        run(&ctx, SetupOptions { clean: true }).unwrap();

        assert!(staging.is_dir());
        assert!(!staging.join("old_pkg").exists());
    }

    #[test]
    fn without_clean_keeps_staging_contents() {
        let (_dir, project) = project_with_requirements("# test requirements\n");
        let staging = project.staging_dir();
        fs::create_dir_all(staging.join("old_pkg")).unwrap();

        let runner = RecordingRunner::new();
        run(&TaskContext::new(&project, &runner), SetupOptions::default()).unwrap();

        assert!(staging.join("old_pkg").is_dir());
    }

    #[test]
    fn clean_tolerates_missing_staging_dir() {
        let (_dir, project) = project_with_requirements("# test requirements\n");
        let runner = RecordingRunner::new();

        run(&TaskContext::new(&project, &runner), SetupOptions { clean: true }).unwrap();
        assert!(project.staging_dir().is_dir());
    }

    #[test]
    fn first_failure_aborts_remaining_installs() {
        let (_dir, project) = project_with_requirements("reqA\nreqB\n# test requirements\n");
        let runner = RecordingRunner::new().answering("pip", 1, "");
        let ctx = TaskContext::new(&project, &runner);

        let err = run(&ctx, SetupOptions::default()).unwrap_err();

        assert!(err.to_string().contains("Failed to install reqA"));
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn missing_divider_fails_before_installing() {
        let (_dir, project) = project_with_requirements("reqA\n");
        let runner = RecordingRunner::new();

        let err = run(&TaskContext::new(&project, &runner), SetupOptions::default()).unwrap_err();
        assert!(format!("{:#}", err).contains("# test requirements"));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn missing_installer_is_reported() {
        let (_dir, project) = project_with_requirements("reqA\n# test requirements\n");
        let runner = RecordingRunner::new().without("pip");

        let err = run(&TaskContext::new(&project, &runner), SetupOptions::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RunError>(),
            Some(RunError::NotFound { .. })
        ));
    }

    #[test]
    fn template_placeholders_are_expanded() {
        let template: Vec<String> = ["easy_install", "-a", "-d", "{staging}"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let cmd = installer_command(&template, &PathBuf::from("/stage"), "six").unwrap();
        assert_eq!(cmd.display(), "easy_install -a -d /stage six");

        let template: Vec<String> = ["pip", "install", "{requirement}", "-t", "{staging}"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let cmd = installer_command(&template, &PathBuf::from("/stage"), "six").unwrap();
        assert_eq!(cmd.display(), "pip install six -t /stage");

        assert!(installer_command(&[], &PathBuf::from("/stage"), "six").is_err());
    }

    #[test]
    fn default_config_template() {
        let config = BuildConfig::default();
        let cmd = installer_command(&config.tools.installer, &PathBuf::from("/s"), "x").unwrap();
        assert_eq!(cmd.program, "pip");
        assert_eq!(cmd.display(), "pip install --target /s x");
    }
}
