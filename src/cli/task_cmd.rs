//! Task dispatch and per-task reporting

use anyhow::Result;

use super::output::Output;
use crate::domain::BuildTask;
use crate::tasks::docs;
use crate::tasks::install::{self, InstallAction, InstallReport, Profile};
use crate::tasks::package::{self, PackageOptions};
use crate::tasks::quality;
use crate::tasks::setup::{self, SetupOptions};
use crate::tasks::TaskContext;

/// Options the user passed along with a task
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    /// `setup --clean`
    pub clean: bool,
    /// `package --tests`
    pub include_tests: bool,
    /// Pass-through arguments for the quality tools
    pub args: Vec<String>,
}

/// Runs a single task and reports its result
pub fn execute(
    task: BuildTask,
    invocation: &Invocation,
    ctx: &TaskContext<'_>,
    output: &Output,
) -> Result<()> {
    match task {
        BuildTask::Setup => {
            let report = setup::run(
                ctx,
                SetupOptions {
                    clean: invocation.clean,
                },
            )?;
            if output.is_json() {
                output.task_result(task.name(), &report);
            } else {
                output.success(&format!(
                    "Installed {} runtime and {} test requirements into {}",
                    report.runtime.len(),
                    report.test.len(),
                    report.staging_dir
                ));
            }
        }

        BuildTask::Install => run_install(task, Profile::Stable, ctx, output)?,
        BuildTask::InstallDev => run_install(task, Profile::Dev, ctx, output)?,
        BuildTask::Install3 => run_install(task, Profile::V3, ctx, output)?,

        BuildTask::BuildDocs => {
            let report = docs::run(ctx)?;
            if output.is_json() {
                output.task_result(task.name(), &report);
            } else {
                output.success(&format!(
                    "Documented {} settings; docs built in {}",
                    report.settings_documented, report.build_dir
                ));
            }
        }

        BuildTask::Package => {
            let report = package::run(
                ctx.project,
                PackageOptions {
                    include_tests: invocation.include_tests,
                },
            )?;
            if output.is_json() {
                output.task_result(task.name(), &report);
            } else {
                output.success(&format!(
                    "Created {} ({} files)",
                    report.archive,
                    report.entries.len()
                ));
            }
        }

        BuildTask::InstallDevtools => {
            quality::install_devtools(ctx)?;
            if output.is_json() {
                output.task_result(task.name(), &serde_json::json!({}));
            } else {
                output.success("Development tools installed");
            }
        }

        BuildTask::Pep8 => {
            let report = quality::pep8(ctx, &invocation.args)?;
            if output.is_json() {
                output.task_result(task.name(), &report);
            } else {
                for line in &report.violations {
                    output.line(line);
                }
                output.line("===== PEP8 SUMMARY =====");
                for line in &report.statistics {
                    output.line(line);
                }
            }
        }

        BuildTask::Autopep8 => {
            let files = quality::autopep8(ctx, &invocation.args)?;
            if output.is_json() {
                let files: Vec<_> = files.iter().map(|f| f.display().to_string()).collect();
                output.task_result(task.name(), &serde_json::json!({ "files": files }));
            } else if files.is_empty() {
                output.line("No Python files to format.");
            } else {
                output.success(&format!("Formatted {} files", files.len()));
            }
        }

        BuildTask::Pylint => {
            quality::pylint(ctx, &invocation.args)?;
            if output.is_json() {
                output.task_result(task.name(), &serde_json::json!({}));
            } else {
                output.success("pylint found no problems");
            }
        }
    }

    Ok(())
}

fn run_install(
    task: BuildTask,
    profile: Profile,
    ctx: &TaskContext<'_>,
    output: &Output,
) -> Result<()> {
    let report = install::run(ctx.project, profile)?;
    if output.is_json() {
        output.task_result(task.name(), &report);
    } else {
        output.success(&install_message(&report));
    }
    Ok(())
}

fn install_message(report: &InstallReport) -> String {
    match report.action {
        InstallAction::Linked => format!(
            "Linked {} -> {}",
            report.destination.display(),
            report.source.display()
        ),
        InstallAction::AlreadyPresent => format!(
            "{} already exists, left untouched",
            report.destination.display()
        ),
        InstallAction::Copied => format!(
            "Copied {} to {}",
            report.source.display(),
            report.destination.display()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn report(action: InstallAction) -> InstallReport {
        InstallReport {
            action,
            source: PathBuf::from("/work/templatescreator"),
            destination: PathBuf::from("/home/u/.qgis2/python/plugins/templatescreator"),
        }
    }

    #[test]
    fn install_messages_name_the_action() {
        assert!(install_message(&report(InstallAction::Linked)).starts_with("Linked "));
        assert!(install_message(&report(InstallAction::AlreadyPresent)).contains("already exists"));
        assert!(install_message(&report(InstallAction::Copied)).starts_with("Copied "));
    }

    #[test]
    fn default_invocation_has_no_options() {
        let invocation = Invocation::default();
        assert!(!invocation.clean);
        assert!(!invocation.include_tests);
        assert!(invocation.args.is_empty());
    }
}
