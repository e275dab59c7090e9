//! Documentation build

use anyhow::{bail, Context, Result};
use serde::Serialize;

use super::{TaskContext, ToolCommand};
use crate::domain::write_settings_doc;

#[derive(Debug, Clone, Serialize)]
pub struct DocsReport {
    pub settings_documented: usize,
    pub submodules_synced: bool,
    pub build_dir: String,
}

/// Regenerates the settings page and runs the docs builder
pub fn run(ctx: &TaskContext<'_>) -> Result<DocsReport> {
    let project = ctx.project;

    // Optional pre-step, result ignored: checkouts outside git have no submodules
    let submodules_synced = sync_submodules(ctx);

    let manifest = project.settings_manifest();
    let doc_file = project.settings_doc();
    let settings_documented = write_settings_doc(&manifest, &doc_file)?;
    tracing::info!(count = settings_documented, file = %doc_file.display(), "settings page written");

    let docroot = project.docs_root();
    let command = ToolCommand::from_argv(&project.config().docs.builder)
        .context("docs.builder must name a command")?
        .current_dir(&docroot)
        .missing_hint("Install it or set docs.builder in pave.toml.");

    let outcome = ctx
        .runner
        .run(&command)
        .with_context(|| format!("Failed to build docs in {}", docroot.display()))?;
    if !outcome.success() {
        bail!(
            "Documentation build failed: {} ({})",
            command.display(),
            outcome.status_text()
        );
    }

    Ok(DocsReport {
        settings_documented,
        submodules_synced,
        build_dir: project.docs_build_dir().display().to_string(),
    })
}

/// Runs `git submodule init` and `git submodule update`; true if both succeed
fn sync_submodules(ctx: &TaskContext<'_>) -> bool {
    for step in ["init", "update"] {
        let command = ToolCommand::new("git")
            .args(["submodule", step])
            .current_dir(ctx.project.root());

        match ctx.runner.run(&command) {
            Ok(outcome) if outcome.success() => {}
            Ok(outcome) => {
                tracing::debug!(step, status = %outcome.status_text(), "submodule sync skipped");
                return false;
            }
            Err(e) => {
                tracing::debug!(step, error = %e, "submodule sync skipped");
                return false;
            }
        }
    }
    true
}
