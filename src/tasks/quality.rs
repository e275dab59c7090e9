//! Code quality tools: pep8, autopep8, pylint, and their installation

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Result};
use serde::Serialize;
use walkdir::WalkDir;

use super::{TaskContext, ToolCommand, DEVTOOLS_HINT};

/// pep8 checks that conflict with the plugin's formatting conventions
pub const PEP8_IGNORE: &[&str] = &[
    "E203", "E121", "E122", "E123", "E124", "E125", "E126", "E127", "E128", "E402",
];

pub const PEP8_MAX_LINE_LENGTH: u32 = 79;

/// Fixes autopep8 must not apply
pub const AUTOPEP8_IGNORE: &[&str] = &["E261", "E265", "E402", "E501"];

pub const DEFAULT_PYLINTRC: &str = "pylintrc";

#[derive(Debug, Clone, Default, Serialize)]
pub struct Pep8Report {
    pub violations: Vec<String>,
    pub statistics: Vec<String>,
}

/// Splits pep8 `--statistics` output into violation and statistics lines
///
/// Statistics lines start with a count followed by an error code.
pub fn split_pep8_output(stdout: &str) -> Pep8Report {
    let mut report = Pep8Report::default();

    for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
        let mut words = line.split_whitespace();
        let is_statistic = matches!(
            (words.next(), words.next()),
            (Some(count), Some(code))
                if count.chars().all(|c| c.is_ascii_digit())
                    && code.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        );

        if is_statistic {
            report.statistics.push(line.to_string());
        } else {
            report.violations.push(line.to_string());
        }
    }

    report
}

/// Directory names whose contents are third-party code, not plugin code
fn third_party_dirs(ctx: &TaskContext<'_>) -> Vec<String> {
    [ctx.project.staging_dir(), ctx.project.vendored_dir()]
        .iter()
        .filter_map(|dir| dir.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .collect()
}

/// Runs the pep8 style checker over the plugin source
///
/// Exit status 1 only means violations were found and does not fail the task.
pub fn pep8(ctx: &TaskContext<'_>, extra_args: &[String]) -> Result<Pep8Report> {
    let exclude: Vec<String> = third_party_dirs(ctx)
        .iter()
        .map(|name| format!("*/{}/*", name))
        .collect();

    let command = ToolCommand::new("pep8")
        .arg(format!("--ignore={}", PEP8_IGNORE.join(",")))
        .arg(format!("--exclude={}", exclude.join(",")))
        .arg("--repeat")
        .arg(format!("--max-line-length={}", PEP8_MAX_LINE_LENGTH))
        .arg("--statistics")
        .args(extra_args)
        .arg(ctx.project.source_dir())
        .current_dir(ctx.project.root())
        .capture_output()
        .missing_hint(DEVTOOLS_HINT);

    let outcome = ctx.runner.run(&command)?;
    match outcome.code {
        Some(0) | Some(1) => Ok(split_pep8_output(&outcome.stdout)),
        _ => bail!("pep8 failed ({})", outcome.status_text()),
    }
}

/// Adds the in-place flag and the fixed ignore list to user arguments
pub fn autopep8_args(extra_args: &[String]) -> Vec<String> {
    let mut args = extra_args.to_vec();

    if !args.iter().any(|a| a == "-i" || a == "--in-place") {
        args.push("-i".to_string());
    }
    args.push(format!("--ignore={}", AUTOPEP8_IGNORE.join(",")));

    args
}

/// Python files under `source_dir`, skipping third-party directories
pub fn python_sources(source_dir: &Path, skip: &[String]) -> Result<Vec<PathBuf>> {
    let walker = WalkDir::new(source_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !(e.file_type().is_dir()
                    && skip.iter().any(|s| e.file_name() == s.as_str()))
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "py") {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}

/// Reformats every plugin Python file in place
///
/// Returns the files handed to autopep8.
pub fn autopep8(ctx: &TaskContext<'_>, extra_args: &[String]) -> Result<Vec<PathBuf>> {
    if !ctx.runner.is_available("autopep8") {
        return Err(ToolCommand::new("autopep8").missing_hint(DEVTOOLS_HINT).not_found().into());
    }

    let files = python_sources(&ctx.project.source_dir(), &third_party_dirs(ctx))?;
    if files.is_empty() {
        tracing::info!("no python files to format");
        return Ok(files);
    }

    let command = ToolCommand::new("autopep8")
        .args(autopep8_args(extra_args))
        .args(&files)
        .current_dir(ctx.project.root())
        .missing_hint(DEVTOOLS_HINT);

    let outcome = ctx.runner.run(&command)?;
    if !outcome.success() {
        bail!("autopep8 failed ({})", outcome.status_text());
    }

    Ok(files)
}

/// Adds the default rcfile (unless one was given) to user arguments
pub fn pylint_args(extra_args: &[String]) -> Vec<String> {
    let mut args = extra_args.to_vec();

    if !args.iter().any(|a| a.contains("rcfile")) {
        args.push(format!("--rcfile={}", DEFAULT_PYLINTRC));
    }

    args
}

/// Lints the plugin source
pub fn pylint(ctx: &TaskContext<'_>, extra_args: &[String]) -> Result<()> {
    let command = ToolCommand::new("pylint")
        .args(pylint_args(extra_args))
        .arg(ctx.project.source_dir())
        .current_dir(ctx.project.root())
        .missing_hint(DEVTOOLS_HINT);

    let outcome = ctx.runner.run(&command)?;
    if !outcome.success() {
        bail!("pylint reported problems ({})", outcome.status_text());
    }

    Ok(())
}

/// Installs the development tools listed in the dev requirements file
pub fn install_devtools(ctx: &TaskContext<'_>) -> Result<()> {
    let pip = ["pip", "pip3"]
        .into_iter()
        .find(|candidate| ctx.runner.is_available(candidate))
        .ok_or_else(|| anyhow!("FATAL: Unable to find pip, please install it first!"))?;

    let requirements = ctx.project.dev_requirements_file();
    let command = ToolCommand::new(pip)
        .args(["install", "-r"])
        .arg(&requirements)
        .current_dir(ctx.project.root());

    let outcome = ctx.runner.run(&command)?;
    if !outcome.success() {
        bail!(
            "Failed to install development tools from {} ({})",
            requirements.display(),
            outcome.status_text()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::PluginProject;
    use crate::tasks::runner::testing::RecordingRunner;
    use std::fs;
    use tempfile::TempDir;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn python_project() -> (TempDir, PluginProject) {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("templatescreator");
        for file in [
            "__init__.py",
            "plugin.py",
            "gui/dialog.py",
            "gui/dialog.ui",
            "ext-libs/six.py",
            "ext-src/vendored/mod.py",
        ] {
            let path = src.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "").unwrap();
        }
        let project = PluginProject::open(dir.path()).unwrap();
        (dir, project)
    }

    #[test]
    fn splits_violations_from_statistics() {
        let stdout = "\
plugin.py:3:1: E302 expected 2 blank lines, found 1
plugin.py:10:80: E501 line too long (85 > 79 characters)
1       E302 expected 2 blank lines, found 1
4       E501 line too long (85 > 79 characters)
";
        let report = split_pep8_output(stdout);
        assert_eq!(report.violations.len(), 2);
        assert_eq!(report.statistics.len(), 2);
        assert!(report.statistics[1].starts_with("4       E501"));
    }

    #[test]
    fn pep8_command_line() {
        let (_dir, project) = python_project();
        let runner = RecordingRunner::new();
        let ctx = TaskContext::new(&project, &runner);

        pep8(&ctx, &strings(&["--show-source"])).unwrap();

        let call = &runner.calls()[0];
        assert!(call.capture);
        assert_eq!(
            call.display(),
            format!(
                "pep8 --ignore=E203,E121,E122,E123,E124,E125,E126,E127,E128,E402 \
                 --exclude=*/ext-libs/*,*/ext-src/* --repeat --max-line-length=79 \
                 --statistics --show-source {}",
                project.source_dir().display()
            )
        );
    }

    #[test]
    fn pep8_violations_do_not_fail() {
        let (_dir, project) = python_project();
        let runner = RecordingRunner::new().answering(
            "pep8",
            1,
            "a.py:1:1: E302 expected 2 blank lines\n1       E302 expected 2 blank lines\n",
        );

        let report = pep8(&TaskContext::new(&project, &runner), &[]).unwrap();
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.statistics.len(), 1);
    }

    #[test]
    fn pep8_crash_fails() {
        let (_dir, project) = python_project();
        let runner = RecordingRunner::new().answering("pep8", 2, "");
        assert!(pep8(&TaskContext::new(&project, &runner), &[]).is_err());
    }

    #[test]
    fn missing_tools_suggest_install_devtools() {
        let (_dir, project) = python_project();
        let runner = RecordingRunner::new()
            .without("pep8")
            .without("autopep8")
            .without("pylint");
        let ctx = TaskContext::new(&project, &runner);

        for err in [
            pep8(&ctx, &[]).unwrap_err(),
            autopep8(&ctx, &[]).unwrap_err(),
            pylint(&ctx, &[]).unwrap_err(),
        ] {
            assert!(err.to_string().contains("not found! Run \"pave install-devtools\"."));
        }
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn autopep8_args_add_in_place_once() {
        assert_eq!(
            autopep8_args(&[]),
            strings(&["-i", "--ignore=E261,E265,E402,E501"])
        );
        assert_eq!(
            autopep8_args(&strings(&["--in-place", "-a"])),
            strings(&["--in-place", "-a", "--ignore=E261,E265,E402,E501"])
        );
        assert_eq!(
            autopep8_args(&strings(&["-i"])),
            strings(&["-i", "--ignore=E261,E265,E402,E501"])
        );
    }

    #[test]
    fn python_sources_skip_third_party_dirs() {
        let (_dir, project) = python_project();
        let skip = strings(&["ext-libs", "ext-src"]);

        let files = python_sources(&project.source_dir(), &skip).unwrap();
        let relative: Vec<_> = files
            .iter()
            .map(|f| f.strip_prefix(project.source_dir()).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            relative,
            vec![
                PathBuf::from("__init__.py"),
                PathBuf::from("gui/dialog.py"),
                PathBuf::from("plugin.py"),
            ]
        );
    }

    #[test]
    fn autopep8_formats_plugin_files_only() {
        let (_dir, project) = python_project();
        let runner = RecordingRunner::new();

        let files = autopep8(&TaskContext::new(&project, &runner), &[]).unwrap();

        assert_eq!(files.len(), 3);
        let call = &runner.calls()[0];
        assert_eq!(call.program, "autopep8");
        let line = call.display();
        assert!(line.starts_with("autopep8 -i --ignore=E261,E265,E402,E501 "));
        assert!(!line.contains("ext-libs"));
        assert!(!line.contains("ext-src"));
    }

    #[test]
    fn pylint_defaults_rcfile() {
        assert_eq!(pylint_args(&[]), strings(&["--rcfile=pylintrc"]));
        assert_eq!(
            pylint_args(&strings(&["--rcfile=custom.rc", "-E"])),
            strings(&["--rcfile=custom.rc", "-E"])
        );
    }

    #[test]
    fn pylint_failure_reports_status() {
        let (_dir, project) = python_project();
        let runner = RecordingRunner::new().answering("pylint", 16, "");

        let err = pylint(&TaskContext::new(&project, &runner), &[]).unwrap_err();
        assert!(err.to_string().contains("exit status 16"));
        assert!(runner.calls()[0]
            .display()
            .ends_with(&format!("--rcfile=pylintrc {}", project.source_dir().display())));
    }

    #[test]
    fn install_devtools_uses_dev_requirements() {
        let (_dir, project) = python_project();
        let runner = RecordingRunner::new();

        install_devtools(&TaskContext::new(&project, &runner)).unwrap();

        assert_eq!(
            runner.command_lines(),
            vec![format!(
                "pip install -r {}",
                project.dev_requirements_file().display()
            )]
        );
    }

    #[test]
    fn install_devtools_falls_back_to_pip3() {
        let (_dir, project) = python_project();
        let runner = RecordingRunner::new().without("pip");

        install_devtools(&TaskContext::new(&project, &runner)).unwrap();
        assert_eq!(runner.calls()[0].program, "pip3");
    }

    #[test]
    fn install_devtools_without_pip_is_fatal() {
        let (_dir, project) = python_project();
        let runner = RecordingRunner::new().without("pip").without("pip3");

        let err = install_devtools(&TaskContext::new(&project, &runner)).unwrap_err();
        assert!(err.to_string().contains("FATAL: Unable to find pip"));
    }
}
