//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::task_cmd::{self, Invocation};
use crate::domain::{BuildTask, TaskGraph};
use crate::logging;
use crate::storage::PluginProject;
use crate::tasks::{SystemRunner, TaskContext};

#[derive(Parser)]
#[command(name = "pave")]
#[command(author, version, about = "Build, package and deploy the templatescreator QGIS plugin")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (defaults to the nearest directory containing pave.toml)
    #[arg(long, global = true, env = "PAVE_ROOT")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install dependencies into the staging directory
    Setup {
        /// Clean out dependencies first
        #[arg(long, short)]
        clean: bool,
    },

    /// Install the plugin into the QGIS 2 profile
    Install,

    /// Install the plugin into the QGIS dev profile
    Installdev,

    /// Install the plugin into the QGIS 3 profile
    Install3,

    /// Create the plugin zip package (builds docs first)
    Package {
        /// Package tests with the plugin
        #[arg(long, short)]
        tests: bool,
    },

    /// Build the documentation
    Builddocs,

    /// Install development tools
    #[command(alias = "install_devtools")]
    InstallDevtools,

    /// Check code for PEP8 violations
    Pep8 {
        /// Extra arguments passed to pep8
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Format code according to PEP8
    Autopep8 {
        /// Extra arguments passed to autopep8
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Check code for errors and coding standard violations
    Pylint {
        /// Extra arguments passed to pylint
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// List available tasks
    List,
}

impl Commands {
    /// The task this command runs, with its options
    fn into_invocation(self) -> Option<(BuildTask, Invocation)> {
        let mut invocation = Invocation::default();

        let task = match self {
            Commands::Setup { clean } => {
                invocation.clean = clean;
                BuildTask::Setup
            }
            Commands::Install => BuildTask::Install,
            Commands::Installdev => BuildTask::InstallDev,
            Commands::Install3 => BuildTask::Install3,
            Commands::Package { tests } => {
                invocation.include_tests = tests;
                BuildTask::Package
            }
            Commands::Builddocs => BuildTask::BuildDocs,
            Commands::InstallDevtools => BuildTask::InstallDevtools,
            Commands::Pep8 { args } => {
                invocation.args = args;
                BuildTask::Pep8
            }
            Commands::Autopep8 { args } => {
                invocation.args = args;
                BuildTask::Autopep8
            }
            Commands::Pylint { args } => {
                invocation.args = args;
                BuildTask::Pylint
            }
            Commands::List => return None,
        };

        Some((task, invocation))
    }
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let output = Output::new(cli.format);

    tracing::debug!("pave starting");
    let graph = TaskGraph::standard();

    let Some((target, invocation)) = cli.command.into_invocation() else {
        list_tasks(&output, &graph);
        return Ok(());
    };

    let project = match cli.root {
        Some(root) => PluginProject::open(root)?,
        None => PluginProject::open_current()?,
    };
    tracing::debug!(root = %project.root().display(), plugin = project.plugin_name(), "project loaded");

    let runner = SystemRunner;
    let ctx = TaskContext::new(&project, &runner);

    for task in graph.execution_plan(target)? {
        tracing::info!(%task, "running task");
        // Options only apply to the task that was asked for
        let task_invocation = if task == target {
            invocation.clone()
        } else {
            Invocation::default()
        };
        task_cmd::execute(task, &task_invocation, &ctx, &output)?;
    }

    tracing::debug!("command completed successfully");
    Ok(())
}

fn list_tasks(output: &Output, graph: &TaskGraph) {
    if output.is_json() {
        let tasks: Vec<_> = BuildTask::ALL
            .iter()
            .map(|task| {
                serde_json::json!({
                    "name": task.name(),
                    "description": task.description(),
                    "depends_on": graph
                        .dependencies(*task)
                        .iter()
                        .map(|t| t.name())
                        .collect::<Vec<_>>(),
                })
            })
            .collect();
        output.data(&tasks);
        return;
    }

    output.line("Tasks:");
    for task in BuildTask::ALL {
        let deps: Vec<_> = graph.dependencies(task).iter().map(|t| t.name()).collect();
        let description = if deps.is_empty() {
            task.description().to_string()
        } else {
            format!("{} (runs {} first)", task.description(), deps.join(", "))
        };
        let name = format!("  {:<18}", task.name());
        output.row(&[name.as_str(), description.as_str()]);
    }
}
