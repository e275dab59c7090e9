//! # Build Tasks
//!
//! Each task is a plain function taking a [`TaskContext`]: the project
//! (root + configuration) and the [`CommandRunner`] used for every external
//! tool. Tasks run synchronously, one after another.
//!
//! | Task | Module | External tools |
//! |------|--------|----------------|
//! | `setup` | [`setup`] | installer (`pip`) |
//! | `install`, `installdev`, `install3` | [`install`] | none |
//! | `builddocs` | [`docs`] | `git`, docs builder (`make html`) |
//! | `package` | [`package`] | none |
//! | `pep8`, `autopep8`, `pylint`, `install-devtools` | [`quality`] | pep8, autopep8, pylint, pip |

pub mod docs;
pub mod install;
pub mod package;
pub mod quality;
pub mod runner;
pub mod setup;

pub use runner::{CommandRunner, RunError, RunOutcome, SystemRunner, ToolCommand};

use crate::storage::PluginProject;

/// Hint appended to missing development tool errors
pub const DEVTOOLS_HINT: &str = "Run \"pave install-devtools\".";

/// Shared inputs of every task
pub struct TaskContext<'a> {
    pub project: &'a PluginProject,
    pub runner: &'a dyn CommandRunner,
}

impl<'a> TaskContext<'a> {
    pub fn new(project: &'a PluginProject, runner: &'a dyn CommandRunner) -> Self {
        Self { project, runner }
    }
}
