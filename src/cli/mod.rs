//! # Command-Line Interface
//!
//! User-facing commands and output formatting.
//!
//! ## Commands
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Dependencies | Stage third-party packages | `setup`, `setup --clean` |
//! | Install | Deploy into a QGIS profile | `install`, `installdev`, `install3` |
//! | Release | Docs and archive | `builddocs`, `package --tests` |
//! | Quality | Style and lint | `pep8`, `autopep8`, `pylint`, `install-devtools` |
//! | Info | Task catalogue | `list` |
//!
//! Tasks with prerequisites run them first (`package` builds the docs).
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - One JSON object per finished task
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug logging on stderr:
//! ```bash
//! pave --verbose package
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod task_cmd;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
pub use task_cmd::Invocation;
