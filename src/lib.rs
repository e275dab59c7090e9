//! pave - build, package and deploy a QGIS Python plugin
//!
//! Replaces a Python task file with a single binary: dependency staging,
//! local installation into QGIS profiles, settings documentation, zip
//! packaging and code quality checks. Every external tool is run through
//! [`tasks::CommandRunner`].

pub mod cli;
pub mod domain;
pub mod logging;
pub mod storage;
pub mod tasks;

pub use domain::{BuildTask, TaskGraph};
pub use storage::{BuildConfig, PluginProject};
