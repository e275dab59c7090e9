//! Requirements file parsing
//!
//! `requirements.txt` lists one dependency per line. A divider line
//! (`# test requirements`) separates runtime dependencies from test
//! dependencies. Blank lines and `#` comments are ignored.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;

/// Line that separates runtime from test requirements
pub const TEST_DIVIDER: &str = "# test requirements";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequirementsError {
    #[error("expected to find \"{}\" in requirements.txt", TEST_DIVIDER)]
    MissingDivider,
}

/// Runtime and test dependencies, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requirements {
    pub runtime: Vec<String>,
    pub test: Vec<String>,
}

impl Requirements {
    /// Parses requirements from file content
    pub fn parse(content: &str) -> Result<Self, RequirementsError> {
        let lines: Vec<&str> = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        let divider = lines
            .iter()
            .position(|l| *l == TEST_DIVIDER)
            .ok_or(RequirementsError::MissingDivider)?;

        let not_comments = |slice: &[&str]| -> Vec<String> {
            slice
                .iter()
                .filter(|l| !l.starts_with('#'))
                .map(|l| l.to_string())
                .collect()
        };

        Ok(Self {
            runtime: not_comments(&lines[..divider]),
            test: not_comments(&lines[divider + 1..]),
        })
    }

    /// Reads and parses a requirements file
    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read requirements: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Invalid requirements file: {}", path.display()))
    }

    /// Runtime requirements followed by test requirements
    pub fn all(&self) -> impl Iterator<Item = &str> {
        self.runtime.iter().chain(self.test.iter()).map(String::as_str)
    }

    /// Total number of requirements
    pub fn len(&self) -> usize {
        self.runtime.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
