//! Domain models for pave
//!
//! Pure parsing and planning logic: requirement lists, archive exclusion
//! patterns, the settings reference and the build task graph. File access
//! is limited to the `read_*`/`write_*` helpers.

mod exclude;
mod requirements;
mod settings;
mod task;

pub use exclude::{ExclusionError, ExclusionSet};
pub use requirements::{Requirements, RequirementsError, TEST_DIVIDER};
pub use settings::{
    group_settings, parse_manifest, read_manifest, render_settings_doc, write_settings_doc,
    GroupedSettings, SettingDescriptor, SettingsError,
};
pub use task::{BuildTask, GraphError, TaskGraph};
