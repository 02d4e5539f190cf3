pub mod applicator;
pub mod loader;
pub mod schema;

pub use applicator::{
    apply_mods, ApplicationError, ApplyMode, ApplyReport, FileChange, ModResult,
};
pub use loader::{load_from_path, load_from_str, ConfigError};
pub use schema::{
    Metadata, ModConfig, ModDefinition, Operation, ValidationError, ValidationIssue,
};
