pub mod compile;
pub mod loader;
pub mod schema;

pub use compile::{compile, CompileError};
pub use loader::{load_from_path, load_from_str, ConfigError};
pub use schema::{
    RawCheck, RawConstraint, RawRule, RawScope, RawSelector, RawStyleParams, RuleFile,
    StringOrList, ValidationError, ValidationIssue,
};
