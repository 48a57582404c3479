//! typeshift: rewrite `expectTypeOf` type assertions to `Ts.Assert`
//!
//! This library exposes the rewriting core for use in property-based tests.
//! The main binary is at src/main.rs.

pub mod backup_manager;
pub mod cli;
pub mod config;
pub mod error;
pub mod logger;
pub mod processor;
pub mod replacement;
pub mod report;
pub mod rules;
pub mod scanner;

// Re-export commonly used types for convenience
pub use backup_manager::{BackupManager, BackupMetadata, FileBackup};
pub use config::Config;
pub use error::RewriteError;
pub use processor::{run, FileOutcome, FileReport, Mode, Preview, Rewriter, RunSummary};
pub use rules::{RewriteRule, RuleSet, RuleSetKind, Strategy};
pub use scanner::{CallShape, Operand, Relation};
