//! # schema-migrate
//!
//! Database schema introspection, structural diffing, and migration
//! planning library.
//!
//! The pipeline: a [`source::SchemaReader`] introspects a database into an
//! immutable [`schema::DatabaseSnapshot`]; the [`diff::SchemaDiffer`]
//! compares two snapshots into a list of
//! [`operations::MigrationOperation`]s; dialect-aware analyzers veto or
//! rewrite operations the target cannot execute; the
//! [`operations::sorter::OperationSorter`] orders the plan into safe
//! phases; and a [`generate::SqlGenerator`] renders it as DDL.
//!
//! ## Example
//!
//! ```rust,no_run
//! use schema_migrate::{DatabaseSnapshot, NameResolution, SchemaDiffer};
//! use tokio_util::sync::CancellationToken;
//!
//! fn main() -> schema_migrate::Result<()> {
//!     let source = DatabaseSnapshot::from_json(&std::fs::read_to_string("current.json")?)?;
//!     let target = DatabaseSnapshot::from_json(&std::fs::read_to_string("desired.json")?)?;
//!     let differ = SchemaDiffer::new(NameResolution::FoldLower);
//!     let plan = differ.diff(&source, &target, &CancellationToken::new())?;
//!     for op in &plan {
//!         println!("{}", op.summary());
//!     }
//!     Ok(())
//! }
//! ```

pub mod compare;
pub mod config;
pub mod core;
pub mod dialect;
pub mod diff;
pub mod error;
pub mod generate;
pub mod lint;
pub mod operations;
pub mod schema;
pub mod source;

// Re-exports for convenient access
pub use compare::ComparerSuite;
pub use config::{Config, MigrationOptions, SnapshotSource};
pub use core::identifier::{Identifier, IdentifierDefaults, NameResolution};
pub use diff::SchemaDiffer;
pub use dialect::{Dialect, DialectCatalog};
pub use error::{Result, SchemaError};
pub use generate::{GenericSqlGenerator, SqlGenerator};
pub use lint::{LintFinding, Linter};
pub use operations::sorter::OperationSorter;
pub use operations::{MigrationOperation, OperationKind};
pub use schema::{DatabaseSnapshot, ObjectKind};
pub use source::{JsonSchemaReader, SchemaReader, SnapshotLoader};
