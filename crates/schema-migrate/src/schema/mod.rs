//! Database-agnostic schema object model.
//!
//! These types are the immutable snapshot representation produced by
//! introspection and consumed by the comparer suite and the diff engine.
//! Optional attributes are always explicit `Option`s (never sentinel
//! values) so that structural equality and JSON round-tripping stay exact.

pub mod column;
pub mod objects;
pub mod snapshot;
pub mod table;

pub use column::{AutoIncrement, Column, ColumnType, DataKind};
pub use objects::{Routine, Sequence, Synonym, View};
pub use snapshot::{DatabaseSnapshot, ObjectKind};
pub use table::{
    CheckConstraint, Index, IndexColumn, IndexOrder, Key, KeyKind, RelationalKey,
    ReferentialAction, Table, Trigger, TriggerEvent, TriggerEvents, TriggerTiming,
};
