//! Core infrastructure: identifiers, memoizing caches, dependency graph.

pub mod cache;
pub mod graph;
pub mod identifier;

pub use cache::{AsyncCache, CacheLoader};
pub use graph::DependencyGraph;
pub use identifier::{Identifier, IdentifierDefaults, NameResolution};
