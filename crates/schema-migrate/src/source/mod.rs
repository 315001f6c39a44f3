//! Schema introspection seam.
//!
//! A [`SchemaReader`] is the async boundary behind which an actual
//! database (or a file, or a test double) lives. [`SnapshotLoader`] drives
//! a reader into an immutable [`DatabaseSnapshot`]: enumeration comes from
//! the reader's authoritative name lists, per-object loads are memoized
//! at-most-once, and a cancellation token aborts in-flight work.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::cache::AsyncCache;
use crate::core::identifier::{Identifier, IdentifierDefaults, NameResolution};
use crate::error::{Result, SchemaError};
use crate::schema::objects::{Routine, Sequence, Synonym, View};
use crate::schema::snapshot::{DatabaseSnapshot, ObjectKind};
use crate::schema::table::Table;

/// Read access to a database's schema catalog.
///
/// Absent objects are `Ok(None)`; errors are reserved for the source
/// itself failing. A name returned by `list_names` may still load as
/// `None` when the object disappears between the two calls.
#[async_trait]
pub trait SchemaReader: Send + Sync {
    /// The source's naming context, used to qualify partial names.
    fn identifier_defaults(&self) -> IdentifierDefaults;

    /// The source dialect's identifier resolution.
    fn resolution(&self) -> NameResolution;

    /// Authoritative enumeration of the objects of one kind.
    async fn list_names(&self, kind: ObjectKind) -> Result<Vec<Identifier>>;

    async fn load_table(&self, name: &Identifier) -> Result<Option<Table>>;

    async fn load_view(&self, name: &Identifier) -> Result<Option<View>>;

    async fn load_sequence(&self, name: &Identifier) -> Result<Option<Sequence>>;

    async fn load_synonym(&self, name: &Identifier) -> Result<Option<Synonym>>;

    async fn load_routine(&self, name: &Identifier) -> Result<Option<Routine>>;
}

macro_rules! cancellable_cache {
    ($reader:expr, $cancel:expr, $method:ident) => {{
        let reader = Arc::clone($reader);
        let cancel = $cancel.clone();
        AsyncCache::new(Arc::new(move |id: Identifier| {
            let reader = Arc::clone(&reader);
            let cancel = cancel.clone();
            async move {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(SchemaError::Cancelled),
                    result = reader.$method(&id) => result,
                }
            }
            .boxed()
        }))
    }};
}

/// Memoizing snapshot assembly over a [`SchemaReader`].
///
/// Each object kind has its own cache keyed by the qualified, resolved
/// identifier, so equivalent spellings of a name share one load and
/// repeated loads (a table referenced by several foreign keys) hit the
/// reader once.
pub struct SnapshotLoader {
    reader: Arc<dyn SchemaReader>,
    defaults: IdentifierDefaults,
    resolution: NameResolution,
    tables: AsyncCache<Option<Table>>,
    views: AsyncCache<Option<View>>,
    sequences: AsyncCache<Option<Sequence>>,
    synonyms: AsyncCache<Option<Synonym>>,
    routines: AsyncCache<Option<Routine>>,
}

impl SnapshotLoader {
    pub fn new(reader: Arc<dyn SchemaReader>, cancel: CancellationToken) -> Self {
        let defaults = reader.identifier_defaults();
        let resolution = reader.resolution();
        Self {
            tables: cancellable_cache!(&reader, &cancel, load_table),
            views: cancellable_cache!(&reader, &cancel, load_view),
            sequences: cancellable_cache!(&reader, &cancel, load_sequence),
            synonyms: cancellable_cache!(&reader, &cancel, load_synonym),
            routines: cancellable_cache!(&reader, &cancel, load_routine),
            reader,
            defaults,
            resolution,
        }
    }

    /// Canonical cache key for a possibly-partial name.
    fn cache_key(&self, name: &Identifier) -> Identifier {
        self.resolution.resolve_identifier(&name.qualify(&self.defaults))
    }

    pub async fn table(&self, name: &Identifier) -> Result<Option<Table>> {
        Ok((*self.tables.get(&self.cache_key(name)).await?).clone())
    }

    pub async fn view(&self, name: &Identifier) -> Result<Option<View>> {
        Ok((*self.views.get(&self.cache_key(name)).await?).clone())
    }

    pub async fn sequence(&self, name: &Identifier) -> Result<Option<Sequence>> {
        Ok((*self.sequences.get(&self.cache_key(name)).await?).clone())
    }

    pub async fn synonym(&self, name: &Identifier) -> Result<Option<Synonym>> {
        Ok((*self.synonyms.get(&self.cache_key(name)).await?).clone())
    }

    pub async fn routine(&self, name: &Identifier) -> Result<Option<Routine>> {
        Ok((*self.routines.get(&self.cache_key(name)).await?).clone())
    }

    /// Load the full snapshot. Enumeration order is the reader's listing
    /// order; a listed name that loads as `None` is logged and skipped.
    pub async fn load_snapshot(&self) -> Result<DatabaseSnapshot> {
        let mut snapshot = DatabaseSnapshot::new(self.defaults.clone(), self.resolution);
        snapshot.tables = self
            .load_all(ObjectKind::Table, |l, n| {
                async move { l.table(&n).await }.boxed()
            })
            .await?;
        snapshot.views = self
            .load_all(ObjectKind::View, |l, n| {
                async move { l.view(&n).await }.boxed()
            })
            .await?;
        snapshot.sequences = self
            .load_all(ObjectKind::Sequence, |l, n| {
                async move { l.sequence(&n).await }.boxed()
            })
            .await?;
        snapshot.synonyms = self
            .load_all(ObjectKind::Synonym, |l, n| {
                async move { l.synonym(&n).await }.boxed()
            })
            .await?;
        snapshot.routines = self
            .load_all(ObjectKind::Routine, |l, n| {
                async move { l.routine(&n).await }.boxed()
            })
            .await?;
        debug!(objects = snapshot.object_count(), "snapshot loaded");
        Ok(snapshot)
    }

    async fn load_all<'a, T>(
        &'a self,
        kind: ObjectKind,
        load: impl Fn(&'a Self, Identifier) -> futures::future::BoxFuture<'a, Result<Option<T>>>,
    ) -> Result<Vec<T>> {
        let names = self.reader.list_names(kind).await?;
        let loaded = try_join_all(names.iter().map(|name| load(self, name.clone()))).await?;
        let mut objects = Vec::with_capacity(loaded.len());
        for (name, object) in names.iter().zip(loaded) {
            match object {
                Some(object) => objects.push(object),
                None => warn!(%kind, %name, "listed object vanished before load"),
            }
        }
        Ok(objects)
    }
}

/// Reader backed by a snapshot JSON file. Serves the CLI and tests; real
/// database drivers implement [`SchemaReader`] out of tree.
#[derive(Debug)]
pub struct JsonSchemaReader {
    snapshot: DatabaseSnapshot,
}

impl JsonSchemaReader {
    pub fn new(snapshot: DatabaseSnapshot) -> Self {
        Self { snapshot }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            SchemaError::load(format!("cannot read snapshot {}: {e}", path.display()))
        })?;
        Ok(Self::new(DatabaseSnapshot::from_json(&text)?))
    }

    /// The backing snapshot, for callers that need it without going
    /// through a loader.
    pub fn snapshot(&self) -> &DatabaseSnapshot {
        &self.snapshot
    }
}

#[async_trait]
impl SchemaReader for JsonSchemaReader {
    fn identifier_defaults(&self) -> IdentifierDefaults {
        self.snapshot.defaults.clone()
    }

    fn resolution(&self) -> NameResolution {
        self.snapshot.resolution
    }

    async fn list_names(&self, kind: ObjectKind) -> Result<Vec<Identifier>> {
        Ok(self.snapshot.names(kind))
    }

    async fn load_table(&self, name: &Identifier) -> Result<Option<Table>> {
        Ok(self.snapshot.table(name).cloned())
    }

    async fn load_view(&self, name: &Identifier) -> Result<Option<View>> {
        Ok(self.snapshot.view(name).cloned())
    }

    async fn load_sequence(&self, name: &Identifier) -> Result<Option<Sequence>> {
        Ok(self.snapshot.sequence(name).cloned())
    }

    async fn load_synonym(&self, name: &Identifier) -> Result<Option<Synonym>> {
        Ok(self.snapshot.synonym(name).cloned())
    }

    async fn load_routine(&self, name: &Identifier) -> Result<Option<Routine>> {
        Ok(self.snapshot.routine(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::schema::column::{Column, DataKind};

    fn sample_snapshot() -> DatabaseSnapshot {
        let mut snapshot = DatabaseSnapshot::new(
            IdentifierDefaults {
                server: None,
                database: None,
                schema: Some("public".to_string()),
            },
            NameResolution::FoldLower,
        );
        let mut users = Table::new(Identifier::with_schema("public", "users").unwrap());
        users.columns.push(Column::required("id", DataKind::Integer));
        snapshot.tables.push(users);
        snapshot.views.push(View {
            name: Identifier::with_schema("public", "v_users").unwrap(),
            definition: "select id from users".to_string(),
            materialized: false,
        });
        snapshot
    }

    /// Counts every load that reaches the underlying reader.
    struct CountingReader {
        inner: JsonSchemaReader,
        table_loads: AtomicUsize,
    }

    impl CountingReader {
        fn new(snapshot: DatabaseSnapshot) -> Self {
            Self {
                inner: JsonSchemaReader::new(snapshot),
                table_loads: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SchemaReader for CountingReader {
        fn identifier_defaults(&self) -> IdentifierDefaults {
            self.inner.identifier_defaults()
        }
        fn resolution(&self) -> NameResolution {
            self.inner.resolution()
        }
        async fn list_names(&self, kind: ObjectKind) -> Result<Vec<Identifier>> {
            self.inner.list_names(kind).await
        }
        async fn load_table(&self, name: &Identifier) -> Result<Option<Table>> {
            self.table_loads.fetch_add(1, Ordering::SeqCst);
            self.inner.load_table(name).await
        }
        async fn load_view(&self, name: &Identifier) -> Result<Option<View>> {
            self.inner.load_view(name).await
        }
        async fn load_sequence(&self, name: &Identifier) -> Result<Option<Sequence>> {
            self.inner.load_sequence(name).await
        }
        async fn load_synonym(&self, name: &Identifier) -> Result<Option<Synonym>> {
            self.inner.load_synonym(name).await
        }
        async fn load_routine(&self, name: &Identifier) -> Result<Option<Routine>> {
            self.inner.load_routine(name).await
        }
    }

    #[tokio::test]
    async fn test_load_snapshot_round_trips() {
        let snapshot = sample_snapshot();
        let reader = Arc::new(JsonSchemaReader::new(snapshot.clone()));
        let loader = SnapshotLoader::new(reader, CancellationToken::new());
        let loaded = loader.load_snapshot().await.unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[tokio::test]
    async fn test_equivalent_spellings_share_one_load() {
        let reader = Arc::new(CountingReader::new(sample_snapshot()));
        let loader = SnapshotLoader::new(Arc::clone(&reader) as Arc<dyn SchemaReader>, {
            CancellationToken::new()
        });

        // Partial, qualified, and differently-cased names all canonicalize
        // to the same cache key.
        let a = loader.table(&Identifier::new("users").unwrap()).await.unwrap();
        let b = loader
            .table(&Identifier::with_schema("public", "USERS").unwrap())
            .await
            .unwrap();
        assert!(a.is_some());
        assert_eq!(a, b);
        assert_eq!(reader.table_loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_object_is_none() {
        let reader = Arc::new(JsonSchemaReader::new(sample_snapshot()));
        let loader = SnapshotLoader::new(reader, CancellationToken::new());
        let absent = loader.table(&Identifier::new("missing").unwrap()).await.unwrap();
        assert!(absent.is_none());
    }

    #[tokio::test]
    async fn test_cancelled_token_aborts_loads() {
        let token = CancellationToken::new();
        token.cancel();
        let reader = Arc::new(JsonSchemaReader::new(sample_snapshot()));
        let loader = SnapshotLoader::new(reader, token);
        let err = loader.load_snapshot().await.unwrap_err();
        assert!(matches!(err, SchemaError::Cancelled));
    }

    #[tokio::test]
    async fn test_from_file_reports_missing_path() {
        let err = JsonSchemaReader::from_file(Path::new("/nonexistent/snapshot.json"))
            .unwrap_err();
        assert!(matches!(err, SchemaError::Load(_)));
    }
}
