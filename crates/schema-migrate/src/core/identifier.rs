//! Qualified identifiers, default-fallback resolution, and identifier quoting.
//!
//! A database object is addressed by an [`Identifier`]: up to four parts
//! (server, database, schema, local name) of which any prefix may be absent.
//! [`Identifier::qualify`] fills absent parts from a database's
//! [`IdentifierDefaults`] so partially specified names can be used for lookup
//! and caching. Equality between names is governed by a [`NameResolution`]
//! strategy (verbatim, or case-folding for case-insensitive dialects).
//!
//! This module also owns identifier *quoting* for SQL generation. Identifiers
//! cannot be passed as parameters in prepared statements, so dynamic DDL must
//! quote them with the dialect's rules after validating for suspicious input
//! (empty names, null bytes, excessive length).

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};

/// Maximum identifier length (conservative limit across databases).
/// - PostgreSQL: 63 bytes
/// - SQL Server: 128 characters
/// - MySQL: 64 characters
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// A possibly-partial, up to four-part qualified name for a database object.
///
/// Component presence is explicit: an absent schema is `None`, never an empty
/// string. The local name is never empty or whitespace (enforced by the
/// constructors).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identifier {
    /// Server (linked server / host) component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,

    /// Database component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// Schema component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Local object name. Never empty.
    pub local_name: String,
}

impl Identifier {
    /// Create an identifier with only a local name.
    pub fn new(local_name: impl Into<String>) -> Result<Self> {
        Self::parts(None, None, None, local_name)
    }

    /// Create a schema-qualified identifier.
    pub fn with_schema(schema: impl Into<String>, local_name: impl Into<String>) -> Result<Self> {
        Self::parts(None, None, Some(schema.into()), local_name)
    }

    /// Create an identifier from explicit parts.
    ///
    /// Fails with `InvalidArgument` if the local name or any present prefix
    /// component is empty or whitespace-only.
    pub fn parts(
        server: Option<String>,
        database: Option<String>,
        schema: Option<String>,
        local_name: impl Into<String>,
    ) -> Result<Self> {
        let local_name = local_name.into();
        if local_name.trim().is_empty() {
            return Err(SchemaError::invalid_argument(
                "Identifier local name cannot be empty or whitespace",
            ));
        }
        for (part, value) in [
            ("server", &server),
            ("database", &database),
            ("schema", &schema),
        ] {
            if let Some(v) = value {
                if v.trim().is_empty() {
                    return Err(SchemaError::invalid_argument(format!(
                        "Identifier {} component cannot be empty or whitespace",
                        part
                    )));
                }
            }
        }
        Ok(Self {
            server,
            database,
            schema,
            local_name,
        })
    }

    /// Fill absent components from the given defaults.
    ///
    /// Present components are never overwritten, so qualification is
    /// idempotent: `id.qualify(d).qualify(d) == id.qualify(d)`.
    pub fn qualify(&self, defaults: &IdentifierDefaults) -> Identifier {
        Identifier {
            server: self.server.clone().or_else(|| defaults.server.clone()),
            database: self.database.clone().or_else(|| defaults.database.clone()),
            schema: self.schema.clone().or_else(|| defaults.schema.clone()),
            local_name: self.local_name.clone(),
        }
    }

    /// True if every component is present.
    pub fn is_fully_qualified(&self) -> bool {
        self.server.is_some() && self.database.is_some() && self.schema.is_some()
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(schema) = &self.schema {
            write!(f, "{}.{}", schema, self.local_name)
        } else {
            write!(f, "{}", self.local_name)
        }
    }
}

/// A database's own naming context, used to qualify partial identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierDefaults {
    /// Default server name, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,

    /// Default database name, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// Default schema (e.g. "public", "dbo"), if the dialect has schemas.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

/// Identifier resolution strategy: how two names are judged equal.
///
/// Case-insensitive dialects fold names before comparing; verbatim keeps
/// byte-for-byte comparison. Resolution is pure and side-effect-free, so it
/// is safe to call from concurrent readers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameResolution {
    /// Byte-for-byte, case-sensitive comparison.
    #[default]
    Verbatim,
    /// Fold to lowercase before comparing (PostgreSQL-style).
    FoldLower,
    /// Fold to uppercase before comparing (Oracle-style).
    FoldUpper,
}

impl NameResolution {
    /// Resolve a single name to its canonical comparison form.
    pub fn resolve(&self, name: &str) -> String {
        match self {
            NameResolution::Verbatim => name.to_string(),
            NameResolution::FoldLower => name.to_lowercase(),
            NameResolution::FoldUpper => name.to_uppercase(),
        }
    }

    /// Compare two names under this strategy.
    ///
    /// No byte-length shortcut: Unicode case folding can change length
    /// ('İ' lowercases to a two-character sequence), so only the resolved
    /// forms are compared.
    pub fn names_equal(&self, a: &str, b: &str) -> bool {
        match self {
            NameResolution::Verbatim => a == b,
            NameResolution::FoldLower | NameResolution::FoldUpper => {
                self.resolve(a) == self.resolve(b)
            }
        }
    }

    /// Resolve every present component of an identifier.
    ///
    /// Used to normalize cache keys so that `Users` and `users` hit the same
    /// entry under a case-folding dialect.
    pub fn resolve_identifier(&self, id: &Identifier) -> Identifier {
        Identifier {
            server: id.server.as_deref().map(|s| self.resolve(s)),
            database: id.database.as_deref().map(|s| self.resolve(s)),
            schema: id.schema.as_deref().map(|s| self.resolve(s)),
            local_name: self.resolve(&id.local_name),
        }
    }
}

/// Validate an identifier before quoting it into SQL.
///
/// Rejects:
/// - Empty identifiers
/// - Identifiers containing null bytes (injection vector)
/// - Identifiers exceeding maximum length
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(SchemaError::invalid_argument("Identifier cannot be empty"));
    }

    if name.contains('\0') {
        return Err(SchemaError::invalid_argument(format!(
            "Identifier contains null byte (possible injection attempt): {:?}",
            name
        )));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(SchemaError::invalid_argument(format!(
            "Identifier exceeds maximum length of {} bytes (got {} bytes): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }

    Ok(())
}

/// Quote a PostgreSQL identifier.
///
/// Escapes double quotes by doubling them and wraps in double quotes.
pub fn quote_pg(name: &str) -> Result<String> {
    validate_name(name)?;
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Quote a MySQL identifier using backticks.
pub fn quote_mysql(name: &str) -> Result<String> {
    validate_name(name)?;
    Ok(format!("`{}`", name.replace('`', "``")))
}

/// Quote a SQL Server identifier using brackets.
pub fn quote_mssql(name: &str) -> Result<String> {
    validate_name(name)?;
    Ok(format!("[{}]", name.replace(']', "]]")))
}

/// Quote a SQLite identifier.
///
/// SQLite accepts double-quoted identifiers with the PostgreSQL escaping
/// rules.
pub fn quote_sqlite(name: &str) -> Result<String> {
    quote_pg(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(schema: Option<&str>, local: &str) -> Identifier {
        Identifier::parts(None, None, schema.map(String::from), local).unwrap()
    }

    // =========================================================================
    // Construction tests
    // =========================================================================

    #[test]
    fn test_rejects_empty_local_name() {
        assert!(Identifier::new("").is_err());
        assert!(Identifier::new("   ").is_err());
        assert!(Identifier::new("\t").is_err());
    }

    #[test]
    fn test_rejects_blank_prefix_component() {
        assert!(Identifier::with_schema("", "users").is_err());
        assert!(Identifier::parts(Some(" ".into()), None, None, "users").is_err());
    }

    #[test]
    fn test_accepts_partial_identifiers() {
        let id = Identifier::new("users").unwrap();
        assert!(id.schema.is_none());
        assert!(!id.is_fully_qualified());

        let id = ident(Some("public"), "users");
        assert_eq!(id.schema.as_deref(), Some("public"));
        assert_eq!(id.to_string(), "public.users");
    }

    // =========================================================================
    // Qualification tests
    // =========================================================================

    fn defaults() -> IdentifierDefaults {
        IdentifierDefaults {
            server: Some("srv1".to_string()),
            database: Some("appdb".to_string()),
            schema: Some("public".to_string()),
        }
    }

    #[test]
    fn test_qualify_fills_missing_parts() {
        let id = Identifier::new("users").unwrap();
        let qualified = id.qualify(&defaults());
        assert_eq!(qualified.server.as_deref(), Some("srv1"));
        assert_eq!(qualified.database.as_deref(), Some("appdb"));
        assert_eq!(qualified.schema.as_deref(), Some("public"));
        assert_eq!(qualified.local_name, "users");
    }

    #[test]
    fn test_qualify_never_overwrites_present_parts() {
        let id = ident(Some("audit"), "users");
        let qualified = id.qualify(&defaults());
        assert_eq!(qualified.schema.as_deref(), Some("audit"));
    }

    #[test]
    fn test_qualify_is_idempotent() {
        let d = defaults();
        for id in [Identifier::new("users").unwrap(), ident(Some("s"), "t")] {
            let once = id.qualify(&d);
            let twice = once.qualify(&d);
            assert_eq!(once, twice);
        }
    }

    // =========================================================================
    // Resolution tests
    // =========================================================================

    #[test]
    fn test_verbatim_resolution_is_case_sensitive() {
        let r = NameResolution::Verbatim;
        assert!(r.names_equal("Users", "Users"));
        assert!(!r.names_equal("Users", "users"));
    }

    #[test]
    fn test_fold_lower_resolution() {
        let r = NameResolution::FoldLower;
        assert!(r.names_equal("Users", "USERS"));
        assert_eq!(r.resolve("Users"), "users");
    }

    #[test]
    fn test_fold_handles_length_changing_case() {
        // 'İ' (U+0130) lowercases to "i\u{307}", which is longer in bytes.
        let r = NameResolution::FoldLower;
        assert!(r.names_equal("\u{130}D", "i\u{307}d"));
    }

    #[test]
    fn test_resolve_identifier_folds_all_components() {
        let id = Identifier::parts(None, Some("AppDb".into()), Some("DBO".into()), "Users").unwrap();
        let resolved = NameResolution::FoldLower.resolve_identifier(&id);
        assert_eq!(resolved.database.as_deref(), Some("appdb"));
        assert_eq!(resolved.schema.as_deref(), Some("dbo"));
        assert_eq!(resolved.local_name, "users");
    }

    // =========================================================================
    // Quoting tests
    // =========================================================================

    #[test]
    fn test_validate_name_rejects_bad_input() {
        assert!(validate_name("").is_err());
        assert!(validate_name("table\0name").is_err());
        assert!(validate_name(&"a".repeat(MAX_IDENTIFIER_LENGTH + 1)).is_err());
        assert!(validate_name(&"a".repeat(MAX_IDENTIFIER_LENGTH)).is_ok());
        assert!(validate_name("column with spaces").is_ok());
    }

    #[test]
    fn test_quote_pg_escapes_double_quote() {
        assert_eq!(quote_pg("users").unwrap(), "\"users\"");
        assert_eq!(quote_pg("table\"name").unwrap(), "\"table\"\"name\"");
    }

    #[test]
    fn test_quote_mysql_escapes_backtick() {
        assert_eq!(quote_mysql("users").unwrap(), "`users`");
        assert_eq!(quote_mysql("table`name").unwrap(), "`table``name`");
    }

    #[test]
    fn test_quote_mssql_escapes_bracket() {
        assert_eq!(quote_mssql("users").unwrap(), "[users]");
        assert_eq!(quote_mssql("table]name").unwrap(), "[table]]name]");
    }

    #[test]
    fn test_quote_injection_safely_quoted() {
        let result = quote_pg("Robert'); DROP TABLE Students;--").unwrap();
        assert_eq!(result, "\"Robert'); DROP TABLE Students;--\"");
    }
}
