// Copyright (c) 2025 - Cowboy AI, Inc.
//! Database Engine Domain Model
//!
//! The data tier describes databases by engine name. Known engines map to a
//! well-known listening port; anything else is carried through unchanged and
//! falls back to the MySQL port.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Database engine taxonomy
///
/// Unknown engine names are preserved in [`DatabaseEngine::Other`] rather than
/// rejected, so topology documents can name engines the platform templates
/// were not written for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DatabaseEngine {
    /// MySQL / MariaDB
    MySql,
    /// PostgreSQL
    PostgreSql,
    /// MongoDB
    MongoDb,
    /// Redis
    Redis,
    /// Engine without a known default port
    Other(String),
}

impl DatabaseEngine {
    /// Port used when an engine has no entry in the port table
    pub const FALLBACK_PORT: u16 = 3306;

    /// Get the canonical string representation
    pub fn as_str(&self) -> &str {
        match self {
            Self::MySql => "mysql",
            Self::PostgreSql => "postgresql",
            Self::MongoDb => "mongodb",
            Self::Redis => "redis",
            Self::Other(name) => name.as_str(),
        }
    }

    /// Parse from string representation
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "mysql" => Self::MySql,
            "postgresql" => Self::PostgreSql,
            "mongodb" => Self::MongoDb,
            "redis" => Self::Redis,
            _ => Self::Other(s.to_string()),
        }
    }

    /// Well-known port for this engine, `None` for unknown engines
    pub fn well_known_port(&self) -> Option<u16> {
        match self {
            Self::MySql => Some(3306),
            Self::PostgreSql => Some(5432),
            Self::MongoDb => Some(27017),
            Self::Redis => Some(6379),
            Self::Other(_) => None,
        }
    }

    /// Default port for this engine, falling back to MySQL's port
    pub fn default_port(&self) -> u16 {
        self.well_known_port().unwrap_or(Self::FALLBACK_PORT)
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

/// Resolve the port a database listens on
///
/// An explicit port always wins; otherwise the engine's default is used.
pub fn resolve_port(engine: &DatabaseEngine, explicit: Option<u16>) -> u16 {
    explicit.unwrap_or_else(|| engine.default_port())
}

impl Default for DatabaseEngine {
    fn default() -> Self {
        Self::MySql
    }
}

impl fmt::Display for DatabaseEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for DatabaseEngine {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for DatabaseEngine {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<DatabaseEngine> for String {
    fn from(engine: DatabaseEngine) -> Self {
        engine.as_str().to_string()
    }
}
