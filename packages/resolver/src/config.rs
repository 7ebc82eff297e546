//! Resolver settings.
//!
//! The defaults live in `config/resolver.toml` and are embedded at
//! compile time. A deployment may supply its own file, which replaces
//! the defaults field by field.

use std::{path::Path, time::Duration};

use serde::Deserialize;

use crate::{LoadError, tier::PrecinctTier};

const DEFAULT_CONFIG: &str = include_str!("../config/resolver.toml");

/// Tunables for [`crate::JurisdictionResolver`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResolverConfig {
    /// Precinct tiers in evaluation order.
    pub tiers: Vec<PrecinctTier>,
    /// Keyword sent with the external nearby search.
    pub hint_keyword: String,
    /// Budget for a single external hint lookup.
    pub hint_budget_ms: u64,
    /// Appended to address queries lacking [`Self::query_scope_marker`].
    pub query_suffix: String,
    /// Lowercase text whose presence means a query is already scoped.
    pub query_scope_marker: String,
}

/// Same fields as [`ResolverConfig`], all optional, for overrides.
#[derive(Debug, Default, Deserialize)]
struct PartialResolverConfig {
    tiers: Option<Vec<PrecinctTier>>,
    hint_keyword: Option<String>,
    hint_budget_ms: Option<u64>,
    query_suffix: Option<String>,
    query_scope_marker: Option<String>,
}

impl Default for ResolverConfig {
    /// # Panics
    ///
    /// Panics if the embedded default config is malformed.
    fn default() -> Self {
        toml::de::from_str(DEFAULT_CONFIG)
            .unwrap_or_else(|e| panic!("Failed to parse embedded resolver config: {e}"))
    }
}

impl ResolverConfig {
    /// Parses an override document on top of the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Config`] if the document is not valid TOML,
    /// names an unknown tier, or leaves the tier list empty.
    pub fn from_toml_str(text: &str) -> Result<Self, LoadError> {
        let partial: PartialResolverConfig =
            toml::de::from_str(text).map_err(|e| LoadError::Config {
                message: format!("invalid resolver config: {e}"),
            })?;

        let defaults = Self::default();
        let config = Self {
            tiers: partial.tiers.unwrap_or(defaults.tiers),
            hint_keyword: partial.hint_keyword.unwrap_or(defaults.hint_keyword),
            hint_budget_ms: partial.hint_budget_ms.unwrap_or(defaults.hint_budget_ms),
            query_suffix: partial.query_suffix.unwrap_or(defaults.query_suffix),
            query_scope_marker: partial
                .query_scope_marker
                .unwrap_or(defaults.query_scope_marker),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reads an override file.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Io`] if the file cannot be read, or
    /// [`LoadError::Config`] if it is invalid.
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::info!("Loaded resolver config from {}", path.display());
        Ok(config)
    }

    /// Reads the file named by `PRECINCT_MAP_RESOLVER_CONFIG`, or returns
    /// the defaults when the variable is unset.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the named file is unreadable or invalid.
    pub fn from_env() -> Result<Self, LoadError> {
        match std::env::var("PRECINCT_MAP_RESOLVER_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_file(Path::new(path.trim())),
            _ => Ok(Self::default()),
        }
    }

    #[must_use]
    pub const fn hint_budget(&self) -> Duration {
        Duration::from_millis(self.hint_budget_ms)
    }

    /// Scopes a free-text address query to the city.
    ///
    /// Queries that already mention the city are sent as-is.
    #[must_use]
    pub fn scope_query(&self, query: &str) -> String {
        let query = query.trim();
        if query.to_lowercase().contains(&self.query_scope_marker) {
            query.to_string()
        } else {
            format!("{query}{}", self.query_suffix)
        }
    }

    fn validate(&self) -> Result<(), LoadError> {
        if self.tiers.is_empty() {
            return Err(LoadError::Config {
                message: "resolver config lists no tiers".to_string(),
            });
        }
        if self.query_scope_marker != self.query_scope_marker.to_lowercase() {
            return Err(LoadError::Config {
                message: "query_scope_marker must be lowercase".to_string(),
            });
        }
        Ok(())
    }
}
