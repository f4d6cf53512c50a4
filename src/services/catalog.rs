//! Catalog service with an on-disk cache
//!
//! The catalog changes rarely, so it is cached in
//! `~/.prestatrack/catalog.json` for an hour. An expired cache is still
//! preferred over nothing when the endpoint cannot be reached.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::services::gateway::Gateway;
use crate::types::{CacheWarning, CatalogEntry, PrestaError, Result};

/// Cache TTL in seconds (1 hour)
const CACHE_TTL_SECS: i64 = 3600;

/// Cached catalog data
#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogCache {
    /// Unix timestamp when the cache was fetched
    pub fetched_at: i64,
    pub entries: Vec<CatalogEntry>,
}

impl CatalogCache {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self {
            fetched_at: Utc::now().timestamp(),
            entries,
        }
    }

    /// Check if the cache has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() - self.fetched_at > CACHE_TTL_SECS
    }
}

/// Result of a catalog load
#[derive(Debug)]
pub struct CatalogLoad {
    pub entries: Vec<CatalogEntry>,
    pub warning: Option<CacheWarning>,
}

/// Catalog loader backed by a gateway and a cache file
pub struct CatalogService {
    cache_path: Option<PathBuf>,
}

impl CatalogService {
    /// Service using the default cache path; caching is disabled when the
    /// home directory cannot be determined
    pub fn new() -> Self {
        Self {
            cache_path: Self::default_cache_path().ok(),
        }
    }

    /// Service with a custom cache path
    pub fn with_cache_path(cache_path: PathBuf) -> Self {
        Self {
            cache_path: Some(cache_path),
        }
    }

    /// Get the default cache path (~/.prestatrack/catalog.json)
    fn default_cache_path() -> Result<PathBuf> {
        let base_dirs = BaseDirs::new()
            .ok_or_else(|| PrestaError::Config("Cannot determine home directory".into()))?;
        Ok(base_dirs.home_dir().join(".prestatrack").join("catalog.json"))
    }

    /// Load the catalog, preferring a fresh cache.
    /// `force_refresh` skips a fresh cache but still falls back to it.
    pub fn load(&self, gateway: &dyn Gateway, force_refresh: bool) -> Result<CatalogLoad> {
        let Some(cache_path) = self.cache_path.as_deref() else {
            return Ok(CatalogLoad {
                entries: gateway.list_catalog()?,
                warning: None,
            });
        };

        let cached = if cache_path.exists() {
            Some(Self::load_cache(cache_path))
        } else {
            None
        };

        match cached {
            Some(Ok(cache)) if !cache.is_expired() && !force_refresh => Ok(CatalogLoad {
                entries: cache.entries,
                warning: None,
            }),
            Some(Ok(cache)) => match Self::fetch_and_save(gateway, cache_path) {
                Ok(entries) => Ok(CatalogLoad {
                    entries,
                    warning: None,
                }),
                // Business errors are not masked by a stale copy
                Err(e @ PrestaError::Backend(_)) => Err(e),
                Err(e) => {
                    tracing::warn!(error = %e, "catalog refresh failed, using cached copy");
                    Ok(CatalogLoad {
                        entries: cache.entries,
                        warning: Some(CacheWarning::Stale(format!(
                            "Catalogue hors ligne : {}",
                            e.user_message()
                        ))),
                    })
                }
            },
            Some(Err(e)) => {
                tracing::warn!(error = %e, "catalog cache corrupted, refetching");
                let entries = Self::fetch_and_save(gateway, cache_path)?;
                Ok(CatalogLoad {
                    entries,
                    warning: Some(CacheWarning::Corrupted(e.to_string())),
                })
            }
            None => Ok(CatalogLoad {
                entries: Self::fetch_and_save(gateway, cache_path)?,
                warning: None,
            }),
        }
    }

    /// Remove the cache file
    pub fn clear(&self) -> Result<()> {
        if let Some(path) = &self.cache_path {
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    fn fetch_and_save(gateway: &dyn Gateway, cache_path: &Path) -> Result<Vec<CatalogEntry>> {
        let entries = gateway.list_catalog()?;
        let cache = CatalogCache::new(entries);
        if let Err(e) = Self::save_cache(cache_path, &cache) {
            tracing::warn!(error = %e, "failed to write catalog cache");
        }
        Ok(cache.entries)
    }

    /// Load cache from disk
    fn load_cache(cache_path: &Path) -> Result<CatalogCache> {
        let content = fs::read_to_string(cache_path)?;
        serde_json::from_str(&content)
            .map_err(|e| PrestaError::Parse(format!("Invalid cache format: {}", e)))
    }

    /// Save cache to disk
    fn save_cache(cache_path: &Path, cache: &CatalogCache) -> Result<()> {
        if let Some(parent) = cache_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(cache)
            .map_err(|e| PrestaError::Parse(format!("Serialization failed: {}", e)))?;
        fs::write(cache_path, content)?;
        Ok(())
    }
}

impl Default for CatalogService {
    fn default() -> Self {
        Self::new()
    }
}
