//! Persistent cache of successful translations.
//!
//! Entries live in `cache.json` in the config directory, keyed by a SHA-256
//! of the query, API URL, provider and model. The API key is never part of
//! the key and never written to disk.

use crate::config::{CacheSettings, EffectiveConfig};
use crate::providers::{SystemTimeProvider, TimeProvider};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const CACHE_FILE: &str = "cache.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub timestamp: u64,
    pub query: String,
    pub command: String,
    pub api_url: String,
    pub provider: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub oldest_entry: Option<u64>,
    pub newest_entry: Option<u64>,
}

pub struct ResponseCache {
    path: PathBuf,
    settings: CacheSettings,
    entries: HashMap<String, CacheEntry>,
    time_provider: Box<dyn TimeProvider>,
}

impl ResponseCache {
    /// Opens the cache file in `dir`. A missing or corrupt file reads as empty.
    pub fn open(dir: &Path, settings: CacheSettings) -> Self {
        Self::with_time_provider(dir, settings, Box::new(SystemTimeProvider))
    }

    /// Opens the cache with a custom time provider (for testing).
    pub fn with_time_provider(
        dir: &Path,
        settings: CacheSettings,
        time_provider: Box<dyn TimeProvider>,
    ) -> Self {
        let path = dir.join(CACHE_FILE);
        let entries = Self::read_entries(&path);
        debug!("Response cache at {:?} has {} entries", path, entries.len());

        Self {
            path,
            settings,
            entries,
            time_provider,
        }
    }

    fn read_entries(path: &Path) -> HashMap<String, CacheEntry> {
        let Ok(content) = fs::read_to_string(path) else {
            return HashMap::new();
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!("Ignoring corrupt cache file {}: {}", path.display(), e);
            HashMap::new()
        })
    }

    pub fn key(query: &str, config: &EffectiveConfig) -> String {
        let material = format!(
            "{}|{}|{}|{}",
            query,
            config.api_url,
            config.provider.name().unwrap_or_default(),
            config.provider.model().unwrap_or_default(),
        );
        let digest = Sha256::digest(material.as_bytes());
        digest.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Returns the cached command for `query`, dropping it if it has expired.
    pub fn get(&mut self, query: &str, config: &EffectiveConfig) -> Option<String> {
        if !self.settings.enabled {
            return None;
        }

        let key = Self::key(query, config);
        let entry = self.entries.get(&key)?;

        let age = self.time_provider.now().saturating_sub(entry.timestamp);
        if age > self.settings.ttl_secs {
            debug!("Cache entry for '{}' expired ({}s old)", query, age);
            self.entries.remove(&key);
            if let Err(e) = self.persist() {
                warn!("Failed to write cache: {}", e);
            }
            return None;
        }

        info!("Cache hit for '{}'", query);
        Some(entry.command.clone())
    }

    /// Stores a translation, evicting the oldest entries beyond `max_size`.
    pub fn put(&mut self, query: &str, command: &str, config: &EffectiveConfig) -> Result<()> {
        if !self.settings.enabled {
            return Ok(());
        }

        let entry = CacheEntry {
            timestamp: self.time_provider.now(),
            query: query.to_string(),
            command: command.to_string(),
            api_url: config.api_url.to_string(),
            provider: config.provider.name().map(str::to_string),
            model: config.provider.model().map(str::to_string),
        };
        self.entries.insert(Self::key(query, config), entry);
        self.evict_oldest();
        self.persist()
    }

    fn evict_oldest(&mut self) {
        let excess = self.entries.len().saturating_sub(self.settings.max_size);
        if excess == 0 {
            return;
        }

        let mut by_age: Vec<(String, u64)> = self
            .entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.timestamp))
            .collect();
        by_age.sort_by_key(|(_, timestamp)| *timestamp);

        for (key, _) in by_age.into_iter().take(excess) {
            self.entries.remove(&key);
        }
        debug!("Evicted {} cache entries", excess);
    }

    pub fn stats(&self) -> CacheStats {
        let timestamps = self.entries.values().map(|e| e.timestamp);
        CacheStats {
            size: self.entries.len(),
            oldest_entry: timestamps.clone().min(),
            newest_entry: timestamps.max(),
        }
    }

    /// Removes the cache file.
    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        info!("Response cache cleared");
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}
