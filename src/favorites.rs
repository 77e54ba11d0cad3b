use anyhow::{anyhow, Result};
use chrono::Utc;
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

use crate::models::{FavoriteEntry, Show};

pub const DEFAULT_FILE_NAME: &str = "favorites.json";

/// Outcome of a store mutation. `changed` is the logical result (did the
/// collection change); `durable` reports whether the new collection reached
/// disk. A failed write never fails the operation: the caller may surface a
/// degraded-persistence warning, but favoriting must not crash the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mutation {
    pub changed: bool,
    pub durable: bool,
}

/// Outcome of `toggle`: the new favorite state plus durability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Toggle {
    pub favorite: bool,
    pub durable: bool,
}

/// Owns the persisted favorites collection: one JSON array of entries in a
/// single file. Every operation is a full read-modify-write of that file;
/// nothing is cached across calls, so independent views of the store stay
/// consistent within the process. Access from another process is not
/// coordinated and last write wins.
#[derive(Debug, Clone)]
pub struct FavoritesStore {
    path: PathBuf,
}

impl FavoritesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `TVSHELF_FAVORITES`, or the platform data directory.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = env::var("TVSHELF_FAVORITES") {
            return Ok(Self::new(path));
        }
        let dir = dirs::data_dir()
            .ok_or_else(|| anyhow!("No data directory available; set TVSHELF_FAVORITES"))?;
        Ok(Self::new(dir.join("tvshelf").join(DEFAULT_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The current persisted collection. Absent, unreadable, or corrupt
    /// storage is logged and treated as "no favorites"; this never fails
    /// outward.
    pub fn load(&self) -> Vec<FavoriteEntry> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                error!("Could not read favorites from {}: {}", self.path.display(), e);
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                error!(
                    "Stored favorites at {} are not valid JSON ({}); starting empty",
                    self.path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    pub fn is_favorite(&self, id: i64) -> bool {
        self.load().iter().any(|entry| entry.id == id)
    }

    pub fn count(&self) -> usize {
        self.load().len()
    }

    /// Appends a snapshot of `show` stamped with the current time. Adding a
    /// show that is already favorited is a no-op.
    pub fn add(&self, show: &Show) -> Mutation {
        let mut entries = self.load();
        if entries.iter().any(|entry| entry.id == show.id) {
            return Mutation {
                changed: false,
                durable: true,
            };
        }
        entries.push(FavoriteEntry::from_show(show, Utc::now()));
        let durable = self.save(&entries);
        Mutation {
            changed: true,
            durable,
        }
    }

    /// Drops any entry matching `id`. `changed` only when something was
    /// actually removed; nothing is written otherwise.
    pub fn remove(&self, id: i64) -> Mutation {
        let entries = self.load();
        let before = entries.len();
        let kept: Vec<FavoriteEntry> = entries.into_iter().filter(|e| e.id != id).collect();
        if kept.len() == before {
            return Mutation {
                changed: false,
                durable: true,
            };
        }
        let durable = self.save(&kept);
        Mutation {
            changed: true,
            durable,
        }
    }

    /// Removes when favorited, adds otherwise. `favorite` is the new state
    /// and matches what `is_favorite` reports afterwards.
    pub fn toggle(&self, show: &Show) -> Toggle {
        if self.is_favorite(show.id) {
            let m = self.remove(show.id);
            Toggle {
                favorite: false,
                durable: m.durable,
            }
        } else {
            let m = self.add(show);
            Toggle {
                favorite: true,
                durable: m.durable,
            }
        }
    }

    /// Replaces the collection with an empty one.
    pub fn clear(&self) -> Mutation {
        let durable = self.save(&[]);
        Mutation {
            changed: true,
            durable,
        }
    }

    /// Whole-collection replace, best effort. Writes to a sibling temp file
    /// and renames over the target so readers never observe a partial blob.
    fn save(&self, entries: &[FavoriteEntry]) -> bool {
        match self.try_save(entries) {
            Ok(()) => {
                debug!("Persisted {} favorites to {}", entries.len(), self.path.display());
                true
            }
            Err(e) => {
                error!("Could not persist favorites to {}: {}", self.path.display(), e);
                false
            }
        }
    }

    fn try_save(&self, entries: &[FavoriteEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let raw = serde_json::to_string(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
