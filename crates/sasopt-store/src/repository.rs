//! Persisted configuration repositories
//!
//! [`ConfigurationRepository`] is the narrow read/write contract the store
//! consumes. [`JsonDirectoryRepository`] keeps one JSON record file per
//! configuration in a user directory, optionally backed by a directory of
//! shipped example configurations. [`MemoryRepository`] serves hosts and
//! tests that keep tables in memory.

use crate::error::{StoreError, StoreResult};
use crate::set::ConfigurationId;
use sasopt_table::{ConfigurationTable, TableDefaults};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Persisted configuration reader/writer
///
/// # Contract
/// `write` followed by `read` of the same identifier returns an equal table.
#[cfg_attr(test, mockall::automock)]
pub trait ConfigurationRepository {
    /// Load the persisted table of a configuration
    ///
    /// # Errors
    /// - [`StoreError::NotFound`] if nothing is stored under `id`
    /// - [`StoreError::Table`] if the stored table is malformed
    fn read(&self, id: &ConfigurationId) -> StoreResult<ConfigurationTable>;

    /// Persist a table under `id`, replacing any previous content
    ///
    /// # Errors
    /// Returns error if the table cannot be stored
    fn write(&self, id: &ConfigurationId, table: &ConfigurationTable) -> StoreResult<()>;

    /// Identifiers of all stored configurations, sorted
    ///
    /// # Errors
    /// Returns error if the backing storage cannot be enumerated
    fn list(&self) -> StoreResult<Vec<ConfigurationId>>;
}

/// Result of [`JsonDirectoryRepository::derive_variant`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantOutcome {
    /// Empty modifier, the base configuration stays selected
    Unchanged(ConfigurationId),

    /// New variant copied from the base
    Created {
        /// New configuration
        id: ConfigurationId,
        /// Configuration it was copied from
        from: ConfigurationId,
    },

    /// Variant already existed
    Switched(ConfigurationId),
}

impl VariantOutcome {
    /// Configuration to select after the operation
    #[inline]
    #[must_use]
    pub fn id(&self) -> &ConfigurationId {
        match self {
            Self::Unchanged(id) | Self::Switched(id) | Self::Created { id, .. } => id,
        }
    }
}

/// Result of [`JsonDirectoryRepository::remove`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// User file deleted
    Removed,

    /// User file replaced by the shipped example of the same name
    RestoredDefault,
}

/// One JSON record file per configuration in a directory
#[derive(Debug, Clone)]
pub struct JsonDirectoryRepository {
    user_dir: PathBuf,
    example_dir: Option<PathBuf>,
    defaults: TableDefaults,
}

impl JsonDirectoryRepository {
    /// Repository over `user_dir`
    #[inline]
    #[must_use]
    pub fn new(user_dir: impl Into<PathBuf>) -> Self {
        Self {
            user_dir: user_dir.into(),
            example_dir: None,
            defaults: TableDefaults::configuration(),
        }
    }

    /// With a directory of shipped example configurations
    #[inline]
    #[must_use]
    pub fn with_example_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.example_dir = Some(dir.into());
        self
    }

    /// With defaults injected on read
    #[inline]
    #[must_use]
    pub fn with_defaults(mut self, defaults: TableDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// User directory
    #[inline]
    #[must_use]
    pub fn user_dir(&self) -> &Path {
        &self.user_dir
    }

    /// File path of a configuration
    ///
    /// # Errors
    /// Returns [`StoreError::InvalidIdentifier`] unless `id` is a plain file name
    pub fn path_of(&self, id: &ConfigurationId) -> StoreResult<PathBuf> {
        check_identifier(id)?;
        Ok(self.user_dir.join(id.as_str()))
    }

    /// Create or switch to a named variant of `base`
    ///
    /// The variant of `sans.json` with modifier `long` is `sans_long.json`. It
    /// is copied from `base` unless it already exists.
    ///
    /// # Errors
    /// - [`StoreError::InvalidModifier`] if `modifier` is already part of `base`
    /// - [`StoreError::Io`] if the copy fails
    pub fn derive_variant(&self, base: &ConfigurationId, modifier: &str) -> StoreResult<VariantOutcome> {
        let modifier = modifier.trim();
        if modifier.is_empty() {
            return Ok(VariantOutcome::Unchanged(base.clone()));
        }
        if base.as_str().contains(modifier) {
            return Err(StoreError::InvalidModifier {
                base: base.to_string(),
                modifier: modifier.to_string(),
            });
        }

        let base_path = self.path_of(base)?;
        let stem = base_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = match base_path.extension() {
            Some(ext) => format!("{stem}_{modifier}.{}", ext.to_string_lossy()),
            None => format!("{stem}_{modifier}"),
        };
        let id = ConfigurationId::new(name);
        let path = self.path_of(&id)?;

        if path.is_file() {
            tracing::info!("Switching to existing configuration {}", id);
            return Ok(VariantOutcome::Switched(id));
        }

        fs::copy(&base_path, &path).map_err(|e| StoreError::io_error(&base_path, e))?;
        tracing::info!("Created configuration {} from {}", id, base);
        Ok(VariantOutcome::Created {
            id,
            from: base.clone(),
        })
    }

    /// Delete a user configuration
    ///
    /// If the example directory ships a configuration of the same name it is
    /// copied back in place of the deleted one.
    ///
    /// # Errors
    /// - [`StoreError::NotFound`] if the user directory has no such file
    /// - [`StoreError::Io`] if deletion or restoration fails
    pub fn remove(&self, id: &ConfigurationId) -> StoreResult<RemoveOutcome> {
        let path = self.path_of(id)?;
        if !path.is_file() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        fs::remove_file(&path).map_err(|e| StoreError::io_error(&path, e))?;

        if let Some(example) = self.example_dir.as_ref().map(|dir| dir.join(id.as_str())) {
            if example.is_file() {
                fs::copy(&example, &path).map_err(|e| StoreError::io_error(&example, e))?;
                tracing::info!("Replaced configuration {} with default", id);
                return Ok(RemoveOutcome::RestoredDefault);
            }
        }

        tracing::info!("Removed configuration {}", id);
        Ok(RemoveOutcome::Removed)
    }

    /// Store an uploaded configuration file verbatim
    ///
    /// The bytes are validated as a table before anything is written.
    ///
    /// # Errors
    /// - [`StoreError::Table`] if the upload is not a valid table
    /// - [`StoreError::Io`] if writing fails
    pub fn import(&self, id: &ConfigurationId, bytes: &[u8]) -> StoreResult<ConfigurationTable> {
        let path = self.path_of(id)?;
        let table = ConfigurationTable::load(bytes, &self.defaults)
            .map_err(|e| StoreError::table(id.as_str(), e))?;
        fs::write(&path, bytes).map_err(|e| StoreError::io_error(&path, e))?;
        tracing::info!("Imported configuration {} ({} settings)", id, table.len());
        Ok(table)
    }
}

impl ConfigurationRepository for JsonDirectoryRepository {
    fn read(&self, id: &ConfigurationId) -> StoreResult<ConfigurationTable> {
        let path = self.path_of(id)?;
        let bytes = fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StoreError::NotFound(id.to_string()),
            _ => StoreError::io_error(&path, e),
        })?;
        tracing::debug!("Read configuration {} ({} bytes)", id, bytes.len());
        ConfigurationTable::load(&bytes, &self.defaults).map_err(|e| StoreError::table(id.as_str(), e))
    }

    fn write(&self, id: &ConfigurationId, table: &ConfigurationTable) -> StoreResult<()> {
        let path = self.path_of(id)?;
        let bytes = table
            .serialize()
            .map_err(|e| StoreError::table(id.as_str(), e))?;
        fs::write(&path, bytes).map_err(|e| StoreError::io_error(&path, e))?;
        tracing::info!("Wrote configuration {}", id);
        Ok(())
    }

    fn list(&self) -> StoreResult<Vec<ConfigurationId>> {
        let entries =
            fs::read_dir(&self.user_dir).map_err(|e| StoreError::io_error(&self.user_dir, e))?;

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io_error(&self.user_dir, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with('.') && name.ends_with(".json") {
                ids.push(ConfigurationId::new(name));
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// In-memory repository
///
/// Single-threaded; writes go through a `RefCell`.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    tables: RefCell<BTreeMap<ConfigurationId, ConfigurationTable>>,
}

impl MemoryRepository {
    /// Create empty repository
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a stored table
    #[must_use]
    pub fn with_table(self, id: impl Into<ConfigurationId>, table: ConfigurationTable) -> Self {
        self.tables.borrow_mut().insert(id.into(), table);
        self
    }

    /// Number of stored tables
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.borrow().len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.borrow().is_empty()
    }
}

impl ConfigurationRepository for MemoryRepository {
    fn read(&self, id: &ConfigurationId) -> StoreResult<ConfigurationTable> {
        self.tables
            .borrow()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn write(&self, id: &ConfigurationId, table: &ConfigurationTable) -> StoreResult<()> {
        self.tables.borrow_mut().insert(id.clone(), table.clone());
        Ok(())
    }

    fn list(&self) -> StoreResult<Vec<ConfigurationId>> {
        Ok(self.tables.borrow().keys().cloned().collect())
    }
}

/// Reject identifiers that would escape the directory
fn check_identifier(id: &ConfigurationId) -> StoreResult<()> {
    let name = id.as_str();
    let plain = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\']);
    if plain {
        Ok(())
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}
