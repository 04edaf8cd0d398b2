//! Search-path resolution and load cache.
//!
//! The search path is assembled from `PKG_CONFIG_PATH`/`PKG_CONFIG_LIBDIR`
//! and probed in order for each package name; once a `.pc` file resolves
//! (or fails to), the result is cached for the rest of the process so a
//! name shared by several dependency edges is parsed only once.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, trace};

use crate::error::{Error, Result};
use crate::model::PkgConfig;
use crate::parser;

/// Resolves `name` to its on-disk `.pc` path without loading or caching it
/// (used by `--path`).
pub fn resolve_path(name: &str, search_path: &[PathBuf]) -> Option<PathBuf> {
    if name.contains(".pc") {
        let path = Path::new(name);
        return path.is_file().then(|| path.to_path_buf());
    }
    search_path
        .iter()
        .map(|dir| dir.join(format!("{name}.pc")))
        .find(|candidate| candidate.is_file())
}

/// Built-in search path used when `PKG_CONFIG_LIBDIR` is unset.
pub const DEFAULT_PKG_CONFIG_PATH: [&str; 4] = [
    "/usr/lib/pkgconfig",
    "/usr/share/pkgconfig",
    "/usr/local/lib/pkgconfig",
    "/usr/local/share/pkgconfig",
];

/// Builds the search path from `PKG_CONFIG_PATH` / `PKG_CONFIG_LIBDIR`:
/// `PKG_CONFIG_PATH` entries are always prepended; `PKG_CONFIG_LIBDIR`, when
/// set, replaces the built-in list rather than merely prepending to it.
pub fn build_search_path(
    pkg_config_path: Option<&str>,
    pkg_config_libdir: Option<&str>,
) -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    if let Some(path) = pkg_config_path {
        dirs.extend(path.split(':').filter(|s| !s.is_empty()).map(PathBuf::from));
    }

    match pkg_config_libdir {
        Some(libdir) => {
            dirs.extend(libdir.split(':').filter(|s| !s.is_empty()).map(PathBuf::from));
        }
        None => {
            dirs.extend(DEFAULT_PKG_CONFIG_PATH.iter().map(PathBuf::from));
        }
    }

    dirs
}

/// A cache entry: either a successfully loaded model, or a negative marker
/// recording that this package name is known not to resolve. The cache is
/// populated once per name and never invalidated.
#[derive(Debug, Clone)]
pub enum CacheEntry {
    Loaded(Box<PkgConfig>),
    NotFound,
}

/// Process-wide, never-invalidated mapping from package name to loaded
/// model.
#[derive(Debug, Default)]
pub struct Cache {
    entries: HashMap<String, CacheEntry>,
    /// Set once an `-uninstalled.pc` variant is resolved anywhere in a walk;
    /// backs `--uninstalled`'s process-wide exit status.
    pub uninstalled_was_found: bool,
}

impl Cache {
    pub fn new() -> Self {
        Cache::default()
    }

    /// Pre-seeds the synthetic `pkg-config` self-package entry.
    pub fn with_self_package(mut self, self_package: PkgConfig) -> Self {
        self.entries
            .insert(self_package.package_name.clone(), CacheEntry::Loaded(Box::new(self_package)));
        self
    }

    pub fn get(&self, name: &str) -> Option<&CacheEntry> {
        self.entries.get(name)
    }

    /// Looks up `name`, loading and parsing it from `search_path` on first
    /// request. `uninstalled` enables the `-uninstalled.pc` probe.
    pub fn lookup(
        &mut self,
        name: &str,
        search_path: &[PathBuf],
        uninstalled: bool,
    ) -> Result<&PkgConfig> {
        if !self.entries.contains_key(name) {
            let loaded = Self::load(name, search_path, uninstalled);
            match loaded {
                Ok((pc, found_uninstalled)) => {
                    if found_uninstalled {
                        self.uninstalled_was_found = true;
                    }
                    self.entries.insert(name.to_string(), CacheEntry::Loaded(Box::new(pc)));
                }
                Err(_) => {
                    self.entries.insert(name.to_string(), CacheEntry::NotFound);
                }
            }
        }

        match self.entries.get(name) {
            Some(CacheEntry::Loaded(pc)) => Ok(pc),
            _ => Err(Error::NotFound { name: name.to_string() }),
        }
    }

    fn load(name: &str, search_path: &[PathBuf], uninstalled: bool) -> Result<(PkgConfig, bool)> {
        if name.contains(".pc") {
            let path = Path::new(name);
            debug!("loading literal path {path:?}");
            let pc = parser::parse_file(name, path)?;
            pc.validate().map_err(|_| Error::Invalid {
                path: path.to_path_buf(),
                message: "missing required property".to_string(),
            })?;
            return Ok((pc, false));
        }

        if uninstalled && !name.ends_with("-uninstalled") {
            for dir in search_path {
                let candidate = dir.join(format!("{name}-uninstalled.pc"));
                trace!("probing {candidate:?}");
                if candidate.is_file() {
                    let pc = parser::parse_file(name, &candidate)?;
                    pc.validate().map_err(|_| Error::Invalid {
                        path: candidate.clone(),
                        message: "missing required property".to_string(),
                    })?;
                    return Ok((pc, true));
                }
            }
        }

        for dir in search_path {
            let candidate = dir.join(format!("{name}.pc"));
            trace!("probing {candidate:?}");
            if candidate.is_file() {
                let pc = parser::parse_file(name, &candidate)?;
                pc.validate().map_err(|_| Error::Invalid {
                    path: candidate.clone(),
                    message: "missing required property".to_string(),
                })?;
                return Ok((pc, false));
            }
        }

        Err(Error::NotFound { name: name.to_string() })
    }
}
