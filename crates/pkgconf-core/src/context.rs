//! Process-wide context: search path, sysroot, mode flags, and variable
//! overrides, built once from CLI arguments and the environment and shared
//! by the walker, expander and flag projector for the lifetime of the run.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::Result;
use crate::model::PkgConfig;
use crate::search::{self, Cache};

pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SELF_PACKAGE_NAME: &str = "pkg-config";

/// Bitflags for the handful of process-wide mode toggles the CLI exposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextFlags(u32);

impl ContextFlags {
    pub const NONE: ContextFlags = ContextFlags(0);
    pub const STATIC: ContextFlags = ContextFlags(1 << 0);
    pub const UNINSTALLED_DISABLED: ContextFlags = ContextFlags(1 << 1);
    pub const ALLOW_SYSTEM_CFLAGS: ContextFlags = ContextFlags(1 << 2);
    pub const ALLOW_SYSTEM_LIBS: ContextFlags = ContextFlags(1 << 3);
    pub const ENV_ONLY: ContextFlags = ContextFlags(1 << 4);

    pub fn contains(self, other: ContextFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn merge(self, other: ContextFlags) -> ContextFlags {
        ContextFlags(self.0 | other.0)
    }

    pub fn set_if(self, other: ContextFlags, cond: bool) -> ContextFlags {
        if cond {
            self.merge(other)
        } else {
            self
        }
    }
}

/// Everything the walker, expander and flag projector need, built once at
/// startup from CLI arguments and the environment and never mutated except
/// for the load cache. The CLI driver runs single-threaded, so `&mut self`
/// cache access is sound without interior mutability.
#[derive(Debug)]
pub struct Context {
    pub search_path: Vec<PathBuf>,
    pub sysroot: Option<String>,
    pub flags: ContextFlags,
    pub system_include_dirs: Vec<String>,
    /// Global `--define-variable=NAME=VALUE` overrides, applied to every
    /// package.
    global_overrides: HashMap<String, String>,
    /// `PKG_CONFIG_<PKG>_<SUFFIX>` overrides, keyed by uppercased package
    /// name, contributing `<suffix lowercased> = value`.
    package_overrides: HashMap<String, HashMap<String, String>>,
    cache: Cache,
}

impl Context {
    pub fn new(
        search_path: Vec<PathBuf>,
        sysroot: Option<String>,
        flags: ContextFlags,
        system_include_dirs: Vec<String>,
    ) -> Self {
        let self_package = build_self_package(&search_path);
        Context {
            search_path,
            sysroot,
            flags,
            system_include_dirs,
            global_overrides: HashMap::new(),
            package_overrides: HashMap::new(),
            cache: Cache::new().with_self_package(self_package),
        }
    }

    pub fn define_variable(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.global_overrides.insert(name.into(), value.into());
    }

    /// Registers a `PKG_CONFIG_<PKG>_<SUFFIX>` style override for one
    /// specific package.
    pub fn define_package_variable(
        &mut self,
        package: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.package_overrides
            .entry(package.into())
            .or_default()
            .insert(name.into(), value.into());
    }

    /// The effective override map for expanding `package`'s variables: the
    /// global overrides plus any package-specific ones layered on top.
    pub fn overrides_for(&self, package: &str) -> HashMap<String, String> {
        let mut merged = self.global_overrides.clone();
        if let Some(specific) = self.package_overrides.get(package) {
            merged.extend(specific.clone());
        }
        merged
    }

    pub fn uninstalled_enabled(&self) -> bool {
        !self.flags.contains(ContextFlags::UNINSTALLED_DISABLED)
    }

    pub fn lookup(&mut self, name: &str) -> Result<&PkgConfig> {
        let uninstalled = self.uninstalled_enabled();
        self.cache.lookup(name, &self.search_path, uninstalled)
    }

    pub fn cached(&self, name: &str) -> Option<&PkgConfig> {
        match self.cache.get(name) {
            Some(search::CacheEntry::Loaded(pc)) => Some(pc),
            _ => None,
        }
    }

    pub fn uninstalled_was_found(&self) -> bool {
        self.cache.uninstalled_was_found
    }
}

/// Builds the synthetic `pkg-config` self-package, so `pkgconf --modversion
/// pkg-config` and `--atleast-pkgconfig-version` resolve like any other
/// dependency.
fn build_self_package(search_path: &[PathBuf]) -> PkgConfig {
    let mut pc = PkgConfig::new(SELF_PACKAGE_NAME);
    let pc_path = search_path
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(":");
    pc.add_variable("pc_path", pc_path).expect("fresh model");
    pc.add_property(crate::model::NAME, vec![SELF_PACKAGE_NAME.to_string()])
        .expect("fresh model");
    pc.add_property(
        crate::model::DESCRIPTION,
        vec!["pkg-config".to_string(), "metadata".to_string(), "tool".to_string()],
    )
    .expect("fresh model");
    pc.add_property(crate::model::VERSION, vec![TOOL_VERSION.to_string()])
        .expect("fresh model");
    pc.add_property(
        crate::model::URL,
        vec!["https://gitlab.freedesktop.org/pkg-config/pkg-config".to_string()],
    )
    .expect("fresh model");
    pc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_pre_seeds_self_package() {
        let mut ctx = Context::new(vec![], None, ContextFlags::NONE, vec![]);
        let pc = ctx.lookup(SELF_PACKAGE_NAME).unwrap();
        assert_eq!(
            pc.property_raw(crate::model::VERSION),
            Some(&[TOOL_VERSION.to_string()][..])
        );
    }

    #[test]
    fn package_overrides_layer_over_global_overrides() {
        let mut ctx = Context::new(vec![], None, ContextFlags::NONE, vec![]);
        ctx.define_variable("prefix", "/usr");
        ctx.define_package_variable("foo", "prefix", "/opt/foo");
        let generic = ctx.overrides_for("bar");
        let specific = ctx.overrides_for("foo");
        assert_eq!(generic.get("prefix").unwrap(), "/usr");
        assert_eq!(specific.get("prefix").unwrap(), "/opt/foo");
    }

    #[test]
    fn context_flags_merge_and_contains() {
        let flags = ContextFlags::NONE
            .set_if(ContextFlags::STATIC, true)
            .set_if(ContextFlags::ALLOW_SYSTEM_LIBS, false);
        assert!(flags.contains(ContextFlags::STATIC));
        assert!(!flags.contains(ContextFlags::ALLOW_SYSTEM_LIBS));
    }
}
