//! `env_logger` wiring for `--debug` / `PKG_CONFIG_DEBUG_SPEW` advisory
//! tracing.
//!
//! Logger setup lives in the binary crate rather than `pkgconf-core`, so the
//! library stays usable by callers who want to install their own `log`
//! subscriber instead.

/// Initializes the global logger. `Warn` by default, `Trace` when debug
/// tracing is requested.
pub fn init(debug: bool) {
    let level = if debug { log::LevelFilter::Trace } else { log::LevelFilter::Warn };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .format_module_path(false)
        .init();
}
