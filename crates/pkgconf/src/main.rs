//! CLI driver: argument parsing, environment-variable discovery, query
//! dispatch, output assembly.
//!
//! A flat `#[derive(Parser)]` struct (no subcommands) mirrors the real
//! `pkg-config`/`pkgconf` command line, with `anyhow::Result` at the
//! reporting boundary and a `silence_errors`/`errors_to_stdout`-gated
//! diagnostic path.

mod logging;

use std::env;
use std::process::ExitCode;

use clap::Parser;

use pkgconf_core::context::{Context, ContextFlags, TOOL_VERSION};
use pkgconf_core::fragment::{self, CflagsFilter, LibsFilter};
use pkgconf_core::model::{self, PropertyKind, LIBS, LIBS_PRIVATE, REQUIRES, REQUIRES_PRIVATE};
use pkgconf_core::search;
use pkgconf_core::version::{self, Comparator};
use pkgconf_core::walk::{self, PackageRequest, WalkOptions};

#[derive(Parser, Debug)]
#[command(
    name = "pkgconf",
    about = "A drop-in replacement command-line tool for pkg-config",
    disable_version_flag = true,
    args_override_self = true,
    trailing_var_arg = true
)]
struct Cli {
    /// Enable verbose tracing to standard error
    #[arg(long)]
    debug: bool,

    /// Print help (alias for --help)
    #[arg(long)]
    usage: bool,

    /// Print tool version string, exit 0
    #[arg(long)]
    version: bool,

    /// Enumerate all discoverable packages
    #[arg(long = "list-all")]
    list_all: bool,

    /// Like --list-all but omit descriptions
    #[arg(long = "list-package-names")]
    list_package_names: bool,

    /// Redirect diagnostic stream to standard output
    #[arg(long = "errors-to-stdout")]
    errors_to_stdout: bool,

    /// Force diagnostics on
    #[arg(long = "print-errors")]
    print_errors: bool,

    /// Force diagnostics off
    #[arg(long = "silence-errors")]
    silence_errors: bool,

    /// Exit 0 iff tool version >= V
    #[arg(long = "atleast-pkgconfig-version")]
    atleast_pkgconfig_version: Option<String>,

    /// Print "NAME = VERSION" for each positional package
    #[arg(long = "print-provides")]
    print_provides: bool,

    /// Print direct dependency names, one per line
    #[arg(long = "print-requires")]
    print_requires: bool,

    /// Print direct private dependency names, one per line
    #[arg(long = "print-requires-private")]
    print_requires_private: bool,

    #[arg(long)]
    cflags: bool,
    #[arg(long = "cflags-only-I")]
    cflags_only_i: bool,
    #[arg(long = "cflags-only-other")]
    cflags_only_other: bool,

    #[arg(long)]
    libs: bool,
    #[arg(long = "libs-only-l")]
    libs_only_l: bool,
    #[arg(long = "libs-only-L")]
    libs_only_capital_l: bool,
    #[arg(long = "libs-only-other")]
    libs_only_other: bool,

    /// Exit 0 iff all positional packages resolve and version constraints hold
    #[arg(long)]
    exists: bool,

    /// Like --exists but skip Requires traversal
    #[arg(long)]
    validate: bool,

    /// Enable static-link ordering and include Libs.private
    #[arg(long = "static")]
    static_mode: bool,

    /// Exit 0 iff the walk encountered any -uninstalled variant
    #[arg(long)]
    uninstalled: bool,

    #[arg(long = "atleast-version")]
    atleast_version: Option<String>,
    #[arg(long = "exact-version")]
    exact_version: Option<String>,
    #[arg(long = "max-version")]
    max_version: Option<String>,

    /// Print the Version property of each positional package
    #[arg(long)]
    modversion: bool,

    /// Print expanded value of variable NAME for each positional package
    #[arg(long)]
    variable: Option<String>,

    /// Inject NAME=VALUE as an override into the expander (repeatable)
    #[arg(long = "define-variable")]
    define_variable: Vec<String>,

    /// Print the resolved .pc file path for each positional package
    #[arg(long)]
    path: bool,

    /// Print a package's License property, if present
    #[arg(long)]
    license: bool,

    /// Print a package's Source property, if present
    #[arg(long)]
    source: bool,

    /// Package names, optionally interleaved with NAME OP VERSION triples
    packages: Vec<String>,
}

fn env_nonempty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_truthy(name: &str) -> bool {
    matches!(env_nonempty(name).as_deref(), Some(v) if v != "0" && !v.eq_ignore_ascii_case("false"))
}

/// Splits each positional word on commas, producing the flat token stream
/// `parse_package_args` then groups into requests (commas between package
/// names are accepted as separators, same as whitespace).
fn split_commas(args: &[String]) -> Vec<String> {
    args.iter()
        .flat_map(|a| a.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

const VERSION_OPS: [&str; 6] = ["<", "<=", "=", "!=", ">=", ">"];

/// Groups the flattened word stream into package requests, consuming a
/// trailing `OP VERSION` pair when present.
fn parse_package_args(args: &[String]) -> anyhow::Result<Vec<PackageRequest>> {
    let words = split_commas(args);
    let mut requests = Vec::new();
    let mut i = 0;
    while i < words.len() {
        let name = words[i].clone();
        if i + 2 < words.len() && VERSION_OPS.contains(&words[i + 1].as_str()) {
            let op: Comparator = words[i + 1].parse()?;
            let version = words[i + 2].clone();
            requests.push(PackageRequest {
                name,
                constraint: Some((op, version)),
            });
            i += 3;
        } else {
            requests.push(PackageRequest { name, constraint: None });
            i += 1;
        }
    }
    Ok(requests)
}

fn pkg_env_prefix(name: &str) -> String {
    let upper: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("PKG_CONFIG_{upper}_")
}

fn enumerate_packages(search_path: &[std::path::PathBuf]) -> Vec<String> {
    let mut names = Vec::new();
    for dir in search_path {
        let Ok(entries) = std::fs::read_dir(dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("pc") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    if !stem.ends_with("-uninstalled") {
                        names.push(stem.to_string());
                    }
                }
            }
        }
    }
    names.sort();
    names.dedup();
    names
}

fn report(message: &str, show: bool, to_stdout: bool) {
    if !show {
        return;
    }
    if to_stdout {
        println!("{message}");
    } else {
        eprintln!("{message}");
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.debug || env_truthy("PKG_CONFIG_DEBUG_SPEW"));

    match run(&cli) {
        Ok(code) => ExitCode::from(code as u8),
        Err(err) => {
            eprintln!("pkgconf: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<i32> {
    if let Some(log_path) = env_nonempty("PKG_CONFIG_LOG") {
        use std::io::Write;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .map_err(|e| anyhow::anyhow!("failed to open PKG_CONFIG_LOG file '{log_path}': {e}"))?;
        let argv: Vec<String> = env::args().collect();
        writeln!(file, "{}", argv.join(" "))?;
    }

    if cli.usage {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        cmd.print_help()?;
        println!();
        return Ok(0);
    }

    if cli.version {
        println!("{TOOL_VERSION}");
        return Ok(0);
    }

    let pkg_config_path = env_nonempty("PKG_CONFIG_PATH");
    let pkg_config_libdir = env_nonempty("PKG_CONFIG_LIBDIR");
    let search_path = search::build_search_path(pkg_config_path.as_deref(), pkg_config_libdir.as_deref());
    let sysroot = env_nonempty("PKG_CONFIG_SYSROOT_DIR");

    let flags = ContextFlags::NONE
        .set_if(ContextFlags::STATIC, cli.static_mode)
        .set_if(ContextFlags::UNINSTALLED_DISABLED, env_truthy("PKG_CONFIG_DISABLE_UNINSTALLED"))
        .set_if(ContextFlags::ALLOW_SYSTEM_CFLAGS, env_truthy("PKG_CONFIG_ALLOW_SYSTEM_CFLAGS"))
        .set_if(ContextFlags::ALLOW_SYSTEM_LIBS, env_truthy("PKG_CONFIG_ALLOW_SYSTEM_LIBS"));

    let system_include_dirs = fragment::system_include_dirs(
        env_nonempty("PKG_CONFIG_SYSTEM_INCLUDE_PATH").as_deref(),
        env_nonempty("C_PATH").as_deref(),
        env_nonempty("C_INCLUDE_PATH").as_deref(),
        env_nonempty("CPLUS_INCLUDE_PATH").as_deref(),
    );

    let mut ctx = Context::new(search_path, sysroot.clone(), flags, system_include_dirs);

    for definition in &cli.define_variable {
        let (name, value) = definition
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("malformed --define-variable '{definition}', expected NAME=VALUE"))?;
        ctx.define_variable(name, value);
    }

    if let Some(required) = &cli.atleast_pkgconfig_version {
        return Ok(if version::atleast_self_version(TOOL_VERSION, required) { 0 } else { 1 });
    }

    if cli.list_all || cli.list_package_names {
        for name in enumerate_packages(&ctx.search_path) {
            if cli.list_package_names {
                println!("{name}");
            } else {
                let description = ctx
                    .lookup(&name)
                    .ok()
                    .and_then(|pc| pc.property_raw(model::DESCRIPTION))
                    .map(|tokens| tokens.join(" "))
                    .unwrap_or_default();
                println!("{name:<30} {description}");
            }
        }
        return Ok(0);
    }

    let requests = parse_package_args(&cli.packages)?;
    if requests.is_empty() {
        anyhow::bail!("must specify package names on the command line");
    }

    for request in &requests {
        let prefix = pkg_env_prefix(&request.name);
        for (key, value) in env::vars() {
            if let Some(suffix) = key.strip_prefix(&prefix) {
                ctx.define_package_variable(request.name.clone(), suffix.to_lowercase(), value);
            }
        }
    }

    let cflags_requested = cli.cflags || cli.cflags_only_i || cli.cflags_only_other;
    let libs_requested = cli.libs || cli.libs_only_l || cli.libs_only_capital_l || cli.libs_only_other;
    let traverse_requires_private =
        cflags_requested || (libs_requested && cli.static_mode) || cli.print_requires_private || cli.exists;
    let opts = WalkOptions {
        traverse_requires: !cli.validate,
        traverse_requires_private,
        max_depth: env_nonempty("PKG_CONFIG_MAXIMUM_TRAVERSE_DEPTH")
            .and_then(|v| v.parse().ok())
            .unwrap_or(pkgconf_core::DEFAULT_MAX_TRAVERSAL_DEPTH),
    };

    let outcome = walk::walk_roots(&mut ctx, &requests, &opts);
    let mut ok = outcome.ok;
    let mut diagnostics = outcome.diagnostics.clone();

    for (flag, comparator) in [
        (&cli.atleast_version, Comparator::GreaterThanEqual),
        (&cli.exact_version, Comparator::Equal),
        (&cli.max_version, Comparator::LessThanEqual),
    ] {
        if let Some(required) = flag {
            for request in &requests {
                if let Some(pc) = ctx.cached(&request.name) {
                    let installed = pc
                        .property_raw(model::VERSION)
                        .and_then(|v| v.first())
                        .cloned()
                        .unwrap_or_default();
                    if !comparator.eval(&installed, required) {
                        ok = false;
                        diagnostics.push(format!(
                            "Requested '{} {comparator} {required}' but version of {} is {installed}",
                            request.name, request.name
                        ));
                    }
                }
            }
        }
    }

    let show_errors = if cli.print_errors {
        true
    } else if cli.silence_errors {
        false
    } else {
        cli.libs || cli.cflags || cli.version || cli.list_all || cli.validate
    };
    for diagnostic in &diagnostics {
        report(diagnostic, show_errors, cli.errors_to_stdout);
    }

    if !ok {
        return Ok(1);
    }

    if cli.modversion {
        for request in &requests {
            if let Some(pc) = ctx.cached(&request.name) {
                println!(
                    "{}",
                    pc.property_raw(model::VERSION).and_then(|v| v.first()).cloned().unwrap_or_default()
                );
            }
        }
        return Ok(0);
    }

    if cli.print_provides {
        for request in &requests {
            if let Some(pc) = ctx.cached(&request.name) {
                let version = pc.property_raw(model::VERSION).and_then(|v| v.first()).cloned().unwrap_or_default();
                println!("{} = {version}", request.name);
            }
        }
        return Ok(0);
    }

    if cli.print_requires || cli.print_requires_private {
        let property = if cli.print_requires_private { REQUIRES_PRIVATE } else { REQUIRES };
        for request in &requests {
            if let Some(pc) = ctx.cached(&request.name) {
                let overrides = ctx.overrides_for(&request.name);
                if let Some(tokens) = pc.property_raw(property) {
                    let expanded = pkgconf_core::expand::expand_property(
                        PropertyKind::RequiresLike,
                        tokens,
                        pc.variables(),
                        &overrides,
                    );
                    for token in expanded {
                        let (name, _) = walk::parse_requires_token(&token);
                        println!("{name}");
                    }
                }
            }
        }
        return Ok(0);
    }

    if cli.path {
        for request in &requests {
            if let Some(found) = search::resolve_path(&request.name, &ctx.search_path) {
                println!("{}", found.display());
            }
        }
        return Ok(0);
    }

    if cli.license || cli.source {
        let property = if cli.license { "License" } else { "Source" };
        for request in &requests {
            if let Some(pc) = ctx.cached(&request.name) {
                let value = pc.property_raw(property).map(|v| v.join(" ")).unwrap_or_default();
                println!("{value}");
            }
        }
        return Ok(0);
    }

    if cli.exists || cli.validate {
        return Ok(0);
    }

    if cli.uninstalled {
        return Ok(if ctx.uninstalled_was_found() { 0 } else { 1 });
    }

    let order = if cli.static_mode {
        walk::project_static(&outcome.accumulated)
    } else {
        walk::project_shared(&outcome.accumulated)
    };

    let mut output_parts = Vec::new();

    if let Some(variable_name) = &cli.variable {
        for request in &requests {
            if let Some(pc) = ctx.cached(&request.name) {
                let overrides = ctx.overrides_for(&request.name);
                let raw = pc.variable_raw(variable_name).unwrap_or("");
                let value = pkgconf_core::expand::expand(raw, pc.variables(), &overrides);
                output_parts.push(value);
            }
        }
    }

    if cli.cflags || cli.cflags_only_i || cli.cflags_only_other {
        let filter = if cli.cflags_only_i {
            CflagsFilter::OnlyInclude
        } else if cli.cflags_only_other {
            CflagsFilter::OnlyOther
        } else {
            CflagsFilter::All
        };
        let tokens = collect_property_tokens(&mut ctx, &order, model::CFLAGS, false);
        let text = fragment::project_cflags(tokens, &ctx.system_include_dirs, flags.contains(ContextFlags::ALLOW_SYSTEM_CFLAGS), sysroot.as_deref(), filter);
        let trimmed = text.trim_end_matches('\n');
        if !trimmed.is_empty() {
            output_parts.push(trimmed.to_string());
        }
    }

    if cli.libs || cli.libs_only_l || cli.libs_only_capital_l || cli.libs_only_other {
        let filter = if cli.libs_only_l {
            LibsFilter::OnlyL
        } else if cli.libs_only_capital_l {
            LibsFilter::OnlyCapitalL
        } else if cli.libs_only_other {
            LibsFilter::OnlyOther
        } else {
            LibsFilter::All
        };
        let tokens = collect_property_tokens(&mut ctx, &order, LIBS, cli.static_mode);
        let text = fragment::project_libs(tokens, flags.contains(ContextFlags::ALLOW_SYSTEM_LIBS), sysroot.as_deref(), filter);
        let trimmed = text.trim_end_matches('\n');
        if !trimmed.is_empty() {
            output_parts.push(trimmed.to_string());
        }
    }

    if !output_parts.is_empty() {
        println!("{}", output_parts.join(" "));
    }

    Ok(0)
}

/// Gathers one property's expanded tokens for every package in walk order;
/// when `also_private` is set (static `Libs` mode), `Libs.private` tokens
/// for each package are appended right after that package's own tokens.
fn collect_property_tokens(
    ctx: &mut Context,
    order: &[String],
    property: &str,
    also_private: bool,
) -> Vec<String> {
    let mut out = Vec::new();
    for name in order {
        let Some(pc) = ctx.cached(name) else { continue };
        let overrides = ctx.overrides_for(name);
        let kind = PropertyKind::of(property);
        if let Some(tokens) = pc.property_raw(property) {
            out.extend(pkgconf_core::expand::expand_property(kind, tokens, pc.variables(), &overrides));
        }
        if also_private {
            if let Some(tokens) = pc.property_raw(LIBS_PRIVATE) {
                out.extend(pkgconf_core::expand::expand_property(kind, tokens, pc.variables(), &overrides));
            }
        }
    }
    out
}
