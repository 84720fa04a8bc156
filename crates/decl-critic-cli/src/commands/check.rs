//! Check command implementation.

use anyhow::{bail, Context, Result};
use decl_critic::{
    ensure_tools_available, Critic, CriticConfig, ErrorKind, KindFilter, LookupCache,
    NpmCliRegistry, SyntacticOracle,
};
use std::path::PathBuf;

use super::output;
use crate::OutputFormat;

/// Config file names searched in the working directory, in priority order,
/// when no explicit --config path is given.
const CONFIG_CANDIDATES: &[&str] = &["decl-critic.toml", ".decl-critic.toml"];

/// Arguments of one check run.
pub struct CheckArgs {
    /// Declaration file to critique.
    pub declaration: PathBuf,
    /// Source module, when supplied explicitly.
    pub source: Option<PathBuf>,
    /// Skip registry interaction entirely.
    pub offline: bool,
    /// Kind names to enable.
    pub enable: Vec<String>,
    /// Kind names to disable.
    pub disable: Vec<String>,
    /// Output format.
    pub format: OutputFormat,
    /// Print inference diagnostics.
    pub debug: bool,
    /// Optional config file path.
    pub config: Option<PathBuf>,
}

/// Runs the check command.
pub fn run(args: CheckArgs) -> Result<()> {
    let config = resolve_config(args.config.as_deref())?;

    let filter = build_filter(&config, &args.enable, &args.disable)?;

    let mut critic = Critic::new(Box::new(SyntacticOracle::new()))
        .with_detector(config.detector())
        .with_filter(filter);
    if let Some(squatters) = config.known_squatters.clone() {
        critic = critic.with_known_squatters(squatters);
    }
    if let Some(dir) = config.sources_dir.clone() {
        critic = critic.with_sources_dir(dir);
    }

    if args.offline {
        if args.source.is_none() {
            bail!("--offline requires --source, there is nothing to compare against");
        }
    } else {
        ensure_tools_available().context("registry tooling unavailable")?;
        let cache = match &config.cache_snapshot {
            Some(path) => LookupCache::load(path).context("failed to load lookup cache")?,
            None => LookupCache::in_memory(),
        };
        critic = critic.with_registry(Box::new(NpmCliRegistry::with_cache(cache)));
    }

    tracing::info!("Critiquing {}", args.declaration.display());

    let outcome = critic
        .critique(&args.declaration, args.source.as_deref())
        .context("Critique failed")?;

    if args.debug {
        if let Some(diagnostics) = &outcome.diagnostics {
            eprintln!("{}", diagnostics.format());
        }
    }

    output::print(&outcome.findings, args.format)?;

    if !outcome.findings.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

/// Loads the explicit config file, or the first candidate found in the
/// working directory, or the defaults.
fn resolve_config(explicit: Option<&std::path::Path>) -> Result<CriticConfig> {
    if let Some(path) = explicit {
        return CriticConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()));
    }
    for candidate in CONFIG_CANDIDATES {
        let path = std::path::Path::new(candidate);
        if path.exists() {
            tracing::info!("Using config: {}", path.display());
            return CriticConfig::from_file(path)
                .with_context(|| format!("Failed to load config: {}", path.display()));
        }
    }
    Ok(CriticConfig::default())
}

/// Layers the command-line kind switches over the config file overrides.
fn build_filter(config: &CriticConfig, enable: &[String], disable: &[String]) -> Result<KindFilter> {
    let mut filter = config
        .kind_filter()
        .context("invalid kind override in config")?;
    for name in enable {
        filter = filter.with_kind(lookup_kind(name)?, true);
    }
    for name in disable {
        filter = filter.with_kind(lookup_kind(name)?, false);
    }
    Ok(filter)
}

fn lookup_kind(name: &str) -> Result<ErrorKind> {
    match ErrorKind::from_name(name) {
        Some(kind) => Ok(kind),
        None => bail!("unknown finding kind '{name}'; see `decl-critic list-kinds`"),
    }
}
