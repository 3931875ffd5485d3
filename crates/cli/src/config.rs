use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tally_core::Granularity;
use tally_import::{default_aliases, extend_aliases, AliasTable, Field};

pub const DEFAULT_CONFIG_FILE: &str = "tally.toml";
pub const DEFAULT_OUTPUT_DIR: &str = "tally-report";

/// Contents of `tally.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub period: Option<Granularity>,
    pub output: Option<PathBuf>,
    /// Relative paths are resolved against the config file's directory.
    pub rules: Option<PathBuf>,
    pub delimiter: Option<String>,
    /// Extra column label -> canonical field aliases.
    pub aliases: BTreeMap<String, Field>,
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("parse config")
    }
}

/// Loads the config named on the command line, else `./tally.toml` if present,
/// else defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(p) => {
            if !p.exists() {
                bail!("Config file not found: {}", p.display());
            }
            p.to_path_buf()
        }
        None => {
            let p = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !p.exists() {
                return Ok(Config::default());
            }
            p
        }
    };

    let s = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let mut config =
        Config::from_toml_str(&s).with_context(|| format!("in {}", path.display()))?;

    if let (Some(rules), Some(base)) = (config.rules.as_ref(), path.parent()) {
        if rules.is_relative() {
            config.rules = Some(base.join(rules));
        }
    }
    tracing::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Effective settings after command-line flags override the config file.
#[derive(Debug, Clone)]
pub struct Settings {
    pub output: PathBuf,
    pub rules: Option<PathBuf>,
    pub period: Granularity,
    pub delimiter: String,
    pub aliases: AliasTable,
}

#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub output: Option<PathBuf>,
    pub rules: Option<PathBuf>,
    pub period: Option<Granularity>,
    pub delimiter: Option<char>,
}

impl Settings {
    pub fn resolve(config: Config, overrides: Overrides) -> Self {
        let mut aliases = default_aliases();
        extend_aliases(&mut aliases, config.aliases);

        Settings {
            output: overrides
                .output
                .or(config.output)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            rules: overrides.rules.or(config.rules),
            period: overrides.period.or(config.period).unwrap_or_default(),
            delimiter: overrides
                .delimiter
                .map(String::from)
                .or(config.delimiter)
                .unwrap_or_else(|| ",".to_string()),
            aliases,
        }
    }
}
