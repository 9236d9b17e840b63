use clap::Parser;
use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "rv32-emu.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("no program image specified")]
    MissingImage,
}

/// Runs a raw RV32I machine-code image with a memory-mapped console.
#[derive(Parser, Deserialize, Debug, Default)]
#[command(author, version, about)]
#[serde(default, deny_unknown_fields)]
pub struct OptionalConfig {
    /// Raw RV32I image to execute, loaded at address 0
    pub image: Option<PathBuf>,

    /// Fail on loads and stores that are not aligned to their width
    #[arg(long)]
    pub enforce_alignment: bool,

    /// Also store console port writes in memory
    #[arg(long)]
    pub mirror_port_writes: bool,

    /// Log every executed instruction at trace level
    #[arg(long)]
    pub trace: bool,

    /// Stop after N instructions
    #[arg(long)]
    pub max_cycles: Option<u64>,

    /// Log filter used when RUST_LOG is not set (e.g. "debug")
    #[arg(long)]
    pub log_level: Option<String>,

    /// Config file to read instead of ./rv32-emu.toml
    #[arg(long)]
    #[serde(skip)]
    pub config: Option<PathBuf>,
}

impl OptionalConfig {
    pub fn get_args() -> Self {
        Self::parse()
    }

    /// Reads `path`, or the default config file if it exists.
    pub fn get_toml(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if !required && e.kind() == io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        toml::from_str(&text).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Values set in `self` take precedence over `rhs`.
    pub fn merge(self, rhs: Self) -> Self {
        Self {
            image: self.image.or(rhs.image),
            enforce_alignment: self.enforce_alignment || rhs.enforce_alignment,
            mirror_port_writes: self.mirror_port_writes || rhs.mirror_port_writes,
            trace: self.trace || rhs.trace,
            max_cycles: self.max_cycles.or(rhs.max_cycles),
            log_level: self.log_level.or(rhs.log_level),
            config: self.config.or(rhs.config),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub image: PathBuf,
    pub enforce_alignment: bool,
    pub mirror_port_writes: bool,
    pub trace: bool,
    /// 0 = no limit
    pub max_cycles: u64,
    pub log_level: String,
}

impl TryFrom<OptionalConfig> for Config {
    type Error = ConfigError;

    fn try_from(config: OptionalConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            image: config.image.ok_or(ConfigError::MissingImage)?,
            enforce_alignment: config.enforce_alignment,
            mirror_port_writes: config.mirror_port_writes,
            trace: config.trace,
            max_cycles: config.max_cycles.unwrap_or(0),
            log_level: config.log_level.unwrap_or_else(|| "warn".to_string()),
        })
    }
}

impl Config {
    pub fn get() -> Result<Self, ConfigError> {
        let args = OptionalConfig::get_args();
        let file = OptionalConfig::get_toml(args.config.as_deref())?;
        args.merge(file).try_into()
    }
}
