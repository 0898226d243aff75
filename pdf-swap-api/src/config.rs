//! Command line, server settings and logger configuration

use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Prefix of the environment variables overriding [`ServerConfig`]
pub const ENV_PREFIX: &str = "PDF_SWAP";

/// Optional settings file searched in the working directory (any format `config` knows)
pub const SETTINGS_FILE: &str = "pdf-swap";

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// PDF swap web service
#[derive(Debug, Parser)]
#[command(name = "pdf-swap", version, about = "Splice annex PDFs into a principal PDF over HTTP")]
pub struct Cli {
    /// TCP port to bind [default: 5000]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Verbose logging to standard error
    #[arg(short, long)]
    pub debug: bool,

    /// Logger configuration file (TOML, JSON or YAML)
    #[arg(short, long, value_name = "PATH")]
    pub logger: Option<PathBuf>,
}

impl Cli {
    /// Parse the process arguments.
    ///
    /// Help and version exit with status 0, any usage error with status 1.
    pub fn parse_or_exit() -> Self {
        match Self::try_parse() {
            Ok(cli) => cli,
            Err(error) => {
                let code = if error.use_stderr() { 1 } else { 0 };
                // Nothing more useful to do if stderr is closed
                let _ = error.print();
                std::process::exit(code);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on a request body
    pub max_upload_bytes: usize,
    /// Base directory for per-request working areas
    pub work_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            work_dir: std::env::temp_dir(),
        }
    }
}

impl ServerConfig {
    /// Load from the optional settings file and `PDF_SWAP__*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Environment::with_prefix(ENV_PREFIX))
    }

    pub fn load_from(environment: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(SETTINGS_FILE).required(false))
            .add_source(environment.separator("__").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
    Pretty,
}

/// Contents of the `--logger` file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// `EnvFilter` directive, e.g. `pdf_swap=debug,tower_http=info`
    pub filter: Option<String>,
    pub format: LogFormat,
    pub ansi: Option<bool>,
    pub target: Option<bool>,
}

impl LoggerConfig {
    /// Read a logger file; the format follows the file extension.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path).required(true))
            .build()?
            .try_deserialize()
    }
}
