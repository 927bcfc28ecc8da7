use clap::{Parser, Subcommand};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE", global = true)]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT", global = true)]
    pub port: Option<u16>,

    /// Actor platform API base URL
    #[arg(long, env = "APIFY_API_BASE_URL", global = true)]
    pub upstream_url: Option<String>,

    /// Seconds the platform may hold a run request open waiting for completion
    #[arg(long, env = "WAIT_FOR_FINISH_SECS", global = true)]
    pub wait_for_finish_secs: Option<u64>,

    /// Bridge API base URL used by the client subcommands
    #[arg(long, env = "BRIDGE_URL", global = true)]
    pub bridge_url: Option<String>,

    /// API token used by the client subcommands
    #[arg(long, env = "APIFY_TOKEN", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Log format: compact or json
    #[arg(long, env = "LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP bridge (default)
    Serve,
    /// List the actors visible to the API token
    Actors,
    /// Show the input form an actor's schema produces
    Schema {
        /// Actor id or `username~name`
        actor_id: String,
    },
    /// Run an actor and follow it until it settles
    Run {
        /// Actor id or `username~name`
        actor_id: String,
        /// Run input as a JSON object (defaults to the schema's initial input)
        #[arg(long, conflicts_with = "input_file")]
        input: Option<String>,
        /// Read run input from a JSON file
        #[arg(long)]
        input_file: Option<PathBuf>,
        /// Directory to export the run output into
        #[arg(long)]
        export: Option<PathBuf>,
    },
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub polling: PollingConfig,
    pub client: ClientConfig,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub request_timeout_secs: u64,
    pub cors_permissive: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub wait_for_finish_secs: u64,
    pub http_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingConfig {
    pub interval_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    pub bridge_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Self::from_cli(&cli)
    }

    pub fn from_cli(cli: &Cli) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder();

        // 1. Defaults
        builder = builder
            .set_default("server.port", 3001)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.request_timeout_secs", 180)?
            .set_default("server.cors_permissive", true)?
            .set_default("upstream.base_url", "https://api.apify.com/v2")?
            .set_default("upstream.wait_for_finish_secs", 120)?
            .set_default("upstream.http_timeout_secs", 150)?
            .set_default("polling.interval_ms", 2000)?
            .set_default("client.bridge_url", "http://127.0.0.1:3001/api")?
            .set_default("log.format", "compact")?;

        // 2. Config file: explicit path is required, ./config.* is optional
        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path).required(true)),
            None => builder.add_source(File::with_name("config").required(false)),
        };

        // 3. Environment variables (prefixed with ACTOR_BRIDGE_)
        // E.g. ACTOR_BRIDGE_SERVER__PORT=8000
        builder = builder.add_source(
            Environment::with_prefix("ACTOR_BRIDGE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // 4. CLI flags and their clap-level env vars win over everything
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(url) = &cli.upstream_url {
            builder = builder.set_override("upstream.base_url", url.as_str())?;
        }
        if let Some(secs) = cli.wait_for_finish_secs {
            builder = builder.set_override(
                "upstream.wait_for_finish_secs",
                i64::try_from(secs).unwrap_or(i64::MAX),
            )?;
        }
        if let Some(url) = &cli.bridge_url {
            builder = builder.set_override("client.bridge_url", url.as_str())?;
        }
        if let Some(key) = &cli.api_key {
            builder = builder.set_override("client.api_key", key.as_str())?;
        }
        if let Some(format) = &cli.log_format {
            builder = builder.set_override("log.format", format.to_lowercase())?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.upstream.http_timeout_secs <= self.upstream.wait_for_finish_secs {
            return Err(config::ConfigError::Message(format!(
                "upstream.http_timeout_secs ({}) must exceed upstream.wait_for_finish_secs ({})",
                self.upstream.http_timeout_secs, self.upstream.wait_for_finish_secs
            )));
        }
        if self.server.request_timeout_secs <= self.upstream.wait_for_finish_secs {
            return Err(config::ConfigError::Message(format!(
                "server.request_timeout_secs ({}) must exceed upstream.wait_for_finish_secs ({})",
                self.server.request_timeout_secs, self.upstream.wait_for_finish_secs
            )));
        }
        if self.polling.interval_ms == 0 {
            return Err(config::ConfigError::Message(
                "polling.interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl UpstreamConfig {
    pub fn wait_for_finish(&self) -> Duration {
        Duration::from_secs(self.wait_for_finish_secs)
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}
