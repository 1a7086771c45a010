//! Command-line and environment configuration.

use std::time::Duration;

use clap::Parser;
use tgpilot_api::ApiConfig;
use tgpilot_runtime::RuntimeConfig;

/// tgpilot - automate channel discovery, joins and comments over HTTP
#[derive(Parser, Debug, Clone)]
#[command(name = "tgpilot", version)]
#[command(about = "HTTP service automating channel discovery, joins and comments")]
pub struct Args {
    /// Host to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Environment name (development, production, ...)
    #[arg(long = "env", env = "APP_ENV", default_value = "development")]
    pub environment: String,

    /// Upper bound for any single remote call, in seconds (unbounded if unset)
    #[arg(long, env = "TGPILOT_CALL_TIMEOUT_SECS")]
    pub call_timeout_secs: Option<u64>,

    /// Pause after each join attempt, in milliseconds
    #[arg(long, env = "TGPILOT_JOIN_DELAY_MS", default_value_t = 2000)]
    pub join_delay_ms: u64,

    /// Pause between discovery keywords, in milliseconds
    #[arg(long, env = "TGPILOT_KEYWORD_DELAY_MS", default_value_t = 500)]
    pub keyword_delay_ms: u64,

    /// Pause after each channel lookup, in milliseconds
    #[arg(long, env = "TGPILOT_LOOKUP_DELAY_MS", default_value_t = 100)]
    pub lookup_delay_ms: u64,

    /// Maximum results per keyword search
    #[arg(long, env = "TGPILOT_SEARCH_LIMIT", default_value_t = 50)]
    pub search_limit: usize,

    /// Treat channels that report no comment setting as commentable
    #[arg(long, env = "TGPILOT_COMMENTS_DEFAULT", default_value_t = true, action = clap::ArgAction::Set)]
    pub comments_default: bool,

    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Workflow configuration.
    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig::new()
            .with_search_limit(self.search_limit)
            .with_channel_lookup_delay(Duration::from_millis(self.lookup_delay_ms))
            .with_keyword_delay(Duration::from_millis(self.keyword_delay_ms))
            .with_join_delay(Duration::from_millis(self.join_delay_ms))
            .with_comments_default(self.comments_default)
            .with_call_timeout(
                self.call_timeout_secs
                    .filter(|secs| *secs > 0)
                    .map(Duration::from_secs),
            )
    }

    /// HTTP server configuration.
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig::new(&self.host, self.port).with_environment(&self.environment)
    }

    /// Default log filter for the verbosity level.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "tgpilot=info,tgpilot_api=info,tgpilot_runtime=info,tower_http=warn",
            1 => "tgpilot=debug,tgpilot_api=debug,tgpilot_runtime=debug,tower_http=info",
            2 => "tgpilot=trace,tgpilot_api=trace,tgpilot_runtime=trace,tgpilot_protocol=debug,tower_http=debug",
            _ => "trace",
        }
    }
}
