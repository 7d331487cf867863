use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the tipbot binary.
#[derive(Debug, Parser)]
#[command(name = "tipbot", version, about = "Daily tech-tip rotation service")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "TIPBOT_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP API and the daily posting schedule.
    Serve(Box<ServeArgs>),
    /// Run one rotation cycle now and exit.
    Post(PostArgs),
    /// Insert the bundled starter catalog.
    Seed(SeedArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatabaseOverride {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct LoggingOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct RotationOverrides {
    /// Override the IANA timezone that decides the calendar day.
    #[arg(long = "rotation-timezone", value_name = "TZ")]
    pub rotation_timezone: Option<String>,

    /// Override the publisher backend (x|log).
    #[arg(long = "publisher-mode", value_name = "MODE")]
    pub publisher_mode: Option<String>,

    /// Override the replacement tip generator (openai|disabled).
    #[arg(long = "generator-mode", value_name = "MODE")]
    pub generator_mode: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub database: DatabaseOverride,

    #[command(flatten)]
    pub logging: LoggingOverrides,

    #[command(flatten)]
    pub rotation: RotationOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Enable or disable the daily posting schedule.
    #[arg(
        long = "schedule-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub schedule_enabled: Option<bool>,

    /// Override the six-field cron expression (UTC) for the daily post.
    #[arg(long = "schedule-cron", value_name = "EXPR")]
    pub schedule_cron: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct PostArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,

    #[command(flatten)]
    pub logging: LoggingOverrides,

    #[command(flatten)]
    pub rotation: RotationOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct SeedArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,

    #[command(flatten)]
    pub logging: LoggingOverrides,
}
