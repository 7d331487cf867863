//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;
#[cfg(test)]
mod tests;

pub use cli::*;

use std::{fmt, net::SocketAddr, num::NonZeroU32, str::FromStr, time::Duration};

use chrono_tz::Tz;
use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::application::jobs::daily_post_schedule;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "tipbot";
const ENV_PREFIX: &str = "TIPBOT";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_TIMEZONE: &str = "UTC";
const DEFAULT_PLATFORM: &str = "twitter";
const DEFAULT_SCHEDULE_CRON: &str = "0 0 9 * * *";
const DEFAULT_X_API_BASE: &str = "https://api.x.com";
const DEFAULT_PUBLISHER_TIMEOUT_SECS: u64 = 30;
const DEFAULT_GENERATOR_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_GENERATOR_MODEL: &str = "gpt-4o-mini";
const DEFAULT_GENERATOR_TIMEOUT_SECS: u64 = 30;
const PLATFORM_MAX_CHARS: usize = 20;

/// Environment variables accepted for the X credentials alongside `TIPBOT__PUBLISHER__*`.
pub const LEGACY_TWITTER_ENV: [&str; 4] = [
    "TWITTER_API_KEY",
    "TWITTER_API_SECRET",
    "TWITTER_ACCESS_TOKEN",
    "TWITTER_ACCESS_TOKEN_SECRET",
];

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub rotation: RotationSettings,
    pub schedule: ScheduleSettings,
    pub publisher: PublisherSettings,
    pub generator: GeneratorSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct RotationSettings {
    /// Timezone whose calendar day selects the category.
    pub timezone: Tz,
    /// Platform tag stored with every post attempt.
    pub platform: String,
}

#[derive(Debug, Clone)]
pub struct ScheduleSettings {
    pub enabled: bool,
    pub cron: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublisherMode {
    X,
    Log,
}

#[derive(Clone)]
pub struct XCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl fmt::Debug for XCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XCredentials")
            .field("api_key", &self.api_key)
            .field("access_token", &self.access_token)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct PublisherSettings {
    pub mode: PublisherMode,
    pub api_base: Url,
    pub timeout: Duration,
    pub credentials: Option<XCredentials>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorMode {
    OpenAi,
    Disabled,
}

#[derive(Clone)]
pub struct GeneratorSettings {
    pub mode: GeneratorMode,
    pub base_url: Url,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl fmt::Debug for GeneratorSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorSettings")
            .field("mode", &self.mode)
            .field("base_url", &self.base_url.as_str())
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.publisher
        .apply_legacy_credentials(|key| std::env::var(key).ok());

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Post(args)) => {
            raw.apply_database_override(&args.database);
            raw.apply_logging_overrides(&args.logging);
            raw.apply_rotation_overrides(&args.rotation);
        }
        Some(Command::Seed(args)) => {
            raw.apply_database_override(&args.database);
            raw.apply_logging_overrides(&args.logging);
        }
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    rotation: RawRotationSettings,
    schedule: RawScheduleSettings,
    publisher: RawPublisherSettings,
    generator: RawGeneratorSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(max) = overrides.database_max_connections {
            self.database.max_connections = Some(max);
        }
        if let Some(enabled) = overrides.schedule_enabled {
            self.schedule.enabled = Some(enabled);
        }
        if let Some(cron) = overrides.schedule_cron.as_ref() {
            self.schedule.cron = Some(cron.clone());
        }

        self.apply_database_override(&overrides.database);
        self.apply_logging_overrides(&overrides.logging);
        self.apply_rotation_overrides(&overrides.rotation);
    }

    fn apply_database_override(&mut self, overrides: &DatabaseOverride) {
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
    }

    fn apply_logging_overrides(&mut self, overrides: &LoggingOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }

    fn apply_rotation_overrides(&mut self, overrides: &RotationOverrides) {
        if let Some(timezone) = overrides.rotation_timezone.as_ref() {
            self.rotation.timezone = Some(timezone.clone());
        }
        if let Some(mode) = overrides.publisher_mode.as_ref() {
            self.publisher.mode = Some(mode.clone());
        }
        if let Some(mode) = overrides.generator_mode.as_ref() {
            self.generator.mode = Some(mode.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            rotation,
            schedule,
            publisher,
            generator,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            rotation: build_rotation_settings(rotation)?,
            schedule: build_schedule_settings(schedule)?,
            publisher: build_publisher_settings(publisher)?,
            generator: build_generator_settings(generator)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.host", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = non_blank(database.url);
    let max_connections = non_zero_u32(
        database
            .max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .into(),
        "database.max_connections",
    )?;

    Ok(DatabaseSettings {
        url,
        max_connections,
    })
}

fn build_rotation_settings(rotation: RawRotationSettings) -> Result<RotationSettings, LoadError> {
    let timezone_name = non_blank(rotation.timezone).unwrap_or_else(|| DEFAULT_TIMEZONE.into());
    let timezone = Tz::from_str(&timezone_name).map_err(|_| {
        LoadError::invalid(
            "rotation.timezone",
            format!("`{timezone_name}` is not an IANA timezone"),
        )
    })?;

    let platform = non_blank(rotation.platform).unwrap_or_else(|| DEFAULT_PLATFORM.into());
    if platform.chars().count() > PLATFORM_MAX_CHARS {
        return Err(LoadError::invalid(
            "rotation.platform",
            format!("must be at most {PLATFORM_MAX_CHARS} characters"),
        ));
    }

    Ok(RotationSettings { timezone, platform })
}

fn build_schedule_settings(schedule: RawScheduleSettings) -> Result<ScheduleSettings, LoadError> {
    let cron = non_blank(schedule.cron).unwrap_or_else(|| DEFAULT_SCHEDULE_CRON.into());
    daily_post_schedule(&cron).map_err(|reason| LoadError::invalid("schedule.cron", reason))?;

    Ok(ScheduleSettings {
        enabled: schedule.enabled.unwrap_or(true),
        cron,
    })
}

fn build_publisher_settings(
    publisher: RawPublisherSettings,
) -> Result<PublisherSettings, LoadError> {
    let mode = match non_blank(publisher.mode).as_deref() {
        None | Some("x") | Some("twitter") => PublisherMode::X,
        Some("log") => PublisherMode::Log,
        Some(other) => {
            return Err(LoadError::invalid(
                "publisher.mode",
                format!("expected `x` or `log`, got `{other}`"),
            ));
        }
    };

    let api_base = parse_url(publisher.api_base, DEFAULT_X_API_BASE, "publisher.api_base")?;
    let timeout = timeout_secs(
        publisher.timeout_seconds,
        DEFAULT_PUBLISHER_TIMEOUT_SECS,
        "publisher.timeout_seconds",
    )?;

    let fields = [
        ("publisher.api_key", non_blank(publisher.api_key)),
        ("publisher.api_secret", non_blank(publisher.api_secret)),
        ("publisher.access_token", non_blank(publisher.access_token)),
        (
            "publisher.access_token_secret",
            non_blank(publisher.access_token_secret),
        ),
    ];
    let credentials = match fields {
        [
            (_, Some(api_key)),
            (_, Some(api_secret)),
            (_, Some(access_token)),
            (_, Some(access_token_secret)),
        ] => Some(XCredentials {
            api_key,
            api_secret,
            access_token,
            access_token_secret,
        }),
        [(_, None), (_, None), (_, None), (_, None)] => None,
        partial => {
            let missing = partial
                .iter()
                .find(|(_, value)| value.is_none())
                .map(|(key, _)| *key)
                .unwrap_or("publisher");
            return Err(LoadError::invalid(
                missing,
                "all four X credentials must be supplied together",
            ));
        }
    };

    Ok(PublisherSettings {
        mode,
        api_base,
        timeout,
        credentials,
    })
}

fn build_generator_settings(
    generator: RawGeneratorSettings,
) -> Result<GeneratorSettings, LoadError> {
    let mode = match non_blank(generator.mode).as_deref() {
        None | Some("disabled") => GeneratorMode::Disabled,
        Some("openai") => GeneratorMode::OpenAi,
        Some(other) => {
            return Err(LoadError::invalid(
                "generator.mode",
                format!("expected `openai` or `disabled`, got `{other}`"),
            ));
        }
    };

    Ok(GeneratorSettings {
        mode,
        base_url: parse_url(
            generator.base_url,
            DEFAULT_GENERATOR_BASE_URL,
            "generator.base_url",
        )?,
        model: non_blank(generator.model).unwrap_or_else(|| DEFAULT_GENERATOR_MODEL.into()),
        api_key: non_blank(generator.api_key),
        timeout: timeout_secs(
            generator.timeout_seconds,
            DEFAULT_GENERATOR_TIMEOUT_SECS,
            "generator.timeout_seconds",
        )?,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRotationSettings {
    timezone: Option<String>,
    platform: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawScheduleSettings {
    enabled: Option<bool>,
    cron: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawPublisherSettings {
    mode: Option<String>,
    api_base: Option<String>,
    timeout_seconds: Option<u64>,
    api_key: Option<String>,
    api_secret: Option<String>,
    access_token: Option<String>,
    access_token_secret: Option<String>,
}

impl RawPublisherSettings {
    /// Fill unset credentials from the `TWITTER_*` variables.
    fn apply_legacy_credentials(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let [api_key, api_secret, access_token, access_token_secret] = LEGACY_TWITTER_ENV;
        for (slot, key) in [
            (&mut self.api_key, api_key),
            (&mut self.api_secret, api_secret),
            (&mut self.access_token, access_token),
            (&mut self.access_token_secret, access_token_secret),
        ] {
            if slot.is_none() {
                *slot = lookup(key);
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawGeneratorSettings {
    mode: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
    timeout_seconds: Option<u64>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn parse_url(value: Option<String>, default: &str, key: &'static str) -> Result<Url, LoadError> {
    let raw = non_blank(value).unwrap_or_else(|| default.to_string());
    let url = Url::parse(&raw).map_err(|err| LoadError::invalid(key, format!("{err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(LoadError::invalid(key, "scheme must be http or https"));
    }
    Ok(url)
}

fn timeout_secs(value: Option<u64>, default: u64, key: &'static str) -> Result<Duration, LoadError> {
    match value.unwrap_or(default) {
        0 => Err(LoadError::invalid(key, "must be greater than zero")),
        secs => Ok(Duration::from_secs(secs)),
    }
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

