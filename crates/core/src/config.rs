use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schedule::calendar::CalendarPolicy;
use crate::schedule::duration::DurationTiers;
use crate::schedule::slots::BusinessHours;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub chat: ChatConfig,
    pub llm: LlmConfig,
    pub schedule: ScheduleConfig,
    pub session: SessionConfig,
    pub admin: AdminConfig,
    pub contacts: ContactsConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ChatConfig {
    /// Credential for the messaging transport behind the seam. Unset in
    /// development, where the noop transport runs.
    pub access_token: Option<SecretString>,
    pub device_label: String,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

/// Dock operating parameters. Times are local wall-clock; there is a
/// single clock, no timezone handling.
#[derive(Clone, Debug)]
pub struct ScheduleConfig {
    pub open: NaiveTime,
    pub close: NaiveTime,
    pub lunch_start: NaiveTime,
    pub lunch_end: NaiveTime,
    pub cadence_minutes: u32,
    pub cutoff: NaiveTime,
    pub dates_offered: usize,
    pub lookahead_days: u32,
    /// Fixed-date holidays as (day, month).
    pub holidays: Vec<(u32, u32)>,
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub idle_timeout_minutes: i64,
    pub admin_max_attempts: u32,
    /// When false (default), a greeting or menu word typed while a state
    /// is capturing free text only resets the flow if it is the entire
    /// message.
    pub triggers_interrupt_free_text: bool,
    pub reset_triggers: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct AdminConfig {
    /// Overrides the secret stored in the settings table when present.
    pub secret: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct ContactsConfig {
    pub quotation: String,
    pub purchasing: String,
    pub finance: String,
    pub hr: String,
    pub quality: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub health_check_port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub admin_secret: Option<String>,
    pub llm_api_key: Option<String>,
    pub chat_access_token: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://dockbook.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            chat: ChatConfig { access_token: None, device_label: "dockbook".to_string() },
            llm: LlmConfig {
                api_key: None,
                base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
                model: "gemini-1.5-flash".to_string(),
                timeout_secs: 30,
                max_retries: 2,
            },
            schedule: ScheduleConfig {
                open: hm(7, 30),
                close: hm(16, 30),
                lunch_start: hm(11, 0),
                lunch_end: hm(12, 0),
                cadence_minutes: 45,
                cutoff: hm(16, 30),
                dates_offered: 7,
                lookahead_days: 15,
                holidays: vec![
                    (1, 1),
                    (21, 4),
                    (1, 5),
                    (7, 9),
                    (12, 10),
                    (2, 11),
                    (15, 11),
                    (25, 12),
                ],
            },
            session: SessionConfig {
                idle_timeout_minutes: 30,
                admin_max_attempts: 3,
                triggers_interrupt_free_text: false,
                reset_triggers: [
                    "hi", "hello", "good morning", "good afternoon", "good evening", "menu",
                    "schedule", "booking", "unloading", "chat",
                ]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            },
            admin: AdminConfig { secret: None },
            contacts: ContactsConfig {
                quotation: "Jose Fernandes - (27) 99978-5768".to_string(),
                purchasing: "Diogo - (27) 99858-1383".to_string(),
                finance: "Angelita - (27) 99747-4410".to_string(),
                hr: "HR - (27) 99784-1052".to_string(),
                quality: "Gean - (27) 98108-1371".to_string(),
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                health_check_port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch)?;
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("dockbook.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn calendar_policy(&self) -> CalendarPolicy {
        CalendarPolicy {
            holidays: self.schedule.holidays.clone(),
            count: self.schedule.dates_offered,
            lookahead_days: self.schedule.lookahead_days,
            cutoff: self.schedule.cutoff,
        }
    }

    pub fn business_hours(&self) -> BusinessHours {
        BusinessHours {
            open: self.schedule.open,
            close: self.schedule.close,
            lunch_start: self.schedule.lunch_start,
            lunch_end: self.schedule.lunch_end,
            cadence_minutes: self.schedule.cadence_minutes,
        }
    }

    pub fn duration_tiers(&self) -> DurationTiers {
        DurationTiers::default()
    }

    pub fn idle_timeout(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.session.idle_timeout_minutes.max(1))
    }

    fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), ConfigError> {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(chat) = patch.chat {
            if let Some(chat_access_token_value) = chat.access_token {
                self.chat.access_token = Some(SecretString::from(chat_access_token_value));
            }
            if let Some(device_label) = chat.device_label {
                self.chat.device_label = device_label;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(SecretString::from(llm_api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(max_retries) = llm.max_retries {
                self.llm.max_retries = max_retries;
            }
        }

        if let Some(schedule) = patch.schedule {
            if let Some(open) = schedule.open {
                self.schedule.open = parse_time("schedule.open", &open)?;
            }
            if let Some(close) = schedule.close {
                self.schedule.close = parse_time("schedule.close", &close)?;
            }
            if let Some(lunch_start) = schedule.lunch_start {
                self.schedule.lunch_start = parse_time("schedule.lunch_start", &lunch_start)?;
            }
            if let Some(lunch_end) = schedule.lunch_end {
                self.schedule.lunch_end = parse_time("schedule.lunch_end", &lunch_end)?;
            }
            if let Some(cadence_minutes) = schedule.cadence_minutes {
                self.schedule.cadence_minutes = cadence_minutes;
            }
            if let Some(cutoff) = schedule.cutoff {
                self.schedule.cutoff = parse_time("schedule.cutoff", &cutoff)?;
            }
            if let Some(dates_offered) = schedule.dates_offered {
                self.schedule.dates_offered = dates_offered;
            }
            if let Some(lookahead_days) = schedule.lookahead_days {
                self.schedule.lookahead_days = lookahead_days;
            }
            if let Some(holidays) = schedule.holidays {
                let mut parsed = Vec::with_capacity(holidays.len());
                for holiday in holidays {
                    parsed.push(parse_holiday(&holiday)?);
                }
                self.schedule.holidays = parsed;
            }
        }

        if let Some(session) = patch.session {
            if let Some(idle_timeout_minutes) = session.idle_timeout_minutes {
                self.session.idle_timeout_minutes = idle_timeout_minutes;
            }
            if let Some(admin_max_attempts) = session.admin_max_attempts {
                self.session.admin_max_attempts = admin_max_attempts;
            }
            if let Some(triggers_interrupt_free_text) = session.triggers_interrupt_free_text {
                self.session.triggers_interrupt_free_text = triggers_interrupt_free_text;
            }
            if let Some(reset_triggers) = session.reset_triggers {
                self.session.reset_triggers = reset_triggers;
            }
        }

        if let Some(admin) = patch.admin {
            if let Some(admin_secret_value) = admin.secret {
                self.admin.secret = Some(SecretString::from(admin_secret_value));
            }
        }

        if let Some(contacts) = patch.contacts {
            if let Some(quotation) = contacts.quotation {
                self.contacts.quotation = quotation;
            }
            if let Some(purchasing) = contacts.purchasing {
                self.contacts.purchasing = purchasing;
            }
            if let Some(finance) = contacts.finance {
                self.contacts.finance = finance;
            }
            if let Some(hr) = contacts.hr {
                self.contacts.hr = hr;
            }
            if let Some(quality) = contacts.quality {
                self.contacts.quality = quality;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(url) = env::var("DOCKBOOK_DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(level) = env::var("DOCKBOOK_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = env::var("DOCKBOOK_LOG_FORMAT") {
            self.logging.format = format.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                key: "DOCKBOOK_LOG_FORMAT".to_string(),
                value: format,
            })?;
        }
        if let Ok(token) = env::var("DOCKBOOK_CHAT_ACCESS_TOKEN") {
            if !token.is_empty() {
                self.chat.access_token = Some(SecretString::from(token));
            }
        }
        if let Ok(key) = env::var("DOCKBOOK_LLM_API_KEY") {
            if !key.is_empty() {
                self.llm.api_key = Some(SecretString::from(key));
            }
        }
        if let Ok(secret) = env::var("DOCKBOOK_ADMIN_SECRET") {
            if !secret.is_empty() {
                self.admin.secret = Some(SecretString::from(secret));
            }
        }
        if let Ok(cutoff) = env::var("DOCKBOOK_SCHEDULE_CUTOFF") {
            self.schedule.cutoff =
                parse_time("DOCKBOOK_SCHEDULE_CUTOFF", &cutoff).map_err(|_| {
                    ConfigError::InvalidEnvOverride {
                        key: "DOCKBOOK_SCHEDULE_CUTOFF".to_string(),
                        value: cutoff,
                    }
                })?;
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(url) = overrides.database_url {
            self.database.url = url;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(admin_secret_value) = overrides.admin_secret {
            self.admin.secret = Some(SecretString::from(admin_secret_value));
        }
        if let Some(llm_api_key_value) = overrides.llm_api_key {
            self.llm.api_key = Some(SecretString::from(llm_api_key_value));
        }
        if let Some(chat_access_token_value) = overrides.chat_access_token {
            self.chat.access_token = Some(SecretString::from(chat_access_token_value));
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Validation("database.url must not be empty".into()));
        }
        if self.schedule.open >= self.schedule.close {
            return Err(ConfigError::Validation(
                "schedule.open must be before schedule.close".into(),
            ));
        }
        if self.schedule.lunch_start >= self.schedule.lunch_end {
            return Err(ConfigError::Validation(
                "schedule.lunch_start must be before schedule.lunch_end".into(),
            ));
        }
        if self.schedule.lunch_start < self.schedule.open
            || self.schedule.lunch_end > self.schedule.close
        {
            return Err(ConfigError::Validation(
                "lunch window must fall inside operating hours".into(),
            ));
        }
        if self.schedule.cadence_minutes == 0 {
            return Err(ConfigError::Validation("schedule.cadence_minutes must be > 0".into()));
        }
        if self.schedule.dates_offered == 0 {
            return Err(ConfigError::Validation("schedule.dates_offered must be > 0".into()));
        }
        for (day, month) in &self.schedule.holidays {
            if *day == 0 || *day > 31 || *month == 0 || *month > 12 {
                return Err(ConfigError::Validation(format!(
                    "invalid holiday day/month pair ({day}, {month})"
                )));
            }
        }
        if self.session.admin_max_attempts == 0 {
            return Err(ConfigError::Validation("session.admin_max_attempts must be > 0".into()));
        }
        Ok(())
    }
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }
    if let Ok(env_path) = env::var("DOCKBOOK_CONFIG") {
        let path = PathBuf::from(env_path);
        return path.exists().then_some(path);
    }
    let default = PathBuf::from("dockbook.toml");
    default.exists().then_some(default)
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn parse_time(field: &str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| {
        ConfigError::Validation(format!("{field} must be HH:MM, got `{value}`"))
    })
}

fn parse_holiday(value: &str) -> Result<(u32, u32), ConfigError> {
    let mut parts = value.trim().splitn(2, '/');
    let day = parts.next().and_then(|p| p.parse::<u32>().ok());
    let month = parts.next().and_then(|p| p.parse::<u32>().ok());
    match (day, month) {
        (Some(day @ 1..=31), Some(month @ 1..=12)) => Ok((day, month)),
        _ => Err(ConfigError::Validation(format!(
            "holiday entries must be DD/MM, got `{value}`"
        ))),
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid default time")
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    chat: Option<ChatPatch>,
    llm: Option<LlmPatch>,
    schedule: Option<SchedulePatch>,
    session: Option<SessionPatch>,
    admin: Option<AdminPatch>,
    contacts: Option<ContactsPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatPatch {
    access_token: Option<String>,
    device_label: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct SchedulePatch {
    open: Option<String>,
    close: Option<String>,
    lunch_start: Option<String>,
    lunch_end: Option<String>,
    cadence_minutes: Option<u32>,
    cutoff: Option<String>,
    dates_offered: Option<usize>,
    lookahead_days: Option<u32>,
    holidays: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct SessionPatch {
    idle_timeout_minutes: Option<i64>,
    admin_max_attempts: Option<u32>,
    triggers_interrupt_free_text: Option<bool>,
    reset_triggers: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct AdminPatch {
    secret: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ContactsPatch {
    quotation: Option<String>,
    purchasing: Option<String>,
    finance: Option<String>,
    hr: Option<String>,
    quality: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    health_check_port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
