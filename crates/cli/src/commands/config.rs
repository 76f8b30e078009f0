use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use dockbook_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let doc = config_file_doc.as_ref();
    let path = config_file_path.as_deref();

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "database.url",
        &config.database.url,
        field_source("database.url", Some("DOCKBOOK_DATABASE_URL"), doc, path),
    ));
    lines.push(render_line(
        "database.max_connections",
        &config.database.max_connections.to_string(),
        field_source("database.max_connections", None, doc, path),
    ));

    let chat_token = if config.chat.access_token.is_some() { "<redacted>" } else { "<unset>" };
    lines.push(render_line(
        "chat.access_token",
        chat_token,
        field_source("chat.access_token", Some("DOCKBOOK_CHAT_ACCESS_TOKEN"), doc, path),
    ));
    lines.push(render_line(
        "chat.device_label",
        &config.chat.device_label,
        field_source("chat.device_label", None, doc, path),
    ));

    lines.push(render_line(
        "llm.model",
        &config.llm.model,
        field_source("llm.model", None, doc, path),
    ));
    let llm_api_key = if config.llm.api_key.is_some() { "<redacted>" } else { "<unset>" };
    lines.push(render_line(
        "llm.api_key",
        llm_api_key,
        field_source("llm.api_key", Some("DOCKBOOK_LLM_API_KEY"), doc, path),
    ));

    lines.push(render_line(
        "schedule.cutoff",
        &config.schedule.cutoff.format("%H:%M").to_string(),
        field_source("schedule.cutoff", Some("DOCKBOOK_SCHEDULE_CUTOFF"), doc, path),
    ));
    lines.push(render_line(
        "schedule.dates_offered",
        &config.schedule.dates_offered.to_string(),
        field_source("schedule.dates_offered", None, doc, path),
    ));
    lines.push(render_line(
        "schedule.lookahead_days",
        &config.schedule.lookahead_days.to_string(),
        field_source("schedule.lookahead_days", None, doc, path),
    ));

    lines.push(render_line(
        "session.idle_timeout_minutes",
        &config.session.idle_timeout_minutes.to_string(),
        field_source("session.idle_timeout_minutes", None, doc, path),
    ));
    lines.push(render_line(
        "session.admin_max_attempts",
        &config.session.admin_max_attempts.to_string(),
        field_source("session.admin_max_attempts", None, doc, path),
    ));

    let admin_secret = if config.admin.secret.is_some() { "<redacted>" } else { "<unset>" };
    lines.push(render_line(
        "admin.secret",
        admin_secret,
        field_source("admin.secret", Some("DOCKBOOK_ADMIN_SECRET"), doc, path),
    ));

    lines.push(render_line(
        "server.bind_address",
        &config.server.bind_address,
        field_source("server.bind_address", None, doc, path),
    ));
    lines.push(render_line(
        "server.health_check_port",
        &config.server.health_check_port.to_string(),
        field_source("server.health_check_port", None, doc, path),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        field_source("logging.level", Some("DOCKBOOK_LOG_LEVEL"), doc, path),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format).to_lowercase(),
        field_source("logging.format", Some("DOCKBOOK_LOG_FORMAT"), doc, path),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    if let Ok(env_path) = env::var("DOCKBOOK_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    let default = PathBuf::from("dockbook.toml");
    default.exists().then_some(default)
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let contents = fs::read_to_string(path).ok()?;
    contents.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_var: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(var) = env_var {
        if env::var(var).is_ok() {
            return format!("env ({var})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
