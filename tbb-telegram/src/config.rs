//! Bot 配置：Telegram 接入、日志、用户存储与会话参数。
//! 与外部交互：从环境变量加载（main 中先通过 dotenvy 读取 .env）。

use anyhow::{Context, Result};
use session::SessionSettings;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// 选择内存存储的 DATABASE_URL 取值。
pub const MEMORY_STORE_URL: &str = "memory";

/// Bot 配置，从环境变量加载
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// BOT_TOKEN
    pub bot_token: String,
    /// TELEGRAM_API_URL 或 TELOXIDE_API_URL
    pub telegram_api_url: Option<String>,
    /// LOG_FILE
    pub log_file: String,
    /// LOG_LEVEL，未设置 RUST_LOG 时生效
    pub log_level: String,
    /// DATABASE_URL；`memory` 使用内存存储
    pub database_url: String,
    /// BOT_SESSION_TIMEOUT_MINUTES，0 表示使用默认值
    pub session_timeout_minutes: u64,
    /// PROFILE_REFRESH_HOURS
    pub profile_refresh_hours: u64,
    /// ALLOWED_CHAT_IDS，逗号分隔；为空表示不限制
    pub allowed_chat_ids: Vec<i64>,
}

fn env_number<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .with_context(|| format!("{} is not a valid number: {}", name, value)),
        _ => Ok(default),
    }
}

fn parse_chat_ids(value: &str) -> Result<Vec<i64>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse()
                .with_context(|| format!("ALLOWED_CHAT_IDS contains an invalid chat id: {}", s))
        })
        .collect()
}

impl BotConfig {
    /// 从环境变量加载配置。`token` 不为空时覆盖 BOT_TOKEN。
    pub fn load(token: Option<String>) -> Result<Self> {
        let bot_token = match token {
            Some(token) => token,
            None => env::var("BOT_TOKEN").context("BOT_TOKEN not set")?,
        };
        let telegram_api_url = env::var("TELEGRAM_API_URL")
            .or_else(|_| env::var("TELOXIDE_API_URL"))
            .ok();
        let log_file = env::var("LOG_FILE").unwrap_or_else(|_| "logs/tbb.log".to_string());
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://tbb.db".to_string());
        let session_timeout_minutes = env_number("BOT_SESSION_TIMEOUT_MINUTES", 15)?;
        let profile_refresh_hours = env_number("PROFILE_REFRESH_HOURS", 24)?;
        let allowed_chat_ids = match env::var("ALLOWED_CHAT_IDS") {
            Ok(value) => parse_chat_ids(&value)?,
            Err(_) => Vec::new(),
        };

        Ok(Self {
            bot_token,
            telegram_api_url,
            log_file,
            log_level,
            database_url,
            session_timeout_minutes,
            profile_refresh_hours,
            allowed_chat_ids,
        })
    }

    /// 校验配置（设置了 telegram_api_url 时必须是合法 URL）。
    pub fn validate(&self) -> Result<()> {
        if let Some(ref url_str) = self.telegram_api_url {
            if reqwest::Url::parse(url_str).is_err() {
                anyhow::bail!(
                    "TELEGRAM_API_URL (or TELOXIDE_API_URL) is set but not a valid URL: {}",
                    url_str
                );
            }
        }
        if self.bot_token.trim().is_empty() {
            anyhow::bail!("BOT_TOKEN is empty");
        }
        Ok(())
    }

    pub fn use_memory_store(&self) -> bool {
        self.database_url == MEMORY_STORE_URL
    }

    /// 转换为会话参数。
    pub fn session_settings(&self) -> SessionSettings {
        let defaults = SessionSettings::default();
        let session_timeout = match self.session_timeout_minutes {
            0 => defaults.session_timeout,
            minutes => Duration::from_secs(minutes * 60),
        };
        SessionSettings {
            allowed_chat_ids: self.allowed_chat_ids.clone(),
            session_timeout,
            profile_refresh_after: Duration::from_secs(self.profile_refresh_hours * 3600),
        }
    }
}
