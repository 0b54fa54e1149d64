// Application settings

use crate::validation::{ConfigValidator, Validate};
use crate::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Accepted values for `smtp_security`.
pub const SMTP_SECURITY_MODES: [&str; 3] = ["tls", "starttls", "none"];

/// Service settings.
///
/// Every field has a default except `sender_accounts`. Numeric fields accept
/// strings as well so that values coming from the environment deserialize.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub smtp_host: String,
    #[serde(deserialize_with = "lenient::deserialize")]
    pub smtp_port: u16,
    pub smtp_security: String,
    #[serde(deserialize_with = "lenient::deserialize")]
    pub smtp_timeout_secs: u64,
    /// `email|password,email|password`
    pub sender_accounts: String,
    pub sender_name: String,
    pub database_path: PathBuf,
    pub timezone: String,
    #[serde(deserialize_with = "lenient::deserialize")]
    pub tick_interval_ms: u64,
    pub upload_dir: PathBuf,
    pub report_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.qq.com".to_string(),
            smtp_port: 465,
            smtp_security: "tls".to_string(),
            smtp_timeout_secs: 30,
            sender_accounts: String::new(),
            sender_name: "Letterbox".to_string(),
            database_path: PathBuf::from("letterbox.db"),
            timezone: "Asia/Taipei".to_string(),
            tick_interval_ms: 1000,
            upload_dir: PathBuf::from("uploads"),
            report_dir: None,
        }
    }
}

impl Settings {
    /// Parsed scheduler timezone.
    pub fn timezone(&self) -> Result<chrono_tz::Tz> {
        self.timezone.parse().map_err(|_| {
            ConfigError::ValidationError(format!("unknown timezone {:?}", self.timezone))
        })
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn smtp_timeout(&self) -> Duration {
        Duration::from_secs(self.smtp_timeout_secs)
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        ConfigValidator::not_empty(&self.smtp_host, "smtp_host")?;
        ConfigValidator::is_port(self.smtp_port, "smtp_port")?;
        ConfigValidator::one_of(&self.smtp_security, &SMTP_SECURITY_MODES, "smtp_security")?;
        ConfigValidator::in_range(self.smtp_timeout_secs, 1, 600, "smtp_timeout_secs")?;
        ConfigValidator::is_sender_pool(&self.sender_accounts, "sender_accounts")?;
        ConfigValidator::not_empty(&self.sender_name, "sender_name")?;
        ConfigValidator::is_timezone(&self.timezone, "timezone")?;
        ConfigValidator::in_range(self.tick_interval_ms, 50, 60_000, "tick_interval_ms")?;
        Ok(())
    }
}

mod lenient {
    use serde::{Deserialize, Deserializer, de::Error};
    use std::fmt::Display;
    use std::str::FromStr;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<T> {
        Native(T),
        Text(String),
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + FromStr,
        T::Err: Display,
    {
        match Raw::<T>::deserialize(deserializer)? {
            Raw::Native(value) => Ok(value),
            Raw::Text(text) => text
                .trim()
                .parse()
                .map_err(|e| D::Error::custom(format!("{:?}: {}", text, e))),
        }
    }
}
