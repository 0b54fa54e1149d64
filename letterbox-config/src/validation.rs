// Configuration validation

use crate::{ConfigError, Result};

/// Trait for validating configuration
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Configuration validator with rules
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate that a value is not empty
    pub fn not_empty(value: &str, field: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be empty",
                field
            )));
        }
        Ok(())
    }

    /// Validate that a number is within range
    pub fn in_range<T: PartialOrd + std::fmt::Display>(
        value: T,
        min: T,
        max: T,
        field: &str,
    ) -> Result<()> {
        if value < min || value > max {
            return Err(ConfigError::ValidationError(format!(
                "{} must be between {} and {}, got {}",
                field, min, max, value
            )));
        }
        Ok(())
    }

    /// Validate that a value is in a list of allowed values
    pub fn one_of(value: &str, allowed: &[&str], field: &str) -> Result<()> {
        if !allowed.iter().any(|a| a.eq_ignore_ascii_case(value)) {
            return Err(ConfigError::ValidationError(format!(
                "{} must be one of {:?}, got {:?}",
                field, allowed, value
            )));
        }
        Ok(())
    }

    /// Validate email format (basic)
    pub fn is_email(value: &str, field: &str) -> Result<()> {
        let valid = value
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !valid {
            return Err(ConfigError::ValidationError(format!(
                "{} must be a valid email, got {:?}",
                field, value
            )));
        }
        Ok(())
    }

    /// Validate port number
    pub fn is_port(value: u16, field: &str) -> Result<()> {
        if value == 0 {
            return Err(ConfigError::ValidationError(format!(
                "{} must be a valid port number",
                field
            )));
        }
        Ok(())
    }

    /// Validate an IANA timezone name
    pub fn is_timezone(value: &str, field: &str) -> Result<()> {
        value.parse::<chrono_tz::Tz>().map(|_| ()).map_err(|_| {
            ConfigError::ValidationError(format!(
                "{} must be an IANA timezone name, got {:?}",
                field, value
            ))
        })
    }

    /// Validate a `email|password,email|password` sender pool
    pub fn is_sender_pool(value: &str, field: &str) -> Result<()> {
        Self::not_empty(value, field)?;
        for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (email, password) = entry.split_once('|').ok_or_else(|| {
                ConfigError::ValidationError(format!(
                    "{} entries must look like email|password",
                    field
                ))
            })?;
            Self::is_email(email.trim(), field)?;
            Self::not_empty(password, &format!("{} password for {}", field, email.trim()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_empty_validation() {
        assert!(ConfigValidator::not_empty("value", "field").is_ok());
        assert!(ConfigValidator::not_empty("   ", "field").is_err());
    }

    #[test]
    fn test_range_validation() {
        assert!(ConfigValidator::in_range(5, 1, 10, "field").is_ok());
        assert!(ConfigValidator::in_range(0, 1, 10, "field").is_err());
        assert!(ConfigValidator::in_range(11, 1, 10, "field").is_err());
    }

    #[test]
    fn test_one_of_validation() {
        let allowed = ["tls", "starttls", "none"];
        assert!(ConfigValidator::one_of("TLS", &allowed, "field").is_ok());
        assert!(ConfigValidator::one_of("ssl", &allowed, "field").is_err());
    }

    #[test]
    fn test_email_validation() {
        assert!(ConfigValidator::is_email("ops@example.com", "field").is_ok());
        assert!(ConfigValidator::is_email("@example.com", "field").is_err());
        assert!(ConfigValidator::is_email("ops@localhost", "field").is_err());
    }

    #[test]
    fn test_timezone_validation() {
        assert!(ConfigValidator::is_timezone("Asia/Taipei", "field").is_ok());
        assert!(ConfigValidator::is_timezone("Mars/Olympus", "field").is_err());
    }

    #[test]
    fn test_sender_pool_validation() {
        assert!(ConfigValidator::is_sender_pool("a@x.com|pw, b@y.org|pw2", "f").is_ok());
        assert!(ConfigValidator::is_sender_pool("a@x.com", "f").is_err());
        assert!(ConfigValidator::is_sender_pool("a@x.com|", "f").is_err());
        assert!(ConfigValidator::is_sender_pool("", "f").is_err());
    }

    #[test]
    fn test_port_validation() {
        assert!(ConfigValidator::is_port(465, "field").is_ok());
        assert!(ConfigValidator::is_port(0, "field").is_err());
    }
}
