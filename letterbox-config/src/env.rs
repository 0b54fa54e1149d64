// Environment variable loading

use std::collections::HashMap;
use std::env;

/// Collects prefixed environment variables as lowercase config keys.
///
/// With prefix `LETTERBOX`, `LETTERBOX_SMTP_HOST=mx` becomes `smtp_host = "mx"`.
/// Variables without the prefix are ignored.
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    /// Create a new environment loader
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Load from the process environment
    pub fn load(&self) -> HashMap<String, String> {
        self.load_from(env::vars())
    }

    /// Load from an explicit set of variables
    pub fn load_from<I>(&self, vars: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        vars.into_iter()
            .filter_map(|(key, value)| self.config_key(&key).map(|k| (k, value)))
            .collect()
    }

    /// Map a variable name to its config key, if it belongs to this loader
    pub fn config_key(&self, var: &str) -> Option<String> {
        match &self.prefix {
            Some(prefix) => {
                let rest = var.strip_prefix(prefix.as_str())?.strip_prefix('_')?;
                if rest.is_empty() {
                    None
                } else {
                    Some(rest.to_lowercase())
                }
            }
            None => Some(var.to_lowercase()),
        }
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_prefix_is_trimmed_and_lowercased() {
        let loader = EnvLoader::new(Some("LETTERBOX".to_string()));
        let loaded = loader.load_from(pairs(&[
            ("LETTERBOX_SMTP_HOST", "smtp.example.com"),
            ("LETTERBOX_SMTP_PORT", "587"),
            ("PATH", "/usr/bin"),
        ]));

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded["smtp_host"], "smtp.example.com");
        assert_eq!(loaded["smtp_port"], "587");
    }

    #[test]
    fn test_prefix_requires_separator() {
        let loader = EnvLoader::new(Some("LETTERBOX".to_string()));
        assert_eq!(loader.config_key("LETTERBOXED_HOST"), None);
        assert_eq!(loader.config_key("LETTERBOX_"), None);
        assert_eq!(
            loader.config_key("LETTERBOX_TIMEZONE"),
            Some("timezone".to_string())
        );
    }

    #[test]
    fn test_no_prefix_keeps_everything() {
        let loader = EnvLoader::default();
        let loaded = loader.load_from(pairs(&[("HOME", "/root")]));
        assert_eq!(loaded["home"], "/root");
    }
}
