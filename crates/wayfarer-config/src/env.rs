//! Typed environment-variable loading with prefix, defaults and validation.

use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnvError {
    #[error("environment variable not found: {var}")]
    NotFound { var: String },
    #[error("invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },
    #[error("type conversion error for {var}: {reason}")]
    ConversionError { var: String, reason: String },
}

pub struct EnvConfigLoader {
    prefix: Option<String>,
    required: Vec<String>,
    defaults: HashMap<String, String>,
}

impl EnvConfigLoader {
    pub fn new() -> Self {
        Self {
            prefix: None,
            required: Vec::new(),
            defaults: HashMap::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn require(mut self, var: impl Into<String>) -> Self {
        self.required.push(var.into());
        self
    }

    pub fn default(mut self, var: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(var.into(), value.into());
        self
    }

    fn make_var_name(&self, var: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, var.to_uppercase()),
            None => var.to_uppercase(),
        }
    }

    pub fn get(&self, var: &str) -> Result<String, EnvError> {
        let full_var = self.make_var_name(var);
        env::var(&full_var).or_else(|_| {
            self.defaults
                .get(var)
                .cloned()
                .ok_or_else(|| EnvError::NotFound { var: full_var.clone() })
        })
    }

    pub fn get_optional(&self, var: &str) -> Option<String> {
        let full_var = self.make_var_name(var);
        env::var(&full_var).ok().or_else(|| self.defaults.get(var).cloned())
    }

    pub fn get_int(&self, var: &str) -> Result<i64, EnvError> {
        let value = self.get(var)?;
        value.parse().map_err(|e| EnvError::ConversionError {
            var: self.make_var_name(var),
            reason: format!("cannot parse as integer: {e}"),
        })
    }

    pub fn get_u32(&self, var: &str) -> Result<u32, EnvError> {
        let value = self.get(var)?;
        value.parse().map_err(|e| EnvError::ConversionError {
            var: self.make_var_name(var),
            reason: format!("cannot parse as u32: {e}"),
        })
    }

    pub fn get_f64(&self, var: &str) -> Result<f64, EnvError> {
        let value = self.get(var)?;
        value.parse().map_err(|e| EnvError::ConversionError {
            var: self.make_var_name(var),
            reason: format!("cannot parse as float: {e}"),
        })
    }

    pub fn get_bool(&self, var: &str) -> Result<bool, EnvError> {
        let value = self.get(var)?;
        match value.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(EnvError::InvalidValue {
                var: self.make_var_name(var),
                reason: format!("invalid boolean value: {value}"),
            }),
        }
    }

    /// Supports "30s", "5m", "1h", "500ms"; bare numbers default to seconds.
    pub fn get_duration(&self, var: &str) -> Result<Duration, EnvError> {
        let value = self.get(var)?;
        parse_duration(&value).map_err(|reason| EnvError::ConversionError {
            var: self.make_var_name(var),
            reason,
        })
    }

    pub fn get_list(&self, var: &str) -> Result<Vec<String>, EnvError> {
        let value = self.get(var)?;
        Ok(value.split(',').map(|s| s.trim().to_string()).collect())
    }

    pub fn validate(&self) -> Result<(), EnvError> {
        for var in &self.required {
            self.get(var)?;
        }
        Ok(())
    }
}

impl Default for EnvConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim().to_lowercase();
    if let Some(num) = s.strip_suffix("ms") {
        return num.parse().map(Duration::from_millis).map_err(|e| e.to_string());
    }
    if let Some(num) = s.strip_suffix('s') {
        return num.parse().map(Duration::from_secs).map_err(|e| e.to_string());
    }
    if let Some(num) = s.strip_suffix('m') {
        return num
            .parse::<u64>()
            .map(|n| Duration::from_secs(n * 60))
            .map_err(|e| e.to_string());
    }
    if let Some(num) = s.strip_suffix('h') {
        return num
            .parse::<u64>()
            .map(|n| Duration::from_secs(n * 3600))
            .map_err(|e| e.to_string());
    }
    s.parse::<u64>().map(Duration::from_secs).map_err(|_| format!("invalid duration format: {s}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_parsing_covers_all_suffixes() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("60").unwrap(), Duration::from_secs(60));
    }

    #[test]
    fn defaults_used_when_var_absent() {
        let loader = EnvConfigLoader::new()
            .with_prefix("WAYFARER_TEST_MISSING_")
            .default("timeout", "60");
        assert_eq!(loader.get_int("timeout").unwrap(), 60);
    }

    #[test]
    fn validate_fails_on_missing_required() {
        let loader = EnvConfigLoader::new()
            .with_prefix("WAYFARER_TEST_VALIDATE_")
            .require("required_var");
        assert!(loader.validate().is_err());
    }
}
