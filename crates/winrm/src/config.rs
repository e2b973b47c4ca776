//! The caller-mutable settings every operation snapshots into its header
//! block.

use std::time::Duration;

use winrm_protocol::header::HeaderConfig;

/// Defaults match the values Windows' own `winrm` client ships with.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_MAX_ENVELOPE_SIZE: u32 = 153_600;
pub const DEFAULT_LOCALE: &str = "en-US";

#[derive(Debug, Clone)]
pub struct SessionConfig {
    operation_timeout: Duration,
    max_envelope_size: u32,
    locale: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
            max_envelope_size: DEFAULT_MAX_ENVELOPE_SIZE,
            locale: DEFAULT_LOCALE.to_string(),
        }
    }
}

impl SessionConfig {
    pub fn operation_timeout(&self) -> Duration {
        self.operation_timeout
    }

    pub fn set_operation_timeout(&mut self, timeout: Duration) {
        self.operation_timeout = timeout;
    }

    pub fn max_envelope_size(&self) -> u32 {
        self.max_envelope_size
    }

    pub fn set_max_envelope_size(&mut self, octets: u32) {
        self.max_envelope_size = octets;
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn set_locale(&mut self, locale: impl Into<String>) {
        self.locale = locale.into();
    }

    /// Snapshots the current values into the header-block config the
    /// protocol engine's builders take.
    pub fn snapshot(&self) -> HeaderConfig {
        HeaderConfig {
            operation_timeout: self.operation_timeout,
            max_envelope_size: self.max_envelope_size,
            locale: self.locale.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let config = SessionConfig::default();
        assert_eq!(config.operation_timeout(), DEFAULT_OPERATION_TIMEOUT);
        assert_eq!(config.max_envelope_size(), DEFAULT_MAX_ENVELOPE_SIZE);
        assert_eq!(config.locale(), DEFAULT_LOCALE);
    }

    #[test]
    fn setters_are_reflected_in_the_next_snapshot() {
        let mut config = SessionConfig::default();
        config.set_operation_timeout(Duration::from_secs(30));
        config.set_max_envelope_size(64_000);
        config.set_locale("fr-FR");

        let snapshot = config.snapshot();
        assert_eq!(snapshot.operation_timeout, Duration::from_secs(30));
        assert_eq!(snapshot.max_envelope_size, 64_000);
        assert_eq!(snapshot.locale, "fr-FR");
    }
}
