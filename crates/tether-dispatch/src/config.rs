//! Dispatch engine configuration.

use std::time::Duration;

use serde::Deserialize;

/// When an idle runtime is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpirationStrategy {
    /// The runtime lives until closed explicitly. Used for the throwaway
    /// contexts independent components run in.
    Never,
    /// The runtime is closed once no event has arrived for the given
    /// duration.
    Inactivity(Duration),
}

/// Tunables of the dispatch engine, usually loaded from `tether.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Minutes of inactivity after which a runtime expires; `0` disables
    /// expiration entirely.
    pub expiration_minutes: u64,
    /// Whether interactions on independent components still run the
    /// middleware chain (permissions, cooldowns, custom middlewares).
    pub independent_middlewares: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            expiration_minutes: 15,
            independent_middlewares: true,
        }
    }
}

impl DispatchConfig {
    /// The expiration strategy applied to command-started runtimes.
    pub fn expiration(&self) -> ExpirationStrategy {
        if self.expiration_minutes == 0 {
            ExpirationStrategy::Never
        } else {
            ExpirationStrategy::Inactivity(Duration::from_secs(self.expiration_minutes * 60))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_minutes_disables_expiration() {
        let config = DispatchConfig {
            expiration_minutes: 0,
            ..DispatchConfig::default()
        };
        assert_eq!(config.expiration(), ExpirationStrategy::Never);
    }

    #[test]
    fn default_expires_after_fifteen_minutes() {
        assert_eq!(
            DispatchConfig::default().expiration(),
            ExpirationStrategy::Inactivity(Duration::from_secs(900))
        );
    }
}
