use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use widget_engine::{CatchupProfile, GatewayConfig};

/// Prefix of the environment variables read by the host
pub const ENV_PREFIX: &str = "DASHBOARD_";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HostConfig {
    pub gateway: GatewayConfig,
    pub catchup: CatchupProfile,

    /// Points kept per dataset for charts created later
    pub history_points: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            catchup: CatchupProfile::default(),
            history_points: 1000,
        }
    }
}

impl HostConfig {
    /// History bound, `0` keeps everything
    pub const fn history(&self) -> Option<NonZeroUsize> {
        NonZeroUsize::new(self.history_points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        figment::Jail::expect_with(|_jail| {
            let config: HostConfig = dash_app::load_config(ENV_PREFIX)?;

            assert_eq!(config, HostConfig::default());
            assert_eq!(config.gateway.timeout_secs, 10);
            assert_eq!(config.catchup.live_delay, 10.0);
            assert_eq!(config.history(), NonZeroUsize::new(1000));
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("DASHBOARD_GATEWAY__TIMEOUT_SECS", "3");
            jail.set_env("DASHBOARD_GATEWAY__BASE_URL", "http://devices.local/");
            jail.set_env("DASHBOARD_CATCHUP__LIVE_DELAY", "4.5");
            jail.set_env("DASHBOARD_CATCHUP__LOW_LATENCY", "false");
            jail.set_env("DASHBOARD_HISTORY_POINTS", "0");

            let config: HostConfig = dash_app::load_config(ENV_PREFIX)?;

            assert_eq!(config.gateway.timeout_secs, 3);
            assert_eq!(
                config.gateway.base_url.as_deref(),
                Some("http://devices.local/")
            );
            assert_eq!(config.catchup.live_delay, 4.5);
            assert!(!config.catchup.low_latency);
            assert_eq!(config.catchup.latency_threshold, 60.0);
            assert_eq!(config.history(), None);
            Ok(())
        });
    }
}
