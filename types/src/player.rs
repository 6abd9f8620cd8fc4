use serde::{Deserialize, Serialize};

/// Settings object accepted by the adaptive media player engine.
///
/// Only the keys that are set get serialized, so the same record is used
/// both for the low latency toggle and for the catch-up tuning update.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerSettings {
    pub streaming: StreamingSettings,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_latency_enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<DelaySettings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_catchup: Option<LiveCatchupSettings>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelaySettings {
    pub live_delay: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveCatchupSettings {
    pub min_drift: f64,
    pub playback_rate: f64,
    pub latency_threshold: f64,
}
