// Wire types shared by the dashboard engine and its hosts.
//
// Everything in here is plain data: it is what the server pushes, or what the
// widget engine hands over to the chart renderer and media player engines.

mod chart;
mod player;

pub use chart::{
    Animation, Axis, AxisTitle, ChartData, ChartOptions, ChartPlugins,
    ChartScales, ChartSeries, ChartSpec, ChartTitle, Font, Legend, RawDataset,
    RawSeries, TimeAxis,
};
pub use player::{
    DelaySettings, LiveCatchupSettings, PlayerSettings, StreamingSettings,
};

use serde::{Deserialize, Serialize};

fn default_chart_type() -> String {
    "line".to_string()
}

/// Setup block of a chart widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSetup {
    /// Name of the dataset the chart is bound to
    pub dataset: String,

    #[serde(default = "default_chart_type")]
    pub chart_type: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub x_label: String,

    #[serde(default)]
    pub y_label: String,

    #[serde(default)]
    pub timeseries: bool,

    /// Upper bound on visible points per series. Servers send either a
    /// number or a string here, so it is kept loose and parsed by the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_points: Option<serde_json::Value>,
}

/// Delivery kind of a stream widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StreamSource {
    /// Adaptive streaming through the media player engine
    #[serde(rename = "DASH", alias = "adaptive")]
    Adaptive,

    /// Single image refreshed by the server (MJPEG style)
    #[serde(rename = "MJPEG", alias = "single-image")]
    SingleImage,

    #[default]
    #[serde(other)]
    Unknown,
}

/// Setup block of a stream widget.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StreamSetup {
    #[serde(default)]
    pub source: StreamSource,

    /// Manifest URI for adaptive streams, image URI for single image streams
    #[serde(default)]
    pub manifest: String,
}

/// Setup block of a switch widget.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchSetup {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub subtitle: String,

    pub on_url: String,

    pub off_url: String,
}

/// Events pushed to a dashboard.
///
/// `target` always names a mount point; the host resolves it into a live
/// handle before the widget engine sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DashboardEvent {
    Chart {
        sid: String,
        setup: ChartSetup,
        target: String,
    },

    Stream {
        sid: String,
        setup: StreamSetup,
        target: String,
    },

    Switch {
        sid: String,
        setup: SwitchSetup,
        target: String,
    },

    /// Manifest-only change for a stream that is already live
    Manifest { sid: String, setup: StreamSetup },

    /// New data points for every chart bound to `dataset`
    Points {
        dataset: String,
        label: serde_json::Value,
        values: Vec<f64>,
    },

    /// Pointer click on a mount point
    Click { target: String },
}
