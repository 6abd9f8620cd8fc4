//! Live widget engine behind a dashboard.
//!
//! Charts, media streams and remote switches share one lifecycle
//! ([`Widget`]): they are created from a server-supplied configuration,
//! destroyed, and regenerated in place when new configuration arrives for a
//! sid that is already on screen. A [`Dashboard`] owns the live widgets and
//! routes [`types::DashboardEvent`]s to them.

pub mod chart;
pub mod dashboard;
pub mod gateway;
pub mod headless;
pub mod mount;
pub mod palette;
pub mod series;
pub mod stream;
pub mod switch;
pub mod widget;

#[cfg(test)]
mod testing;

pub use chart::{
    ChartContext, ChartHandle, ChartRenderer, ChartWidget, DataSource,
    MemoryDataSource,
};
pub use dashboard::{Dashboard, DashboardError};
pub use gateway::{Decode, Gateway, GatewayConfig, GatewayError, Reply};
pub use mount::{ClickHandler, Element, MountHandle, MountPoint, MountResolver};
pub use series::SeriesBuffer;
pub use stream::{
    CatchupProfile, MediaEngine, MediaPlayer, StreamContext, StreamWidget,
};
pub use switch::{SwitchContext, SwitchState, SwitchWidget};
pub use widget::{Widget, WidgetCollection, WidgetConfig};
