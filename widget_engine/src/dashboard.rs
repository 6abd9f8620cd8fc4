use crate::chart::{ChartContext, ChartWidget};
use crate::mount::MountResolver;
use crate::stream::{self, StreamContext, StreamWidget};
use crate::switch::{SwitchContext, SwitchWidget};
use crate::widget::{WidgetCollection, WidgetConfig};
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, info};
use types::{ChartSetup, DashboardEvent, StreamSetup, SwitchSetup};

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Unknown mount point: {0}")]
    UnknownTarget(String),
}

/// Owner of every live widget of one dashboard.
///
/// Each kind has its own collection, and a sid is unique within a
/// collection: configuration for a known sid regenerates the widget instead
/// of adding a second one.
pub struct Dashboard {
    charts: WidgetCollection<ChartWidget>,
    players: WidgetCollection<StreamWidget>,
    switches: WidgetCollection<SwitchWidget>,
    chart_context: ChartContext,
    stream_context: StreamContext,
    switch_context: SwitchContext,
}

impl Dashboard {
    pub fn new(
        chart_context: ChartContext,
        stream_context: StreamContext,
        switch_context: SwitchContext,
    ) -> Self {
        Self {
            charts: WidgetCollection::new(),
            players: WidgetCollection::new(),
            switches: WidgetCollection::new(),
            chart_context,
            stream_context,
            switch_context,
        }
    }

    pub const fn charts(&self) -> &WidgetCollection<ChartWidget> {
        &self.charts
    }

    pub const fn players(&self) -> &WidgetCollection<StreamWidget> {
        &self.players
    }

    pub const fn switches(&self) -> &WidgetCollection<SwitchWidget> {
        &self.switches
    }

    pub fn apply_chart(&mut self, config: &WidgetConfig<ChartSetup>) -> bool {
        self.charts.upsert(&self.chart_context, config)
    }

    pub fn apply_stream(&mut self, config: &WidgetConfig<StreamSetup>) -> bool {
        self.players.upsert(&self.stream_context, config)
    }

    pub fn apply_switch(&mut self, config: &WidgetConfig<SwitchSetup>) -> bool {
        self.switches.upsert(&self.switch_context, config)
    }

    pub fn update_manifest(&mut self, sid: &str, setup: &StreamSetup) -> usize {
        stream::update_manifest(&mut self.players, setup, sid)
    }

    /// Record a point for `dataset` and feed it to every chart bound to it.
    ///
    /// Returns the number of charts updated.
    pub fn push_points(
        &mut self,
        dataset: &str,
        label: &JsonValue,
        values: &[f64],
    ) -> usize {
        self.chart_context.data.append(dataset, label, values);

        let mut updated = 0;
        for chart in self.charts.iter_mut() {
            if chart.dataset() == dataset && chart.push(label.clone(), values) {
                updated += 1;
            }
        }
        updated
    }

    /// Route one event to the matching widget operation.
    ///
    /// # Errors
    /// If the event names a mount point the resolver does not know.
    pub fn apply<R>(
        &mut self,
        event: DashboardEvent,
        mounts: &R,
    ) -> Result<(), DashboardError>
    where
        R: MountResolver + ?Sized,
    {
        let resolve = |target: String| {
            mounts
                .resolve(&target)
                .ok_or(DashboardError::UnknownTarget(target))
        };

        match event {
            DashboardEvent::Chart { sid, setup, target } => {
                let config = WidgetConfig::new(sid, setup, resolve(target)?);
                self.apply_chart(&config);
            }
            DashboardEvent::Stream { sid, setup, target } => {
                let config = WidgetConfig::new(sid, setup, resolve(target)?);
                self.apply_stream(&config);
            }
            DashboardEvent::Switch { sid, setup, target } => {
                let config = WidgetConfig::new(sid, setup, resolve(target)?);
                self.apply_switch(&config);
            }
            DashboardEvent::Manifest { sid, setup } => {
                self.update_manifest(&sid, &setup);
            }
            DashboardEvent::Points {
                dataset,
                label,
                values,
            } => {
                let updated = self.push_points(&dataset, &label, &values);
                debug!("Points for {} reached {} charts", dataset, updated);
            }
            DashboardEvent::Click { target } => {
                let mount = mounts
                    .find(&target)
                    .ok_or(DashboardError::UnknownTarget(target))?;
                if !mount.click() {
                    debug!("Click on {} without a handler", mount.id());
                }
            }
        }

        Ok(())
    }

    /// Destroy every widget, as when the view goes away.
    pub fn teardown(&mut self) {
        let count = self.charts.len() + self.players.len() + self.switches.len();
        self.charts.clear();
        self.players.clear();
        self.switches.clear();
        if count > 0 {
            info!("Tore down {} widgets", count);
        }
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.teardown();
    }
}
