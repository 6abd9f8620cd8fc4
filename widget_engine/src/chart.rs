use crate::mount::MountHandle;
use crate::series::{SeriesBuffer, parse_limit};
use crate::widget::{Widget, WidgetConfig};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};
use types::{
    Animation, Axis, AxisTitle, ChartData, ChartOptions, ChartPlugins,
    ChartScales, ChartSetup, ChartSpec, ChartTitle, Font, Legend, RawDataset,
    TimeAxis,
};

/// Chart drawing engine.
pub trait ChartRenderer: Send + Sync {
    fn render(&self, target: &MountHandle, spec: &ChartSpec) -> Box<dyn ChartHandle>;
}

/// Live chart owned by a renderer.
pub trait ChartHandle: Send {
    /// Redraw with new data
    fn update(&mut self, data: &ChartData);

    fn destroy(&mut self);
}

/// Where charts get the current contents of a named dataset.
pub trait DataSource: Send + Sync {
    fn chart_data(&self, dataset: &str) -> RawDataset;

    /// Record a new point for `dataset`
    fn append(&self, dataset: &str, label: &JsonValue, values: &[f64]);
}

/// Data source kept in memory, each dataset bounded to `history` points.
#[derive(Debug)]
pub struct MemoryDataSource {
    history: Option<NonZeroUsize>,
    datasets: Mutex<HashMap<String, SeriesBuffer>>,
}

impl MemoryDataSource {
    pub fn new(history: Option<NonZeroUsize>) -> Self {
        Self {
            history,
            datasets: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the contents of `dataset`.
    pub fn insert(&self, dataset: &str, raw: RawDataset) {
        self.datasets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(dataset.to_string(), SeriesBuffer::from_raw(raw, self.history));
    }
}

impl DataSource for MemoryDataSource {
    fn chart_data(&self, dataset: &str) -> RawDataset {
        self.datasets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(dataset)
            .map(SeriesBuffer::to_raw)
            .unwrap_or_default()
    }

    fn append(&self, dataset: &str, label: &JsonValue, values: &[f64]) {
        self.datasets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(dataset.to_string())
            .or_insert_with(|| SeriesBuffer::new(self.history))
            .push(label.clone(), values);
    }
}

pub struct ChartContext {
    pub renderer: Arc<dyn ChartRenderer>,
    pub data: Arc<dyn DataSource>,
}

/// Rendering options derived from a chart setup.
///
/// Title and axis labels only appear when their text is non-empty, the time
/// axis only for time series, and the y axis always starts at zero.
pub fn chart_options(setup: &ChartSetup) -> ChartOptions {
    let title = (!setup.title.is_empty()).then(|| ChartTitle {
        display: true,
        text: setup.title.clone(),
        font: Font { size: 14 },
    });

    let x_axes = setup.timeseries.then(|| TimeAxis {
        axis_type: "time".to_string(),
        distribution: "linear".to_string(),
    });

    let x = (!setup.x_label.is_empty()).then(|| Axis {
        begin_at_zero: None,
        display: Some(true),
        title: Some(AxisTitle {
            display: true,
            text: setup.x_label.clone(),
        }),
    });

    let y = if setup.y_label.is_empty() {
        Axis {
            begin_at_zero: Some(true),
            ..Axis::default()
        }
    } else {
        Axis {
            begin_at_zero: Some(true),
            display: Some(true),
            title: Some(AxisTitle {
                display: true,
                text: setup.y_label.clone(),
            }),
        }
    };

    ChartOptions {
        maintain_aspect_ratio: false,
        plugins: ChartPlugins {
            legend: Legend {
                position: "top".to_string(),
            },
            title,
        },
        scales: ChartScales { x_axes, x, y },
        animation: Animation { duration: 0 },
        resize_delay: 125,
    }
}

/// Numeric chart bound to a dataset.
pub struct ChartWidget {
    sid: String,
    dataset: String,
    buffer: SeriesBuffer,
    handle: Option<Box<dyn ChartHandle>>,
}

impl ChartWidget {
    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub const fn limit_points(&self) -> Option<NonZeroUsize> {
        self.buffer.limit()
    }

    pub const fn buffer(&self) -> &SeriesBuffer {
        &self.buffer
    }

    /// Append a point and redraw, evicting the oldest points past the limit.
    ///
    /// Returns `false` on a destroyed chart.
    pub fn push(&mut self, label: JsonValue, values: &[f64]) -> bool {
        let Some(handle) = self.handle.as_mut() else {
            debug!("Ignoring points for destroyed chart {}", self.sid);
            return false;
        };

        self.buffer.push(label, values);
        handle.update(&self.buffer.chart_data());
        true
    }
}

impl Widget for ChartWidget {
    type Setup = ChartSetup;
    type Context = ChartContext;

    fn create(
        context: &ChartContext,
        config: &WidgetConfig<ChartSetup>,
    ) -> Option<Self> {
        let setup = &config.setup;
        let limit = parse_limit(setup.limit_points.as_ref());
        let buffer = SeriesBuffer::from_raw(
            context.data.chart_data(&setup.dataset),
            limit,
        );

        let spec = ChartSpec {
            chart_type: setup.chart_type.clone(),
            data: buffer.chart_data(),
            options: chart_options(setup),
        };
        let handle = context.renderer.render(&config.target, &spec);

        info!(
            "Created {} chart {} on {} for dataset {}",
            setup.chart_type,
            config.sid,
            config.target.id(),
            setup.dataset
        );

        Some(Self {
            sid: config.sid.clone(),
            dataset: setup.dataset.clone(),
            buffer,
            handle: Some(handle),
        })
    }

    fn sid(&self) -> &str {
        &self.sid
    }

    fn destroy(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.destroy();
            debug!("Destroyed chart {}", self.sid);
        }
        self.buffer.clear();
    }

    fn is_live(&self) -> bool {
        self.handle.is_some()
    }
}
