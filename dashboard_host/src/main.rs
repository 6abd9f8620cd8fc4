use dash_app::{AppError, ContextProvider};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use types::DashboardEvent;
use widget_engine::headless::{HeadlessMediaEngine, HeadlessMounts, HeadlessRenderer};
use widget_engine::{
    ChartContext, Dashboard, Gateway, MemoryDataSource, StreamContext,
    SwitchContext,
};

mod config;
use config::{ENV_PREFIX, HostConfig};

struct AppContext {
    dashboard: Dashboard,
    mounts: HeadlessMounts,
}

impl ContextProvider<HostConfig> for AppContext {
    async fn new(config: HostConfig) -> Result<Self, AppError> {
        let gateway = Gateway::new(&config.gateway)
            .map_err(|err| AppError::Context(err.to_string()))?;

        let dashboard = Dashboard::new(
            ChartContext {
                renderer: Arc::new(HeadlessRenderer::logging()),
                data: Arc::new(MemoryDataSource::new(config.history())),
            },
            StreamContext {
                engine: Arc::new(HeadlessMediaEngine::logging()),
                catchup: config.catchup,
            },
            SwitchContext { gateway },
        );

        Ok(Self {
            dashboard,
            mounts: HeadlessMounts::new(),
        })
    }
}

fn handle_line(context: &mut AppContext, line: &str) {
    let event: DashboardEvent = match serde_json::from_str(line) {
        Ok(event) => event,
        Err(err) => {
            warn!("Failed to parse event {:?}: {}", line, err);
            return;
        }
    };

    if let Err(err) = context.dashboard.apply(event, &context.mounts) {
        warn!("Failed to apply event: {}", err);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut context =
        dash_app::create_app_context::<AppContext, HostConfig>(ENV_PREFIX)
            .await?;

    info!("Reading dashboard events from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut processed = 0_usize;
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        handle_line(&mut context, &line);
        processed += 1;
    }

    info!(
        "Input closed after {} events: {} charts, {} streams, {} switches",
        processed,
        context.dashboard.charts().len(),
        context.dashboard.players().len(),
        context.dashboard.switches().len()
    );
    context.dashboard.teardown();

    Ok(())
}
