//! Collaborators that render nothing: they log what a real display would do,
//! for hosts without a screen. Built with `recording()` they also keep a
//! journal of it for tests to inspect.

use crate::chart::{ChartHandle, ChartRenderer};
use crate::mount::{ClickHandler, Element, MountHandle, MountPoint, MountResolver};
use crate::stream::{MediaEngine, MediaPlayer};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};
use types::{ChartData, ChartSpec, PlayerSettings};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared event list, absent when the collaborator only logs.
struct Journal<T> {
    entries: Option<Arc<Mutex<Vec<T>>>>,
}

impl<T> Journal<T> {
    fn recording() -> Self {
        Self {
            entries: Some(Arc::new(Mutex::new(Vec::new()))),
        }
    }

    const fn disabled() -> Self {
        Self { entries: None }
    }

    /// `event` is only built when the journal is kept
    fn record(&self, event: impl FnOnce() -> T) {
        if let Some(entries) = &self.entries {
            lock(entries).push(event());
        }
    }

    fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, |entries| lock(entries).len())
    }
}

impl<T: Clone> Journal<T> {
    fn snapshot(&self) -> Vec<T> {
        self.entries
            .as_ref()
            .map_or_else(Vec::new, |entries| lock(entries).clone())
    }
}

impl<T> Clone for Journal<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

#[derive(Default)]
struct MountState {
    children: Vec<Element>,
    classes: BTreeSet<String>,
    source: Option<String>,
    click: Option<ClickHandler>,
}

pub struct HeadlessMount {
    id: String,
    state: Mutex<MountState>,
}

impl HeadlessMount {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: Mutex::new(MountState::default()),
        }
    }

    pub fn children(&self) -> Vec<Element> {
        lock(&self.state).children.clone()
    }

    pub fn has_class(&self, class: &str) -> bool {
        lock(&self.state).classes.contains(class)
    }

    pub fn source(&self) -> Option<String> {
        lock(&self.state).source.clone()
    }

    pub fn has_click_handler(&self) -> bool {
        lock(&self.state).click.is_some()
    }
}

impl MountPoint for HeadlessMount {
    fn id(&self) -> &str {
        &self.id
    }

    fn append(&self, children: Vec<Element>) {
        debug!(mount = %self.id, "Appending {} children", children.len());
        lock(&self.state).children.extend(children);
    }

    fn remove_children(&self) {
        debug!(mount = %self.id, "Removing children");
        lock(&self.state).children.clear();
    }

    fn on_click(&self, handler: ClickHandler) {
        lock(&self.state).click = Some(handler);
    }

    fn clear_click(&self) {
        lock(&self.state).click = None;
    }

    fn click(&self) -> bool {
        // the handler may call back into this mount, so run it unlocked
        let handler = lock(&self.state).click.clone();
        let Some(handler) = handler else {
            debug!(mount = %self.id, "Click without a handler");
            return false;
        };
        handler();
        true
    }

    fn set_source(&self, uri: &str) {
        info!(mount = %self.id, "Source set to {}", uri);
        lock(&self.state).source = Some(uri.to_string());
    }

    fn set_class(&self, class: &str, enabled: bool) {
        let mut state = lock(&self.state);
        let changed = if enabled {
            state.classes.insert(class.to_string())
        } else {
            state.classes.remove(class)
        };
        if changed {
            info!(mount = %self.id, "Class {} {}", class, if enabled { "added" } else { "removed" });
        }
    }
}

/// Mount points created when a widget first renders into them, by name.
#[derive(Default)]
pub struct HeadlessMounts {
    mounts: Mutex<HashMap<String, Arc<HeadlessMount>>>,
}

impl HeadlessMounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<Arc<HeadlessMount>> {
        lock(&self.mounts).get(id).cloned()
    }

    pub fn get_or_create(&self, id: &str) -> Arc<HeadlessMount> {
        Arc::clone(
            lock(&self.mounts)
                .entry(id.to_string())
                .or_insert_with(|| Arc::new(HeadlessMount::new(id))),
        )
    }
}

impl MountResolver for HeadlessMounts {
    fn resolve(&self, target: &str) -> Option<MountHandle> {
        let mount: MountHandle = self.get_or_create(target);
        Some(mount)
    }

    fn find(&self, target: &str) -> Option<MountHandle> {
        let mount: MountHandle = self.get(target)?;
        Some(mount)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    Rendered {
        chart: usize,
        target: String,
        spec: ChartSpec,
    },
    Updated {
        chart: usize,
        data: ChartData,
    },
    Destroyed {
        chart: usize,
    },
}

impl RenderEvent {
    pub const fn chart(&self) -> usize {
        match self {
            Self::Rendered { chart, .. }
            | Self::Updated { chart, .. }
            | Self::Destroyed { chart } => *chart,
        }
    }
}

#[derive(Clone)]
pub struct HeadlessRenderer {
    events: Journal<RenderEvent>,
    next_chart: Arc<AtomicUsize>,
}

impl HeadlessRenderer {
    /// Renderer that keeps every event, see [`Self::events`].
    pub fn recording() -> Self {
        Self {
            events: Journal::recording(),
            next_chart: Arc::default(),
        }
    }

    /// Renderer that only logs, for long running hosts.
    pub fn logging() -> Self {
        Self {
            events: Journal::disabled(),
            next_chart: Arc::default(),
        }
    }

    /// Events recorded so far, always empty for a logging renderer.
    pub fn events(&self) -> Vec<RenderEvent> {
        self.events.snapshot()
    }

    pub fn recorded(&self) -> usize {
        self.events.len()
    }
}

impl ChartRenderer for HeadlessRenderer {
    fn render(&self, target: &MountHandle, spec: &ChartSpec) -> Box<dyn ChartHandle> {
        let chart = self.next_chart.fetch_add(1, Ordering::Relaxed);
        info!(
            chart,
            mount = %target.id(),
            "Rendering {} chart with {} series",
            spec.chart_type,
            spec.data.datasets.len()
        );
        self.events.record(|| RenderEvent::Rendered {
            chart,
            target: target.id().to_string(),
            spec: spec.clone(),
        });

        Box::new(HeadlessChart {
            chart,
            events: self.events.clone(),
        })
    }
}

struct HeadlessChart {
    chart: usize,
    events: Journal<RenderEvent>,
}

impl ChartHandle for HeadlessChart {
    fn update(&mut self, data: &ChartData) {
        debug!(chart = self.chart, "Updating with {} labels", data.labels.len());
        self.events.record(|| RenderEvent::Updated {
            chart: self.chart,
            data: data.clone(),
        });
    }

    fn destroy(&mut self) {
        info!(chart = self.chart, "Destroying chart");
        self.events.record(|| RenderEvent::Destroyed { chart: self.chart });
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    Created {
        player: usize,
    },
    Settings {
        player: usize,
        settings: PlayerSettings,
    },
    Initialized {
        player: usize,
        target: String,
        manifest: String,
        autoplay: bool,
    },
    Attached {
        player: usize,
        manifest: String,
    },
    Destroyed {
        player: usize,
    },
}

#[derive(Clone)]
pub struct HeadlessMediaEngine {
    events: Journal<PlayerEvent>,
    next_player: Arc<AtomicUsize>,
}

impl HeadlessMediaEngine {
    pub fn recording() -> Self {
        Self {
            events: Journal::recording(),
            next_player: Arc::default(),
        }
    }

    pub fn logging() -> Self {
        Self {
            events: Journal::disabled(),
            next_player: Arc::default(),
        }
    }

    pub fn events(&self) -> Vec<PlayerEvent> {
        self.events.snapshot()
    }

    pub fn recorded(&self) -> usize {
        self.events.len()
    }

    /// Number of players created so far
    pub fn created(&self) -> usize {
        self.next_player.load(Ordering::Relaxed)
    }
}

impl MediaEngine for HeadlessMediaEngine {
    fn create_player(&self) -> Box<dyn MediaPlayer> {
        let player = self.next_player.fetch_add(1, Ordering::Relaxed);
        self.events.record(|| PlayerEvent::Created { player });

        Box::new(HeadlessPlayer {
            player,
            events: self.events.clone(),
        })
    }
}

struct HeadlessPlayer {
    player: usize,
    events: Journal<PlayerEvent>,
}

impl MediaPlayer for HeadlessPlayer {
    fn update_settings(&mut self, settings: &PlayerSettings) {
        debug!(player = self.player, "Updating settings {:?}", settings);
        self.events.record(|| PlayerEvent::Settings {
            player: self.player,
            settings: settings.clone(),
        });
    }

    fn initialize(&mut self, target: &MountHandle, manifest: &str, autoplay: bool) {
        info!(player = self.player, mount = %target.id(), "Playing {}", manifest);
        self.events.record(|| PlayerEvent::Initialized {
            player: self.player,
            target: target.id().to_string(),
            manifest: manifest.to_string(),
            autoplay,
        });
    }

    fn attach_source(&mut self, manifest: &str) {
        info!(player = self.player, "Switching to {}", manifest);
        self.events.record(|| PlayerEvent::Attached {
            player: self.player,
            manifest: manifest.to_string(),
        });
    }

    fn destroy(&mut self) {
        info!(player = self.player, "Destroying player");
        self.events.record(|| PlayerEvent::Destroyed { player: self.player });
    }
}
