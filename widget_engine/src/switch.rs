use crate::gateway::{Decode, Gateway};
use crate::mount::{Element, MountHandle};
use crate::widget::{Widget, WidgetConfig};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};
use types::SwitchSetup;

/// Class set on the mount point while the switch is on
const ON_CLASS: &str = "on";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwitchState {
    #[default]
    Off,
    On,
}

impl SwitchState {
    pub const fn toggled(self) -> Self {
        match self {
            Self::Off => Self::On,
            Self::On => Self::Off,
        }
    }

    pub const fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

pub struct SwitchContext {
    pub gateway: Gateway,
}

#[derive(Debug)]
struct SwitchInner {
    on_url: String,
    off_url: String,
    state: SwitchState,
    in_flight: bool,
    /// Bumped on destroy, so replies to older requests are discarded
    generation: u64,
    target: Option<MountHandle>,
}

type Shared = Arc<Mutex<SwitchInner>>;

fn lock(shared: &Shared) -> MutexGuard<'_, SwitchInner> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle that runs the switch's transitions, also held by the click handler.
#[derive(Clone)]
struct SwitchCommand {
    sid: String,
    shared: Shared,
    gateway: Gateway,
}

impl SwitchCommand {
    /// Claim the transition slot, returning the URL to call, the state to
    /// move to and the generation the request belongs to.
    fn begin(&self) -> Option<(String, SwitchState, u64)> {
        let mut inner = lock(&self.shared);

        if inner.target.is_none() {
            debug!("Switch {} is destroyed, ignoring command", self.sid);
            return None;
        }
        if inner.in_flight {
            debug!("Switch {} already has a transition in flight", self.sid);
            return None;
        }

        let next = inner.state.toggled();
        let url = match next {
            SwitchState::On => inner.on_url.clone(),
            SwitchState::Off => inner.off_url.clone(),
        };
        inner.in_flight = true;

        Some((url, next, inner.generation))
    }

    async fn run(self) -> bool {
        let Some((url, next, generation)) = self.begin() else {
            return false;
        };

        let shared = Arc::clone(&self.shared);
        let delivered = self
            .gateway
            .request(&url, Decode::Raw, move |_| {
                let mut inner = lock(&shared);
                if inner.generation != generation {
                    return;
                }
                if let Some(target) = &inner.target {
                    target.set_class(ON_CLASS, next.is_on());
                }
                inner.state = next;
            })
            .await;

        let mut inner = lock(&self.shared);
        if inner.generation != generation {
            debug!("Switch {} was destroyed while its request was pending", self.sid);
            return false;
        }
        inner.in_flight = false;

        if delivered {
            info!("Switch {} is now {:?}", self.sid, next);
        }
        delivered
    }

    fn spawn(&self) {
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(self.clone().run());
            }
            Err(_) => warn!("Switch {} clicked outside of a runtime", self.sid),
        }
    }
}

/// Two-state remote control bound to an "on" and an "off" endpoint.
///
/// The state only changes once the endpoint answered successfully, and at
/// most one transition is in flight at any time.
pub struct SwitchWidget {
    command: SwitchCommand,
}

impl SwitchWidget {
    pub fn state(&self) -> SwitchState {
        lock(&self.command.shared).state
    }

    pub fn in_flight(&self) -> bool {
        lock(&self.command.shared).in_flight
    }

    /// Request the opposite state.
    ///
    /// Resolves to `true` when the transition was confirmed. A failed
    /// request, a transition already in flight or a destroyed switch leave
    /// the state untouched and resolve to `false`.
    pub fn command(&self) -> impl Future<Output = bool> + Send + 'static {
        self.command.clone().run()
    }
}

impl Widget for SwitchWidget {
    type Setup = SwitchSetup;
    type Context = SwitchContext;

    fn create(
        context: &SwitchContext,
        config: &WidgetConfig<SwitchSetup>,
    ) -> Option<Self> {
        let target = Arc::clone(&config.target);
        let command = SwitchCommand {
            sid: config.sid.clone(),
            shared: Arc::new(Mutex::new(SwitchInner {
                on_url: config.setup.on_url.clone(),
                off_url: config.setup.off_url.clone(),
                state: SwitchState::Off,
                in_flight: false,
                generation: 0,
                target: Some(Arc::clone(&target)),
            })),
            gateway: context.gateway.clone(),
        };

        let on_click = command.clone();
        target.on_click(Arc::new(move || on_click.spawn()));
        target.set_class(ON_CLASS, false);
        target.append(vec![
            Element::new("h2", config.setup.title.clone()),
            Element::new("h3", config.setup.subtitle.clone()),
        ]);

        info!("Created switch {} on {}", config.sid, target.id());
        Some(Self { command })
    }

    fn sid(&self) -> &str {
        &self.command.sid
    }

    fn destroy(&mut self) {
        let mut inner = lock(&self.command.shared);
        let Some(target) = inner.target.take() else {
            return;
        };

        inner.on_url.clear();
        inner.off_url.clear();
        inner.state = SwitchState::Off;
        inner.in_flight = false;
        inner.generation += 1;
        drop(inner);

        target.clear_click();
        target.set_class(ON_CLASS, false);
        target.remove_children();
        debug!("Destroyed switch {}", self.command.sid);
    }

    fn is_live(&self) -> bool {
        lock(&self.command.shared).target.is_some()
    }
}
