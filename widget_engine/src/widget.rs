use crate::mount::MountHandle;
use tracing::debug;

/// Configuration of one widget: identity, kind-specific setup, and the mount
/// point it renders into.
#[derive(Clone)]
pub struct WidgetConfig<S> {
    pub sid: String,
    pub setup: S,
    pub target: MountHandle,
}

impl<S> WidgetConfig<S> {
    pub fn new(sid: impl Into<String>, setup: S, target: MountHandle) -> Self {
        Self {
            sid: sid.into(),
            setup,
            target,
        }
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for WidgetConfig<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetConfig")
            .field("sid", &self.sid)
            .field("setup", &self.setup)
            .field("target", &self.target.id())
            .finish()
    }
}

/// Lifecycle shared by every widget kind.
pub trait Widget: Sized {
    type Setup;

    /// Engines and services the kind needs to build a widget
    type Context: ?Sized;

    /// Build a live widget. `None` means the configuration does not describe
    /// a widget of this kind.
    fn create(
        context: &Self::Context,
        config: &WidgetConfig<Self::Setup>,
    ) -> Option<Self>;

    fn sid(&self) -> &str;

    /// Release everything the widget holds. Operations on a destroyed widget
    /// are no-ops.
    fn destroy(&mut self);

    fn is_live(&self) -> bool;

    /// Replace every widget of `collection` matching `config.sid` with a
    /// fresh one, destroying the old one first.
    fn regenerate(
        collection: &mut WidgetCollection<Self>,
        context: &Self::Context,
        config: &WidgetConfig<Self::Setup>,
    ) -> usize {
        collection.regenerate(context, config)
    }
}

/// Owned list of live widgets of one kind.
#[derive(Debug)]
pub struct WidgetCollection<W> {
    widgets: Vec<W>,
}

impl<W> Default for WidgetCollection<W> {
    fn default() -> Self {
        Self {
            widgets: Vec::new(),
        }
    }
}

impl<W: Widget> WidgetCollection<W> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &W> {
        self.widgets.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut W> {
        self.widgets.iter_mut()
    }

    pub fn get(&self, sid: &str) -> Option<&W> {
        self.widgets.iter().find(|widget| widget.sid() == sid)
    }

    pub fn get_mut(&mut self, sid: &str) -> Option<&mut W> {
        self.widgets.iter_mut().find(|widget| widget.sid() == sid)
    }

    pub fn contains(&self, sid: &str) -> bool {
        self.get(sid).is_some()
    }

    /// Destroy-then-create every widget whose sid matches `config.sid`.
    ///
    /// A slot whose replacement cannot be built is removed, so a destroyed
    /// widget never stays reachable. Returns the number of widgets destroyed.
    pub fn regenerate(
        &mut self,
        context: &W::Context,
        config: &WidgetConfig<W::Setup>,
    ) -> usize {
        let mut replaced = 0;
        let mut index = 0;

        while index < self.widgets.len() {
            if self.widgets[index].sid() != config.sid {
                index += 1;
                continue;
            }

            self.widgets[index].destroy();
            replaced += 1;

            if let Some(fresh) = W::create(context, config) {
                self.widgets[index] = fresh;
                index += 1;
            } else {
                debug!("Dropping widget {} with no replacement", config.sid);
                self.widgets.remove(index);
            }
        }

        replaced
    }

    /// Create the widget on first receipt of its sid, regenerate it after.
    ///
    /// Returns `true` if a live widget for the sid exists afterwards.
    pub fn upsert(
        &mut self,
        context: &W::Context,
        config: &WidgetConfig<W::Setup>,
    ) -> bool {
        if self.contains(&config.sid) {
            W::regenerate(self, context, config);
        } else if let Some(widget) = W::create(context, config) {
            self.widgets.push(widget);
        }

        self.contains(&config.sid)
    }

    /// Destroy and drop the widgets for `sid`.
    pub fn remove(&mut self, sid: &str) -> usize {
        let before = self.widgets.len();
        self.widgets.retain_mut(|widget| {
            if widget.sid() == sid {
                widget.destroy();
                false
            } else {
                true
            }
        });
        before - self.widgets.len()
    }

    /// Destroy and drop every widget.
    pub fn clear(&mut self) {
        for widget in &mut self.widgets {
            widget.destroy();
        }
        self.widgets.clear();
    }
}
