use std::sync::Arc;

/// Child element mounted into a mount point (a heading, a label).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub text: String,
}

impl Element {
    pub fn new(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            text: text.into(),
        }
    }
}

pub type ClickHandler = Arc<dyn Fn() + Send + Sync>;

/// Display region a widget renders into.
///
/// Implementations use interior mutability: widgets only ever hold a shared
/// handle to their mount point.
pub trait MountPoint: Send + Sync {
    /// Identifier of the region, used for diagnostics
    fn id(&self) -> &str;

    fn append(&self, children: Vec<Element>);

    fn remove_children(&self);

    /// Install the click handler, replacing any previous one
    fn on_click(&self, handler: ClickHandler);

    fn clear_click(&self);

    /// Fire the installed click handler. Returns `false` if there is none.
    fn click(&self) -> bool;

    /// Point the region's image source at `uri`
    fn set_source(&self, uri: &str);

    fn set_class(&self, class: &str, enabled: bool);
}

impl std::fmt::Debug for dyn MountPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MountPoint({})", self.id())
    }
}

pub type MountHandle = Arc<dyn MountPoint>;

/// Turns the mount point names carried by configuration events into live
/// handles.
pub trait MountResolver {
    /// Mount point a widget is about to render into.
    fn resolve(&self, target: &str) -> Option<MountHandle>;

    /// Mount point that is already on screen, for events acting on it.
    fn find(&self, target: &str) -> Option<MountHandle> {
        self.resolve(target)
    }
}
