use crate::mount::MountHandle;
use crate::widget::{Widget, WidgetCollection, WidgetConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use types::{
    DelaySettings, LiveCatchupSettings, PlayerSettings, StreamSetup,
    StreamSource, StreamingSettings,
};

/// Adaptive streaming engine.
pub trait MediaEngine: Send + Sync {
    fn create_player(&self) -> Box<dyn MediaPlayer>;
}

pub trait MediaPlayer: Send {
    fn update_settings(&mut self, settings: &PlayerSettings);

    fn initialize(&mut self, target: &MountHandle, manifest: &str, autoplay: bool);

    /// Switch to another manifest without rebuilding the player
    fn attach_source(&mut self, manifest: &str);

    fn destroy(&mut self);
}

/// Live catch-up tuning applied to every adaptive player.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CatchupProfile {
    pub low_latency: bool,

    /// Target live delay, in seconds
    pub live_delay: f64,

    pub min_drift: f64,

    /// Playback rate adjustment used while catching up
    pub playback_rate: f64,

    /// Latency past which the player stops catching up and seeks
    pub latency_threshold: f64,
}

impl Default for CatchupProfile {
    fn default() -> Self {
        Self {
            low_latency: true,
            live_delay: 10.0,
            min_drift: 0.05,
            playback_rate: 0.05,
            latency_threshold: 60.0,
        }
    }
}

impl CatchupProfile {
    /// Settings applied before the player is initialized.
    pub fn streaming_mode(&self) -> PlayerSettings {
        PlayerSettings {
            streaming: StreamingSettings {
                low_latency_enabled: Some(self.low_latency),
                ..StreamingSettings::default()
            },
        }
    }

    /// Settings applied once playback is initialized.
    pub fn catchup(&self) -> PlayerSettings {
        PlayerSettings {
            streaming: StreamingSettings {
                delay: Some(DelaySettings {
                    live_delay: self.live_delay,
                }),
                live_catchup: Some(LiveCatchupSettings {
                    min_drift: self.min_drift,
                    playback_rate: self.playback_rate,
                    latency_threshold: self.latency_threshold,
                }),
                ..StreamingSettings::default()
            },
        }
    }
}

pub struct StreamContext {
    pub engine: Arc<dyn MediaEngine>,
    pub catchup: CatchupProfile,
}

pub struct AdaptiveStream {
    sid: String,
    player: Option<Box<dyn MediaPlayer>>,
}

pub struct ImageStream {
    sid: String,
    target: Option<MountHandle>,
}

impl ImageStream {
    fn attach_source(&self, uri: &str) -> bool {
        let Some(target) = &self.target else {
            return false;
        };
        target.set_source(uri);
        true
    }
}

/// Live media surface, either an adaptive player or a refreshed image.
pub enum StreamWidget {
    Adaptive(AdaptiveStream),
    SingleImage(ImageStream),
}

impl StreamWidget {
    pub const fn source(&self) -> StreamSource {
        match self {
            Self::Adaptive(_) => StreamSource::Adaptive,
            Self::SingleImage(_) => StreamSource::SingleImage,
        }
    }

    /// Show `uri` without tearing down the underlying engine.
    ///
    /// Returns `false` on a destroyed stream.
    pub fn attach_source(&mut self, uri: &str) -> bool {
        match self {
            Self::Adaptive(stream) => {
                let Some(player) = stream.player.as_mut() else {
                    return false;
                };
                player.attach_source(uri);
                true
            }
            Self::SingleImage(stream) => stream.attach_source(uri),
        }
    }

    /// Full regeneration with an explicit sid and mount point.
    pub fn regenerate_at(
        collection: &mut WidgetCollection<Self>,
        context: &StreamContext,
        setup: &StreamSetup,
        sid: &str,
        target: MountHandle,
    ) -> usize {
        let config = WidgetConfig::new(sid, setup.clone(), target);
        Self::regenerate(collection, context, &config)
    }
}

/// Point the stream for `sid` at `setup.manifest`, keeping its engine.
///
/// Returns the number of streams updated.
pub fn update_manifest(
    collection: &mut WidgetCollection<StreamWidget>,
    setup: &StreamSetup,
    sid: &str,
) -> usize {
    let mut updated = 0;

    for stream in collection.iter_mut().filter(|stream| stream.sid() == sid) {
        if stream.attach_source(&setup.manifest) {
            updated += 1;
        }
    }

    if updated == 0 {
        debug!("No live stream {} for manifest update", sid);
    }
    updated
}

impl Widget for StreamWidget {
    type Setup = StreamSetup;
    type Context = StreamContext;

    fn create(
        context: &StreamContext,
        config: &WidgetConfig<StreamSetup>,
    ) -> Option<Self> {
        let manifest = &config.setup.manifest;

        match config.setup.source {
            StreamSource::Adaptive => {
                let mut player = context.engine.create_player();
                player.update_settings(&context.catchup.streaming_mode());
                player.initialize(&config.target, manifest, true);
                player.update_settings(&context.catchup.catchup());

                info!("Created adaptive stream {} for {}", config.sid, manifest);
                Some(Self::Adaptive(AdaptiveStream {
                    sid: config.sid.clone(),
                    player: Some(player),
                }))
            }
            StreamSource::SingleImage => {
                let stream = ImageStream {
                    sid: config.sid.clone(),
                    target: Some(Arc::clone(&config.target)),
                };
                stream.attach_source(manifest);

                info!("Created image stream {} for {}", config.sid, manifest);
                Some(Self::SingleImage(stream))
            }
            StreamSource::Unknown => {
                warn!("Stream {} has no known source, skipping", config.sid);
                None
            }
        }
    }

    fn sid(&self) -> &str {
        match self {
            Self::Adaptive(stream) => &stream.sid,
            Self::SingleImage(stream) => &stream.sid,
        }
    }

    fn destroy(&mut self) {
        match self {
            Self::Adaptive(stream) => {
                if let Some(mut player) = stream.player.take() {
                    player.destroy();
                }
            }
            Self::SingleImage(stream) => {
                stream.target = None;
            }
        }
        debug!("Destroyed stream {}", self.sid());
    }

    fn is_live(&self) -> bool {
        match self {
            Self::Adaptive(stream) => stream.player.is_some(),
            Self::SingleImage(stream) => stream.target.is_some(),
        }
    }
}
