use crate::playback::{decode_asset, PlaybackTransport};
use crate::session::{RecordingSession, SessionEvent};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The single recording session
    pub session: Arc<RecordingSession>,

    /// Playback of the last finished take
    pub transport: Arc<Mutex<PlaybackTransport>>,
}

impl AppState {
    pub fn new(session: RecordingSession, transport: PlaybackTransport) -> Self {
        Self {
            session: Arc::new(session),
            transport: Arc::new(Mutex::new(transport)),
        }
    }

    /// Load every finished take into the transport as it arrives.
    pub fn start_handoff(&self) -> JoinHandle<()> {
        let mut events = self.session.subscribe();
        let transport = Arc::clone(&self.transport);

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SessionEvent::Finished(asset)) => {
                        // Decode on a blocking thread; the transport is locked only to install the result
                        let to_decode = asset.clone();
                        let decoded =
                            tokio::task::spawn_blocking(move || decode_asset(&to_decode)).await;

                        let result = match decoded {
                            Ok(Ok(audio)) => transport.lock().await.load_decoded(&asset, audio),
                            Ok(Err(e)) => Err(e),
                            Err(e) => {
                                error!("Decode task for {} failed: {}", asset.title(), e);
                                continue;
                            }
                        };
                        match result {
                            Ok(()) => info!("Take ready for playback: {}", asset.title()),
                            Err(e) => error!("Failed to load {}: {}", asset.title(), e),
                        }
                    }
                    Ok(SessionEvent::Failed { reason }) => {
                        warn!("Recording failed, nothing to play: {}", reason);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Playback handoff skipped {} session events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}
