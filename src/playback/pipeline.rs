use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use super::effect::EffectSpec;
use super::engine::{AudioEngine, DirectPlayer, PlayerFactory};
use super::graph::{NodeId, NodeKind};
use crate::audio::{AudioAsset, DecodedAudio};
use crate::error::{Error, Result};

pub const RATE_RANGE: RangeInclusive<f32> = 0.5..=2.0;

/// Decode the audio behind `asset`. Blocking; callers on an async runtime
/// should run it on a blocking thread.
pub fn decode_asset(asset: &AudioAsset) -> Result<DecodedAudio> {
    DecodedAudio::open(asset.location()).map_err(|e| decode_error(asset, e))
}

fn decode_error(asset: &AudioAsset, e: anyhow::Error) -> Error {
    Error::Decode {
        path: asset.location().to_path_buf(),
        reason: format!("{:#}", e),
    }
}

/// Plays a prepared asset either directly at a chosen rate or through a
/// `player → [effect] → output` graph.
///
/// Only one of the two paths is audible at a time: every play operation
/// stops both first, and every graph is built on a freshly reset engine.
pub struct EffectPipeline {
    engine: Box<dyn AudioEngine>,
    players: Arc<dyn PlayerFactory>,
    prepared: Option<Prepared>,
}

struct Prepared {
    asset: AudioAsset,
    audio: Arc<DecodedAudio>,
    player: Box<dyn DirectPlayer>,
}

impl EffectPipeline {
    pub fn new(engine: Box<dyn AudioEngine>, players: Arc<dyn PlayerFactory>) -> Self {
        Self {
            engine,
            players,
            prepared: None,
        }
    }

    /// Decode `asset` and open a direct player for it.
    ///
    /// On failure nothing stays prepared, and a later call may succeed.
    pub fn prepare_playback(&mut self, asset: &AudioAsset) -> Result<()> {
        self.stop();
        self.prepared = None;

        let audio = decode_asset(asset)?;
        self.prepare_decoded(asset, audio)
    }

    /// Open a direct player over audio already decoded from `asset`.
    pub fn prepare_decoded(&mut self, asset: &AudioAsset, audio: DecodedAudio) -> Result<()> {
        self.stop();
        self.prepared = None;

        info!("Preparing playback: {}", asset.title());

        let audio = Arc::new(audio);
        let mut player = self
            .players
            .open_player(Arc::clone(&audio))
            .map_err(|e| decode_error(asset, e))?;
        player.set_rate(1.0);

        self.prepared = Some(Prepared {
            asset: asset.clone(),
            audio,
            player,
        });

        Ok(())
    }

    /// Play the prepared asset directly at `rate` (1.0 is normal speed).
    pub fn play_at_rate(&mut self, rate: f32) -> Result<()> {
        if !RATE_RANGE.contains(&rate) {
            return Err(Error::InvalidRate(rate));
        }
        if self.prepared.is_none() {
            return Err(Error::NotPrepared);
        }

        self.stop();

        let prepared = self.prepared.as_mut().ok_or(Error::NotPrepared)?;
        prepared.player.set_rate(rate);
        prepared.player.play().map_err(|e| {
            Error::DeviceUnavailable(format!("Failed to start playback: {:#}", e))
        })?;

        info!("Playing {} at {:.2}x", prepared.asset.title(), rate);
        Ok(())
    }

    /// Play the prepared asset through a single effect.
    pub fn play_with_effect(&mut self, effect: EffectSpec) -> Result<()> {
        effect.validate()?;
        self.play_through_graph(Some(effect))
    }

    /// Play the prepared asset through the graph with no effect.
    pub fn play_dry(&mut self) -> Result<()> {
        self.play_through_graph(None)
    }

    /// Silence both playback paths and rewind. Safe to call at any time.
    pub fn stop(&mut self) {
        if let Some(prepared) = self.prepared.as_mut() {
            prepared.player.stop();
            prepared.player.set_position(Duration::ZERO);
        }
        self.engine.stop();
        self.engine.reset();
    }

    pub fn is_playing(&self) -> bool {
        self.engine.is_running()
            || self
                .prepared
                .as_ref()
                .is_some_and(|p| p.player.is_playing())
    }

    pub fn asset(&self) -> Option<&AudioAsset> {
        self.prepared.as_ref().map(|p| &p.asset)
    }

    /// Position of the direct player, if an asset is prepared.
    pub fn position(&self) -> Option<Duration> {
        self.prepared.as_ref().map(|p| p.player.position())
    }

    /// Node kinds of the live graph, from the player to the output.
    pub fn topology(&self) -> Vec<NodeKind> {
        self.engine.graph().topology()
    }

    pub fn node_count(&self) -> usize {
        self.engine.graph().node_count()
    }

    pub fn connection_count(&self) -> usize {
        self.engine.graph().connections().len()
    }

    fn play_through_graph(&mut self, effect: Option<EffectSpec>) -> Result<()> {
        let audio = self
            .prepared
            .as_ref()
            .map(|p| Arc::clone(&p.audio))
            .ok_or(Error::NotPrepared)?;

        self.stop();

        if let Err(e) = self.build_graph(effect, audio) {
            error!("Effect playback failed: {}", e);
            self.engine.stop();
            self.engine.reset();
            return Err(e);
        }

        match effect {
            Some(effect) => info!("Playing through {} effect", effect.unit_name()),
            None => info!("Playing through graph without effect"),
        }
        Ok(())
    }

    fn build_graph(&mut self, effect: Option<EffectSpec>, audio: Arc<DecodedAudio>) -> Result<()> {
        let graph_error = |e: anyhow::Error| Error::GraphStart(format!("{:#}", e));

        let player = self.engine.attach(NodeKind::Player);
        let mut tail: NodeId = player;

        if let Some(effect) = effect {
            let node = self.engine.attach(NodeKind::Effect { effect });
            self.engine.connect(tail, node).map_err(graph_error)?;
            tail = node;
        }

        let output = self.engine.output_node();
        self.engine.connect(tail, output).map_err(graph_error)?;
        self.engine.schedule_file(player, audio).map_err(graph_error)?;
        self.engine.start().map_err(graph_error)?;

        if let Err(e) = self.engine.play(player) {
            warn!("Engine started but player {} did not", player);
            return Err(graph_error(e));
        }

        Ok(())
    }
}
