use anyhow::{bail, Context, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::graph::{AudioGraph, NodeId, NodeKind};
use crate::audio::DecodedAudio;

/// Effects engine the pipeline builds its graph on.
///
/// Effect units and rendering live behind this trait; the pipeline only
/// uses the graph primitives.
pub trait AudioEngine: Send {
    fn attach(&mut self, kind: NodeKind) -> NodeId;

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<()>;

    fn output_node(&self) -> NodeId;

    /// Queue `audio` on a player node, to play from its start.
    fn schedule_file(&mut self, player: NodeId, audio: Arc<DecodedAudio>) -> Result<()>;

    fn start(&mut self) -> Result<()>;

    fn play(&mut self, player: NodeId) -> Result<()>;

    fn stop(&mut self);

    /// Drop scheduled audio and detach every node except the output.
    fn reset(&mut self);

    fn is_running(&self) -> bool;

    fn graph(&self) -> &AudioGraph;
}

/// Plain file player with an adjustable rate.
pub trait DirectPlayer: Send {
    /// Rates that are not finite and positive leave the rate unchanged
    fn set_rate(&mut self, rate: f32);

    fn rate(&self) -> f32;

    fn play(&mut self) -> Result<()>;

    /// Stop without rewinding
    fn stop(&mut self);

    fn set_position(&mut self, position: Duration);

    fn position(&self) -> Duration;

    fn is_playing(&self) -> bool;
}

/// Opens direct players over decoded audio.
pub trait PlayerFactory: Send + Sync {
    fn open_player(&self, audio: Arc<DecodedAudio>) -> Result<Box<dyn DirectPlayer>>;
}

/// Engine without an audio device.
///
/// Keeps the graph and playback state, validates that every player reaches
/// the output before starting, and logs what a device-backed engine would
/// render.
pub struct HeadlessEngine {
    graph: AudioGraph,
    scheduled: HashMap<NodeId, Arc<DecodedAudio>>,
    playing: HashSet<NodeId>,
    running: bool,
}

impl HeadlessEngine {
    pub fn new() -> Self {
        Self {
            graph: AudioGraph::new(),
            scheduled: HashMap::new(),
            playing: HashSet::new(),
            running: false,
        }
    }

    pub fn is_playing(&self, player: NodeId) -> bool {
        self.playing.contains(&player)
    }
}

impl Default for HeadlessEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEngine for HeadlessEngine {
    fn attach(&mut self, kind: NodeKind) -> NodeId {
        let label = kind.label();
        let id = self.graph.attach(kind);
        debug!("Attached {} node {}", label, id);
        id
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        self.graph
            .connect(from, to)
            .with_context(|| format!("Failed to connect {} -> {}", from, to))?;
        debug!("Connected {} -> {}", from, to);
        Ok(())
    }

    fn output_node(&self) -> NodeId {
        self.graph.output()
    }

    fn schedule_file(&mut self, player: NodeId, audio: Arc<DecodedAudio>) -> Result<()> {
        match self.graph.kind(player) {
            Some(NodeKind::Player) => {}
            Some(kind) => bail!("Cannot schedule audio on {} node {}", kind.label(), player),
            None => bail!("Node {} is not attached", player),
        }
        debug!(
            "Scheduled {} on player {}",
            audio.path.display(),
            player
        );
        self.scheduled.insert(player, audio);
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        if self.running {
            return Ok(());
        }

        for player in self.scheduled.keys() {
            if self.graph.path_to_output(*player).is_none() {
                bail!("Player {} is not connected to the output", player);
            }
        }

        self.running = true;
        let chain: Vec<&str> = self.graph.topology().iter().map(|k| k.label()).collect();
        info!("Engine started: {}", chain.join(" -> "));
        Ok(())
    }

    fn play(&mut self, player: NodeId) -> Result<()> {
        if !self.running {
            bail!("Engine is not running");
        }
        let audio = self
            .scheduled
            .get(&player)
            .with_context(|| format!("Nothing scheduled on player {}", player))?;

        info!(
            "Playing {} ({:.2}s) through {}",
            audio.path.display(),
            audio.duration().as_secs_f64(),
            player
        );
        self.playing.insert(player);
        Ok(())
    }

    fn stop(&mut self) {
        if self.running {
            debug!("Engine stopped");
        }
        self.playing.clear();
        self.running = false;
    }

    fn reset(&mut self) {
        self.stop();
        self.scheduled.clear();
        self.graph.detach_all();
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn graph(&self) -> &AudioGraph {
        &self.graph
    }
}

/// Direct player that tracks position against the wall clock.
pub struct HeadlessPlayer {
    audio: Arc<DecodedAudio>,
    rate: f32,
    position: Duration,
    started_at: Option<Instant>,
}

impl HeadlessPlayer {
    pub fn new(audio: Arc<DecodedAudio>) -> Self {
        Self {
            audio,
            rate: 1.0,
            position: Duration::ZERO,
            started_at: None,
        }
    }

    fn elapsed_position(&self) -> Duration {
        let played = match self.started_at {
            Some(started) => started.elapsed().mul_f32(self.rate),
            None => Duration::ZERO,
        };
        (self.position + played).min(self.audio.duration())
    }
}

impl DirectPlayer for HeadlessPlayer {
    fn set_rate(&mut self, rate: f32) {
        if !rate.is_finite() || rate <= 0.0 {
            warn!("Ignoring playback rate {}, keeping {:.2}x", rate, self.rate);
            return;
        }
        // Fold elapsed time in at the old rate before switching
        self.position = self.elapsed_position();
        if self.started_at.is_some() {
            self.started_at = Some(Instant::now());
        }
        self.rate = rate;
    }

    fn rate(&self) -> f32 {
        self.rate
    }

    fn play(&mut self) -> Result<()> {
        if self.started_at.is_none() {
            if self.position >= self.audio.duration() {
                self.position = Duration::ZERO;
            }
            self.started_at = Some(Instant::now());
            info!(
                "Playing {} at {:.2}x",
                self.audio.path.display(),
                self.rate
            );
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.position = self.elapsed_position();
        self.started_at = None;
    }

    fn set_position(&mut self, position: Duration) {
        self.position = position.min(self.audio.duration());
        if self.started_at.is_some() {
            self.started_at = Some(Instant::now());
        }
    }

    fn position(&self) -> Duration {
        self.elapsed_position()
    }

    fn is_playing(&self) -> bool {
        self.started_at.is_some() && self.elapsed_position() < self.audio.duration()
    }
}

pub struct HeadlessPlayerFactory;

impl PlayerFactory for HeadlessPlayerFactory {
    fn open_player(&self, audio: Arc<DecodedAudio>) -> Result<Box<dyn DirectPlayer>> {
        Ok(Box::new(HeadlessPlayer::new(audio)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::EffectSpec;
    use std::path::PathBuf;

    fn one_second() -> Arc<DecodedAudio> {
        Arc::new(DecodedAudio {
            path: PathBuf::from("take.wav"),
            samples: vec![0.0; 8000],
            sample_rate: 8000,
            channels: 1,
        })
    }

    #[test]
    fn start_requires_player_connected_to_output() {
        let mut engine = HeadlessEngine::new();
        let player = engine.attach(NodeKind::Player);
        engine.schedule_file(player, one_second()).unwrap();

        assert!(engine.start().is_err());
        assert!(!engine.is_running());

        let output = engine.output_node();
        engine.connect(player, output).unwrap();
        engine.start().unwrap();
        engine.play(player).unwrap();
        assert!(engine.is_playing(player));
    }

    #[test]
    fn reset_detaches_everything() {
        let mut engine = HeadlessEngine::new();
        let player = engine.attach(NodeKind::Player);
        let effect = engine.attach(NodeKind::Effect {
            effect: EffectSpec::PitchShift { cents: 1000.0 },
        });
        let output = engine.output_node();
        engine.connect(player, effect).unwrap();
        engine.connect(effect, output).unwrap();
        engine.schedule_file(player, one_second()).unwrap();
        engine.start().unwrap();

        engine.reset();

        assert!(!engine.is_running());
        assert_eq!(engine.graph().node_count(), 1);
        assert!(engine.play(player).is_err());
    }

    #[test]
    fn audio_cannot_be_scheduled_on_effect_node() {
        let mut engine = HeadlessEngine::new();
        let effect = engine.attach(NodeKind::Effect {
            effect: EffectSpec::PitchShift { cents: 1000.0 },
        });
        assert!(engine.schedule_file(effect, one_second()).is_err());
    }

    #[test]
    fn player_stop_and_rewind() {
        let mut player = HeadlessPlayer::new(one_second());
        player.set_rate(1.5);
        player.play().unwrap();
        assert!(player.is_playing());

        player.stop();
        player.set_position(Duration::ZERO);

        assert!(!player.is_playing());
        assert_eq!(player.position(), Duration::ZERO);
        assert_eq!(player.rate(), 1.5);
    }

    #[test]
    fn player_ignores_unusable_rates() {
        let mut player = HeadlessPlayer::new(one_second());
        player.play().unwrap();

        player.set_rate(f32::NAN);
        player.set_rate(-1.0);
        player.set_rate(0.0);
        player.set_rate(f32::INFINITY);

        assert_eq!(player.rate(), 1.0);
        assert!(player.position() <= Duration::from_secs(1));
        assert!(player.is_playing());
    }
}
