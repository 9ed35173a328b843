//! Playback of recorded takes.
//!
//! - `effect`: effect unit parameters (pitch shift, reverb, delay)
//! - `graph`: node/edge model of the `player → [effect] → output` chain
//! - `engine`: engine and direct player traits, plus headless implementations
//! - `pipeline`: builds and tears down the graph, drives direct playback
//! - `transport`: stop semantics and the named playback presets

mod effect;
mod engine;
mod graph;
mod pipeline;
mod transport;

pub use effect::{EffectSpec, ReverbPreset, MAX_DELAY_SECS, PITCH_RANGE_CENTS};
pub use engine::{
    AudioEngine, DirectPlayer, HeadlessEngine, HeadlessPlayer, HeadlessPlayerFactory,
    PlayerFactory,
};
pub use graph::{AudioGraph, GraphError, NodeId, NodeKind};
pub use pipeline::{decode_asset, EffectPipeline, RATE_RANGE};
pub use transport::{PlaybackPreset, PlaybackTransport, PresetAction};
