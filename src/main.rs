use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pitch_perfect::audio::{AudioAsset, AudioSource, WavCaptureDevice};
use pitch_perfect::playback::{
    EffectPipeline, HeadlessEngine, HeadlessPlayerFactory, PlaybackPreset, PlaybackTransport,
    PresetAction,
};
use pitch_perfect::session::{RecordingSession, SessionConfig, SessionState};
use pitch_perfect::{create_router, AppState, Config};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "pitch-perfect", version, about = "Record a take and play it back with voice effects")]
struct Cli {
    /// Config file, extension optional
    #[arg(long, default_value = "config/pitch-perfect")]
    config: String,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record a take and print it as JSON
    Record {
        /// Replay this WAV file as the microphone
        #[arg(long, conflicts_with = "tone")]
        input: Option<PathBuf>,

        /// Record a sine tone at this frequency
        #[arg(long)]
        tone: Option<f32>,

        /// Capture length
        #[arg(long, default_value_t = 3.0)]
        seconds: f64,
    },
    /// Run a playback preset on a file and show the graph it builds
    Play {
        file: PathBuf,

        #[arg(long, value_enum, default_value_t = PlaybackPreset::Chipmunk)]
        preset: PlaybackPreset,
    },
    /// Serve the HTTP control API
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    let cfg = Config::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config))?;

    info!("Pitch Perfect v{}", env!("CARGO_PKG_VERSION"));
    info!("Recordings directory: {}", cfg.recordings.resolved_path().display());

    match cli.command {
        Command::Record {
            input,
            tone,
            seconds,
        } => record(&cfg, input, tone, seconds).await,
        Command::Play { file, preset } => play(&cfg, file, preset),
        Command::Serve => serve(cfg).await,
    }
}

fn new_transport(cfg: &Config) -> PlaybackTransport {
    let pipeline = EffectPipeline::new(
        Box::new(HeadlessEngine::new()),
        Arc::new(HeadlessPlayerFactory),
    );
    PlaybackTransport::new(pipeline, cfg.effects.clone())
}

async fn record(cfg: &Config, input: Option<PathBuf>, tone: Option<f32>, seconds: f64) -> Result<()> {
    let source = match (input, tone) {
        (Some(path), _) => AudioSource::File(path),
        (None, Some(frequency_hz)) => AudioSource::Tone { frequency_hz },
        (None, None) => cfg.recordings.source(),
    };

    let device = WavCaptureDevice::new(source, cfg.recordings.backend_config());
    let session = RecordingSession::new(SessionConfig::from(&cfg.recordings), Arc::new(device));

    session.start().await?;
    tokio::time::sleep(Duration::from_secs_f64(seconds.max(0.0))).await;
    session.stop().await?;

    match session.wait_for_completion().await {
        SessionState::Finished { asset } => {
            println!("{}", serde_json::to_string_pretty(&asset)?);
            Ok(())
        }
        SessionState::Failed { reason } => bail!("Recording failed: {}", reason),
        other => bail!("Recording ended in unexpected state: {}", other.name()),
    }
}

fn play(cfg: &Config, file: PathBuf, preset: PlaybackPreset) -> Result<()> {
    let asset = AudioAsset::from_location(file);
    let mut transport = new_transport(cfg);

    transport.load(&asset)?;
    transport.play(preset)?;

    match transport.effects().action(preset) {
        PresetAction::Rate(rate) => info!("{}: direct player at {:.2}x", preset, rate),
        PresetAction::Effect(_) => {
            let chain: Vec<&str> = transport
                .pipeline()
                .topology()
                .iter()
                .map(|kind| kind.label())
                .collect();
            info!("{}: {}", preset, chain.join(" -> "));
        }
    }

    transport.stop_requested();
    Ok(())
}

async fn serve(cfg: Config) -> Result<()> {
    let device = WavCaptureDevice::new(cfg.recordings.source(), cfg.recordings.backend_config());
    let session = RecordingSession::new(SessionConfig::from(&cfg.recordings), Arc::new(device));

    let state = AppState::new(session, new_transport(&cfg));
    let _handoff = state.start_handoff();

    let addr = format!("{}:{}", cfg.http.bind, cfg.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);
    axum::serve(listener, create_router(state)).await?;

    Ok(())
}
