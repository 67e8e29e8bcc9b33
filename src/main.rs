use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use secrecy::ExposeSecret;
use tracing_subscriber::EnvFilter;

use devvoice::api::ApiServer;
use devvoice::pipeline::{AudioClip, Pipeline};
use devvoice::speech::{PlaybackSession, WORDS_PER_MINUTE, estimate_duration};
use devvoice::{Config, ResponseGenerator, SpeechToText};

#[derive(Parser)]
#[command(
    name = "devvoice",
    version,
    about = "DevVoice - voice demo gateway for the DevVoice landing page"
)]
struct Cli {
    /// Port to listen on
    #[arg(long, env = "DEVVOICE_PORT")]
    port: Option<u16>,

    /// Static files directory for the landing page
    #[arg(long, env = "DEVVOICE_STATIC_DIR")]
    static_dir: Option<PathBuf>,

    /// Requests-per-minute cap on the vendor proxies
    #[arg(long, env = "DEVVOICE_RATE_LIMIT")]
    rate_limit: Option<u32>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run an audio capture through transcription and generation
    Ask {
        /// Path to the audio file (WAV, `WebM`, MP3, M4A)
        file: PathBuf,
    },
    /// Send a text question straight to the generation proxy
    Chat {
        /// The question to ask
        message: String,
    },
    /// Preview the playback plan for a text (word-by-word highlight timing)
    Speak {
        /// Text to plan
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,devvoice=info",
        1 => "info,devvoice=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(dir) = cli.static_dir {
        config.server.static_dir = Some(dir);
    }
    if let Some(rpm) = cli.rate_limit {
        config.server.rate_limit_per_minute = Some(rpm);
    }

    match cli.command {
        Some(Command::Ask { file }) => ask(&config, &file).await,
        Some(Command::Chat { message }) => chat(&config, &message).await,
        Some(Command::Speak { text }) => {
            speak(&text);
            Ok(())
        }
        None => serve(&config).await,
    }
}

/// Run the gateway
async fn serve(config: &Config) -> anyhow::Result<()> {
    let server = ApiServer::from_config(config)?;
    server.run().await?;
    Ok(())
}

/// One-shot pipeline run over an audio file
async fn ask(config: &Config, file: &Path) -> anyhow::Result<()> {
    let clip = load_clip(file)?;
    let pipeline = build_pipeline(config)?;

    let outcome = pipeline.run_clip(&clip).await?;

    println!(
        "Transcript ({:.0}% confidence):",
        outcome.transcript.confidence * 100.0
    );
    println!("  {}", outcome.transcript.text);
    println!();
    println!("{}", outcome.response);
    Ok(())
}

/// One-shot generation run over a text question
async fn chat(config: &Config, message: &str) -> anyhow::Result<()> {
    let key = config
        .generation
        .api_key
        .as_ref()
        .context("COHERE_API_KEY not set")?;
    let generator = ResponseGenerator::new(key.expose_secret().to_string(), &config.generation)?;

    let response = generator.generate(message).await?;
    println!("{response}");
    Ok(())
}

/// Print the word-by-word playback plan
fn speak(text: &str) {
    let mut playback = PlaybackSession::new();
    let timeline = playback.start(text);
    let total = estimate_duration(text);

    println!(
        "Estimated duration: {:.1}s at {WORDS_PER_MINUTE:.0} wpm",
        total.as_secs_f64()
    );
    for (index, word) in timeline.words().iter().enumerate() {
        let at = timeline.slot() * u32::try_from(index).unwrap_or(u32::MAX);
        println!("{:>7.2}s  {word}", at.as_secs_f64());
    }
}

/// Construct both vendor clients or explain which key is missing
fn build_pipeline(config: &Config) -> anyhow::Result<Pipeline> {
    let stt_key = config
        .transcription
        .api_key
        .as_ref()
        .context("ASSEMBLYAI_API_KEY not set")?;
    let gen_key = config
        .generation
        .api_key
        .as_ref()
        .context("COHERE_API_KEY not set")?;

    let stt = SpeechToText::new(stt_key.expose_secret().to_string(), &config.transcription)?;
    let generator = ResponseGenerator::new(gen_key.expose_secret().to_string(), &config.generation)?;

    Ok(Pipeline::new(
        stt,
        generator,
        config.transcription.min_audio_bytes,
    ))
}

/// Read an audio file and tag it with a MIME type; WAV captures also get a
/// duration report
fn load_clip(path: &Path) -> anyhow::Result<AudioClip> {
    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;

    let mime = match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .as_deref()
    {
        Some("wav") => "audio/wav",
        Some("webm") => "audio/webm",
        Some("mp3") => "audio/mpeg",
        Some("m4a") => "audio/mp4",
        Some("ogg") => "audio/ogg",
        _ => "application/octet-stream",
    };

    if mime == "audio/wav" {
        if let Ok(reader) = hound::WavReader::new(Cursor::new(&data)) {
            let spec = reader.spec();
            let seconds = f64::from(reader.duration()) / f64::from(spec.sample_rate);
            tracing::info!(
                seconds,
                sample_rate = spec.sample_rate,
                channels = spec.channels,
                "loaded WAV capture"
            );
        }
    }

    Ok(AudioClip {
        data,
        mime: mime.to_string(),
    })
}
