#![deny(warnings)]

use anyhow::Context;
use clap::{Parser, Subcommand};
use moodscout_core::analysis::{normalize, AnalysisResult};
use moodscout_core::config::{
    resolve_api_key, resolve_optional_string, resolve_string_with_default, ApiKeys, AppConfig,
    Endpoint, Env, LlmConfig, SpeechConfig, StdEnv, DEFAULT_ANTHROPIC_BASE_URL,
    DEFAULT_ANTHROPIC_MODEL, DEFAULT_ELEVENLABS_BASE_URL, DEFAULT_MAX_TOKENS,
    ENV_ANTHROPIC_API_KEY, ENV_ANTHROPIC_BASE_URL, ENV_ANTHROPIC_MODEL, ENV_ELEVENLABS_API_KEY,
    ENV_ELEVENLABS_BASE_URL, ENV_HISTORY_PATH,
};
use moodscout_core::history::{HistoryRecord, HistoryStore};
use moodscout_core::llm::AnthropicClient;
use moodscout_core::pipeline::AnalysisPipeline;
use moodscout_core::tone::VOICE_TABLE;
use moodscout_core::tts::{ElevenLabsClient, TonePlayer};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "moodscout")]
#[command(about = "Sentiment and tone analysis for text, with tone-matched speech")]
struct Cli {
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze text with the language model
    Analyze(AnalyzeArgs),
    /// Normalize a raw model completion without calling any service
    Normalize {
        /// Read the completion from this file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Show saved analyses, newest first
    History(HistoryArgs),
    /// List the voice used for each tone
    Voices,
}

#[derive(clap::Args, Debug)]
struct HistoryArgs {
    #[arg(long)]
    history: Option<PathBuf>,

    #[arg(long, default_value_t = 10)]
    limit: usize,

    /// Show one analysis in full, by id or id prefix
    #[arg(long, value_name = "ID", conflicts_with = "clear")]
    show: Option<String>,

    /// Delete all saved analyses
    #[arg(long)]
    clear: bool,
}

#[derive(clap::Args, Debug)]
struct AnalyzeArgs {
    /// Text to analyze; read from stdin when omitted
    #[arg(long)]
    text: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Write the input text, spoken in the detected tone, to this mp3 file
    #[arg(long)]
    speak: Option<PathBuf>,

    /// Append the analysis to this history file
    #[arg(long)]
    history: Option<PathBuf>,

    #[arg(long)]
    anthropic_api_key: Option<String>,

    #[arg(long)]
    elevenlabs_api_key: Option<String>,

    #[arg(long)]
    model: Option<String>,

    #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
    max_tokens: u32,

    #[arg(long)]
    anthropic_base_url: Option<String>,

    #[arg(long)]
    elevenlabs_base_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    let env = StdEnv;
    match cli.command {
        Command::Analyze(args) => run_analyze(args, &env).await,
        Command::Normalize { file } => run_normalize(file).await,
        Command::History(args) => run_history(args, &env).await,
        Command::Voices => {
            print_voices();
            Ok(())
        }
    }
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn build_config(args: &AnalyzeArgs, env: &impl Env) -> anyhow::Result<AppConfig> {
    let anthropic = resolve_api_key(args.anthropic_api_key.clone(), ENV_ANTHROPIC_API_KEY, env)?;
    let elevenlabs =
        resolve_api_key(args.elevenlabs_api_key.clone(), ENV_ELEVENLABS_API_KEY, env)?;
    if args.speak.is_some() && elevenlabs.is_none() {
        anyhow::bail!("ElevenLabs API key is required for --speak (set {ENV_ELEVENLABS_API_KEY})");
    }

    let model = resolve_string_with_default(
        args.model.clone(),
        ENV_ANTHROPIC_MODEL,
        env,
        DEFAULT_ANTHROPIC_MODEL,
    );
    let anthropic_base_url = resolve_string_with_default(
        args.anthropic_base_url.clone(),
        ENV_ANTHROPIC_BASE_URL,
        env,
        DEFAULT_ANTHROPIC_BASE_URL,
    );
    let elevenlabs_base_url = resolve_string_with_default(
        args.elevenlabs_base_url.clone(),
        ENV_ELEVENLABS_BASE_URL,
        env,
        DEFAULT_ELEVENLABS_BASE_URL,
    );

    let llm = LlmConfig::new(model, args.max_tokens)?
        .with_base_url(Endpoint::parse(&anthropic_base_url)?);
    let speech = SpeechConfig::default().with_base_url(Endpoint::parse(&elevenlabs_base_url)?);

    Ok(AppConfig {
        api_keys: ApiKeys {
            anthropic,
            elevenlabs,
        },
        llm,
        speech,
        history_path: history_path(args.history.clone(), env),
    })
}

fn history_path(cli_value: Option<PathBuf>, env: &impl Env) -> Option<PathBuf> {
    resolve_optional_string(
        cli_value.map(|p| p.to_string_lossy().into_owned()),
        ENV_HISTORY_PATH,
        env,
    )
    .map(PathBuf::from)
}

async fn read_input(text: Option<String>) -> anyhow::Result<String> {
    match text {
        Some(t) => Ok(t),
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

async fn run_analyze(args: AnalyzeArgs, env: &impl Env) -> anyhow::Result<()> {
    let cfg = build_config(&args, env)?;
    let text = read_input(args.text.clone()).await?;

    let anthropic_key = cfg
        .api_keys
        .anthropic
        .clone()
        .ok_or_else(|| anyhow::anyhow!("Anthropic API key is required for analysis"))?;

    tracing::info!(model = %cfg.llm.model, max_tokens = cfg.llm.max_tokens, "config loaded");

    let pipeline = AnalysisPipeline::new(AnthropicClient::new(anthropic_key, cfg.llm.clone()));
    let record = pipeline.analyze_for_history(&text).await?;

    print_result(&record.result, args.json)?;
    save_then_speak(&cfg, &record, args.speak.as_deref()).await
}

/// The analysis is saved before any speech request, so a failed synthesis
/// never loses it.
async fn save_then_speak(
    cfg: &AppConfig,
    record: &HistoryRecord,
    speak_to: Option<&Path>,
) -> anyhow::Result<()> {
    if let Some(path) = &cfg.history_path {
        HistoryStore::new(path)
            .append(record)
            .await
            .context("failed to save analysis")?;
    }

    if let Some(out) = speak_to {
        speak(cfg, record, out).await?;
    }
    Ok(())
}

async fn speak(cfg: &AppConfig, record: &HistoryRecord, out: &Path) -> anyhow::Result<()> {
    let key = cfg
        .api_keys
        .elevenlabs
        .clone()
        .ok_or_else(|| anyhow::anyhow!("ElevenLabs API key is required for --speak"))?;

    let player = TonePlayer::new(
        ElevenLabsClient::new(key, cfg.speech.clone()),
        record.input_text.clone(),
        record.result.tone,
    );
    player.toggle().await.context("failed to generate speech")?;

    if let Some(clip) = player.clip().await {
        tokio::fs::write(out, &clip.data)
            .await
            .with_context(|| format!("failed to write {}", out.display()))?;
        tracing::info!(path = %out.display(), bytes = clip.data.len(), tone = %player.tone(), "speech written");
    }
    player.release().await;
    Ok(())
}

async fn run_normalize(file: Option<PathBuf>) -> anyhow::Result<()> {
    let raw = match file {
        Some(path) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => read_input(None).await?,
    };
    print_result(&normalize(&raw), true)
}

async fn run_history(args: HistoryArgs, env: &impl Env) -> anyhow::Result<()> {
    let path = history_path(args.history, env)
        .ok_or_else(|| anyhow::anyhow!("pass --history or set {ENV_HISTORY_PATH}"))?;
    let store = HistoryStore::new(path);

    if args.clear {
        store.clear().await?;
        println!("History cleared");
        return Ok(());
    }

    if let Some(id) = args.show {
        let record = store
            .find(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("no saved analysis with id {id}"))?;
        println!("Id:         {}", record.id);
        println!("Saved:      {}", unix_secs(&record));
        println!("Text:       {}", record.input_text);
        println!();
        return print_result(&record.result, false);
    }

    let records = store.recent(args.limit).await?;
    if records.is_empty() {
        println!("No analyses yet");
        return Ok(());
    }

    for record in records {
        println!(
            "{} [{}] {} ({}%, {}) {}",
            record.short_id(),
            unix_secs(&record),
            record.result.sentiment,
            record.result.confidence,
            record.result.tone,
            record.sample()
        );
    }
    Ok(())
}

fn unix_secs(record: &HistoryRecord) -> u64 {
    record
        .created_at
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

fn print_result(result: &AnalysisResult, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    println!("Sentiment:  {} ({}% confidence)", result.sentiment, result.confidence);
    println!("Tone:       {}", result.tone);
    if !result.emotions.is_empty() {
        println!("Emotions:   {}", result.emotions.join(", "));
    }
    println!();
    println!("{}", result.analysis);
    if !result.potentially_confusing_elements.is_empty() {
        println!();
        println!("Potentially confusing:");
        for item in &result.potentially_confusing_elements {
            println!("  - {item}");
        }
    }
    Ok(())
}

fn print_voices() {
    for (tone, voice) in VOICE_TABLE.iter() {
        let s = voice.settings;
        println!(
            "{:<9} {:<7} {}  stability={} similarity_boost={} style={} speaker_boost={}",
            tone.as_str(),
            voice.name,
            voice.voice_id,
            s.stability,
            s.similarity_boost,
            s.style,
            s.use_speaker_boost
        );
    }
}
