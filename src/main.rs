use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use furigana_rs::config::Config;
use furigana_rs::gateway::Gateway;
use furigana_rs::ingest;
use furigana_rs::library::{save_subtitles, Libraries, SaveOutcome, SubtitleBatch};
use furigana_rs::llm::LlmClient;
use furigana_rs::renderer::CumulativeRenderer;
use furigana_rs::server;
use furigana_rs::session::Session;
use furigana_rs::tts::TtsClient;

mod cli;

use cli::{AnnotateCmd, Args, Command, LibraryCmd};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = match args.log_level.as_deref() {
        Some(level) => EnvFilter::try_new(level).context("invalid --log-level")?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = Config::resolve(args.config.as_deref())?;
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "furigana starting");

    match args.command {
        Command::Serve { host, port } => serve(config, host, port).await,
        Command::Annotate(cmd) => annotate(config, cmd).await,
        Command::Import { file, overwrite } => import(&config, &file, overwrite),
        Command::Library { action } => library(&config, action),
        Command::PrintDefaultConfig => {
            print!("{}", Config::default().to_toml_pretty()?);
            Ok(())
        }
    }
}

fn build_gateway(config: &Config) -> Gateway<LlmClient, TtsClient> {
    let llm = LlmClient::new(config.clone());
    if !llm.is_available() {
        tracing::warn!(
            "LLM provider '{}' has no API key; model endpoints will fail",
            llm.provider()
        );
    }
    Gateway::new(llm, TtsClient::new(config.tts.clone()), config.llm.clone())
}

async fn serve(config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or_else(|| config.get_port());
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid listen address {host}:{port}"))?;

    server::serve(Arc::new(build_gateway(&config)), addr).await
}

async fn annotate(config: Config, cmd: AnnotateCmd) -> Result<()> {
    let gateway = build_gateway(&config);

    let mut session = Session::new();
    session.set_input(cmd.text.trim());
    if cmd.separator {
        session.toggle_separator();
    }
    if session.generate(&gateway).await.is_err() {
        bail!("{}", session.status().message);
    }
    if session.result().is_empty() {
        println!("(no result)");
        return Ok(());
    }

    print_frames(&session);

    if cmd.save {
        let mut libs = Libraries::open(&config.library, config.library_dir());
        match session.save_to_library(&mut libs.examples, cmd.overwrite, Utc::now()) {
            Ok(Some(SaveOutcome::Duplicate)) => {
                println!("Already in the library; pass --overwrite to replace it.")
            }
            Ok(Some(outcome)) => println!("Saved to library ({outcome:?})."),
            Ok(None) => {}
            Err(e) => bail!("{} ({})", e.user_message(), e),
        }
    }

    Ok(())
}

fn print_frames(session: &Session) {
    for frame in session.frames() {
        println!("[{}] {}", frame.index + 1, frame.jp.to_markup());
        println!("    • {}", frame.meanings);
        println!("    ({}) → {}", frame.kr.to_markup(), frame.translation.to_markup());
    }

    if let Some(summary) = session.summary() {
        println!();
        println!("Japanese:    {}", summary.jp);
        println!("Reading:     {}", summary.reading);
        println!("Korean:      {}", summary.kr);
        println!("Translation: {}", summary.translation);
    }
}

fn import(config: &Config, file: &std::path::Path, overwrite: bool) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed reading {}", file.display()))?;
    let filename = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();

    let sentences = ingest::parse_file(&filename, &text);
    if sentences.is_empty() {
        bail!("no Japanese sentences found in {}", file.display());
    }

    let count = sentences.len();
    let mut libs = Libraries::open(&config.library, config.library_dir());
    let batch = SubtitleBatch::new(filename.clone(), sentences, Utc::now());
    match save_subtitles(&mut libs.subtitles, batch, overwrite) {
        Ok(SaveOutcome::Duplicate) => {
            println!("{filename} is already in the library; pass --overwrite to replace it.")
        }
        Ok(_) => println!("Extracted {count} sentences from {filename}."),
        Err(e) => bail!("{} ({})", e.user_message(), e),
    }
    Ok(())
}

fn library(config: &Config, action: LibraryCmd) -> Result<()> {
    let mut libs = Libraries::open(&config.library, config.library_dir());

    let result = match action {
        LibraryCmd::List { subtitles: false } => {
            for entry in libs.examples.get_all() {
                println!("{}  {}  {}  {}", entry.id, entry.date.format("%Y-%m-%d"), entry.jp, entry.trans);
            }
            Ok(())
        }
        LibraryCmd::List { subtitles: true } => {
            for batch in libs.subtitles.get_all() {
                println!(
                    "{}  {}  {}  ({} sentences)",
                    batch.id,
                    batch.date.format("%Y-%m-%d"),
                    batch.filename,
                    batch.count
                );
            }
            Ok(())
        }
        LibraryCmd::Show { id, subtitles: false, separator } => {
            let Some(entry) = libs.examples.find(id) else {
                bail!("no example with id {id}");
            };
            let renderer = CumulativeRenderer::new(separator);
            for frame in renderer.render(&entry.full_data) {
                println!("[{}] {}", frame.index + 1, frame.jp.to_markup());
            }
            if let Some(summary) = renderer.summary(&entry.full_data) {
                println!("{} / {} / {}", summary.jp, summary.reading, summary.translation);
            }
            Ok(())
        }
        LibraryCmd::Show { id, subtitles: true, .. } => {
            let Some(batch) = libs.subtitles.find(id) else {
                bail!("no subtitle batch with id {id}");
            };
            let mut session = Session::new();
            session.load_subtitle_batch(batch);
            for (i, sentence) in session.sentences().iter().enumerate() {
                println!("{:>4}  {}", i + 1, sentence);
            }
            Ok(())
        }
        LibraryCmd::Delete { id, subtitles: false } => libs.examples.remove(id),
        LibraryCmd::Delete { id, subtitles: true } => libs.subtitles.remove(id),
        LibraryCmd::Clear { subtitles: false } => libs.examples.clear(),
        LibraryCmd::Clear { subtitles: true } => libs.subtitles.clear(),
    };

    result.map_err(|e| anyhow::anyhow!("{} ({})", e.user_message(), e))
}
