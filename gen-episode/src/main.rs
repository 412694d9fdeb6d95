//! gen-episode - Convert papers and text files into narrated podcast episodes

mod audio;
mod config;
mod coordinator;
mod episode;
mod source;
mod text;
mod tts;
mod upload;
mod worker;

use anyhow::{Context, Result};
use audio::AssemblyError;
use clap::{Args as ClapArgs, Parser, Subcommand};
use config::GenEpisodeConfig;
use coordinator::RunReport;
use episode::{EpisodeLayout, EpisodeRunner, EpisodeSettings, UploadOutcome};
use indicatif::{ProgressBar, ProgressStyle};
use llm_client::OpenAiProvider;
use llm_client::providers::{OPENAI_API_KEY_ENV, api_key_from_env};
use log::info;
use source::{FileTextSource, PdfTextSource, ScriptSettings, ScriptSource, TextSource};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tts::{OpenAiSpeech, Voice};
use upload::{GcsUploader, Uploader};

#[derive(Parser, Debug)]
#[command(name = "gen-episode")]
#[command(about = "Convert papers and text files into narrated podcast episodes", long_about = None)]
#[command(version)]
struct Args {
    /// Enable debug output
    #[arg(short, long, global = true, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Narrate a PDF paper
    Pdf {
        /// PDF file name (resolved against the papers directory)
        pdf_file: PathBuf,
        /// Pages to skip at the start
        start_offset: u32,
        /// Pages to skip at the end
        end_offset: u32,
        /// Voice to use (random if not set)
        #[arg(long, value_enum, ignore_case = true)]
        voice: Option<Voice>,
        #[command(flatten)]
        run: RunOptions,
    },
    /// Narrate a text file
    Text {
        /// Path to the text file
        text_file: PathBuf,
        /// Voice to use (random if not set)
        #[arg(long, value_enum, ignore_case = true)]
        voice: Option<Voice>,
        #[command(flatten)]
        run: RunOptions,
    },
    /// Show the report of the last run for a document
    Report {
        /// Document base name (file name without extension)
        name: String,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Options shared by the narration modes.
#[derive(ClapArgs, Debug)]
struct RunOptions {
    /// Narrate the extracted text as-is instead of generating a script
    #[arg(long)]
    no_script: bool,

    /// Do not upload the merged episode
    #[arg(long)]
    no_upload: bool,

    /// Assemble the episode even if some chunks failed
    #[arg(long)]
    allow_partial: bool,

    /// Concurrent synthesis calls (default: min(32, cpus + 4))
    #[arg(long)]
    concurrency: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set default voice
    SetVoice {
        #[arg(value_enum, ignore_case = true)]
        voice: Voice,
    },
    /// Set default concurrency
    SetConcurrency {
        /// Number of concurrent synthesis calls
        value: usize,
    },
    /// Set upload bucket
    SetBucket {
        /// Bucket name
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    match args.command {
        Commands::Config { action } => handle_config_command(&action),
        Commands::Report { name } => show_report(&name),
        Commands::Pdf {
            pdf_file,
            start_offset,
            end_offset,
            voice,
            run,
        } => {
            let config = GenEpisodeConfig::load().context("Failed to load configuration")?;
            let pdf_path = resolve_pdf_path(&config.papers_dir, &pdf_file);
            if !pdf_path.exists() {
                anyhow::bail!("PDF file not found: {}", pdf_path.display());
            }
            let source = Box::new(PdfTextSource::new(&pdf_path, start_offset, end_offset));
            produce_episode(&config, &pdf_path, source, voice, &run).await
        }
        Commands::Text {
            text_file,
            voice,
            run,
        } => {
            let config = GenEpisodeConfig::load().context("Failed to load configuration")?;
            if !text_file.exists() {
                anyhow::bail!("Text file not found: {}", text_file.display());
            }
            let source = Box::new(FileTextSource::new(&text_file));
            produce_episode(&config, &text_file, source, voice, &run).await
        }
    }
}

fn init_logging(debug: bool) {
    let default_filter = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

/// Use the path as given if it exists, otherwise look in the papers directory.
fn resolve_pdf_path(papers_dir: &Path, pdf_file: &Path) -> PathBuf {
    if pdf_file.is_absolute() || pdf_file.exists() {
        pdf_file.to_path_buf()
    } else {
        papers_dir.join(pdf_file)
    }
}

/// Run every stage for one source document.
async fn produce_episode(
    config: &GenEpisodeConfig,
    source_path: &Path,
    source: Box<dyn TextSource>,
    voice: Option<Voice>,
    run: &RunOptions,
) -> Result<()> {
    config.validate()?;
    if run.concurrency == Some(0) {
        anyhow::bail!("--concurrency must be greater than zero");
    }

    // Credentials are checked before any text is produced or chunk created.
    let api_key = api_key_from_env(OPENAI_API_KEY_ENV, "OpenAI")?;
    let uploader: Option<Box<dyn Uploader>> = if run.no_upload {
        None
    } else {
        let bucket = config.resolve_bucket().ok_or_else(|| {
            anyhow::anyhow!(
                "Please set the {} environment variable or run 'gen-episode config set-bucket'.",
                config::BUCKET_ENV_VAR
            )
        })?;
        Some(Box::new(GcsUploader::from_env(bucket)?))
    };

    let layout = EpisodeLayout::for_source(source_path, &config.chunks_root, &config.library_root)?;

    let source: Box<dyn TextSource> = if run.no_script {
        source
    } else {
        let provider = Arc::new(OpenAiProvider::new(&config.script_model, api_key.clone()));
        let settings = ScriptSettings {
            temperature: config.script_temperature,
            max_tokens: config.script_max_tokens,
        };
        Box::new(ScriptSource::new(source, provider, settings))
    };

    info!("Reading {}", source.describe());
    let text = source.text().await.context("No text produced")?;

    let voice = Voice::select(voice, config.voice);
    let settings = EpisodeSettings {
        chunk_size: config.chunk_size,
        cost_per_char: config.cost_per_char,
        concurrency: run.concurrency.unwrap_or_else(|| config.effective_concurrency()),
        instructions: config.tts_instructions.clone(),
        allow_partial: run.allow_partial || config.allow_partial,
    };
    let runner = EpisodeRunner::new(
        Arc::new(OpenAiSpeech::new(&config.tts_model, api_key)),
        audio::create_merger(config.merge),
        uploader,
        settings,
    );

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
            .progress_chars("#>-"),
    );

    let result = runner
        .run(&text, voice, &layout, |progress| {
            pb.set_length(progress.total as u64);
            pb.set_position(progress.finished as u64);
            if progress.failed > 0 {
                pb.set_message(format!("{} failed", progress.failed));
            }
        })
        .await;
    pb.finish_and_clear();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            if let Some(AssemblyError::MissingSegments(indices)) = e.downcast_ref::<AssemblyError>() {
                eprintln!("Failed chunks: {:?}", indices);
                eprintln!(
                    "Chunk audio is in {}. Re-run, or pass --allow-partial to assemble without them.",
                    layout.chunks_dir.display()
                );
            }
            return Err(e);
        }
    };

    let summary = &outcome.report.summary;
    let size_mb = outcome.output_bytes as f64 / (1024.0 * 1024.0);
    eprintln!(
        "\nCompleted: {}, Failed: {}",
        summary.succeeded,
        summary.failed_indices.len()
    );
    if !summary.is_complete() {
        eprintln!("Missing chunks in episode: {:?}", summary.failed_indices);
    }
    eprintln!("Voice: {}", outcome.report.voice);
    eprintln!("Estimated cost: ${:.4}", outcome.report.estimated_cost);
    eprintln!("Output: {} ({:.1} MB)", outcome.output_path.display(), size_mb);

    match &outcome.upload {
        UploadOutcome::Skipped => eprintln!("Upload skipped"),
        UploadOutcome::Uploaded(url) => eprintln!("Uploaded: {}", url),
        UploadOutcome::Failed(reason) => {
            eprintln!("Upload failed: {}", reason);
            eprintln!("The episode is still available locally.");
        }
    }

    Ok(())
}

fn show_report(name: &str) -> Result<()> {
    let config = GenEpisodeConfig::load()?;
    let dir = config.chunks_root.join(name);
    let report = RunReport::load(&dir)?;

    println!("Source: {}", report.source);
    println!("Voice: {}", report.voice);
    println!("Started: {}", report.started_at.to_rfc3339());
    println!("Finished: {}", report.finished_at.to_rfc3339());
    println!(
        "Characters: {}, Chunk size: {}, Estimated cost: ${:.4}",
        report.total_chars, report.chunk_size, report.estimated_cost
    );
    println!(
        "Chunks: {} total, {} succeeded, {} failed",
        report.summary.total,
        report.summary.succeeded,
        report.summary.failed_indices.len()
    );
    for chunk in &report.chunks {
        match (chunk.audio_path(), chunk.failure_reason()) {
            (Some(path), _) => println!("  chunk {}: ok {}", chunk.index, path.display()),
            (None, reason) => println!(
                "  chunk {}: FAILED {}",
                chunk.index,
                reason.unwrap_or("unknown error")
            ),
        }
    }
    Ok(())
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = GenEpisodeConfig::load()?;
            println!("Configuration file: {:?}", GenEpisodeConfig::config_path()?);
            println!();
            println!("{}", toml::to_string_pretty(&config)?);
            if config.voice.is_none() {
                println!("# voice: (random per run)");
            }
            if config.concurrency.is_none() {
                println!("# concurrency: {} (auto)", config.effective_concurrency());
            }
            match config.resolve_bucket() {
                Some(bucket) => println!("# upload bucket: {}", bucket),
                None => println!("# upload bucket: (none)"),
            }
        }
        ConfigAction::SetVoice { voice } => {
            let mut config = GenEpisodeConfig::load()?;
            config.voice = Some(*voice);
            config.save()?;
            println!("Default voice set to: {}", voice);
        }
        ConfigAction::SetConcurrency { value } => {
            let mut config = GenEpisodeConfig::load()?;
            config.concurrency = Some(*value);
            config.save()?;
            println!("Default concurrency set to: {}", value);
        }
        ConfigAction::SetBucket { name } => {
            let mut config = GenEpisodeConfig::load()?;
            config.bucket = Some(name.clone());
            config.save()?;
            println!("Upload bucket set to: {}", name);
        }
    }
    Ok(())
}
