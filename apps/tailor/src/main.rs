mod config;
mod errors;
mod generation;
mod grounding;
mod llm_client;
mod models;
mod output;
mod render;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::generation::jd_source::load_job_description;
use crate::generation::orchestrator::{
    Orchestrator, Stage, TailorOutcome, TailorRequest, TailorSettings,
};
use crate::grounding::Tolerance;
use crate::llm_client::LlmClient;
use crate::models::resume::ResumeRecord;
use crate::render::render_sections;

const DEFAULT_CONTENT: &str = "resources/resume_content.yaml";
const DEFAULT_SECTIONS: &str = "resources/resume_sections.tex";

/// Resume content tailoring with a fact-fidelity guard.
#[derive(Parser)]
#[command(name = "resume-tailor", version)]
#[command(about = "Render resume sections and tailor them to a job description without fabrication", long_about = None)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render resume_sections.tex from resume content YAML.
    Render {
        #[arg(long, default_value = DEFAULT_CONTENT)]
        content: PathBuf,

        #[arg(long, default_value = DEFAULT_SECTIONS)]
        output: PathBuf,
    },

    /// Tailor resume content to a job description using an LLM.
    ///
    /// Falls back to the base content whenever the model output cannot be
    /// trusted.
    Tailor(TailorArgs),
}

#[derive(Args)]
struct TailorArgs {
    #[arg(long, default_value = DEFAULT_CONTENT)]
    content: PathBuf,

    /// Job description file or http(s) URL; omit to only polish
    #[arg(long)]
    job: Option<String>,

    /// Freeform profile text used as the factual ground truth
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Use OpenAI instead of a local Ollama server
    #[arg(long)]
    openai: bool,

    /// Maximum tolerated fact error rate, 0.0 to 1.0
    #[arg(long)]
    tolerance: Option<f64>,

    /// Write tailored YAML here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Also render the resulting content to this .tex file
    #[arg(long)]
    render: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    let level = if cli.verbose { "debug" } else { config.rust_log.as_str() };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), level))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Render { content, output } => run_render(&content, &output),
        Commands::Tailor(args) => run_tailor(&config, args).await,
    }
}

fn run_render(content: &Path, output_path: &Path) -> Result<()> {
    let (_, record) = output::load_content(content)?;
    if record.is_empty() {
        anyhow::bail!("Content file is empty: {}", content.display());
    }
    output::write_atomically(output_path, &render_sections(&record))?;
    Ok(())
}

async fn run_tailor(config: &Config, args: TailorArgs) -> Result<()> {
    let (base_yaml, base) = output::load_content(&args.content)
        .with_context(|| format!("loading base content {}", args.content.display()))?;
    let profile = args
        .profile
        .as_deref()
        .map(output::read_text)
        .transpose()?;

    let job_description = match &args.job {
        Some(source) => match load_job_description(source, config.fetch_timeout).await {
            Ok(jd) => Some(jd),
            Err(e) => {
                let outcome = TailorOutcome::Aborted {
                    stage: Stage::JobDescription,
                    reason: e.to_string(),
                    yaml: base_yaml.clone(),
                };
                error!("Tailoring failed at {} ({e}); using base content", Stage::JobDescription);
                return emit(&args, &outcome, &base);
            }
        },
        None => None,
    };

    let llm = LlmClient::from_config(config, args.openai)?;
    info!("LLM client initialized (model: {})", llm.model());

    let settings = TailorSettings {
        tolerance: Tolerance::resolve(args.tolerance, config.fact_tolerance),
    };
    info!("Fact error tolerance: {:.3}", settings.tolerance.value());

    let outcome = Orchestrator::new(&llm, settings)
        .run(TailorRequest {
            base_yaml: &base_yaml,
            base: &base,
            profile: profile.as_deref(),
            job_description: job_description.as_deref(),
        })
        .await;

    emit(&args, &outcome, &base)
}

/// Writes the outcome's YAML (and optional rendered sections).
fn emit(args: &TailorArgs, outcome: &TailorOutcome, base: &ResumeRecord) -> Result<()> {
    if !outcome.is_accepted() {
        warn!("Emitting untailored base content");
    }

    match &args.output {
        Some(path) => output::write_atomically(path, outcome.yaml())?,
        None => print!("{}", outcome.yaml()),
    }

    if let Some(tex_path) = &args.render {
        output::write_atomically(tex_path, &render_sections(outcome.record(base)))?;
    }

    Ok(())
}
