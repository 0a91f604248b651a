use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use course_scraper::config::{Config, NonTargetMode};
use course_scraper::constants::page_url;
use course_scraper::pages::{DirectoryPageSource, PageSource};
use course_scraper::pipeline::{BatchOptions, PageOutcome, PipelineOrchestrator};
use course_scraper::storage::{JsonDirStorage, RecordSink};
use course_scraper::{logging, metrics};

#[derive(Parser)]
#[command(name = "course_scraper")]
#[command(about = "Extracts and normalizes university course pages into JSON records")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse every cached page and write one JSON record per course
    Parse {
        /// Configuration file (defaults to config.toml when present)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Directory holding cached `<name>.html` pages
        #[arg(long)]
        pages: Option<PathBuf>,
        /// Directory receiving the JSON records
        #[arg(long)]
        output: Option<PathBuf>,
        /// Only courses of this faculty are kept
        #[arg(long)]
        faculty: Option<String>,
        /// Number of pages processed concurrently
        #[arg(long)]
        workers: Option<usize>,
        /// Keep other faculties' field bags under <output>/secondary
        #[arg(long)]
        secondary: bool,
    },
    /// Run a single page through the pipeline and print the result
    Inspect {
        /// Cached page file
        file: PathBuf,
        /// Source URL recorded in the output (derived from the file name by default)
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    Ok(match path {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    logging::init_logging();
    metrics::init_metrics();

    match cli.command {
        Commands::Parse {
            config,
            pages,
            output,
            faculty,
            workers,
            secondary,
        } => {
            let mut config = load_config(config.as_ref())?;
            if let Some(pages) = pages {
                config.pages_dir = pages;
            }
            if let Some(output) = output {
                config.output_dir = output;
            }
            if let Some(faculty) = faculty {
                config.target_faculty = faculty;
            }
            if let Some(workers) = workers {
                config.workers = workers;
            }
            if secondary {
                config.non_target = NonTargetMode::Secondary;
            }
            config.validate()?;

            info!(
                "Parsing pages from {} for {}",
                config.pages_dir.display(),
                config.target_faculty
            );
            let orchestrator = Arc::new(PipelineOrchestrator::from_config(&config)?);
            let source: Arc<dyn PageSource> = Arc::new(DirectoryPageSource::new(
                config.pages_dir.clone(),
                config.base_url.clone(),
            ));
            let sink: Arc<dyn RecordSink> = Arc::new(JsonDirStorage::new(config.output_dir.clone()));

            let summary = orchestrator
                .run_batch(
                    source,
                    sink,
                    BatchOptions {
                        workers: config.workers,
                        non_target: config.non_target,
                    },
                )
                .await?;

            println!("\n📊 Parse results:");
            println!("   Pages: {}", summary.total());
            println!("   Parsed: {}", summary.parsed);
            println!("   Skipped: {}", summary.skipped);
            println!("   Failed: {}", summary.failed());
            println!("   Output directory: {}", config.output_dir.display());

            if !summary.failures.is_empty() {
                warn!("{} pages failed", summary.failed());
                println!("\n⚠️  Failures:");
                for failure in &summary.failures {
                    println!("   - {}", failure);
                }
            }
        }
        Commands::Inspect { file, url, config } => {
            let config = load_config(config.as_ref())?;
            let markup = tokio::fs::read_to_string(&file).await?;
            let name = file
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("page")
                .to_string();
            let url = url.unwrap_or_else(|| page_url(&config.base_url, &name));

            let orchestrator = PipelineOrchestrator::from_config(&config)?;
            let report = match orchestrator.process_page(&name, &url, &markup) {
                PageOutcome::Parsed(record) => serde_json::to_string_pretty(&record)?,
                PageOutcome::Skipped { faculty, .. } => {
                    format!("skipped: course belongs to {faculty:?}")
                }
                PageOutcome::Failed(failure) => serde_json::to_string_pretty(&failure)?,
            };
            println!("{report}");
        }
    }

    Ok(())
}
