use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use panovr::config::Config;
use panovr::orchestrator::TaskOrchestrator;
use panovr::project::{InMemoryProjectStore, Project, ProjectId, ProjectLookup, ProjectUpdater};
use panovr::registry::TaskRegistry;
use panovr::request::{ProcessingOptions, ProcessingRequest};
use panovr::storage::{FsImageSource, FsResultSink, ImageSource, ResultSink};
use panovr::task::TaskStatus;
use panovr::{plog, Result};

/// panovr - VR panorama generation pipeline
#[derive(Parser, Debug)]
#[command(name = "panovr")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    PANOVR_DEBUG=1    Enable debug logging (alternative to --debug)")]
pub struct Cli {
    /// Enable debug logging (writes to ~/.panovr/panovr.log)
    #[arg(short = 'd', long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Generate a VR panorama from local images and wait for the result
    Process {
        /// Source images, stitched left to right in the given order
        #[arg(required = true)]
        images: Vec<String>,

        /// Output panorama width in pixels
        #[arg(long, default_value_t = 4096)]
        width: u32,

        /// Output panorama height in pixels
        #[arg(long, default_value_t = 2048)]
        height: u32,

        /// JPEG quality, 0-100
        #[arg(long, default_value_t = 90)]
        quality: u8,

        /// Skip the optimization stage
        #[arg(long)]
        no_optimize: bool,
    },

    /// Print the resolved configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    panovr::log::init_with_debug(cli.debug);

    match cli.command {
        Command::Process {
            images,
            width,
            height,
            quality,
            no_optimize,
        } => run_process(images, width, height, quality, no_optimize).await,
        Command::Config => {
            let config = Config::load()?;
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

async fn run_process(
    images: Vec<String>,
    width: u32,
    height: u32,
    quality: u8,
    no_optimize: bool,
) -> Result<()> {
    let config = Config::load()?;
    config.ensure_dirs()?;
    let upload_dir = config.upload_dir()?;

    // One throwaway project to attach the result to.
    let projects = Arc::new(InMemoryProjectStore::new());
    let project_id = ProjectId(1);
    projects.insert(Project::new(project_id, "local"));

    let orchestrator = TaskOrchestrator::new(
        Arc::new(TaskRegistry::new()),
        Arc::clone(&projects) as Arc<dyn ProjectLookup>,
        Arc::clone(&projects) as Arc<dyn ProjectUpdater>,
        Arc::new(FsImageSource::new(&upload_dir, &config.base_url)) as Arc<dyn ImageSource>,
        Arc::new(FsResultSink::new(&upload_dir, &config.base_url)) as Arc<dyn ResultSink>,
        config.max_concurrent_tasks,
    );

    // Local paths are made absolute so they bypass the URL mapping.
    let mut references = Vec::with_capacity(images.len());
    for image in &images {
        let path = std::fs::canonicalize(image)?;
        references.push(path.to_string_lossy().into_owned());
    }

    let mut request = ProcessingRequest::new(project_id, references);
    request.options = ProcessingOptions {
        output_width: width,
        output_height: height,
        quality,
        enable_optimization: !no_optimize,
    };

    let task = orchestrator.submit(request)?;
    plog!("cli submitted task {}", task.task_id.short());
    println!("task {} submitted", task.task_id);

    let mut last = (u8::MAX, String::new());
    loop {
        let snapshot = orchestrator.status(&task.task_id);
        if (snapshot.progress, snapshot.message.clone()) != last {
            println!("[{:>3}%] {}", snapshot.progress, snapshot.message);
            last = (snapshot.progress, snapshot.message.clone());
        }
        if snapshot.is_terminal() {
            match snapshot.status {
                TaskStatus::Completed => {
                    let url = snapshot.result_url.unwrap_or_default();
                    println!(
                        "done in {}ms: {}",
                        snapshot.duration_millis.unwrap_or_default(),
                        url
                    );
                    return Ok(());
                }
                _ => {
                    eprintln!(
                        "task ended as {}: {}",
                        snapshot.status,
                        snapshot.error_detail.unwrap_or(snapshot.message)
                    );
                    std::process::exit(1);
                }
            }
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}
