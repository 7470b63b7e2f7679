//! CLI for ArkGen - image-to-video generation.

use anyhow::Context;
use arkgen::task::DEFAULT_MODEL;
use arkgen::{
    ArkClient, Downloader, Driver, GenerationParams, PollConfig, RunConfig, RunOutcome,
    TaskClient, TaskHandle,
};
use clap::{Args, Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "arkgen")]
#[command(about = "Generate videos from an image and a prompt via the Volcengine Ark API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Ark API key
    #[arg(long, global = true, env = "ARK_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Ark API base URL
    #[arg(long, global = true, env = "ARK_BASE_URL")]
    base_url: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a video from a reference image and a prompt
    Generate(GenerateArgs),

    /// Show the current status of a task
    Status {
        /// Task id returned at creation
        task_id: String,
    },

    /// Cancel a queued task or delete a finished task record
    Cancel {
        /// Task id returned at creation
        task_id: String,
    },
}

#[derive(Args)]
struct GenerateArgs {
    /// Reference image used as the first frame (.jpg/.jpeg or .png)
    #[arg(short, long)]
    image: PathBuf,

    /// The text prompt describing the video
    #[arg(short, long, conflicts_with = "prompt_file", required_unless_present = "prompt_file")]
    prompt: Option<String>,

    /// Read the prompt from a file
    #[arg(long)]
    prompt_file: Option<PathBuf>,

    /// Model identifier
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Output resolution (480p, 720p, 1080p)
    #[arg(long, default_value = "480p")]
    resolution: String,

    /// Aspect ratio (e.g. 16:9, 9:16, adaptive)
    #[arg(long, default_value = "16:9")]
    ratio: String,

    /// Video duration in seconds
    #[arg(short, long, default_value_t = 12)]
    duration: u32,

    /// Keep the camera fixed
    #[arg(long)]
    camera_fixed: bool,

    /// Add a watermark
    #[arg(long)]
    watermark: bool,

    /// Seed for reproducible generation
    #[arg(long)]
    seed: Option<i64>,

    /// Also return the last frame as an image URL
    #[arg(long)]
    return_last_frame: bool,

    /// Directory for the downloaded video [default: $DOWNLOAD_DIR or ~/Downloads]
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Seconds between status queries
    #[arg(long, default_value_t = 3)]
    poll_interval: u64,

    /// Give up after this many status queries (0 disables the cap)
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Give up after this many seconds of polling (0 disables the deadline)
    #[arg(long, default_value_t = 600)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let mut builder = ArkClient::builder();
    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key);
    }
    if let Some(ref url) = cli.base_url {
        builder = builder.base_url(url);
    }
    let client = builder.build().context("Failed to configure the Ark client")?;

    match cli.command {
        Commands::Generate(args) => generate(&client, args, cli.json).await,
        Commands::Status { task_id } => status(&client, &task_id, cli.json).await,
        Commands::Cancel { task_id } => cancel(&client, &task_id, cli.json).await,
    }
}

fn run_config(args: GenerateArgs) -> anyhow::Result<RunConfig> {
    let prompt = match (args.prompt, args.prompt_file) {
        (Some(p), _) => p,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read prompt file {}", path.display()))?,
        (None, None) => anyhow::bail!("either --prompt or --prompt-file is required"),
    };
    if prompt.trim().is_empty() {
        anyhow::bail!("prompt is empty");
    }
    if args.poll_interval == 0 {
        anyhow::bail!("--poll-interval must be at least 1 second");
    }

    let params = GenerationParams {
        resolution: Some(args.resolution),
        ratio: Some(args.ratio),
        duration_secs: Some(args.duration),
        camera_fixed: Some(args.camera_fixed),
        watermark: Some(args.watermark),
        seed: args.seed,
    };
    let poll = PollConfig::default()
        .with_interval(Duration::from_secs(args.poll_interval))
        .with_max_attempts(args.max_attempts.filter(|&n| n > 0))
        .with_timeout((args.timeout > 0).then(|| Duration::from_secs(args.timeout)));

    let mut config = RunConfig::new(args.image, prompt)
        .with_model(args.model)
        .with_params(params)
        .with_return_last_frame(args.return_last_frame)
        .with_poll(poll);
    if let Some(dir) = args.output_dir {
        config = config.with_download_dir(dir);
    }
    Ok(config)
}

async fn generate(client: &ArkClient, args: GenerateArgs, json_output: bool) -> anyhow::Result<()> {
    let config = run_config(args)?;
    let downloader = Downloader::new()?;

    let report = tokio::select! {
        report = Driver::new(client, &downloader, config).run() => report?,
        _ = tokio::signal::ctrl_c() => {
            anyhow::bail!("interrupted; the remote task keeps running and can be checked with `arkgen status`");
        }
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        match &report.outcome {
            RunOutcome::Downloaded {
                path,
                bytes,
                last_frame_url,
                ..
            } => {
                println!(
                    "Generated video: {} ({} bytes) via task {}",
                    path.display(),
                    bytes,
                    report.task_id
                );
                println!(
                    "Polled {} times over {}s",
                    report.poll_attempts,
                    report.poll_elapsed.as_secs()
                );
                if let Some(url) = last_frame_url {
                    println!("Last frame: {url}");
                }
            }
            RunOutcome::TaskFailed { payload } => {
                println!("Task {} failed: {}", report.task_id, payload);
            }
            RunOutcome::DownloadFailed {
                video_url, error, ..
            } => {
                println!("Download failed: {error}");
                println!("Video URL (valid for a limited time): {video_url}");
            }
        }
    }

    if !report.is_success() {
        anyhow::bail!("task {} did not produce a saved video", report.task_id);
    }
    Ok(())
}

async fn status(client: &ArkClient, task_id: &str, json_output: bool) -> anyhow::Result<()> {
    let snapshot = client.get(&TaskHandle::new(task_id)).await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        println!("Task {}: {}", snapshot.id, snapshot.status);
        if let Some(ref model) = snapshot.model {
            println!("Model: {model}");
        }
        if let Some(url) = snapshot.video_url() {
            println!("Video URL: {url}");
        }
        if let Some(ref error) = snapshot.error {
            println!("Error: {error}");
        }
    }
    Ok(())
}

async fn cancel(client: &ArkClient, task_id: &str, json_output: bool) -> anyhow::Result<()> {
    client.cancel(&TaskHandle::new(task_id)).await?;

    if json_output {
        let result = serde_json::json!({ "task_id": task_id, "cancelled": true });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Cancelled task {task_id}");
    }
    Ok(())
}
