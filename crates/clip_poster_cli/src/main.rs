//! clip-poster CLI
//!
//! Fetches one recorded clip, renders it, turns the render into a video and
//! publishes the video next to the clip's parsed data.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use clip_poster_core::config::{ConfigManager, Settings};
use clip_poster_core::logging::{self, LogLevel};
use clip_poster_core::orchestrator::{JobReport, JobRunner};
use clip_poster_core::storage;
use clip_poster_core::tools::ProcessRunner;

const DEFAULT_CONFIG: &str = "clip-poster.toml";

const DEFAULT_INPUT: &str = "s3://ros-bags/collected_data/35236_196_WeiLai-006_dave.du_2024-06-17-15-26-01/35236_196_WeiLai-006_dave.du_2024-06-17-15-26-01_33/";

#[derive(Parser, Debug)]
#[command(name = "clip-poster", version)]
#[command(about = "Fetch a clip, render it to video and publish the video", long_about = None)]
struct Args {
    /// Remote clip directory, e.g. s3://bucket/collected_data/<trip>/<clip>/
    #[arg(long = "input-dir", alias = "input_dir", default_value = DEFAULT_INPUT)]
    input_dir: String,

    /// Load settings from this TOML file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write a config file with defaults (or clean up an existing one) and exit
    #[arg(long, value_name = "PATH")]
    init_config: Option<PathBuf>,

    /// Seed for storage endpoint selection (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Abort when the clip download fails
    #[arg(long)]
    fail_on_fetch_error: bool,

    /// Storage access key id
    #[arg(long, env = "S3_ACCESS_KEY_ID", hide_env_values = true)]
    access_key_id: Option<String>,

    /// Storage secret access key
    #[arg(long, env = "S3_SECRET_ACCESS_KEY", hide_env_values = true)]
    secret_access_key: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn level(&self) -> LogLevel {
        if self.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Info
        }
    }

    fn apply_overrides(&self, settings: &mut Settings) {
        if self.fail_on_fetch_error {
            settings.tools.fail_on_fetch_error = true;
        }
        if let Some(ref key) = self.access_key_id {
            settings.storage.access_key_id = key.clone();
        }
        if let Some(ref secret) = self.secret_access_key {
            settings.storage.secret_access_key = secret.clone();
        }
    }
}

/// Config from `path`, or defaults when no file was given.
fn load_config(path: Option<&PathBuf>) -> Result<ConfigManager> {
    match path {
        Some(path) => {
            let mut manager = ConfigManager::new(path);
            manager
                .load()
                .with_context(|| format!("loading config {}", path.display()))?;
            Ok(manager)
        }
        None => Ok(ConfigManager::new(DEFAULT_CONFIG)),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(ref path) = args.init_config {
        logging::init_tracing(args.level());
        let mut manager = ConfigManager::new(path);
        manager
            .load_or_create()
            .with_context(|| format!("writing config {}", path.display()))?;
        println!("Config written to {}", manager.path().display());
        return Ok(());
    }

    if args.input_dir.is_empty() {
        println!("No input directory given; nothing to do.");
        return Ok(());
    }

    let mut config = load_config(args.config.as_ref())?;
    args.apply_overrides(config.settings_mut());

    let _guard = logging::init_tracing_with_file(args.level(), &config.logs_folder())
        .context("initializing logging")?;
    let settings = config.into_settings();
    tracing::debug!("clip-poster {}", clip_poster_core::version());

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let uploader = storage::build_uploader(&settings.storage, &mut rng)
        .context("setting up storage client")?;

    let runner = JobRunner::new(settings, Arc::new(ProcessRunner::new()), Arc::new(uploader))
        .with_log_level(args.level())
        .with_console(Arc::new(|line: &str| println!("{}", line)));

    match runner.run(&args.input_dir)? {
        JobReport::NoInput => {
            println!("No input directory given; nothing to do.");
        }
        JobReport::Completed(summary) => {
            println!();
            println!("Published: {}", summary.url_hint);
            println!("  endpoint: {}", summary.endpoint);
            println!("  log:      {}", summary.log_path.display());
            println!("  state:    {}", summary.state_path.display());
        }
    }

    Ok(())
}
