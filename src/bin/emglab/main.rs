use clap::Parser;
use emglab::{
    AcquisitionState, AcquisitionTask, ChannelLayout, ConditioningPolicy, NullInput,
    SessionClock, SessionConfig, SessionRecorder, SessionRunner,
};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const SUCCESS: i32 = 0;
const SESSION_ERROR: i32 = 1;
const CONFIG_ERROR: i32 = 2;

#[derive(Parser)]
#[command(
    name = "emglab",
    version,
    about = "Serial EMG acquisition, signal conditioning, and research session recording",
    long_about = "Acquires EMG frames from a serial bio-amplifier, conditions them into\n\
                  control values, and records session data as CSV. Without a device the\n\
                  session runs on fallback input."
)]
struct Cli {
    /// Channel layout (vertical, crosshair, flight)
    #[arg(long)]
    layout: Option<ChannelLayout>,

    /// Conditioning policy override (baseline-relative, fixed-threshold)
    #[arg(long)]
    policy: Option<ConditioningPolicy>,

    /// JSON config file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Candidate serial ports, tried in order
    #[arg(long, num_args = 1..)]
    port: Vec<String>,

    /// Serial baud rate
    #[arg(long)]
    baud: Option<u32>,

    /// Session length in seconds (runs until interrupted when absent)
    #[arg(long)]
    duration: Option<f64>,

    /// Periodic record cadence in control-loop ticks
    #[arg(long)]
    record_every: Option<u32>,

    /// Directory receiving the per-session CSV files
    #[arg(short, long, env = "EMGLAB_DATA_DIR")]
    output: Option<PathBuf>,

    /// Suppress progress messages
    #[arg(short, long)]
    quiet: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    std::process::exit(run(cli).await);
}

async fn run(cli: Cli) -> i32 {
    if let Some(secs) = cli.duration {
        if !secs.is_finite() || secs < 0.0 {
            eprintln!("Error: duration must be a non-negative number of seconds");
            return CONFIG_ERROR;
        }
    }

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return CONFIG_ERROR;
        }
    };

    let clock = SessionClock::start();
    let state = AcquisitionState::new(config.layout.channel_count());
    let cancel = CancellationToken::new();

    let recorder = match SessionRecorder::create(&config, clock) {
        Ok(recorder) => recorder,
        Err(e) => {
            eprintln!("Error: {}", e);
            return SESSION_ERROR;
        }
    };

    if !cli.quiet {
        eprintln!(
            "Session {} ({} layout, {} policy)",
            recorder.session_id(),
            config.layout,
            config.effective_policy()
        );
        eprintln!("Recording to {}", config.output_dir.display());
    }

    let acquisition = tokio::spawn(
        AcquisitionTask::new(config.clone(), state.clone(), clock, cancel.clone()).run(),
    );

    // Ctrl-C closes the session cleanly, like the configured duration.
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::info!("Interrupt received; closing session");
                cancel.cancel();
            }
        });
    }

    let duration = cli.duration.map(Duration::from_secs_f64);
    let runner = SessionRunner::new(&config, state, recorder, clock, cancel.clone());
    let result = runner.run(NullInput, duration).await;

    cancel.cancel();
    if let Err(e) = acquisition.await {
        log::warn!("Acquisition task failed: {}", e);
    }

    match result {
        Ok(summary) => {
            println!("=== SESSION SUMMARY ===");
            println!("Session:   {}", summary.session_id);
            println!("Duration:  {:.1}s", summary.duration_secs);
            println!("Samples:   {}", summary.samples_recorded);
            println!("Movements: {}", summary.movements_recorded);
            println!("Data saved to {}", summary.sample_path.display());
            println!("          and {}", summary.movement_path.display());
            SUCCESS
        }
        Err(e) => {
            eprintln!("Session failed: {}", e);
            SESSION_ERROR
        }
    }
}

fn build_config(cli: &Cli) -> Result<SessionConfig, String> {
    let mut config = match &cli.config {
        Some(path) => SessionConfig::load(path).map_err(|e| e.to_string())?,
        None => SessionConfig::default(),
    };

    if let Some(layout) = cli.layout {
        config.layout = layout;
    }
    if let Some(policy) = cli.policy {
        config.policy = Some(policy);
    }
    if !cli.port.is_empty() {
        config.ports = cli.port.clone();
    }
    if let Some(baud) = cli.baud {
        config.baud_rate = baud;
    }
    if let Some(every) = cli.record_every {
        config.record_every = Some(every);
    }
    if let Some(output) = &cli.output {
        config.output_dir = output.clone();
    }

    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}
