use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use secure_eraser::io::{HandleOptions, PlatformOpener};
use secure_eraser::ui::{human_bytes, render_device_table, TerminalProgress};
use secure_eraser::*;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const MIB: u64 = 1024 * 1024;

#[derive(Parser)]
#[command(name = "secure-eraser")]
#[command(about = "Secure disk eraser with multiple wipe patterns")]
#[command(version)]
struct Cli {
    /// List available devices
    #[arg(short, long)]
    list: bool,

    /// Device to erase
    #[arg(short, long, value_name = "PATH", required_unless_present = "list")]
    device: Option<PathBuf>,

    /// Wipe pattern: zeros, ones, random, dod3, gutmann35
    #[arg(short, long, value_name = "TYPE", default_value = "zeros")]
    pattern: WipeScheme,

    /// Verify final pass
    #[arg(short, long)]
    verify: bool,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    yes: bool,

    /// Print the device list or wipe report as JSON
    #[arg(long)]
    json: bool,

    /// Configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Bytes per write call (overrides configuration)
    #[arg(long, value_name = "BYTES")]
    block_size: Option<usize>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Also write JSON logs to this file
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guard = match init_logging(cli.debug, cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(debug: bool, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let stderr_layer = fmt::layer().with_writer(io::stderr).with_target(false);

    match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow!("Log file path has no file name: {}", path.display()))?;

            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(fmt::layer().json().with_writer(writer))
                .try_init()
                .context("Failed to initialise logging")?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .try_init()
                .context("Failed to initialise logging")?;
            Ok(None)
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let catalog = SysfsCatalog::new();

    if cli.list {
        let devices = catalog.devices().context("Failed to enumerate devices")?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&devices)?);
        } else {
            print!("{}", render_device_table(&devices));
            println!();
        }
        return Ok(());
    }

    let device_path = cli
        .device
        .as_deref()
        .ok_or_else(|| anyhow!("No device given (use --device or --list)"))?;

    let mut config = EngineConfig::load(cli.config.as_deref())?;
    if let Some(block_size) = cli.block_size {
        config = config.with_block_size(block_size);
        config.validate()?;
    }

    if !is_root() {
        eprintln!(
            "{}",
            "Warning: not running as root; opening the device will likely fail.".yellow()
        );
    }

    let target = catalog
        .find(device_path)
        .context("Failed to enumerate devices")?
        .ok_or_else(|| anyhow!("Device not found: {}", device_path.display()))?;

    // Safety checks
    if target.mounted {
        bail!("Device is mounted. Please unmount before erasing.");
    }

    if !cli.yes {
        let message = format!(
            "WARNING: This will permanently destroy all data on {} ({} MB). Continue?",
            target.path.display(),
            target.size_bytes / MIB
        );
        if !confirm_action(&message)? {
            println!("Operation cancelled.");
            return Ok(());
        }
    }

    let cancel = CancelFlag::new();
    cancel
        .register_sigint()
        .context("Failed to install SIGINT handler")?;

    let opener = PlatformOpener::new(HandleOptions {
        direct_io: config.direct_io,
        allow_image_files: false,
    });
    let engine = WipeEngine::new(opener, config)?.with_cancel_flag(cancel);

    if !cli.json {
        println!(
            "Starting secure erase of {} with pattern {} ({} pass(es))...",
            target.path.display(),
            cli.pattern,
            cli.pattern.pass_count()
        );
    }

    let mut progress = if cli.json {
        TerminalProgress::hidden()
    } else {
        TerminalProgress::new()
    };

    match engine.wipe(&target, cli.pattern, cli.verify, &mut progress) {
        Ok(report) => {
            progress.finish();
            print_report(&report, cli.json)
        }
        Err(WipeError::Cancelled { .. }) => {
            progress.abandon();
            bail!("Interrupted; the device is only partially overwritten")
        }
        Err(e) => {
            progress.abandon();
            Err(e).context("Secure erase failed")
        }
    }
}

fn print_report(report: &WipeReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let elapsed = report.elapsed();
    let rate = report.bytes_written as f64 / elapsed.as_secs_f64().max(0.001);
    // Whole seconds keep the summary readable
    let shown = std::time::Duration::from_secs(elapsed.as_secs());

    println!("{}", "Secure erase completed successfully.".green().bold());
    println!("  Session:  {}", report.session_id);
    println!("  Device:   {}", report.device.path.display());
    println!("  Pattern:  {} ({})", report.scheme, report.scheme.description());
    println!("  Passes:   {}", report.passes_completed);
    println!("  Written:  {}", human_bytes(report.bytes_written as f64));
    println!(
        "  Elapsed:  {} ({}/s)",
        humantime::format_duration(shown),
        human_bytes(rate)
    );

    match report.verification {
        VerificationStatus::Confirmed => println!("{}", "Verification passed.".green()),
        VerificationStatus::Mismatch => println!(
            "{}",
            "WARNING: Verification failed - sampled data does not match the final pass.".yellow()
        ),
        VerificationStatus::Skipped => {}
    }
    Ok(())
}

fn confirm_action(message: &str) -> Result<bool> {
    print!("{} [y/N]: ", message.red().bold());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn is_root() -> bool {
    nix::unistd::geteuid().is_root()
}
