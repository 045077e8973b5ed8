//! CLI binary for imei-scan.
//!
//! A thin shim over the library crate that maps CLI flags to `ScanConfig`,
//! runs one scan and renders the outcome.

use anyhow::{Context, Result};
use clap::Parser;
use imei_scan::{
    default_csv_filename, scan_input, write_csv, AnalysisOutcome, OutcomeKind, ScanConfig,
    ScanProgressCallback, ScanResult, ScanStage,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner whose message follows the orchestrator stage.
struct CliSpinner {
    bar: ProgressBar,
}

impl CliSpinner {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Scanning");
        bar.set_message("Preparing image…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ScanProgressCallback for CliSpinner {
    fn on_stage(&self, stage: ScanStage) {
        let msg = match stage {
            ScanStage::Encoding => "Encoding image…",
            ScanStage::AwaitingInference => "Analyzing image…",
            ScanStage::Validating => "Reading response…",
            _ => return,
        };
        self.bar.set_message(msg);
    }

    fn on_scan_complete(&self, _kind: OutcomeKind) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Scan a photo and print the devices
  imei-scan boxes.jpg

  # Save the device list as CSV (default name imei-scan-YYYY-MM-DD.csv)
  imei-scan boxes.jpg --csv
  imei-scan boxes.jpg --csv shelf-3.csv

  # Structured output
  imei-scan --json boxes.png > result.json

  # Use a specific provider/model
  imei-scan --provider openai --model gpt-4.1-mini boxes.jpg

  # Abort if the model takes longer than 30 seconds
  imei-scan --timeout 30 boxes.jpg

EXIT CODES:
  0  devices read (or the model reported the image unusable)
  2  the model's answer could not be understood; try a clearer image
  1  hard failure (unsupported image, missing API key, network/service error)

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (default provider)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (gemini, openai, anthropic, ollama)
  EDGEQUAKE_MODEL         Override model ID
"#;

/// Read IMEI numbers from photos of device packaging using Vision LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "imei-scan",
    version,
    about = "Read IMEI numbers from photos of device packaging using Vision LLMs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Image path (JPEG/PNG), data URL, or HTTP/HTTPS URL.
    input: String,

    /// Write the device list as CSV. Without a value, uses imei-scan-YYYY-MM-DD.csv.
    #[arg(long, env = "IMEI_SCAN_CSV", num_args = 0..=1, default_missing_value = "")]
    csv: Option<String>,

    /// LLM model ID (default: gemini-2.0-flash).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: gemini, openai, anthropic, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "IMEI_SCAN_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, env = "IMEI_SCAN_MAX_TOKENS", default_value_t = 2048)]
    max_tokens: usize,

    /// Abort the scan after this many seconds.
    #[arg(long, env = "IMEI_SCAN_TIMEOUT")]
    timeout: Option<u64>,

    /// HTTP download timeout in seconds (URL inputs).
    #[arg(long, env = "IMEI_SCAN_DOWNLOAD_TIMEOUT", default_value_t = 60)]
    download_timeout: u64,

    /// Output the outcome as JSON instead of text.
    #[arg(long, env = "IMEI_SCAN_JSON")]
    json: bool,

    /// Disable the spinner.
    #[arg(long, env = "IMEI_SCAN_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "IMEI_SCAN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except results and errors.
    #[arg(short, long, env = "IMEI_SCAN_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let mut builder = ScanConfig::builder()
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .download_timeout_secs(cli.download_timeout);
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if show_progress {
        builder = builder.progress_callback(CliSpinner::new());
    }
    let config = builder.build().context("Invalid configuration")?;

    // ── Run scan ─────────────────────────────────────────────────────────
    let outcome = match cli.timeout {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), scan_input(&cli.input, &config))
            .await
            .with_context(|| format!("Scan timed out after {secs}s"))?,
        None => scan_input(&cli.input, &config).await,
    };

    // ── Render ───────────────────────────────────────────────────────────
    if cli.json {
        println!("{}", outcome_json(&outcome)?);
    } else {
        render_text(&outcome, cli.quiet);
    }

    if let AnalysisOutcome::Success(ref result) = outcome {
        if let Some(ref path) = cli.csv {
            export_csv(result, path, cli.quiet).await?;
        }
    }

    Ok(match outcome.kind() {
        OutcomeKind::Success => ExitCode::SUCCESS,
        OutcomeKind::SoftError => ExitCode::from(2),
        OutcomeKind::HardError => ExitCode::FAILURE,
    })
}

/// Serialise the outcome as a tagged JSON object.
fn outcome_json(outcome: &AnalysisOutcome) -> Result<String> {
    let value = match outcome {
        AnalysisOutcome::Success(result) => serde_json::json!({
            "outcome": OutcomeKind::Success,
            "result": result,
            "countMismatch": result.count_mismatch(),
        }),
        AnalysisOutcome::SoftError(e) => serde_json::json!({
            "outcome": OutcomeKind::SoftError,
            "message": e.to_string(),
        }),
        AnalysisOutcome::HardError(e) => serde_json::json!({
            "outcome": OutcomeKind::HardError,
            "message": e.to_string(),
        }),
    };
    serde_json::to_string_pretty(&value).context("Failed to serialise outcome")
}

fn render_text(outcome: &AnalysisOutcome, quiet: bool) {
    match outcome {
        AnalysisOutcome::Success(result) => {
            if !quiet && !result.description.is_empty() {
                eprintln!("{} {}", dim("Image:"), result.description);
            }
            if let Some(ref message) = result.soft_error {
                eprintln!("{} {}", yellow("⚠"), message);
                return;
            }
            if !quiet {
                eprintln!(
                    "{} Devices detected: {}",
                    green("✔"),
                    bold(&result.device_count.to_string())
                );
                if let Some(mismatch) = result.count_mismatch() {
                    eprintln!("{} {}", yellow("⚠"), mismatch);
                }
            }
            for device in &result.devices {
                println!("{:<24} {}", device.position, device.imei);
            }
        }
        AnalysisOutcome::SoftError(e) => eprintln!("{} {}", yellow("⚠"), e),
        AnalysisOutcome::HardError(e) => eprintln!("{} {}", red("✘"), e),
    }
}

async fn export_csv(result: &ScanResult, path: &str, quiet: bool) -> Result<()> {
    if result.devices.is_empty() {
        if !quiet {
            eprintln!("{}", dim("No devices detected; CSV not written."));
        }
        return Ok(());
    }
    let path = if path.trim().is_empty() {
        PathBuf::from(default_csv_filename())
    } else {
        PathBuf::from(path)
    };
    write_csv(&result.devices, &path)
        .await
        .context("Failed to write CSV")?;
    if !quiet {
        eprintln!("{} {}", dim("CSV written to"), bold(&path.display().to_string()));
    }
    Ok(())
}
