mod loader;
mod reports;
mod runner;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};

use evroute_engine::{OptimizeRequest, Optimizer, PlannerConfig};
use loader::{build_optimizer, resolve_catalog_path};
use runner::{BatchItem, RequestResult, run_batch, run_request};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Colored human-readable summary
    Console,
    /// Response JSON (single request) or an array of labeled entries (batch)
    Json,
    /// Markdown tables
    Markdown,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Plan a single request read from a JSON file (`-` for stdin)
    Plan {
        #[arg(value_name = "REQUEST")]
        request: PathBuf,
    },
    /// Plan every request in a JSON array concurrently
    Batch {
        #[arg(value_name = "REQUESTS")]
        requests: PathBuf,
    },
    /// List zones with their exits and encounters
    Zones,
    /// List species with their EV yields and where they appear
    Species,
    /// Export the zone adjacency structure as JSON
    Export,
}

#[derive(Debug, Parser)]
#[command(name = "evroute", version)]
#[command(about = "Plan EV training routes: where to travel and what to battle")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Catalog JSON file (falls back to $EVROUTE_CATALOG, then the bundled Kanto catalog)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Planner config JSON file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Per-request time budget in milliseconds (overrides the config file)
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console, global = true)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_config(args.config.as_deref(), args.timeout_ms)?;
    let catalog_path = resolve_catalog_path(args.catalog.clone());
    let optimizer = build_optimizer(catalog_path.as_deref(), config)
        .context("failed to load catalog")?;

    let all_ok = execute(&args, &optimizer).await?;
    if !all_ok {
        std::process::exit(1);
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    if verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
            .init();
    } else {
        env_logger::init();
    }
}

fn load_config(path: Option<&Path>, timeout_ms: Option<u64>) -> Result<PlannerConfig> {
    let mut config = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            PlannerConfig::from_json(&raw)
                .with_context(|| format!("invalid planner config in {}", path.display()))?
        }
        None => PlannerConfig::default(),
    };
    if let Some(ms) = timeout_ms {
        if ms == 0 {
            bail!("--timeout-ms must be greater than zero");
        }
        config.time_budget_ms = ms;
    }
    config.validate()?;
    Ok(config)
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut raw = String::new();
        std::io::Read::read_to_string(&mut std::io::stdin(), &mut raw)
            .context("failed to read stdin")?;
        Ok(raw)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
    }
}

/// Run the selected command. Returns `false` when any request failed.
async fn execute(args: &Args, optimizer: &Optimizer) -> Result<bool> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    let budget = optimizer.config().time_budget();

    let all_ok = match &args.command {
        Command::Plan { request } => {
            let raw = read_input(request)?;
            let parsed: OptimizeRequest =
                serde_json::from_str(&raw).context("request JSON does not match the schema")?;
            let label = parsed.pokemon_name.clone();
            let result = run_request(optimizer.clone(), label, parsed, budget).await;
            write_results(args.report, &mut output_target, std::slice::from_ref(&result), true)?;
            result.succeeded()
        }
        Command::Batch { requests } => {
            let raw = read_input(requests)?;
            let items: Vec<BatchItem> =
                serde_json::from_str(&raw).context("batch file must be a JSON array of requests")?;
            if matches!(args.report, ReportFormat::Console) {
                announce_banner(items.len());
            }
            let results = run_batch(optimizer, items, budget).await;
            write_results(args.report, &mut output_target, &results, false)?;
            results.iter().all(RequestResult::succeeded)
        }
        Command::Zones => {
            if matches!(args.report, ReportFormat::Json) {
                let data = optimizer.catalog().to_data();
                writeln!(output_target, "{}", serde_json::to_string_pretty(&data.zones)?)?;
            } else {
                reports::write_zone_listing(&mut output_target, optimizer.catalog())?;
            }
            true
        }
        Command::Species => {
            if matches!(args.report, ReportFormat::Json) {
                let data = optimizer.catalog().to_data();
                writeln!(output_target, "{}", serde_json::to_string_pretty(&data.species)?)?;
            } else {
                reports::write_species_listing(&mut output_target, optimizer.catalog())?;
            }
            true
        }
        Command::Export => {
            let export = optimizer.adjacency();
            writeln!(output_target, "{}", serde_json::to_string_pretty(&export)?)?;
            true
        }
    };

    output_target.flush_inner()?;
    Ok(all_ok)
}

fn announce_banner(count: usize) {
    println!("{}", "🗺️  EV Route Planner".bright_cyan().bold());
    println!("{}", "====================".cyan());
    println!("Planning {count} request(s)");
}

fn write_results(
    format: ReportFormat,
    out: &mut OutputTarget,
    results: &[RequestResult],
    single: bool,
) -> Result<()> {
    match format {
        ReportFormat::Json if single => {
            if let Some(result) = results.first() {
                reports::generate_json_response(out, result)?;
            }
        }
        ReportFormat::Json => reports::generate_json_report(out, results)?,
        ReportFormat::Markdown => reports::generate_markdown_report(out, results)?,
        ReportFormat::Console => reports::generate_console_report(out, results)?,
    }
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evroute_engine::Catalog;
    use std::time::Duration;

    fn base_args(command: Command, output: PathBuf, report: ReportFormat) -> Args {
        Args {
            command,
            catalog: None,
            config: None,
            timeout_ms: None,
            report,
            output: Some(output),
            verbose: false,
        }
    }

    fn optimizer() -> Optimizer {
        Optimizer::new(Catalog::embedded().unwrap(), PlannerConfig::default())
    }

    #[test]
    fn timeout_flag_overrides_config() {
        let config = load_config(None, Some(750)).unwrap();
        assert_eq!(config.time_budget(), Duration::from_millis(750));
        assert!(load_config(None, Some(0)).is_err());
    }

    #[test]
    fn config_file_is_validated() {
        let path = std::env::temp_dir().join("evroute-bad-config.json");
        std::fs::write(&path, r#"{"battle_weight": -2}"#).unwrap();
        let err = load_config(Some(path.as_path()), None).unwrap_err();
        assert!(format!("{err:#}").contains("battle_weight"));
    }

    #[test]
    fn plan_command_writes_json_response() {
        let request = std::env::temp_dir().join("evroute-main-request.json");
        std::fs::write(
            &request,
            r#"{"pokemon_name": "Zubat", "start_zone": "Mt. Moon",
                "target_evs": {"Speed": 3}, "lambda_penalty": 0.5}"#,
        )
        .unwrap();
        let output = std::env::temp_dir().join("evroute-main-plan.json");
        let args = base_args(Command::Plan { request }, output.clone(), ReportFormat::Json);
        let ok = tokio_test::block_on(execute(&args, &optimizer())).unwrap();
        assert!(ok);
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(output).unwrap()).unwrap();
        assert_eq!(value["total_encounters"], 3);
        assert_eq!(value["path"][0]["target_pokemon"], "Zubat");
    }

    #[test]
    fn failed_batch_entry_reports_false() {
        let requests = std::env::temp_dir().join("evroute-main-batch.json");
        std::fs::write(
            &requests,
            r#"[{"pokemon_name": "Zubat", "start_zone": "Mt. Moon", "target_evs": {"HP": 400}}]"#,
        )
        .unwrap();
        let output = std::env::temp_dir().join("evroute-main-batch.md");
        let args = base_args(Command::Batch { requests }, output.clone(), ReportFormat::Markdown);
        let ok = tokio_test::block_on(execute(&args, &optimizer())).unwrap();
        assert!(!ok);
        let text = std::fs::read_to_string(output).unwrap();
        assert!(text.contains("InvalidRequest"));
    }

    #[test]
    fn export_command_writes_adjacency() {
        let output = std::env::temp_dir().join("evroute-main-export.json");
        let args = base_args(Command::Export, output.clone(), ReportFormat::Console);
        assert!(tokio_test::block_on(execute(&args, &optimizer())).unwrap());
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(output).unwrap()).unwrap();
        assert!(value["zones"]["Route 1"]["edges"].is_array());
        assert_eq!(value["fingerprint"].as_str().map(str::len), Some(16));
    }

    #[test]
    fn output_target_stdout_writes() {
        let mut target = OutputTarget::new(None).unwrap();
        writeln!(target, "ok").unwrap();
        target.flush_inner().unwrap();
    }
}
