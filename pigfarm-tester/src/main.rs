mod invariants;
mod live;
mod reports;
mod simulation;
mod storage;
mod strategy;
mod util;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use pigfarm_game::GameEngine;

use live::{LiveConfig, run_live};
use simulation::{SimulationConfig, SimulationReport, run_simulation};
use storage::{HostCatalog, HostStorage};
use strategy::Strategy;
use util::{parse_seeds, session_key, split_csv};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    /// Deterministic virtual-time simulation with invariant checks (fast)
    Simulate,
    /// Real-time session on the tokio runtime, saved on exit
    Live,
}

#[derive(Debug, Parser)]
#[command(name = "pigfarm-tester", version = "0.1.0")]
#[command(about = "Headless host and QA driver for the Pig Farm Clicker engine")]
struct Args {
    /// Run mode: simulate (virtual clock) or live (wall clock)
    #[arg(long, value_enum, default_value_t = RunMode::Simulate)]
    mode: RunMode,

    /// Strategies to run (comma-separated, or `all`)
    #[arg(long, default_value = "all")]
    strategies: String,

    /// List all available strategies and exit
    #[arg(long)]
    list_strategies: bool,

    /// Seeds to run (comma-separated, decimal or 0x-hex)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Virtual minutes per simulated session
    #[arg(long, default_value_t = 10)]
    minutes: u64,

    /// Wall-clock seconds for a live session
    #[arg(long, default_value_t = 30)]
    seconds: u64,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Directory for `<key>.json` snapshots (in-memory when omitted)
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Catalog JSON to use instead of the embedded one
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if maybe_list_strategies(&args)? {
        return Ok(());
    }

    let strategies = expand_strategies(&args.strategies)?;
    let seeds = parse_seeds(&args.seeds)?;
    if seeds.is_empty() {
        bail!("no seeds given");
    }
    let storage = HostStorage::from_dir(args.save_dir.as_deref())?;
    let loader = HostCatalog::new(args.catalog.clone());

    announce_banner();

    match args.mode {
        RunMode::Simulate => {
            let start_time = Instant::now();
            let engine = GameEngine::new(loader, storage);
            let results = run_simulations(&engine, &strategies, &seeds, args.minutes)?;
            write_reports(&args, &results, start_time)?;
            if results.iter().any(|r| !r.passed) {
                std::process::exit(1);
            }
        }
        RunMode::Live => {
            let strategy = strategies[0];
            let seed = seeds[0];
            if strategies.len() > 1 || seeds.len() > 1 {
                eprintln!(
                    "⚠️  Live mode runs one session; using {} with seed {}",
                    strategy.key().yellow(),
                    seed
                );
            }
            let config = LiveConfig {
                duration: Duration::from_secs(args.seconds),
                click_interval: Duration::from_millis(250),
                autosave_interval: None,
                seed,
                save_key: session_key(strategy.key(), seed),
            };
            println!(
                "{} {} for {}s (Ctrl-C to stop early)",
                "▶️  Live session:".bright_green().bold(),
                strategy.key(),
                args.seconds
            );
            let report = run_live(GameEngine::new(loader, storage), strategy, config).await?;
            let mut output_target = OutputTarget::new(args.output.clone())?;
            reports::generate_live_report(&mut output_target, &report, &args.report)?;
            output_target.flush_inner()?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn maybe_list_strategies(args: &Args) -> Result<bool> {
    if !args.list_strategies {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available strategies:")?;
    for strategy in Strategy::ALL {
        writeln!(
            output_target.writer(),
            "  {:12} - {}",
            strategy.key(),
            strategy.description()
        )?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🐷 Pig Farm Automated Tester".bright_cyan().bold());
    println!("{}", "============================".cyan());
}

fn expand_strategies(arg: &str) -> Result<Vec<Strategy>> {
    let mut strategies = Vec::new();
    let mut seen = HashSet::new();
    for token in split_csv(arg) {
        let picked = if token.eq_ignore_ascii_case("all") {
            Strategy::ALL.to_vec()
        } else {
            vec![token.parse::<Strategy>().map_err(anyhow::Error::msg)?]
        };
        strategies.extend(picked.into_iter().filter(|strategy| seen.insert(*strategy)));
    }
    if strategies.is_empty() {
        bail!("no strategies selected");
    }
    Ok(strategies)
}

fn run_simulations(
    engine: &GameEngine<HostCatalog, HostStorage>,
    strategies: &[Strategy],
    seeds: &[u64],
    minutes: u64,
) -> Result<Vec<SimulationReport>> {
    println!("{}", "🧪 Running Simulations".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let config = SimulationConfig::from_minutes(minutes);
    let mut results = Vec::with_capacity(strategies.len() * seeds.len());
    for strategy in strategies {
        for seed in seeds {
            let report = run_simulation(engine, *strategy, *seed, &config)
                .with_context(|| format!("simulating {strategy} seed {seed}"))?;
            let mark = if report.passed { "✅" } else { "❌" };
            println!(
                "{mark} [{} seed {}] {} coins after {} virtual min",
                strategy.key().green(),
                seed,
                report.coins,
                minutes
            );
            results.push(report);
        }
    }
    Ok(results)
}

fn write_reports(args: &Args, results: &[SimulationReport], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => reports::generate_json_report(&mut output_target, results)?,
        "markdown" => reports::generate_markdown_report(&mut output_target, results)?,
        _ => {
            reports::generate_console_report(&mut output_target, results, start_time.elapsed())?;
            writeln!(&mut output_target)?;
            writeln!(
                &mut output_target,
                "🏁 Total time: {:?}",
                start_time.elapsed()
            )?;
        }
    }

    output_target.flush_inner()?;
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

    fn base_args() -> Args {
        Args {
            mode: RunMode::Simulate,
            strategies: "idle".to_string(),
            list_strategies: false,
            seeds: "1".to_string(),
            minutes: 1,
            seconds: 1,
            report: "json".to_string(),
            output: None,
            save_dir: None,
            catalog: None,
            verbose: false,
        }
    }

    fn temp_path(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "pigfarm-main-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    #[test]
    fn expand_all_lists_every_strategy_once() {
        let strategies = expand_strategies("all").unwrap();
        assert_eq!(strategies, Strategy::ALL.to_vec());
        assert_eq!(
            expand_strategies("greedy, ribbon").unwrap(),
            vec![Strategy::Greedy, Strategy::Ribbon]
        );
        assert_eq!(
            expand_strategies("idle,greedy,idle").unwrap(),
            vec![Strategy::Idle, Strategy::Greedy]
        );
        assert_eq!(
            expand_strategies("ribbon,all").unwrap(),
            vec![
                Strategy::Ribbon,
                Strategy::Idle,
                Strategy::Greedy,
                Strategy::Automation
            ]
        );
        assert!(expand_strategies("nope").is_err());
        assert!(expand_strategies(" , ").is_err());
    }

    #[test]
    fn list_strategies_writes_to_output_file() {
        let path = temp_path("list");
        let mut args = base_args();
        args.list_strategies = true;
        args.output = Some(path.clone());
        assert!(maybe_list_strategies(&args).unwrap());
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Available strategies"));
        assert!(content.contains("automation"));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn markdown_report_written_to_file() {
        let path = temp_path("md");
        let mut args = base_args();
        args.report = "markdown".to_string();
        args.output = Some(path.clone());
        let engine = GameEngine::new(HostCatalog::default(), HostStorage::from_dir(None).unwrap());
        let results = run_simulations(&engine, &[Strategy::Idle], &[1], 1).unwrap();
        write_reports(&args, &results, Instant::now()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("| idle | 1 |"));
        let _ = std::fs::remove_file(path);
    }
}
