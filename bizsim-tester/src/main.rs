mod logic;
mod play;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use bizsim_game::{
    CatalogLoader, CatalogSource, DecisionSession, EngineConfig, FileCatalogLoader, GameEngine,
    JsonCatalogLoader,
};
use logic::{
    GameplayStrategy, ScenarioResult, StrategyRunner, parse_seeds, parse_strategies, split_csv,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    /// Play the catalog interactively in the terminal
    Play,
    /// Run automated strategies and check run invariants
    Simulate,
}

#[derive(Debug, Parser)]
#[command(name = "bizsim-tester", version = "0.1.0")]
#[command(about = "Terminal front end and strategy sweeps for the bizsim decision engine")]
struct Args {
    /// Run mode: interactive play or automated simulation
    #[arg(long, value_enum, default_value_t = RunMode::Simulate)]
    mode: RunMode,

    /// Strategies to run (comma-separated, or `all`)
    #[arg(long, default_value = "all")]
    strategies: String,

    /// List all available strategies and exit
    #[arg(long)]
    list_strategies: bool,

    /// Seeds to run (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of runs per strategy and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output (also raises the default log level to debug)
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Phase catalog JSON file; the bundled catalog is used when omitted
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Engine configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if maybe_list_strategies(&args)? {
        return Ok(());
    }

    announce_banner();

    let config = load_config(args.config.as_deref())?;
    let mut session = match &args.catalog {
        Some(path) => open_session(GameEngine::with_config(FileCatalogLoader::new(path), config)?),
        None => open_session(GameEngine::with_config(JsonCatalogLoader::bundled(), config)?),
    };

    match args.mode {
        RunMode::Play => {
            let stdin = std::io::stdin();
            let mut out = stdout();
            play::run_interactive(&mut session, stdin.lock(), &mut out)
        }
        RunMode::Simulate => run_simulation(&args, session),
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn maybe_list_strategies(args: &Args) -> Result<bool> {
    if !args.list_strategies {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available strategies:")?;
    for strategy in GameplayStrategy::ALL {
        let key = strategy
            .to_possible_value()
            .map(|value| value.get_name().to_string())
            .unwrap_or_default();
        writeln!(
            output_target.writer(),
            "  {key:15} - {}",
            strategy.description()
        )?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "📈 bizsim Strategy Tester".bright_cyan().bold());
    println!("{}", "=========================".cyan());
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    EngineConfig::from_json(&json)
        .with_context(|| format!("invalid engine configuration in {}", path.display()))
}

fn open_session<L: CatalogLoader>(engine: GameEngine<L>) -> DecisionSession {
    let loaded = engine.loaded();
    if let CatalogSource::Fallback { reason } = &loaded.source {
        eprintln!(
            "{} {}",
            "⚠️  Using the built-in fallback catalog:".yellow(),
            reason
        );
    }
    for record in &loaded.skipped {
        let location = match record.option_index {
            Some(option) => format!("phase #{} option #{}", record.phase_index, option),
            None => format!("phase #{}", record.phase_index),
        };
        eprintln!("{} {location}: {}", "⚠️  Skipped".yellow(), record.reason);
    }
    engine.new_session()
}

fn run_simulation(args: &Args, session: DecisionSession) -> Result<()> {
    let start_time = Instant::now();
    let strategies = parse_strategies(&split_csv(&args.strategies))?;
    let seeds = parse_seeds(&split_csv(&args.seeds))?;

    println!("{}", "🧠 Running Strategy Sweeps".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let runner = StrategyRunner::new(session, args.verbose);
    let results: Vec<ScenarioResult> = strategies
        .iter()
        .flat_map(|&strategy| runner.run_strategy(strategy, &seeds, args.iterations))
        .collect();

    write_reports(args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }
    Ok(())
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(&mut output_target, results)?,
        "markdown" => logic::reports::generate_markdown_report(&mut output_target, results)?,
        _ => {
            if results.is_empty() {
                writeln!(&mut output_target, "No strategies executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    results,
                    start_time.elapsed(),
                )?;
            }
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

    fn temp_file(label: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "bizsim-main-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        std::fs::write(&path, contents).expect("write temp file");
        path
    }

    #[test]
    fn args_default_to_simulation() {
        let args = Args::parse_from(["bizsim-tester"]);
        assert_eq!(args.mode, RunMode::Simulate);
        assert_eq!(args.report, "console");
        assert_eq!(args.iterations, 10);
        assert!(args.catalog.is_none());
    }

    #[test]
    fn args_reject_unknown_report() {
        assert!(Args::try_parse_from(["bizsim-tester", "--report", "csv"]).is_err());
    }

    #[test]
    fn load_config_reads_and_validates() {
        assert_eq!(load_config(None).unwrap(), EngineConfig::default());

        let good = temp_file("good", r#"{ "initial_value": 60 }"#);
        assert_eq!(load_config(Some(good.as_path())).unwrap().initial_value, 60);

        let bad = temp_file("bad", r#"{ "initial_value": 160 }"#);
        let err = load_config(Some(bad.as_path())).unwrap_err();
        assert!(format!("{err:#}").contains("invalid engine configuration"));

        let missing = std::env::temp_dir().join("bizsim-main-missing-config.json");
        assert!(load_config(Some(missing.as_path())).is_err());
    }

    #[test]
    fn open_session_survives_broken_catalog() {
        let engine = GameEngine::new(JsonCatalogLoader::new("{ \"phases\": 3 }"));
        let session = open_session(engine);
        assert_eq!(session.progress().total_phases, 1);
    }

    #[test]
    fn write_reports_to_file() {
        let path = temp_file("report", "");
        let mut args = Args::parse_from(["bizsim-tester", "--report", "json"]);
        args.output = Some(path.clone());
        write_reports(&args, &[], Instant::now()).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(content.trim(), "[]");
    }
}
