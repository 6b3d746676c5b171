//! MoodShift CLI: evaluate the allocation signal and manage its state.
//!
//! Commands:
//! - `evaluate`: fetch indicators, apply the monthly shift rule, persist state
//! - `interpret`: label hand-supplied sentiment readings, offline
//! - `state show`: print the persisted allocation
//! - `state reset`: return to fully defensive
//! - `history`: list recent evaluations from the journal

mod logging;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use logging::LogFormat;
use moodshift_core::config::AllocationConfig;
use moodshift_core::{
    evaluate_with, AllocationState, Evaluation, EvaluationJournal, IndicatorAggregator,
    IndicatorSnapshot, MoodShiftConfig, SentimentLabel, SentimentReadout, StateStore,
};

#[derive(Parser)]
#[command(
    name = "moodshift",
    about = "MoodShift — sentiment readout and monthly two-bucket allocation signal"
)]
struct Cli {
    /// Base log level (trace, debug, info, warn, error). RUST_LOG overrides.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log output format, written to stderr.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch indicators, apply the shift rule and persist the new state.
    Evaluate {
        /// Path to a TOML config file. Defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Allocation state file.
        #[arg(long, default_value = "moodshift-state.json")]
        state: PathBuf,

        /// Evaluation journal (JSONL).
        #[arg(long, default_value = "moodshift-journal.jsonl")]
        journal: PathBuf,

        /// Evaluate as if in this calendar month (1-12).
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,

        /// Compute and print, but write neither state nor journal.
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Print the evaluation as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Label sentiment readings without touching the network.
    Interpret {
        #[arg(long)]
        vix: Option<f64>,

        /// Fear & Greed Index, 0-100.
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        fear_greed: Option<u8>,

        #[arg(long)]
        put_call: Option<f64>,

        #[arg(long)]
        rsi: Option<f64>,
    },
    /// Inspect or reset the persisted allocation.
    State {
        #[command(subcommand)]
        action: StateAction,
    },
    /// List recent evaluations from the journal.
    History {
        #[arg(long, default_value = "moodshift-journal.jsonl")]
        journal: PathBuf,

        /// Most recent evaluations to show.
        #[arg(long, default_value_t = 12)]
        limit: usize,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum StateAction {
    /// Print the persisted allocation.
    Show {
        #[arg(long, default_value = "moodshift-state.json")]
        state: PathBuf,

        /// Path to a TOML config file (for bucket names).
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Return to fully defensive with no streak.
    Reset {
        #[arg(long, default_value = "moodshift-state.json")]
        state: PathBuf,

        /// Actually overwrite (without this flag, only previews).
        #[arg(long, default_value_t = false)]
        confirm: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level, cli.log_format);

    match cli.command {
        Commands::Evaluate {
            config,
            state,
            journal,
            month,
            dry_run,
            json,
        } => run_evaluate(config.as_deref(), &state, &journal, month, dry_run, json),
        Commands::Interpret {
            vix,
            fear_greed,
            put_call,
            rsi,
        } => {
            run_interpret(vix, fear_greed, put_call, rsi);
            Ok(())
        }
        Commands::State { action } => match action {
            StateAction::Show { state, config } => run_state_show(&state, config.as_deref()),
            StateAction::Reset { state, confirm } => run_state_reset(&state, confirm),
        },
        Commands::History {
            journal,
            limit,
            json,
        } => run_history(&journal, limit, json),
    }
}

fn load_config(path: Option<&Path>) -> Result<MoodShiftConfig> {
    match path {
        Some(path) => MoodShiftConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(MoodShiftConfig::default()),
    }
}

/// Move `now` into `month` of the same year, keeping the time of day.
fn in_month(now: NaiveDateTime, month: u32) -> Result<NaiveDateTime> {
    let date = NaiveDate::from_ymd_opt(now.year(), month, 1)
        .with_context(|| format!("invalid month {month}"))?;
    Ok(date.and_time(now.time()))
}

fn run_evaluate(
    config_path: Option<&Path>,
    state_path: &Path,
    journal_path: &Path,
    month: Option<u32>,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let store = StateStore::new(state_path);
    let journal = EvaluationJournal::new(journal_path);

    let state = store
        .load()
        .with_context(|| format!("loading state {}", state_path.display()))?;

    let prices = config
        .sources
        .chart_provider()
        .context("building chart client")?;
    let scraper = config
        .sources
        .page_scraper()
        .context("building page scraper")?;
    let snapshot = IndicatorAggregator::new(&prices, &scraper, config.aggregation()).snapshot();

    let mut now = chrono::Local::now().naive_local();
    if let Some(m) = month {
        now = in_month(now, m)?;
    }
    let evaluation = evaluate_with(&config.schedule(), &state, &snapshot, now);

    tracing::info!(
        month = %evaluation.month(),
        action = %evaluation.action,
        bucket_a_pct = evaluation.state.bucket_a_pct,
        bucket_b_pct = evaluation.state.bucket_b_pct,
        dry_run,
        "evaluation complete"
    );

    if !dry_run {
        persist(&store, &journal, &evaluation)?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&evaluation)?);
    } else {
        print_evaluation(&evaluation, &config.allocation, &config.reference.symbol);
        if dry_run {
            println!("Dry run — state and journal left untouched.");
        }
    }

    Ok(())
}

/// Record the evaluation, then commit its state. The two writes are not
/// atomic together; a failed journal append leaves the old state in place.
fn persist(
    store: &StateStore,
    journal: &EvaluationJournal,
    evaluation: &Evaluation,
) -> Result<()> {
    journal
        .append(evaluation)
        .with_context(|| format!("appending to journal {}", journal.path().display()))?;
    store
        .save(&evaluation.state)
        .with_context(|| format!("saving state {}", store.path().display()))?;
    Ok(())
}

fn run_interpret(
    vix: Option<f64>,
    fear_greed: Option<u8>,
    put_call: Option<f64>,
    rsi: Option<f64>,
) {
    let snapshot = IndicatorSnapshot {
        vix,
        fear_greed_index: fear_greed,
        put_call_ratio: put_call,
        rsi,
        ..IndicatorSnapshot::unknown()
    };
    if snapshot.is_empty() {
        println!("No readings supplied; pass --vix, --fear-greed, --put-call or --rsi.");
        return;
    }
    print_readout(&snapshot, &SentimentReadout::from_snapshot(&snapshot));
}

fn run_state_show(state_path: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let store = StateStore::new(state_path);
    if !store.exists() {
        println!("No state file at {}; showing the initial allocation.", state_path.display());
    }
    let state = store
        .load()
        .with_context(|| format!("loading state {}", state_path.display()))?;
    print_state(&state, &config.allocation);
    Ok(())
}

fn run_state_reset(state_path: &Path, confirm: bool) -> Result<()> {
    let store = StateStore::new(state_path);
    if store.exists() {
        let current = store
            .load()
            .with_context(|| format!("loading state {}", state_path.display()))?;
        println!(
            "Current: {:.2}% / {:.2}%, streak {}",
            current.bucket_a_pct, current.bucket_b_pct, current.month_counter
        );
    } else {
        println!("No state file at {}.", state_path.display());
    }

    if !confirm {
        println!("Dry run — pass --confirm to reset to 100% / 0%.");
        return Ok(());
    }

    store
        .reset()
        .with_context(|| format!("resetting state {}", state_path.display()))?;
    println!("State reset: 100.00% / 0.00%, streak 0.");
    Ok(())
}

fn run_history(journal_path: &Path, limit: usize, json: bool) -> Result<()> {
    let journal = EvaluationJournal::new(journal_path);
    let entries = journal
        .tail(limit)
        .with_context(|| format!("reading journal {}", journal_path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No evaluations recorded in {}.", journal_path.display());
        return Ok(());
    }

    println!(
        "{:<17} {:>9} {:>9} {:>7} {:>7}  {}",
        "Evaluated", "Price", "MA", "Def %", "Agg %", "Action"
    );
    println!("{}", "-".repeat(82));
    for e in &entries {
        println!(
            "{:<17} {:>9} {:>9} {:>7.2} {:>7.2}  {}",
            e.evaluated_at.format("%Y-%m-%d %H:%M"),
            format_opt(e.snapshot.price, 2),
            format_opt(e.snapshot.moving_average, 2),
            e.state.bucket_a_pct,
            e.state.bucket_b_pct,
            e.action
        );
    }
    Ok(())
}

fn format_opt(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{v:.decimals$}"),
        None => "n/a".into(),
    }
}

fn hint_text(label: &impl SentimentLabel) -> String {
    match label.hint() {
        Some(hint) => hint.to_string(),
        None => "-".into(),
    }
}

fn print_readout(snapshot: &IndicatorSnapshot, readout: &SentimentReadout) {
    println!("--- Sentiment ---");
    println!(
        "VIX:            {:<8} {:<30} {}",
        format_opt(snapshot.vix, 2),
        readout.vix,
        hint_text(&readout.vix)
    );
    println!(
        "Fear & Greed:   {:<8} {:<30} {}",
        snapshot
            .fear_greed_index
            .map_or_else(|| "n/a".to_string(), |v| v.to_string()),
        readout.fear_greed,
        hint_text(&readout.fear_greed)
    );
    println!(
        "Put/Call:       {:<8} {:<30} {}",
        format_opt(snapshot.put_call_ratio, 2),
        readout.put_call,
        hint_text(&readout.put_call)
    );
    println!(
        "RSI:            {:<8} {:<30} {}",
        format_opt(snapshot.rsi, 1),
        readout.rsi,
        hint_text(&readout.rsi)
    );
    let (buys, sells) = readout.hint_tally();
    println!("Tally:          {buys} buy / {sells} sell");
}

fn print_state(state: &AllocationState, buckets: &AllocationConfig) {
    println!("--- Allocation ---");
    println!("{:<15} {:.2}%", format!("{}:", buckets.defensive), state.bucket_a_pct);
    println!("{:<15} {:.2}%", format!("{}:", buckets.aggressive), state.bucket_b_pct);
    println!("Streak:         {} month(s)", state.month_counter);
    println!(
        "Last shift:     {}",
        state
            .last_triggered_month
            .map_or_else(|| "never".to_string(), |m| format!("month {m}"))
    );
}

fn print_evaluation(evaluation: &Evaluation, buckets: &AllocationConfig, reference: &str) {
    let snapshot = &evaluation.snapshot;
    println!();
    println!("=== MoodShift Evaluation ===");
    println!("Evaluated:      {}", evaluation.evaluated_at.format("%Y-%m-%d %H:%M"));
    println!("Month:          {}", evaluation.month());
    println!(
        "{:<15} {} vs MA {}",
        format!("{reference}:"),
        format_opt(snapshot.price, 2),
        format_opt(snapshot.moving_average, 2)
    );
    println!();
    print_readout(snapshot, &evaluation.readout);
    println!();
    print_state(&evaluation.state, buckets);
    println!();
    println!("Action:         {}", evaluation.action);
    if snapshot.is_empty() {
        println!();
        println!("WARNING: every data source was unavailable");
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn in_month_keeps_year_and_time() {
        let now = NaiveDate::from_ymd_opt(2024, 1, 31)
            .unwrap()
            .and_hms_opt(9, 15, 0)
            .unwrap();
        let moved = in_month(now, 2).unwrap();
        assert_eq!(moved.year(), 2024);
        assert_eq!(moved.month(), 2);
        assert_eq!(moved.hour(), 9);
        assert_eq!(moved.minute(), 15);
    }

    #[test]
    fn month_flag_is_range_checked() {
        assert!(Cli::try_parse_from(["moodshift", "evaluate", "--month", "13"]).is_err());
        assert!(Cli::try_parse_from(["moodshift", "evaluate", "--month", "12"]).is_ok());
    }

    #[test]
    fn interpret_accepts_partial_readings() {
        let cli = Cli::try_parse_from(["moodshift", "interpret", "--vix", "18.5"]).unwrap();
        match cli.command {
            Commands::Interpret { vix, fear_greed, .. } => {
                assert_eq!(vix, Some(18.5));
                assert_eq!(fear_greed, None);
            }
            _ => panic!("expected interpret"),
        }
    }

    fn shifted_evaluation() -> Evaluation {
        let snapshot = IndicatorSnapshot {
            price: Some(90.0),
            moving_average: Some(100.0),
            ..IndicatorSnapshot::unknown()
        };
        let now = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(16, 0, 0)
            .unwrap();
        moodshift_core::evaluate(&AllocationState::initial(), &snapshot, now)
    }

    #[test]
    fn persist_writes_journal_and_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        let journal = EvaluationJournal::new(dir.path().join("journal.jsonl"));
        let evaluation = shifted_evaluation();

        persist(&store, &journal, &evaluation).unwrap();

        assert_eq!(store.load().unwrap(), evaluation.state);
        assert_eq!(journal.read_all().unwrap(), vec![evaluation]);
    }

    #[test]
    fn failed_journal_append_leaves_state_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        // A directory cannot be opened for appending.
        let journal = EvaluationJournal::new(dir.path());

        assert!(persist(&store, &journal, &shifted_evaluation()).is_err());
        assert!(!store.exists());
        assert_eq!(store.load().unwrap(), AllocationState::initial());
    }

    #[test]
    fn format_opt_renders_missing() {
        assert_eq!(format_opt(None, 2), "n/a");
        assert_eq!(format_opt(Some(1.234), 2), "1.23");
    }
}
