//! SectorLens CLI: rank a sector universe and replay its history.
//!
//! Commands:
//! - `analyze`: momentum table, reversal candidates and batch summary
//! - `trend`: one entity's momentum or reversal trend over recent bars
//! - `history`: top momentum picks (with forward returns) or reversal picks per past date
//! - `synthesize`: write deterministic demo CSVs for every universe symbol

use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveDate};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sectorlens_core::analysis::{EntityResult, IndicatorSnapshot};
use sectorlens_core::domain::Interval;
use sectorlens_core::replay::{
    historical_performance, historical_reversals, momentum_trend, reversal_trend,
};
use sectorlens_core::RankTable;
use sectorlens_runner::synthetic::write_synthetic_csvs;
use sectorlens_runner::{
    run_analysis, AnalysisRun, CachedProvider, CsvProvider, PriceProvider, RunSettings,
    SyntheticProvider, Universe, UniverseKind,
};

#[derive(Parser)]
#[command(
    name = "sectorlens",
    about = "SectorLens CLI — sector momentum and reversal ranking"
)]
struct Cli {
    /// Log filter (e.g. info, debug, sectorlens_core=debug). Overrides RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Where the data comes from and what to rank.
#[derive(Args, Clone)]
struct SourceArgs {
    /// Path to a TOML settings file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of {symbol}.csv files. Overrides the settings file.
    #[arg(long, conflicts_with = "synthetic")]
    data_dir: Option<PathBuf>,

    /// Use deterministic synthetic data instead of CSV files.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Bar interval: hourly, daily or weekly.
    #[arg(long)]
    interval: Option<Interval>,

    /// Rank sector ETF proxies instead of the sector indices.
    #[arg(long, default_value_t = false)]
    etf: bool,

    /// Last date of data to use (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    end: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank the universe and print the momentum table and reversal candidates.
    Analyze {
        #[command(flatten)]
        source: SourceArgs,

        /// Print the full rank table as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Show how one entity's score and rank moved over recent bars.
    Trend {
        #[command(flatten)]
        source: SourceArgs,

        /// Universe member name (e.g. "IT", "PSU Bank").
        #[arg(long)]
        entity: String,

        /// Number of trend points. Defaults to the settings value (8).
        #[arg(long)]
        periods: Option<usize>,

        /// Reversal trend instead of momentum.
        #[arg(long, default_value_t = false)]
        reversal: bool,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Historical top picks at each past date.
    History {
        #[command(flatten)]
        source: SourceArgs,

        /// Report reversal candidates instead of momentum leaders.
        #[arg(long, default_value_t = false)]
        reversal: bool,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Write synthetic CSVs for every built-in universe symbol.
    Synthesize {
        /// Output directory.
        #[arg(long)]
        out: PathBuf,

        /// First date (YYYY-MM-DD). Defaults to 800 days before --end.
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<NaiveDate>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    match cli.command {
        Commands::Analyze { source, json } => run_analyze(&source, json),
        Commands::Trend {
            source,
            entity,
            periods,
            reversal,
            json,
        } => run_trend(&source, &entity, periods, reversal, json),
        Commands::History {
            source,
            reversal,
            json,
        } => run_history(&source, reversal, json),
        Commands::Synthesize { out, start, end } => run_synthesize(out, start, end),
    }
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(source: &SourceArgs) -> Result<RunSettings> {
    let mut settings = match &source.config {
        Some(path) => RunSettings::from_file(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => RunSettings::default(),
    };
    if let Some(dir) = &source.data_dir {
        settings.data_dir = dir.clone();
    }
    if let Some(interval) = source.interval {
        settings.interval = interval;
    }
    if source.etf {
        settings.universe = UniverseKind::Etfs;
    }
    if source.end.is_some() {
        settings.end_date = source.end;
    }
    Ok(settings)
}

fn provider_for(source: &SourceArgs, settings: &RunSettings) -> Result<Arc<dyn PriceProvider>> {
    if source.synthetic {
        return Ok(Arc::new(CachedProvider::new(
            SyntheticProvider::new(),
            settings.cache_ttl(),
        )));
    }
    if !settings.data_dir.is_dir() {
        bail!(
            "data directory {} does not exist (run `sectorlens synthesize --out {}` or pass --synthetic)",
            settings.data_dir.display(),
            settings.data_dir.display()
        );
    }
    Ok(Arc::new(CachedProvider::new(
        CsvProvider::new(&settings.data_dir),
        settings.cache_ttl(),
    )))
}

fn analyze(source: &SourceArgs) -> Result<AnalysisRun> {
    let settings = load_settings(source)?;
    let provider = provider_for(source, &settings)?;
    Ok(run_analysis(&settings, provider)?)
}

fn run_analyze(source: &SourceArgs, json: bool) -> Result<()> {
    let run = analyze(source)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&run.table)?);
        return Ok(());
    }
    print_momentum_table(&run.table);
    print_reversal_candidates(&run.table);
    print_summary(&run.table);
    print_failures(&run.table);
    Ok(())
}

fn run_trend(
    source: &SourceArgs,
    entity: &str,
    periods: Option<usize>,
    reversal: bool,
    json: bool,
) -> Result<()> {
    let run = analyze(source)?;
    let periods = periods.unwrap_or(run.config.replay.trend_periods);

    if reversal {
        let points = reversal_trend(entity, &run.series, &run.benchmark, &run.config, periods)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&points)?);
            return Ok(());
        }
        println!("=== Reversal trend: {entity} ===");
        println!(
            "{:<16} {:>6} {:>7} {:>7} {:>6} {:>8} {:>8} {:>10}",
            "Point", "RSI", "ADX_Z", "CMF", "RS", "Status", "Score", "Rank"
        );
        for p in &points {
            let rank = match p.reversal_rank {
                Some(r) => format!("{r}/{}", p.eligible_peers),
                None => "-".to_string(),
            };
            println!(
                "{:<16} {:>6.1} {:>7.1} {:>7.2} {:>6.1} {:>8} {:>8.1} {:>10}",
                p.label,
                p.snapshot.rsi.value,
                p.snapshot.adx_z.value,
                p.snapshot.cmf.value,
                p.snapshot.rs_rating.value,
                p.reversal_status,
                p.reversal_score.value(),
                rank
            );
        }
    } else {
        let points = momentum_trend(entity, &run.series, &run.benchmark, &run.config, periods)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&points)?);
            return Ok(());
        }
        println!("=== Momentum trend: {entity} ===");
        println!(
            "{:<16} {:>6} {:>7} {:>9} {:>6} {:>9} {:>8}",
            "Point", "RSI", "ADX_Z", "DI_Spread", "RS", "Momentum", "Rank"
        );
        for p in &points {
            println!(
                "{:<16} {:>6.1} {:>7.1} {:>9.1} {:>6.1} {:>9.1} {:>8}",
                p.label,
                p.snapshot.rsi.value,
                p.snapshot.adx_z.value,
                p.snapshot.di_spread.value,
                p.snapshot.rs_rating.value,
                p.momentum_score,
                format!("{}/{}", p.momentum_rank, p.peers)
            );
        }
    }
    Ok(())
}

fn run_history(source: &SourceArgs, reversal: bool, json: bool) -> Result<()> {
    let run = analyze(source)?;

    if reversal {
        let rows = historical_reversals(&run.series, &run.benchmark, &run.config);
        if json {
            println!("{}", serde_json::to_string_pretty(&rows)?);
            return Ok(());
        }
        if rows.is_empty() {
            println!("Not enough history for a reversal report.");
            return Ok(());
        }
        println!("=== Historical reversal candidates ===");
        for row in &rows {
            let picks: Vec<String> = row
                .picks
                .iter()
                .map(|p| format!("{}. {} ({:.1}, {})", p.rank, p.entity_id, p.reversal_score, p.status))
                .collect();
            println!("{}  {}", run.config.interval.market_date_label(row.date), picks.join("  "));
        }
    } else {
        let rows = historical_performance(&run.series, &run.benchmark, &run.config);
        if json {
            println!("{}", serde_json::to_string_pretty(&rows)?);
            return Ok(());
        }
        if rows.is_empty() {
            println!("Not enough history for a performance report.");
            return Ok(());
        }
        println!("=== Historical momentum leaders ===");
        for row in &rows {
            let picks: Vec<String> = row
                .picks
                .iter()
                .map(|p| {
                    let returns: Vec<String> = p
                        .forward_returns
                        .iter()
                        .map(|r| match r.pct {
                            Some(pct) => format!("{}b {:+.1}%", r.horizon, pct),
                            None => format!("{}b n/a", r.horizon),
                        })
                        .collect();
                    format!(
                        "{}. {} ({:.1}) {}",
                        p.rank,
                        p.entity_id,
                        p.momentum_score,
                        returns.join(" ")
                    )
                })
                .collect();
            println!("{}  {}", run.config.interval.market_date_label(row.date), picks.join("  |  "));
        }
    }
    Ok(())
}

fn run_synthesize(out: PathBuf, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<()> {
    let end = end.unwrap_or_else(|| chrono::Local::now().date_naive());
    let start = start.unwrap_or(end - Duration::days(800));
    if start > end {
        bail!("--start {start} is after --end {end}");
    }

    let sectors = Universe::nse_sectors();
    let etfs = Universe::sector_etfs();
    let mut symbols = sectors.symbols();
    for symbol in etfs.symbols() {
        if !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }

    info!(dir = %out.display(), symbols = symbols.len(), "writing synthetic data");
    let written = write_synthetic_csvs(&out, &symbols, start, end)?;
    println!("Wrote {written} synthetic CSVs ({start} to {end}) to {}", out.display());
    Ok(())
}

fn flag(snapshot: &IndicatorSnapshot) -> &'static str {
    if snapshot.defaulted().is_empty() {
        ""
    } else {
        "*"
    }
}

fn print_momentum_table(table: &RankTable) {
    println!();
    println!("=== Momentum ranking — {} ===", table.market_date());
    println!(
        "{:>4} {:<28} {:>10} {:>7} {:>9} {:>6} {:>7} {:>9} {:>6} {:>6} {:>6}",
        "#", "Entity", "Price", "Chg%", "Momentum", "RSI", "ADX_Z", "DI_Spread", "CMF", "RS", "MRS"
    );
    let mut any_defaulted = false;
    for (i, e) in table.sorted_by_momentum().into_iter().enumerate() {
        let mark = flag(&e.snapshot);
        any_defaulted |= !mark.is_empty();
        print_momentum_row(i + 1, e, mark);
    }
    if any_defaulted {
        println!("* some indicators lacked history and report neutral defaults");
    }
}

fn print_momentum_row(rank: usize, e: &EntityResult, mark: &str) {
    let s = &e.snapshot;
    println!(
        "{:>4} {:<28} {:>10.1} {:>7.1} {:>9.1} {:>6.1} {:>7.1} {:>9.1} {:>6.2} {:>6.1} {:>6.1}",
        rank,
        format!("{}{mark}", e.entity_id),
        e.latest_price,
        e.pct_change,
        e.momentum_score.unwrap_or(0.0),
        s.rsi.value,
        s.adx_z.value,
        s.di_spread.value,
        s.cmf.value,
        s.rs_rating.value,
        s.mansfield_rs.value
    );
}

fn print_reversal_candidates(table: &RankTable) {
    let candidates = table.reversal_candidates();
    println!();
    println!("=== Reversal candidates ===");
    if candidates.is_empty() {
        println!("(none)");
        return;
    }
    println!(
        "{:<28} {:>8} {:>7} {:>6} {:>7} {:>6} {:>6}",
        "Entity", "Status", "Score", "RSI", "ADX_Z", "CMF", "RS"
    );
    for e in candidates {
        let s = &e.snapshot;
        println!(
            "{:<28} {:>8} {:>7.1} {:>6.1} {:>7.1} {:>6.2} {:>6.1}",
            e.entity_id,
            e.reversal_status,
            e.reversal_score.value(),
            s.rsi.value,
            s.adx_z.value,
            s.cmf.value,
            s.rs_rating.value
        );
    }
}

fn print_summary(table: &RankTable) {
    let summary = table.summary();
    let leaders: Vec<&str> = table
        .momentum_leaders()
        .into_iter()
        .map(|e| e.entity_id.as_str())
        .collect();
    println!();
    println!("--- Summary ---");
    println!("Entities:       {}", summary.entities);
    println!("Failed:         {}", summary.failed);
    println!("Mean Momentum:  {:.1}", summary.mean_momentum);
    println!("Max Momentum:   {:.1}", summary.max_momentum);
    println!("Net Money Flow: {:.2}", summary.net_money_flow);
    println!("BUY_DIV:        {}", summary.buy_div);
    println!("Watch:          {}", summary.watch);
    println!("Leaders:        {}", leaders.join(", "));
}

fn print_failures(table: &RankTable) {
    if table.failures().is_empty() {
        return;
    }
    println!();
    for failure in table.failures() {
        println!("WARNING: {} excluded: {}", failure.entity_id, failure.reason);
    }
}
