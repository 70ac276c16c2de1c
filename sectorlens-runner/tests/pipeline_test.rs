//! End-to-end pipeline tests over synthetic and CSV-backed data.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::NaiveDate;

use sectorlens_runner::synthetic::write_synthetic_csvs;
use sectorlens_runner::{
    fetch_all, run_analysis, CachedProvider, CsvProvider, FetchError, FetchJob, FetchRequest,
    Member, PipelineError, PriceProvider, RunSettings, SyntheticProvider, Universe, UniverseKind,
};
use sectorlens_core::domain::{HistoryPeriod, Interval, PriceSeries};

fn end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 28).unwrap()
}

fn settings() -> RunSettings {
    RunSettings {
        end_date: Some(end()),
        ..RunSettings::default()
    }
}

fn custom(members: &[(&str, &str)]) -> RunSettings {
    RunSettings {
        universe: UniverseKind::Custom,
        custom_universe: Some(Universe::new(
            Member::new("Index", "IDX"),
            members.iter().map(|(n, s)| Member::new(n, s)).collect(),
        )),
        ..settings()
    }
}

#[test]
fn synthetic_sector_run_ranks_every_member() {
    let run = run_analysis(&settings(), Arc::new(SyntheticProvider::new())).unwrap();

    assert_eq!(run.table.len(), Universe::nse_sectors().members.len());
    assert!(run.table.failures().is_empty());
    assert_eq!(run.table.benchmark().entity_id, "Nifty 50");
    assert_eq!(run.table.market_date(), "2024-06-28");
    assert!(run.table.entries().iter().all(|e| e.momentum_score.is_some()));
    assert!(run.series_for("IT").is_some());
}

#[test]
fn csv_run_records_missing_members() {
    let dir = tempfile::tempdir().unwrap();
    let request = FetchRequest::new(Interval::Daily, HistoryPeriod::OneYear, end());
    write_synthetic_csvs(dir.path(), &["IDX", "AAA", "BBB"], request.start(), end()).unwrap();

    let mut settings = custom(&[("Alpha", "AAA"), ("Beta", "BBB"), ("Gamma", "CCC")]);
    settings.data_dir = dir.path().to_path_buf();

    let provider = CsvProvider::new(&settings.data_dir);
    let run = run_analysis(&settings, Arc::new(provider)).unwrap();

    assert_eq!(run.table.len(), 2);
    let failures = run.table.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].entity_id, "Gamma");
    assert!(failures[0].reason.contains("CCC"));
    assert_eq!(run.table.summary().failed, 1);
}

#[test]
fn missing_benchmark_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let request = FetchRequest::new(Interval::Daily, HistoryPeriod::OneYear, end());
    write_synthetic_csvs(dir.path(), &["AAA"], request.start(), end()).unwrap();

    let err = run_analysis(&custom(&[("Alpha", "AAA")]), Arc::new(CsvProvider::new(dir.path())))
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Benchmark(FetchError::SymbolNotFound { .. })
    ));
}

#[test]
fn no_members_fetched_is_empty_batch() {
    let dir = tempfile::tempdir().unwrap();
    let request = FetchRequest::new(Interval::Daily, HistoryPeriod::OneYear, end());
    write_synthetic_csvs(dir.path(), &["IDX"], request.start(), end()).unwrap();

    let err = run_analysis(&custom(&[("Alpha", "AAA")]), Arc::new(CsvProvider::new(dir.path())))
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Batch(sectorlens_core::BatchError::EmptyBatch { failed: 1 })
    ));
}

#[test]
fn weekly_run_uses_weekly_calendar() {
    let settings = RunSettings {
        interval: Interval::Weekly,
        period: HistoryPeriod::TwoYears,
        ..settings()
    };
    let run = run_analysis(&settings, Arc::new(SyntheticProvider::new())).unwrap();
    assert_eq!(run.config.interval, Interval::Weekly);
    assert_eq!(run.table.market_date(), "Week of 2024-06-24");
}

/// Sleeps on symbols starting with "SLOW".
struct SlowProvider;

impl PriceProvider for SlowProvider {
    fn name(&self) -> &str {
        "slow"
    }

    fn fetch(&self, symbol: &str, request: &FetchRequest) -> Result<PriceSeries, FetchError> {
        if symbol.starts_with("SLOW") {
            thread::sleep(Duration::from_millis(1500));
        }
        SyntheticProvider::new().fetch(symbol, request)
    }
}

#[test]
fn stragglers_time_out_without_blocking() {
    let jobs = vec![
        FetchJob::new("Fast", "FAST"),
        FetchJob::new("Slow", "SLOW"),
        FetchJob::new("Fast 2", "FAST2"),
    ];
    let request = FetchRequest::new(Interval::Daily, HistoryPeriod::OneYear, end());

    let started = Instant::now();
    let outcomes = fetch_all(
        Arc::new(SlowProvider),
        &jobs,
        &request,
        3,
        Duration::from_millis(300),
    )
    .unwrap();

    assert!(started.elapsed() < Duration::from_millis(1400));
    assert!(outcomes[0].is_ok());
    assert!(outcomes[2].is_ok());
    assert!(matches!(
        outcomes[1].result,
        Err(FetchError::TimedOut { ref symbol, .. }) if symbol == "SLOW"
    ));
}

struct Counting {
    calls: AtomicUsize,
}

impl PriceProvider for Counting {
    fn name(&self) -> &str {
        "counting"
    }

    fn fetch(&self, symbol: &str, request: &FetchRequest) -> Result<PriceSeries, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        SyntheticProvider::new().fetch(symbol, request)
    }
}

#[test]
fn cache_serves_repeat_runs() {
    let provider = Arc::new(CachedProvider::new(
        Counting {
            calls: AtomicUsize::new(0),
        },
        Duration::from_secs(300),
    ));
    let settings = custom(&[("Alpha", "AAA"), ("Beta", "BBB")]);

    let first = run_analysis(&settings, provider.clone()).unwrap();
    let second = run_analysis(&settings, provider.clone()).unwrap();

    assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 3);
    assert_eq!(first.table, second.table);

    provider.cache().clear();
    run_analysis(&settings, provider.clone()).unwrap();
    assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 6);
}
