use clap::Parser;
use log::{LevelFilter, Log, Metadata, Record};
use rocket_ascent::config::GameConfig;
use rocket_ascent::constants::{TICK_MS, TICK_RATE};
use rocket_ascent::game::GameContext;
use rocket_ascent::session_record::SessionRecord;
use rocket_ascent::types::{GameEvent, ItemCategory, Placement, RunEnd, UpgradeKind};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    runs: Option<u32>,
    #[arg(long)]
    minutes: Option<i32>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
    #[arg(long)]
    log_level: Option<String>,
    /// Comma-separated upgrade kinds bought in priority order between runs.
    #[arg(long)]
    upgrades: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
struct RunResultLine {
    run: u32,
    seed: u32,
    reason: RunEnd,
    #[serde(rename = "timeCapped")]
    time_capped: bool,
    #[serde(rename = "heightReached")]
    height_reached: f32,
    #[serde(rename = "durationMs")]
    duration_ms: u64,
    collected: BTreeMap<String, u32>,
    #[serde(rename = "itemsSpawned")]
    items_spawned: u32,
    #[serde(rename = "fuelLowWarnings")]
    fuel_low_warnings: u32,
    #[serde(rename = "newBest")]
    new_best: bool,
    purchases: Vec<String>,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug)]
struct FlightRunResult {
    result: RunResultLine,
    anomaly_records: Vec<AnomalyRecord>,
    finished_tick: u64,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "generatedAtIso")]
    generated_at_iso: String,
    #[serde(rename = "runCount")]
    run_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageHeight")]
    average_height: f32,
    record: SessionRecord,
    runs: Vec<RunResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    run: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

/// Routes `log` records from the library through the structured line format.
struct StructuredLogger {
    match_id: String,
    level: LevelFilter,
}

impl Log for StructuredLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        emit_log(
            &record.level().as_str().to_ascii_lowercase(),
            "library_log",
            &self.match_id,
            None,
            None,
            json!({
                "target": record.target(),
                "message": record.args().to_string(),
            }),
        );
    }

    fn flush(&self) {}
}

fn main() {
    let cli = Cli::parse();
    let run_started_at_ms = now_ms();
    let seed = normalize_seed(cli.seed.unwrap_or_else(|| rand::random::<u32>() as u64));
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(seed, run_started_at_ms));
    install_logger(&match_id, parse_level(cli.log_level.as_deref()));

    let config_path = resolve_config_path(&cli);
    let config = match GameConfig::load_or_default(config_path.as_deref()) {
        Ok(config) => config,
        Err(error) => {
            emit_log(
                "error",
                "config_load_failed",
                &match_id,
                None,
                None,
                json!({ "error": error.to_string() }),
            );
            std::process::exit(2);
        }
    };
    let mut context = match GameContext::new(config, SessionRecord::default(), seed) {
        Ok(context) => context,
        Err(error) => {
            emit_log(
                "error",
                "config_invalid",
                &match_id,
                None,
                None,
                json!({ "error": error.to_string() }),
            );
            std::process::exit(2);
        }
    };

    let (upgrade_priority, unknown_upgrades) = parse_upgrade_priority(cli.upgrades.as_deref());
    if !unknown_upgrades.is_empty() {
        emit_log(
            "warn",
            "unknown_upgrades_ignored",
            &match_id,
            None,
            None,
            json!({ "names": unknown_upgrades }),
        );
    }

    let runs = cli.runs.unwrap_or(3).clamp(1, 100);
    let minutes = cli.minutes.unwrap_or(2).clamp(1, 10);
    let mut has_anomaly = false;
    let mut run_results = Vec::new();
    let mut total_anomalies = 0usize;

    for run in 0..runs {
        let purchases = if run == 0 {
            Vec::new()
        } else {
            let bought = buy_upgrades(&mut context, &upgrade_priority);
            context.restart();
            bought
        };
        emit_log(
            "info",
            "run_started",
            &match_id,
            Some(run),
            None,
            json!({
                "minutes": minutes,
                "purchases": purchases,
                "liveItems": context.spawner().live_count(),
            }),
        );

        let mut flight_run = run_flight(&mut context, run, seed, minutes);
        flight_run.result.purchases = purchases;

        for anomaly in &flight_run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &match_id,
                Some(run),
                Some(anomaly.tick),
                json!({ "message": anomaly.message }),
            );
        }
        if !flight_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += flight_run.anomaly_records.len();

        emit_log(
            "info",
            "run_finished",
            &match_id,
            Some(run),
            Some(flight_run.finished_tick),
            json!({
                "reason": flight_run.result.reason,
                "heightReached": flight_run.result.height_reached,
                "newBest": flight_run.result.new_best,
                "anomalyCount": flight_run.anomaly_records.len(),
            }),
        );

        match serde_json::to_string(&flight_run.result) {
            Ok(line) => println!("{line}"),
            Err(error) => emit_log(
                "error",
                "result_serialize_failed",
                &match_id,
                Some(run),
                None,
                json!({ "error": error.to_string() }),
            ),
        }
        run_results.push(flight_run.result);
    }

    let summary = build_run_summary(
        match_id.clone(),
        run_started_at_ms,
        now_ms(),
        run_results,
        total_anomalies,
        context.record().clone(),
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &match_id,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "simulation_finished",
        &match_id,
        None,
        None,
        json!({
            "runCount": summary.run_count,
            "anomalyCount": summary.anomaly_count,
            "averageHeight": summary.average_height,
            "bestHeight": summary.record.best_height,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_flight(context: &mut GameContext, run: u32, seed: u32, minutes: i32) -> FlightRunResult {
    let tick_limit = minutes as u64 * 60 * TICK_RATE as u64;
    let best_before = context.record().best_height;
    let mut collected: BTreeMap<String, u32> = ItemCategory::ALL
        .iter()
        .map(|category| (category.key().to_string(), 0))
        .collect();
    let mut items_spawned = 0;
    let mut fuel_low_warnings = 0;
    let mut time_capped = false;
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut last_tick = 0u64;

    while !context.is_run_over() {
        if let Some(target) = pick_target(context) {
            context.steer_towards(target.position.x, TICK_MS);
        }
        context.step(TICK_MS, true);
        context.collect_in_reach();
        for message in collect_context_anomalies(context) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                context.tick(),
                message,
            );
        }

        let snapshot = context.snapshot(true);
        last_tick = snapshot.tick;
        for event in &snapshot.events {
            match event {
                GameEvent::ItemCollected { category, .. } => {
                    *collected.entry(category.key().to_string()).or_insert(0) += 1;
                }
                GameEvent::ItemSpawned { .. } => items_spawned += 1,
                GameEvent::FuelLow { .. } => fuel_low_warnings += 1,
                _ => {}
            }
        }

        if !context.is_run_over() && snapshot.tick >= tick_limit {
            time_capped = true;
            context.crash();
            context.snapshot(true);
        }
    }

    let flight = context.flight();
    FlightRunResult {
        result: RunResultLine {
            run,
            seed,
            reason: flight.end().unwrap_or(RunEnd::Crashed),
            time_capped,
            height_reached: (flight.height() * 10.0).round() / 10.0,
            duration_ms: flight.elapsed_ms(),
            collected,
            items_spawned,
            fuel_low_warnings,
            new_best: context.record().best_height > best_before,
            purchases: Vec::new(),
            anomalies,
        },
        anomaly_records,
        finished_tick: last_tick,
    }
}

/// Nearest live item at or above the rocket.
fn pick_target(context: &GameContext) -> Option<Placement> {
    let flight = context.flight();
    let (x, height) = (flight.x(), flight.height());
    context
        .spawner()
        .placements()
        .filter(|placement| placement.position.y >= height)
        .min_by(|a, b| {
            let da = (a.position.x - x).powi(2) + (a.position.y - height).powi(2);
            let db = (b.position.x - x).powi(2) + (b.position.y - height).powi(2);
            da.total_cmp(&db)
        })
        .cloned()
}

/// Buys each listed kind until it stops succeeding; with no list, buys the
/// cheapest affordable upgrade until none is left.
fn buy_upgrades(context: &mut GameContext, priority: &[UpgradeKind]) -> Vec<String> {
    let mut bought = Vec::new();
    if !priority.is_empty() {
        for kind in priority {
            while let Ok(level) = context.purchase(*kind) {
                bought.push(format!("{kind:?}:{level}"));
            }
        }
        return bought;
    }
    while let Some((kind, _)) = context
        .upgrades()
        .cheapest_affordable(context.wallet(), &context.config().shop)
    {
        match context.purchase(kind) {
            Ok(level) => bought.push(format!("{kind:?}:{level}")),
            Err(_) => break,
        }
    }
    bought
}

fn collect_context_anomalies(context: &GameContext) -> Vec<String> {
    let mut anomalies = Vec::new();
    let spawner = context.spawner();
    let cells: HashSet<_> = spawner.placements().map(|placement| placement.cell).collect();
    if cells.len() != spawner.live_count() {
        anomalies.push(format!(
            "shared cells: {} live items on {} cells",
            spawner.live_count(),
            cells.len()
        ));
    }
    if spawner.occupied_count() != spawner.live_count() {
        anomalies.push(format!(
            "occupancy drift: {} occupied vs {} live",
            spawner.occupied_count(),
            spawner.live_count()
        ));
    }
    for placement in spawner.placements() {
        if !spawner.grid().contains(placement.cell) || !spawner.is_occupied(placement.cell) {
            anomalies.push(format!(
                "item {} on untracked cell ({}, {})",
                placement.id, placement.cell.col, placement.cell.row
            ));
        }
    }
    let cap = spawner.config().max_items.max(spawner.config().initial_count);
    if spawner.live_count() > cap {
        anomalies.push(format!("live items over cap: {} > {cap}", spawner.live_count()));
    }

    let flight = context.flight();
    if !flight.fuel().is_finite()
        || flight.fuel() < 0.0
        || flight.fuel() > flight.stats().fuel_capacity
    {
        anomalies.push(format!("fuel out of range: {}", flight.fuel()));
    }
    if !flight.height().is_finite() || flight.height() < 0.0 {
        anomalies.push(format!("invalid height: {}", flight.height()));
    }
    anomalies
}

fn parse_upgrade_priority(raw: Option<&str>) -> (Vec<UpgradeKind>, Vec<String>) {
    let mut kinds = Vec::new();
    let mut unknown = Vec::new();
    for name in raw.unwrap_or_default().split(',') {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        match UpgradeKind::parse(name) {
            Some(kind) if !kinds.contains(&kind) => kinds.push(kind),
            Some(_) => {}
            None => unknown.push(name.to_string()),
        }
    }
    (kinds, unknown)
}

fn resolve_config_path(cli: &Cli) -> Option<PathBuf> {
    cli.config.clone().or_else(|| {
        std::env::var("ROCKET_CONFIG")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
    })
}

fn parse_level(raw: Option<&str>) -> LevelFilter {
    raw.and_then(|value| value.trim().parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Warn)
}

fn install_logger(match_id: &str, level: LevelFilter) {
    let logger = StructuredLogger {
        match_id: match_id.to_string(),
        level,
    };
    if log::set_boxed_logger(Box::new(logger)).is_ok() {
        log::set_max_level(level);
    }
}

fn normalize_seed(seed: u64) -> u32 {
    seed as u32
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_match_id(seed: u32, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    match_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    runs: Vec<RunResultLine>,
    anomaly_count: usize,
    record: SessionRecord,
) -> RunSummary {
    let run_count = runs.len();
    let average_height = if run_count == 0 {
        0.0
    } else {
        runs.iter().map(|run| run.height_reached).sum::<f32>() / run_count as f32
    };
    RunSummary {
        match_id,
        started_at_ms,
        finished_at_ms,
        generated_at_iso: chrono::Utc::now()
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        run_count,
        anomaly_count,
        average_height,
        record,
        runs,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    match_id: &str,
    run: Option<u32>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        match_id: match_id.to_string(),
        run,
        tick,
        details,
    };
    match serde_json::to_string(&log_line) {
        Ok(text) => eprintln!("{text}"),
        Err(error) => eprintln!("[simulate] failed to serialize log line: {error}"),
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary)
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))?;
    std::fs::write(path, summary_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_run_result(height_reached: f32) -> RunResultLine {
        RunResultLine {
            run: 0,
            seed: 42,
            reason: RunEnd::OutOfFuel,
            time_capped: false,
            height_reached,
            duration_ms: 10_000,
            collected: BTreeMap::new(),
            items_spawned: 0,
            fuel_low_warnings: 0,
            new_best: false,
            purchases: Vec::new(),
            anomalies: Vec::new(),
        }
    }

    fn make_context(seed: u32) -> GameContext {
        GameContext::new(GameConfig::default(), SessionRecord::default(), seed)
            .expect("default config is valid")
    }

    #[test]
    fn default_match_id_contains_seed_and_timestamp() {
        assert_eq!(default_match_id(42, 123456789), "sim-42-123456789");
    }

    #[test]
    fn build_run_summary_calculates_average_height() {
        let summary = build_run_summary(
            "sim-42-1".to_string(),
            1,
            2,
            vec![make_run_result(100.0), make_run_result(300.0)],
            1,
            SessionRecord::default(),
        );
        assert_eq!(summary.average_height, 200.0);
        assert_eq!(summary.run_count, 2);
    }

    #[test]
    fn write_summary_returns_error_when_parent_does_not_exist() {
        let target = std::env::temp_dir()
            .join(format!("rocket-ascent-missing-{}", now_ms()))
            .join("summary.json");
        let summary = build_run_summary(
            "sim-1-1".to_string(),
            1,
            2,
            vec![make_run_result(10.0)],
            0,
            SessionRecord::default(),
        );
        assert!(write_summary(&target, &summary).is_err());
    }

    #[test]
    fn push_anomaly_keeps_records_and_deduplicates_summary_messages() {
        let mut anomalies = Vec::new();
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        push_anomaly(&mut anomalies, &mut records, &mut seen, 10, "same".to_string());
        push_anomaly(&mut anomalies, &mut records, &mut seen, 11, "same".to_string());
        assert_eq!(anomalies.len(), 1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].tick, 11);
    }

    #[test]
    fn fresh_context_has_no_anomalies() {
        let context = make_context(5);
        assert!(collect_context_anomalies(&context).is_empty());
    }

    #[test]
    fn pick_target_returns_closest_item_above_rocket() {
        let context = make_context(8);
        let target = pick_target(&context).expect("items exist");
        let best = context
            .spawner()
            .placements()
            .map(|p| p.position.x.powi(2) + p.position.y.powi(2))
            .fold(f32::INFINITY, f32::min);
        assert_eq!(
            target.position.x.powi(2) + target.position.y.powi(2),
            best
        );
    }

    #[test]
    fn scripted_run_ends_without_anomalies() {
        let mut context = make_context(21);
        let flight_run = run_flight(&mut context, 0, 21, 1);
        assert!(flight_run.result.anomalies.is_empty());
        assert!(context.is_run_over());
        assert!(flight_run.result.height_reached > 0.0);
        assert_eq!(context.record().runs, 1);
    }

    #[test]
    fn buy_upgrades_with_empty_wallet_buys_nothing() {
        let mut context = make_context(4);
        assert!(buy_upgrades(&mut context, &[]).is_empty());
        assert!(buy_upgrades(&mut context, &[UpgradeKind::Engine]).is_empty());
    }

    #[test]
    fn buy_upgrades_follows_priority_until_max_level() {
        let mut config = GameConfig::default();
        config.shop.engine = Default::default();
        config.shop.fuel_tank = Default::default();
        let mut context =
            GameContext::new(config, SessionRecord::default(), 4).expect("config is valid");
        let bought = buy_upgrades(&mut context, &[UpgradeKind::Engine, UpgradeKind::FuelTank]);
        let max_level = context.config().shop.max_level as usize;
        assert_eq!(bought.len(), max_level * 2);
        assert_eq!(bought[0], "Engine:1");
        assert_eq!(bought[max_level], "FuelTank:1");
        assert_eq!(context.upgrades().level(UpgradeKind::GoldMagnet), 0);
    }

    #[test]
    fn parse_upgrade_priority_keeps_order_and_reports_unknown() {
        let (kinds, unknown) =
            parse_upgrade_priority(Some("engine, gold_magnet,warp_drive,engine,"));
        assert_eq!(kinds, vec![UpgradeKind::Engine, UpgradeKind::GoldMagnet]);
        assert_eq!(unknown, vec!["warp_drive".to_string()]);
        assert_eq!(parse_upgrade_priority(None), (Vec::new(), Vec::new()));
    }

    #[test]
    fn parse_level_defaults_to_warn() {
        assert_eq!(parse_level(None), LevelFilter::Warn);
        assert_eq!(parse_level(Some("debug")), LevelFilter::Debug);
        assert_eq!(parse_level(Some("nonsense")), LevelFilter::Warn);
    }
}
