//! End-to-end tests over the public API.
//!
//! Component tests build their own `Logger` instances against temporary
//! directories; exactly one test exercises the process-global facade.

use logroute::core::{LogConfig, LogFormat, LogLevel, Logger};
use logroute::{attrs, FieldValue};
use std::path::Path;
use tempfile::tempdir;

fn base_config(dir: &Path) -> LogConfig {
    LogConfig {
        directory: dir.display().to_string(),
        level: LogLevel::Debug,
        enable_async: false,
        show_location: false,
        console: false,
        compress: false,
        ..Default::default()
    }
}

fn read_log(dir: &Path, service: &str, stem: &str) -> String {
    std::fs::read_to_string(dir.join(service).join(format!("{}.log", stem))).unwrap()
}

#[test]
fn below_threshold_events_produce_zero_writes() {
    let dir = tempdir().unwrap();
    let mut config = base_config(dir.path());
    config.level = LogLevel::Warn;
    let logger = Logger::new("svc", "", &config).unwrap();

    logger.debug("no");
    logger.info("also no");
    logger.warn("yes");
    logger.shutdown();

    assert_eq!(
        std::fs::metadata(dir.path().join("svc").join("debug.log"))
            .unwrap()
            .len(),
        0
    );
    assert_eq!(
        std::fs::metadata(dir.path().join("svc").join("info.log"))
            .unwrap()
            .len(),
        0
    );
    assert!(read_log(dir.path(), "svc", "warn").contains("yes"));
}

#[test]
fn async_events_keep_submission_order() {
    let dir = tempdir().unwrap();
    let mut config = base_config(dir.path());
    config.enable_async = true;
    config.async_buffer_size = 64;
    let logger = Logger::new("svc", "", &config).unwrap();

    for i in 0..300 {
        logger.info(format!("seq-{:04}", i));
    }
    logger.shutdown();

    let content = read_log(dir.path(), "svc", "info");
    let positions: Vec<usize> = (0..300)
        .map(|i| content.find(&format!("seq-{:04}", i)).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn shutdown_drains_every_accepted_event() {
    let dir = tempdir().unwrap();
    let mut config = base_config(dir.path());
    config.enable_async = true;
    config.async_buffer_size = 16; // small queue forces producer blocking
    let logger = Logger::new("svc", "", &config).unwrap();

    for i in 0..1_000 {
        logger.info(format!("ev-{}", i));
    }
    logger.shutdown();

    let content = read_log(dir.path(), "svc", "info");
    assert_eq!(content.lines().count(), 1_000);
    assert_eq!(logger.metrics().processed, 1_000);
    assert_eq!(logger.metrics().dropped, 0);
}

#[test]
fn shutdown_is_idempotent() {
    let dir = tempdir().unwrap();
    let mut config = base_config(dir.path());
    config.enable_async = true;
    let logger = Logger::new("svc", "", &config).unwrap();

    logger.info("once");
    logger.shutdown();
    logger.shutdown();
    logger.shutdown();

    assert_eq!(read_log(dir.path(), "svc", "info").lines().count(), 1);
}

#[test]
fn drop_on_full_discards_and_counts() {
    let dir = tempdir().unwrap();
    let mut config = base_config(dir.path());
    config.enable_async = true;
    config.async_drop_on_full = true;
    config.async_buffer_size = 8;
    let logger = Logger::new("svc", "", &config).unwrap();

    // far more events than the queue holds; some may drop, none may block
    for i in 0..10_000 {
        logger.info(format!("burst-{}", i));
    }
    logger.shutdown();

    let metrics = logger.metrics();
    assert_eq!(metrics.submitted, 10_000);
    assert_eq!(
        metrics.processed + metrics.dropped,
        10_000,
        "every submission is either processed or counted as dropped"
    );
    let written = read_log(dir.path(), "svc", "info").lines().count() as u64;
    assert_eq!(written, metrics.processed);
}

#[test]
fn reserved_key_routes_to_subdirectory_and_is_stripped() {
    let dir = tempdir().unwrap();
    let logger = Logger::new("svc", "node-1", &base_config(dir.path())).unwrap();

    logger.info_with(
        "order placed",
        attrs! { "order_id" => 7001i64, "folder" => "orders" },
    );
    logger.shutdown();

    let routed = dir
        .path()
        .join("node-1")
        .join("svc")
        .join("orders")
        .join("info.log");
    let content = std::fs::read_to_string(&routed).unwrap();
    assert!(content.contains("order placed"));
    assert!(content.contains("order_id=7001"));
    assert!(!content.contains("folder"));

    // the standard info file saw nothing
    let standard = dir.path().join("node-1").join("svc").join("info.log");
    assert_eq!(std::fs::metadata(standard).unwrap().len(), 0);
}

#[test]
fn single_file_mode_merges_levels() {
    let dir = tempdir().unwrap();
    let mut config = base_config(dir.path());
    config.single_file = true;
    config.single_file_name = "combined.log".to_string();
    let logger = Logger::new("svc", "", &config).unwrap();

    logger.debug("d");
    logger.warn("w");
    logger.error("e");
    logger.shutdown();

    let content = read_log(dir.path(), "svc", "combined");
    assert_eq!(content.lines().count(), 3);
    assert!(content.contains("DEBUG"));
    assert!(content.contains("WARN"));
    assert!(content.contains("ERROR"));
}

#[test]
fn json_records_flatten_attributes() {
    let dir = tempdir().unwrap();
    let mut config = base_config(dir.path());
    config.format = LogFormat::Json;
    let logger = Logger::new("svc", "", &config).unwrap();

    logger.warn_with(
        "slow query",
        attrs! { "elapsed_ms" => 412i64, "table" => "accounts" },
    );
    logger.shutdown();

    let content = read_log(dir.path(), "svc", "warn");
    let value: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
    assert_eq!(value["level"], "warn");
    assert_eq!(value["message"], "slow query");
    assert_eq!(value["elapsed_ms"], 412);
    assert_eq!(value["table"], "accounts");
}

#[test]
fn formatted_args_and_surplus_handling() {
    let dir = tempdir().unwrap();
    let logger = Logger::new("svc", "", &base_config(dir.path())).unwrap();

    logger.info_args("cache hit ratio {}", &[&0.93f64, &"warmup"]);
    logger.info_args("a={} b={}", &[&1i32]);
    logger.shutdown();

    let content = read_log(dir.path(), "svc", "info");
    assert!(content.contains("cache hit ratio 0.93 warmup"));
    assert!(content.contains("a=1 b={}"));
}

#[test]
fn message_newlines_are_escaped() {
    let dir = tempdir().unwrap();
    let logger = Logger::new("svc", "", &base_config(dir.path())).unwrap();

    logger.info("first\nsecond");
    logger.shutdown();

    let content = read_log(dir.path(), "svc", "info");
    assert_eq!(content.lines().count(), 1);
    assert!(content.contains("first\\nsecond"));
}

#[test]
fn emergency_helpers_route_and_level() {
    let dir = tempdir().unwrap();
    let logger = Logger::new("svc", "", &base_config(dir.path())).unwrap();

    logger.critical("queue backlog growing");
    logger.disaster("datastore unreachable");
    logger.shutdown();

    let emergency = dir.path().join("svc").join("emergency");
    assert!(std::fs::read_to_string(emergency.join("warn.log"))
        .unwrap()
        .contains("queue backlog growing"));
    assert!(std::fs::read_to_string(emergency.join("error.log"))
        .unwrap()
        .contains("datastore unreachable"));
}

#[test]
fn rotation_creates_backups_under_load() {
    let dir = tempdir().unwrap();
    let mut config = base_config(dir.path());
    config.max_size_mb = 1;
    config.max_backups = 2;
    let logger = Logger::new("svc", "", &config).unwrap();

    let filler = "x".repeat(512);
    for i in 0..4_000 {
        logger.info(format!("row-{} {}", i, filler));
    }
    logger.shutdown();

    let base = dir.path().join("svc");
    assert!(base.join("info.log").exists());
    assert!(base.join("info.log.1").exists());
    assert!(!base.join("info.log.3").exists());
}

// The single test that touches the process-global facade.
#[test]
fn facade_lifecycle() {
    let dir = tempdir().unwrap();
    let config = LogConfig {
        directory: dir.path().display().to_string(),
        enable_async: true,
        async_buffer_size: 256,
        show_location: false,
        console: false,
        compress: false,
        ..Default::default()
    };

    logroute::init("gateway", "gw-1", "debug", config.clone()).unwrap();
    assert!(logroute::is_initialized());

    logroute::debug!("debug line {}", 1);
    logroute::info!("hello from {}", "facade");
    logroute::warn_with("tagged", logroute::attrs! { "folder" => "ops" });
    assert!(logroute::check_level("error"));

    logroute::update_level("warn").unwrap();
    assert!(!logroute::check_level("info"));
    logroute::info!("suppressed after update");

    // re-init drains the first instance and swaps the snapshot whole
    logroute::init("gateway", "gw-1", "info", config).unwrap();
    logroute::info!("second generation");

    logroute::close();
    assert!(!logroute::is_initialized());
    assert!(logroute::flush().is_err());

    let base = dir.path().join("gw-1").join("gateway");
    let info = std::fs::read_to_string(base.join("info.log")).unwrap();
    assert!(info.contains("hello from facade"));
    assert!(!info.contains("suppressed after update"));
    assert!(info.contains("second generation"));
    let ops = std::fs::read_to_string(base.join("ops").join("warn.log")).unwrap();
    assert!(ops.contains("tagged"));
}
