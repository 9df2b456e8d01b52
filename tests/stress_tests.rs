//! Concurrency stress tests

use logroute::core::{LogConfig, LogLevel, Logger, SafeFormatter};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

fn config(dir: &Path) -> LogConfig {
    LogConfig {
        directory: dir.display().to_string(),
        level: LogLevel::Debug,
        enable_async: true,
        async_buffer_size: 4096,
        show_location: false,
        console: false,
        compress: false,
        ..Default::default()
    }
}

#[test]
fn concurrent_producers_lose_nothing() {
    let dir = tempdir().unwrap();
    let logger = Arc::new(Logger::new("stress", "", &config(dir.path())).unwrap());

    let threads = 8;
    let per_thread = 2_000;
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for i in 0..per_thread {
                    logger.info(format!("t{}-{}", t, i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    logger.shutdown();

    let content =
        std::fs::read_to_string(dir.path().join("stress").join("info.log")).unwrap();
    assert_eq!(content.lines().count(), threads * per_thread);
    assert_eq!(logger.metrics().dropped, 0);

    // per-thread order survives interleaving
    for t in 0..threads {
        let positions: Vec<usize> = (0..per_thread)
            .map(|i| content.find(&format!("t{}-{}\n", t, i)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn serializer_survives_concurrent_mutation() {
    let formatter = Arc::new(SafeFormatter::new());
    let shared: Arc<parking_lot::RwLock<HashMap<u64, String>>> =
        Arc::new(parking_lot::RwLock::new(HashMap::new()));
    let stop = Arc::new(AtomicBool::new(false));

    // 10 writers churn the map while captures run
    let mutators: Vec<_> = (0..10)
        .map(|seed| {
            let shared = Arc::clone(&shared);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut i: u64 = seed;
                while !stop.load(Ordering::Relaxed) {
                    {
                        let mut map = shared.write();
                        map.insert(i, format!("value-{}", i));
                        if i % 3 == 0 {
                            map.remove(&(i / 2));
                        }
                    }
                    i = i.wrapping_add(7);
                }
            })
        })
        .collect();

    for _ in 0..10_000 {
        let message = formatter.format("map state {}", &[&*shared]);
        assert!(!message.is_empty());
        assert!(message.starts_with("map state HashMap{"));
    }

    stop.store(true, Ordering::Relaxed);
    for handle in mutators {
        handle.join().unwrap();
    }

    let stats = formatter.stats();
    assert_eq!(stats.captured, 10_000);
}

#[test]
fn level_updates_race_with_producers() {
    let dir = tempdir().unwrap();
    let logger = Arc::new(Logger::new("race", "", &config(dir.path())).unwrap());

    let producers: Vec<_> = (0..100)
        .map(|t| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for i in 0..100 {
                    logger.debug(format!("p{}-{}", t, i));
                    logger.warn(format!("p{}-{}", t, i));
                    logger.error(format!("p{}-{}", t, i));
                }
            })
        })
        .collect();

    let updater = {
        let logger = Arc::clone(&logger);
        thread::spawn(move || {
            for _ in 0..50 {
                logger.update_level("debug").unwrap();
                thread::sleep(Duration::from_micros(200));
                logger.update_level("error").unwrap();
                thread::sleep(Duration::from_micros(200));
            }
        })
    };

    for handle in producers {
        handle.join().unwrap();
    }
    updater.join().unwrap();

    // flags converge to the final threshold
    logger.update_level("warn").unwrap();
    assert!(!logger.check_level("debug"));
    assert!(logger.check_level("error"));
    assert_eq!(logger.level(), LogLevel::Warn);
    logger.shutdown();
}

#[test]
fn many_tags_share_cached_routes() {
    let dir = tempdir().unwrap();
    let logger = Arc::new(Logger::new("tags", "", &config(dir.path())).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for i in 0..500 {
                    logger.info_with(
                        format!("tagged-{}", i),
                        vec![(
                            "folder".to_string(),
                            logroute::FieldValue::from(format!("bucket-{}", t % 2)),
                        )],
                    );
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    logger.shutdown();

    for bucket in ["bucket-0", "bucket-1"] {
        let path = dir.path().join("tags").join(bucket).join("info.log");
        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(content.lines().count(), 1_000);
    }
}
