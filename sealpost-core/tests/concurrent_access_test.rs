//! Concurrent access tests
//!
//! Several processes (or threads) may append to the same audit log and stage
//! archives in the same outbox at the same second. Lines must stay whole and
//! archive names must never collide.
//!
//! Run with: cargo test --test concurrent_access_test -- --nocapture

use std::collections::HashSet;
use std::fs;
use std::sync::{Arc, Barrier};
use std::thread;

use chrono::{Local, TimeZone};
use tempfile::TempDir;

use sealpost_core::services::{ArchiveCipher, AuditTrail};
use sealpost_core::{AuditRecord, AuditStatus, Credential, SourceFile};

/// Keep this realistic: a CLI run or two competing for the same files
const THREAD_COUNT: usize = 6;

const ITERATIONS_PER_THREAD: usize = 20;

#[test]
fn test_concurrent_audit_appends_keep_lines_whole() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("logs").join("audit.jsonl");
    let barrier = Arc::new(Barrier::new(THREAD_COUNT));

    let handles: Vec<_> = (0..THREAD_COUNT)
        .map(|thread_id| {
            let barrier = Arc::clone(&barrier);
            // Separate instances, as separate processes would have
            let trail = AuditTrail::new(log_path.clone());
            thread::spawn(move || {
                barrier.wait();
                for i in 0..ITERATIONS_PER_THREAD {
                    let record = AuditRecord::new(
                        &Local::now(),
                        &format!("sender-{}", thread_id),
                        &format!("r{}@example.com", i),
                        AuditStatus::Success,
                        "",
                    );
                    trail.append(&record).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let content = fs::read_to_string(&log_path).unwrap();
    let records: Vec<AuditRecord> = content
        .lines()
        .map(|line| serde_json::from_str(line).expect("torn audit line"))
        .collect();
    assert_eq!(records.len(), THREAD_COUNT * ITERATIONS_PER_THREAD);

    for thread_id in 0..THREAD_COUNT {
        let sender = format!("sender-{}", thread_id);
        let count = records.iter().filter(|r| r.sender == sender).count();
        assert_eq!(count, ITERATIONS_PER_THREAD, "{}", sender);
    }

    let recent = AuditTrail::new(log_path).read_recent(5).unwrap();
    assert_eq!(recent.len(), 5);
}

#[test]
fn test_concurrent_builds_in_same_second_get_distinct_names() {
    let temp_dir = TempDir::new().unwrap();
    let source_path = temp_dir.path().join("resume.pdf");
    fs::write(&source_path, b"resume body").unwrap();
    let outbox = temp_dir.path().join("outbox");

    let created_at = Local.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap();
    let barrier = Arc::new(Barrier::new(THREAD_COUNT));

    let handles: Vec<_> = (0..THREAD_COUNT)
        .map(|_| {
            let barrier = Arc::clone(&barrier);
            let cipher = ArchiveCipher::new(outbox.clone());
            let source = SourceFile::new(source_path.clone());
            thread::spawn(move || {
                let credential = Credential::generate();
                barrier.wait();
                let archive = cipher.build_at(&source, &credential, created_at).unwrap();
                cipher
                    .verify(archive.path(), &credential, "resume.pdf")
                    .unwrap();
                archive.path().to_path_buf()
            })
        })
        .collect();

    let paths: HashSet<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();
    assert_eq!(paths.len(), THREAD_COUNT);
    assert!(paths
        .iter()
        .any(|p| p.file_name().unwrap() == "resume_20250115_103000.zip"));
    assert_eq!(fs::read_dir(&outbox).unwrap().count(), THREAD_COUNT);
}
