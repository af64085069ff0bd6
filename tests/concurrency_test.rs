//! Concurrency tests: a link is delivered at most once per chat even when the
//! scheduler and a user request race.

mod common;

use std::sync::Arc;

use common::{numbered_entries, single_topic_config, StaticFetcher};
use newsdigest::news::NewsCollector;
use newsdigest::summarizer::DisabledSummarizer;
use newsdigest::transport::MemoryTransport;
use newsdigest::{Database, DeliveryKind, DeliveryOutcome, DigestService, ProfileService, SeenLinkLedger};

async fn setup_file_db() -> (tempfile::TempDir, Arc<Database>) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("digest.db")).await.unwrap();
    (dir, Arc::new(db))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_deliveries_send_each_link_once() {
    let (_dir, db) = setup_file_db().await;
    let config = single_topic_config();
    let collector = Arc::new(NewsCollector::new(
        Arc::new(StaticFetcher::new(numbered_entries(12))),
        &config.news,
    ));
    let transport = Arc::new(MemoryTransport::new());
    let digests = Arc::new(DigestService::new(
        db.clone(),
        collector,
        Arc::new(DisabledSummarizer),
        transport.clone(),
        &config,
    ));
    let profile = ProfileService::new(&db).ensure(900).await.unwrap();

    const RUNS: usize = 6;
    let mut handles = Vec::new();
    for i in 0..RUNS {
        let digests = digests.clone();
        let profile = profile.clone();
        let kind = if i % 2 == 0 {
            DeliveryKind::Scheduled
        } else {
            DeliveryKind::OnDemand
        };
        handles.push(tokio::spawn(async move {
            digests.deliver(&profile, kind).await.unwrap()
        }));
    }

    let mut delivered_candidates = 0;
    for handle in handles {
        if let DeliveryOutcome::Delivered { candidates, .. } = handle.await.unwrap() {
            delivered_candidates += candidates;
        }
    }

    // Every link was new for exactly one run.
    assert_eq!(delivered_candidates, 12);
    assert_eq!(SeenLinkLedger::new(db.pool()).count(900).await.unwrap(), 12);

    let mut shown = Vec::new();
    for message in transport.sent_to(900) {
        for line in message.text.lines().filter(|l| l.starts_with("• ")) {
            shown.push(line.to_string());
        }
    }
    let unique: std::collections::HashSet<_> = shown.iter().collect();
    assert_eq!(unique.len(), shown.len());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_preference_changes_and_ledger_writes() {
    let (_dir, db) = setup_file_db().await;
    let profiles = ProfileService::new(&db);
    profiles.ensure(901).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..10 {
        let db = db.clone();
        handles.push(tokio::spawn(async move {
            let ledger = SeenLinkLedger::new(db.pool());
            ledger
                .record(901, &format!("https://news.test/{i}"))
                .await
                .unwrap();
            if i == 5 {
                ProfileService::new(&db)
                    .set_keywords(901, "economy")
                    .await
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let profile = profiles.ensure(901).await.unwrap();
    assert_eq!(profile.keywords.as_slice(), ["economy"]);
    let count = SeenLinkLedger::new(db.pool()).count(901).await.unwrap();
    assert!(count <= 10);
}
