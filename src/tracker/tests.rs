use super::testing::{create_client, create_harness, create_message, test_config, RecordingPublisher, StaticDirectory};
use super::{ActivityEnrichmentService, CachedUserDirectory, ProcessOutcome, StartOutcome, SweepReport, UserContext, UserDirectory};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::{DateTime, TimeDelta, Utc};
use futures::future::join_all;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use uuid::Uuid;

use crate::config::TrackerConfig;
use crate::enrichment::{ActivityEnrichment, ActivityEnrichmentType, AffectedTransaction, EnrichmentDomain, EnrichmentStatus};
use crate::models::fixtures::date;
use crate::storage::{ActivityStorage, Retention, Storage};

#[test]
fn test_start_is_idempotent() {
    let harness = create_harness(RecordingPublisher::default(), StaticDirectory::default());
    let client = create_client(&[EnrichmentDomain::Categories]);
    let activity_id = Uuid::new_v4();

    assert_eq!(harness.service.start(&client, ActivityEnrichmentType::Refresh, activity_id), StartOutcome::Started);
    assert_eq!(harness.service.start(&client, ActivityEnrichmentType::Refresh, activity_id), StartOutcome::AlreadyStarted);
    assert_eq!(harness.storage.len(), 1);
}

#[test]
fn test_start_writes_exactly_once_for_repeated_starts() {
    struct CountingStorage {
        inner: ActivityStorage,
        writes: AtomicUsize
    }

    impl Storage for CountingStorage {
        fn create(&self, enrichment: ActivityEnrichment) -> bool {
            let created = self.inner.create(enrichment);
            if created {
                self.writes.fetch_add(1, Ordering::SeqCst);
            }
            created
        }

        fn modify<R, F>(&self, activity_id: Uuid, mutation: F) -> Option<R>
        where
            F: FnOnce(&mut ActivityEnrichment) -> (Retention, R)
        {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.modify(activity_id, mutation)
        }

        fn load(&self, activity_id: Uuid) -> Option<ActivityEnrichment> {
            self.inner.load(activity_id)
        }

        fn started_before(&self, threshold: DateTime<Utc>) -> Vec<Uuid> {
            self.inner.started_before(threshold)
        }
    }

    let storage = Arc::new(CountingStorage {
        inner: ActivityStorage::new(),
        writes: Default::default()
    });
    let service = ActivityEnrichmentService::new(
        storage.clone(),
        Arc::new(RecordingPublisher::default()),
        Arc::new(StaticDirectory::default()),
        &test_config()
    );
    let client = create_client(&[EnrichmentDomain::Labels]);
    let activity_id = Uuid::new_v4();

    for _ in 0..3 {
        service.start(&client, ActivityEnrichmentType::Refresh, activity_id);
    }

    assert_eq!(storage.writes.load(Ordering::SeqCst), 1);
    assert_eq!(storage.inner.len(), 1);
}

#[test]
fn test_start_without_capabilities_tracks_nothing() {
    let harness = create_harness(RecordingPublisher::default(), StaticDirectory::default());
    let client = create_client(&[]);

    assert_eq!(harness.service.start(&client, ActivityEnrichmentType::Refresh, Uuid::new_v4()), StartOutcome::NoCapabilities);
    assert!(harness.storage.is_empty());
}

#[tokio::test]
async fn test_activity_completes_only_after_every_enabled_domain_finished() -> Result<()> {
    let harness = create_harness(RecordingPublisher::default(), StaticDirectory::default());
    let client = create_client(&[EnrichmentDomain::Categories, EnrichmentDomain::Labels]);
    let activity_id = Uuid::new_v4();
    let account_id = Uuid::new_v4();
    harness.service.start(&client, ActivityEnrichmentType::Refresh, activity_id);

    let first_page = create_message(EnrichmentDomain::Categories, activity_id, &client, false);
    let outcome = harness.service
        .process_enrichment(&first_page, &[AffectedTransaction { account_id, date: date("2024-04-10") }], &client)
        .await;

    assert_eq!(outcome, ProcessOutcome::Accumulating { checksum: 0, expected: 1001 });

    let last_page = create_message(EnrichmentDomain::Categories, activity_id, &client, true);
    let outcome = harness.service
        .process_enrichment(&last_page, &[AffectedTransaction { account_id, date: date("2024-04-02") }], &client)
        .await;

    assert_eq!(outcome, ProcessOutcome::Accumulating { checksum: 1, expected: 1001 });

    let disabled = create_message(EnrichmentDomain::CounterParties, activity_id, &client, true);

    assert_eq!(harness.service.process_enrichment(&disabled, &[], &client).await, ProcessOutcome::CapabilityDisabled);
    assert_eq!(harness.storage.load(activity_id).ok_or_else(|| anyhow!("Activity missing"))?.checksum, 1);
    assert!(harness.publisher.events().is_empty());

    let labels = create_message(EnrichmentDomain::Labels, activity_id, &client, true);
    let outcome = harness.service
        .process_enrichment(&labels, &[AffectedTransaction { account_id, date: date("2024-04-05") }], &client)
        .await;

    assert_eq!(outcome, ProcessOutcome::Completed);
    assert!(harness.storage.is_empty());

    let events = harness.publisher.events();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status, EnrichmentStatus::Success);
    assert_eq!(events[0].activity_id, activity_id);
    assert_eq!(events[0].user_id, client.user_id);
    assert_eq!(events[0].client_id, Some(client.client_id));
    assert_eq!(events[0].accounts.len(), 1);
    assert_eq!(events[0].accounts[0].account_id, account_id);
    assert_eq!(events[0].accounts[0].date, date("2024-04-02"));

    Ok(())
}

#[tokio::test]
async fn test_unsupported_version_is_dropped_without_changes() -> Result<()> {
    let harness = create_harness(RecordingPublisher::default(), StaticDirectory::default());
    let client = create_client(&[EnrichmentDomain::Categories]);
    let activity_id = Uuid::new_v4();
    harness.service.start(&client, ActivityEnrichmentType::Refresh, activity_id);

    let mut message = create_message(EnrichmentDomain::Categories, activity_id, &client, true);
    message.version = 2;

    assert_eq!(harness.service.process_enrichment(&message, &[], &client).await, ProcessOutcome::UnsupportedVersion);
    assert_eq!(harness.storage.load(activity_id).ok_or_else(|| anyhow!("Activity missing"))?.checksum, 0);

    Ok(())
}

#[tokio::test]
async fn test_messages_for_unknown_or_finished_activities_are_orphaned() {
    let harness = create_harness(RecordingPublisher::default(), StaticDirectory::default());
    let client = create_client(&[EnrichmentDomain::Categories]);
    let activity_id = Uuid::new_v4();
    let message = create_message(EnrichmentDomain::Categories, activity_id, &client, true);

    assert_eq!(harness.service.process_enrichment(&message, &[], &client).await, ProcessOutcome::Orphaned);

    harness.service.start(&client, ActivityEnrichmentType::Refresh, activity_id);

    assert_eq!(harness.service.process_enrichment(&message, &[], &client).await, ProcessOutcome::Completed);
    assert_eq!(harness.service.process_enrichment(&message, &[], &client).await, ProcessOutcome::Orphaned);
    assert_eq!(harness.publisher.events().len(), 1);
}

#[tokio::test]
async fn test_feedback_waits_for_its_domain_twice() {
    let harness = create_harness(RecordingPublisher::default(), StaticDirectory::default());
    let client = create_client(&[EnrichmentDomain::Categories, EnrichmentDomain::CounterParties]);
    let activity_id = Uuid::new_v4();
    harness.service.start(&client, ActivityEnrichmentType::CategoryFeedback, activity_id);

    let categories = create_message(EnrichmentDomain::Categories, activity_id, &client, true);
    let counter_parties = create_message(EnrichmentDomain::CounterParties, activity_id, &client, true);

    assert_eq!(
        harness.service.process_enrichment(&categories, &[], &client).await,
        ProcessOutcome::Accumulating { checksum: 1, expected: 12 }
    );
    assert_eq!(
        harness.service.process_enrichment(&counter_parties, &[], &client).await,
        ProcessOutcome::Accumulating { checksum: 11, expected: 12 }
    );
    assert_eq!(harness.service.process_enrichment(&categories, &[], &client).await, ProcessOutcome::Completed);
}

#[tokio::test]
async fn test_stale_activity_times_out_exactly_once() {
    let user_id = Uuid::new_v4();
    let client_id = Uuid::new_v4();
    let directory = StaticDirectory::default().with_user(UserContext { client_id, user_id });
    let harness = create_harness(RecordingPublisher::default(), directory);
    let mut client = create_client(&[EnrichmentDomain::Categories, EnrichmentDomain::Labels]);
    client.user_id = user_id;
    let activity_id = Uuid::new_v4();
    let account_id = Uuid::new_v4();

    harness.service.start(&client, ActivityEnrichmentType::Refresh, activity_id);
    harness.service
        .process_enrichment(
            &create_message(EnrichmentDomain::Categories, activity_id, &client, true),
            &[AffectedTransaction { account_id, date: date("2024-01-15") }],
            &client
        )
        .await;

    harness.clock.advance(TimeDelta::seconds(599));

    assert_eq!(harness.service.sweep_timeouts().await, SweepReport::default());
    assert_eq!(harness.storage.len(), 1);

    harness.clock.advance(TimeDelta::seconds(2));

    assert_eq!(harness.service.sweep_timeouts().await, SweepReport { timed_out: 1, ..Default::default() });
    assert!(harness.storage.is_empty());
    assert_eq!(harness.service.sweep_timeouts().await, SweepReport::default());

    let events = harness.publisher.events();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status, EnrichmentStatus::Timeout);
    assert_eq!(events[0].client_id, Some(client_id));
    assert_eq!(events[0].accounts.len(), 1);
    assert_eq!(events[0].accounts[0].date, date("2024-01-15"));
}

#[tokio::test]
async fn test_timeout_degrades_when_user_cannot_be_resolved() {
    let harness = create_harness(RecordingPublisher::default(), StaticDirectory::unavailable());
    let unknown_user_harness = create_harness(RecordingPublisher::default(), StaticDirectory::default());
    let client = create_client(&[EnrichmentDomain::Labels]);

    for harness in [&harness, &unknown_user_harness] {
        harness.service.start(&client, ActivityEnrichmentType::Refresh, Uuid::new_v4());
        harness.clock.advance(TimeDelta::hours(1));

        assert_eq!(harness.service.sweep_timeouts().await, SweepReport { degraded: 1, ..Default::default() });
        assert!(harness.storage.is_empty());

        let events = harness.publisher.events();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, EnrichmentStatus::Timeout);
        assert_eq!(events[0].user_id, client.user_id);
        assert!(events[0].client_id.is_none());
        assert!(events[0].accounts.is_empty());
    }
}

#[tokio::test]
async fn test_completed_activity_never_times_out() {
    let harness = create_harness(RecordingPublisher::default(), StaticDirectory::default());
    let client = create_client(&[EnrichmentDomain::Labels]);
    let activity_id = Uuid::new_v4();

    harness.service.start(&client, ActivityEnrichmentType::Refresh, activity_id);
    harness.service
        .process_enrichment(&create_message(EnrichmentDomain::Labels, activity_id, &client, true), &[], &client)
        .await;
    harness.clock.advance(TimeDelta::hours(2));

    assert_eq!(harness.service.sweep_timeouts().await, SweepReport::default());

    let events = harness.publisher.events();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status, EnrichmentStatus::Success);
}

#[tokio::test]
async fn test_publication_is_retried_on_transient_failures() {
    let harness = create_harness(RecordingPublisher::failing_times(2), StaticDirectory::default());
    let client = create_client(&[EnrichmentDomain::Labels]);
    let activity_id = Uuid::new_v4();

    harness.service.start(&client, ActivityEnrichmentType::Refresh, activity_id);
    let outcome = harness.service
        .process_enrichment(&create_message(EnrichmentDomain::Labels, activity_id, &client, true), &[], &client)
        .await;

    assert_eq!(outcome, ProcessOutcome::Completed);
    assert_eq!(harness.publisher.attempts(), 3);
    assert_eq!(harness.publisher.events().len(), 1);
}

#[tokio::test]
async fn test_rejected_publication_is_not_retried_and_cleanup_still_happens() {
    let harness = create_harness(RecordingPublisher::rejecting(), StaticDirectory::default());
    let client = create_client(&[EnrichmentDomain::Labels]);

    harness.service.start(&client, ActivityEnrichmentType::Refresh, Uuid::new_v4());
    harness.clock.advance(TimeDelta::hours(1));

    assert_eq!(harness.service.sweep_timeouts().await.degraded, 1);
    assert_eq!(harness.publisher.attempts(), 1);
    assert!(harness.storage.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_last_pages_complete_an_activity_once() {
    let harness = create_harness(RecordingPublisher::default(), StaticDirectory::default());
    let client = create_client(&EnrichmentDomain::ALL);
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..20 {
        let activity_id = Uuid::new_v4();
        harness.service.start(&client, ActivityEnrichmentType::Refresh, activity_id);

        let mut domains = EnrichmentDomain::ALL.to_vec();
        domains.shuffle(&mut rng);

        let tasks = domains.into_iter().map(|domain| {
            let service = harness.service.clone();
            let message = create_message(domain, activity_id, &client, true);
            let client = client;

            tokio::spawn(async move { service.process_enrichment(&message, &[], &client).await })
        });

        let completions = join_all(tasks).await
            .into_iter()
            .filter(|outcome| matches!(outcome, Ok(ProcessOutcome::Completed)))
            .count();

        assert_eq!(completions, 1);
    }

    assert!(harness.storage.is_empty());
    assert_eq!(harness.publisher.events().len(), 20);
}

#[tokio::test]
async fn test_cached_directory_only_caches_found_users() -> Result<()> {
    let user = UserContext { client_id: Uuid::new_v4(), user_id: Uuid::new_v4() };
    let inner = Arc::new(StaticDirectory::default().with_user(user));
    let config = TrackerConfig { user_cache_capacity: 100, user_cache_ttl: Duration::from_secs(60), ..test_config() };
    let cached = CachedUserDirectory::from_config(inner.clone(), &config);

    assert_eq!(cached.find_user(user.user_id).await?, Some(user));
    assert_eq!(cached.find_user(user.user_id).await?, Some(user));
    assert_eq!(inner.lookups(), 1);

    let unknown = Uuid::new_v4();

    assert_eq!(cached.find_user(unknown).await?, None);
    assert_eq!(cached.find_user(unknown).await?, None);
    assert_eq!(inner.lookups(), 3);

    Ok(())
}

#[tokio::test]
async fn test_orphan_with_last_possible_page_index_is_logged_and_dropped() {
    let _subscriber = tracing::subscriber::set_default(
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .finish()
    );
    let harness = create_harness(RecordingPublisher::default(), StaticDirectory::default());
    let client = create_client(&[EnrichmentDomain::Labels]);
    let mut message = create_message(EnrichmentDomain::Labels, Uuid::new_v4(), &client, true);
    message.message_index = u32::MAX;
    message.message_total = u32::MAX;

    assert_eq!(harness.service.process_enrichment(&message, &[], &client).await, ProcessOutcome::Orphaned);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sweep_racing_completion_emits_one_terminal_event_per_activity() -> Result<()> {
    let harness = create_harness(RecordingPublisher::default(), StaticDirectory::default());
    let client = create_client(&[EnrichmentDomain::Categories, EnrichmentDomain::Labels]);
    let activity_ids: Vec<Uuid> = (0..200).map(|_| Uuid::new_v4()).collect();

    for activity_id in &activity_ids {
        harness.service.start(&client, ActivityEnrichmentType::Refresh, *activity_id);
        harness.service
            .process_enrichment(&create_message(EnrichmentDomain::Categories, *activity_id, &client, true), &[], &client)
            .await;
    }

    harness.clock.advance(TimeDelta::hours(1));

    let sweeps: Vec<_> = (0..2)
        .map(|_| {
            let service = harness.service.clone();
            tokio::spawn(async move { service.sweep_timeouts().await })
        })
        .collect();

    let completions = activity_ids.iter().map(|activity_id| {
        let service = harness.service.clone();
        let message = create_message(EnrichmentDomain::Labels, *activity_id, &client, true);
        let client = client;

        tokio::spawn(async move { service.process_enrichment(&message, &[], &client).await })
    });

    let mut completed = 0;

    for outcome in join_all(completions).await {
        match outcome? {
            ProcessOutcome::Completed => completed += 1,
            ProcessOutcome::Orphaned => {}
            other => return Err(anyhow!("Unexpected outcome {other:?}"))
        }
    }

    let mut report = SweepReport::default();

    for sweep in join_all(sweeps).await {
        report = report.merge(sweep?);
    }

    let events = harness.publisher.events();
    let successes = events.iter().filter(|event| event.status == EnrichmentStatus::Success).count();
    let timeouts = events.iter().filter(|event| event.status == EnrichmentStatus::Timeout).count();

    assert!(harness.storage.is_empty());
    assert_eq!(events.len(), activity_ids.len());
    assert_eq!(successes, completed);
    assert_eq!(timeouts, report.timed_out + report.degraded);

    for activity_id in &activity_ids {
        assert_eq!(events.iter().filter(|event| event.activity_id == *activity_id).count(), 1);
    }

    Ok(())
}
