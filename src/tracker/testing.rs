use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use crate::config::TrackerConfig;
use crate::enrichment::{ActivityEnrichmentEvent, EnrichmentCapabilities, EnrichmentDomain, EnrichmentMessage, MessageKey};
use crate::storage::ActivityStorage;
use crate::tracker::{
    ActivityEnrichmentService, ActivityEventPublisher, ClientContext, Clock, DirectoryError, PublishError, RetryPolicy,
    UserContext, UserDirectory
};
use crate::types::ActivityId;

#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<ActivityEnrichmentEvent>>,
    attempts: AtomicUsize,
    failures_remaining: AtomicU32,
    rejects: bool
}

impl RecordingPublisher {
    pub fn failing_times(failures: u32) -> Self {
        Self {
            failures_remaining: AtomicU32::new(failures),
            ..Default::default()
        }
    }

    pub fn rejecting() -> Self {
        Self {
            rejects: true,
            ..Default::default()
        }
    }

    pub fn events(&self) -> Vec<ActivityEnrichmentEvent> {
        self.events.lock().expect("publisher lock poisoned").clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ActivityEventPublisher for RecordingPublisher {
    async fn publish(&self, event: &ActivityEnrichmentEvent) -> Result<(), PublishError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if self.rejects {
            return Err(PublishError::Rejected("schema mismatch".to_string()));
        }

        let failed = self.failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| remaining.checked_sub(1))
            .is_ok();

        if failed {
            return Err(PublishError::Unavailable("broker down".to_string()));
        }

        self.events.lock().expect("publisher lock poisoned").push(event.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct StaticDirectory {
    users: HashMap<Uuid, UserContext>,
    unavailable: bool,
    lookups: AtomicUsize
}

impl StaticDirectory {
    pub fn with_user(mut self, user: UserContext) -> Self {
        self.users.insert(user.user_id, user);
        self
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserDirectory for StaticDirectory {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<UserContext>, DirectoryError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        if self.unavailable {
            return Err(DirectoryError::Unavailable("connection refused".to_string()));
        }

        Ok(self.users.get(&user_id).copied())
    }
}

#[async_trait]
impl<D: UserDirectory> UserDirectory for Arc<D> {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<UserContext>, DirectoryError> {
        self.as_ref().find_user(user_id).await
    }
}

pub struct ManualClock {
    now: Mutex<DateTime<Utc>>
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc::now())
        }
    }

    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock().expect("clock lock poisoned");
        *now += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock poisoned")
    }
}

pub struct Harness {
    pub service: Arc<ActivityEnrichmentService<ActivityStorage>>,
    pub storage: Arc<ActivityStorage>,
    pub publisher: Arc<RecordingPublisher>,
    pub clock: Arc<ManualClock>
}

pub fn test_config() -> TrackerConfig {
    TrackerConfig {
        timeout: Duration::from_secs(600),
        retry: RetryPolicy {
            max_retries: 3,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5)
        },
        ..Default::default()
    }
}

pub fn create_harness(publisher: RecordingPublisher, directory: StaticDirectory) -> Harness {
    let storage = Arc::new(ActivityStorage::new());
    let publisher = Arc::new(publisher);
    let clock = Arc::new(ManualClock::new());
    let service = ActivityEnrichmentService::new(storage.clone(), publisher.clone(), Arc::new(directory), &test_config())
        .with_clock(clock.clone());

    Harness {
        service: Arc::new(service),
        storage,
        publisher,
        clock
    }
}

pub fn create_client(domains: &[EnrichmentDomain]) -> ClientContext {
    ClientContext {
        client_id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        capabilities: EnrichmentCapabilities::only(domains)
    }
}

pub fn create_message(domain: EnrichmentDomain, activity_id: ActivityId, client: &ClientContext, is_last_page: bool) -> EnrichmentMessage {
    EnrichmentMessage {
        domain,
        version: EnrichmentMessage::SUPPORTED_VERSION,
        activity_id,
        message_key: MessageKey { user_id: client.user_id },
        is_last_page,
        message_index: 0,
        message_total: 1,
        payload: serde_json::Value::Null
    }
}
