//! Integration tests for casewell-store
//!
//! These cover the full optimistic CRUD cycle against the in-memory store,
//! pagination across feed + store, and out-of-order load completion.

use casewell_domain::identity::UserIdentity;
use casewell_domain::traits::{CaseStore, Cursor, Page, StaticIdentity};
use casewell_domain::{
    Case, CaseId, CasePatch, Indicator, IndicatorDraft, IndicatorId, IndicatorKind,
    IndicatorPatch, Message, MessageId,
};
use casewell_store::{IndicatorStore, MemoryError, MemoryStore, PagedFeed};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

fn signed_in() -> Arc<StaticIdentity> {
    Arc::new(StaticIdentity::signed_in(UserIdentity::new("worker-1")))
}

#[tokio::test]
async fn test_full_indicator_cycle_reaches_the_store() {
    let store = Arc::new(MemoryStore::new());
    let cache = IndicatorStore::new(Arc::clone(&store), signed_in());
    let case_id = CaseId::new();
    cache.attach(case_id);

    let added = cache
        .add(IndicatorDraft::new(
            IndicatorKind::Positive,
            "Parents completed substance abuse treatment",
        ))
        .await
        .unwrap();

    let patch = IndicatorPatch {
        weight: Some(3.0),
        ..Default::default()
    };
    cache.update(added.id, patch).await.unwrap();
    assert_eq!(
        cache.get_by_kind(IndicatorKind::Positive)[0].weight,
        3.0
    );

    // A fresh load round-trips the persisted state.
    cache.replace(Vec::new(), Vec::new());
    cache.load(case_id).await.unwrap();
    let loaded = cache.get_by_kind(IndicatorKind::Positive);
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].weight, 3.0);

    cache.remove(added.id).await.unwrap();
    cache.load(case_id).await.unwrap();
    assert!(cache.get_by_kind(IndicatorKind::Positive).is_empty());
}

#[tokio::test]
async fn test_case_feed_pages_without_duplicates() {
    let store = Arc::new(MemoryStore::new());
    for n in 0..23 {
        let mut case = Case::new("worker-1", format!("case {}", n));
        case.created_at = 1_000 + n;
        store.seed_case(case);
    }

    let feed = PagedFeed::default();
    let mut seen: Vec<CaseId> = Vec::new();
    let mut pages = 0;
    loop {
        let page = feed
            .load_page(|cursor, limit| {
                let store = Arc::clone(&store);
                async move { store.list_cases("worker-1", limit, cursor.as_ref()).await }
            })
            .await
            .unwrap();
        pages += 1;
        seen.extend(page.items.iter().map(|c| c.id));
        if !page.has_more {
            break;
        }
    }

    assert_eq!(pages, 3);
    assert_eq!(seen.len(), 23);
    let mut unique = seen.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 23, "no case id may appear twice");
}

#[tokio::test]
async fn test_message_feed_preserves_timeline_order() {
    let store = Arc::new(MemoryStore::new());
    let case_id = CaseId::new();
    for n in 0..15u64 {
        let mut msg = Message::user(
            case_id,
            format!("entry {}", n),
            casewell_domain::message::Sender::Anonymous,
        );
        msg.timestamp = 100 + n;
        store.seed_message(msg);
    }

    let feed = PagedFeed::default();
    let mut timeline: Vec<u64> = Vec::new();
    loop {
        let page = feed
            .load_page(|cursor, limit| {
                let store = Arc::clone(&store);
                async move { store.list_messages(case_id, limit, cursor.as_ref()).await }
            })
            .await
            .unwrap();
        timeline.extend(page.items.iter().map(|m| m.timestamp));
        if !page.has_more {
            break;
        }
    }

    assert_eq!(timeline, (100..115).collect::<Vec<_>>());
}

/// Store wrapper that holds `list_indicators` responses behind a per-case
/// gate, so tests can force out-of-order completion.
struct GatedStore {
    inner: MemoryStore,
    gates: Mutex<HashMap<CaseId, Arc<Notify>>>,
}

impl GatedStore {
    fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            gates: Mutex::new(HashMap::new()),
        }
    }

    fn gate(&self, case_id: CaseId) -> Arc<Notify> {
        Arc::clone(
            self.gates
                .lock()
                .unwrap()
                .entry(case_id)
                .or_insert_with(|| Arc::new(Notify::new())),
        )
    }
}

#[async_trait]
impl CaseStore for GatedStore {
    type Error = MemoryError;

    async fn create_case(&self, case: &Case) -> Result<CaseId, Self::Error> {
        self.inner.create_case(case).await
    }

    async fn update_case(&self, id: CaseId, patch: &CasePatch) -> Result<(), Self::Error> {
        self.inner.update_case(id, patch).await
    }

    async fn list_cases(
        &self,
        owner_id: &str,
        limit: usize,
        after: Option<&Cursor>,
    ) -> Result<Page<Case>, Self::Error> {
        self.inner.list_cases(owner_id, limit, after).await
    }

    async fn create_indicator(&self, indicator: &Indicator) -> Result<IndicatorId, Self::Error> {
        self.inner.create_indicator(indicator).await
    }

    async fn update_indicator(
        &self,
        case_id: CaseId,
        id: IndicatorId,
        patch: &IndicatorPatch,
    ) -> Result<(), Self::Error> {
        self.inner.update_indicator(case_id, id, patch).await
    }

    async fn delete_indicator(&self, case_id: CaseId, id: IndicatorId) -> Result<(), Self::Error> {
        self.inner.delete_indicator(case_id, id).await
    }

    async fn list_indicators(&self, case_id: CaseId) -> Result<Vec<Indicator>, Self::Error> {
        self.gate(case_id).notified().await;
        self.inner.list_indicators(case_id).await
    }

    async fn create_message(&self, message: &Message) -> Result<MessageId, Self::Error> {
        self.inner.create_message(message).await
    }

    async fn list_messages(
        &self,
        case_id: CaseId,
        limit: usize,
        after: Option<&Cursor>,
    ) -> Result<Page<Message>, Self::Error> {
        self.inner.list_messages(case_id, limit, after).await
    }
}

async fn seed_indicator(store: &MemoryStore, case_id: CaseId, kind: IndicatorKind, text: &str) {
    let indicator = Indicator::from_draft(case_id, IndicatorDraft::new(kind, text));
    store.create_indicator(&indicator).await.unwrap();
}

#[tokio::test]
async fn test_stale_load_is_discarded() {
    let memory = MemoryStore::new();
    let case_a = CaseId::new();
    let case_b = CaseId::new();
    seed_indicator(&memory, case_a, IndicatorKind::Positive, "from case A").await;
    seed_indicator(&memory, case_b, IndicatorKind::Negative, "from case B").await;
    seed_indicator(&memory, case_b, IndicatorKind::Negative, "also case B").await;

    let gated = Arc::new(GatedStore::new(memory));
    let cache = Arc::new(IndicatorStore::new(Arc::clone(&gated), signed_in()));

    let load_a = {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move { cache.load(case_a).await })
    };
    // Let load A reach its gate before starting load B, so A holds the
    // earlier request token.
    tokio::task::yield_now().await;

    let load_b = {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move { cache.load(case_b).await })
    };
    tokio::task::yield_now().await;

    // B resolves first, then A's response arrives late.
    gated.gate(case_b).notify_one();
    load_b.await.unwrap().unwrap();

    gated.gate(case_a).notify_one();
    load_a.await.unwrap().unwrap();

    // Final cache reflects B, not the late-arriving A.
    let (positive, negative) = cache.snapshot();
    assert!(positive.is_empty());
    assert_eq!(negative.len(), 2);
    assert_eq!(cache.active_case(), Some(case_b));
}
