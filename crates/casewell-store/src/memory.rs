//! In-process `CaseStore` implementation
//!
//! A deterministic stand-in for the remote document store: keeps documents
//! in memory, honors the same ordering and cursor contracts, and lets tests
//! inject failures per operation and count calls.

use casewell_domain::traits::{CaseStore, Cursor, Page};
use casewell_domain::{
    Case, CaseId, CasePatch, Indicator, IndicatorId, IndicatorPatch, Message, MessageId,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use thiserror::Error;

/// Errors reported by the in-memory store
#[derive(Error, Debug)]
pub enum MemoryError {
    /// A failure injected by a test via `fail_on`
    #[error("injected failure in {0}")]
    Injected(&'static str),

    /// No document with the given id
    #[error("no such document: {0}")]
    Missing(String),
}

#[derive(Debug, Default)]
struct Documents {
    cases: Vec<Case>,
    indicators: HashMap<CaseId, Vec<Indicator>>,
    messages: HashMap<CaseId, Vec<Message>>,
}

/// In-memory document store with failure injection
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<Documents>,
    failures: Mutex<HashSet<&'static str>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    reassign_ids: bool,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign fresh server-side ids on create instead of echoing the
    /// client's optimistic ids, to exercise id reconciliation
    pub fn with_reassigned_ids(mut self) -> Self {
        self.reassign_ids = true;
        self
    }

    /// Make every future call to `op` fail until `clear_failures`
    pub fn fail_on(&self, op: &'static str) {
        self.failures.lock().unwrap().insert(op);
    }

    /// Remove all injected failures
    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    /// How many times `op` has been called (including failed calls)
    pub fn call_count(&self, op: &'static str) -> usize {
        self.calls.lock().unwrap().get(op).copied().unwrap_or(0)
    }

    /// Seed a case directly, bypassing failure injection
    pub fn seed_case(&self, case: Case) {
        self.documents.lock().unwrap().cases.push(case);
    }

    /// Seed a message directly, bypassing failure injection
    pub fn seed_message(&self, message: Message) {
        self.documents
            .lock()
            .unwrap()
            .messages
            .entry(message.case_id)
            .or_default()
            .push(message);
    }

    fn enter(&self, op: &'static str) -> Result<(), MemoryError> {
        *self.calls.lock().unwrap().entry(op).or_insert(0) += 1;
        if self.failures.lock().unwrap().contains(op) {
            return Err(MemoryError::Injected(op));
        }
        Ok(())
    }
}

/// Slice `items` into the page after `cursor`, where the cursor token is the
/// rendering of the last item's id under `id_of`.
fn page_after<T: Clone>(
    items: &[T],
    cursor: Option<&Cursor>,
    limit: usize,
    id_of: impl Fn(&T) -> String,
) -> Page<T> {
    let start = match cursor {
        Some(c) => match items.iter().position(|i| id_of(i) == c.as_str()) {
            Some(pos) => pos + 1,
            // Cursor no longer present under the stable sort key: treat the
            // range as exhausted rather than re-serving items.
            None => items.len(),
        },
        None => 0,
    };
    let end = (start + limit).min(items.len());
    let page_items: Vec<T> = items[start..end].to_vec();
    let next_cursor = page_items.last().map(|i| Cursor::new(id_of(i)));
    Page {
        has_more: end < items.len(),
        items: page_items,
        next_cursor,
    }
}

#[async_trait]
impl CaseStore for MemoryStore {
    type Error = MemoryError;

    async fn create_case(&self, case: &Case) -> Result<CaseId, Self::Error> {
        self.enter("create_case")?;
        let mut stored = case.clone();
        if self.reassign_ids {
            stored.id = CaseId::new();
        }
        let id = stored.id;
        self.documents.lock().unwrap().cases.push(stored);
        Ok(id)
    }

    async fn update_case(&self, id: CaseId, patch: &CasePatch) -> Result<(), Self::Error> {
        self.enter("update_case")?;
        let mut docs = self.documents.lock().unwrap();
        let case = docs
            .cases
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| MemoryError::Missing(format!("case {}", id)))?;
        patch.apply(case);
        Ok(())
    }

    async fn list_cases(
        &self,
        owner_id: &str,
        limit: usize,
        after: Option<&Cursor>,
    ) -> Result<Page<Case>, Self::Error> {
        self.enter("list_cases")?;
        let docs = self.documents.lock().unwrap();
        let mut owned: Vec<Case> = docs
            .cases
            .iter()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect();
        // created_at descending, id as tiebreaker for a stable cursor key
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(page_after(&owned, after, limit, |c| c.id.to_string()))
    }

    async fn create_indicator(&self, indicator: &Indicator) -> Result<IndicatorId, Self::Error> {
        self.enter("create_indicator")?;
        let mut stored = indicator.clone();
        if self.reassign_ids {
            stored.id = IndicatorId::new();
        }
        let id = stored.id;
        self.documents
            .lock()
            .unwrap()
            .indicators
            .entry(stored.case_id)
            .or_default()
            .push(stored);
        Ok(id)
    }

    async fn update_indicator(
        &self,
        case_id: CaseId,
        id: IndicatorId,
        patch: &IndicatorPatch,
    ) -> Result<(), Self::Error> {
        self.enter("update_indicator")?;
        let mut docs = self.documents.lock().unwrap();
        let indicator = docs
            .indicators
            .get_mut(&case_id)
            .and_then(|list| list.iter_mut().find(|i| i.id == id))
            .ok_or_else(|| MemoryError::Missing(format!("indicator {}", id)))?;
        patch.apply(indicator);
        Ok(())
    }

    async fn delete_indicator(
        &self,
        case_id: CaseId,
        id: IndicatorId,
    ) -> Result<(), Self::Error> {
        self.enter("delete_indicator")?;
        let mut docs = self.documents.lock().unwrap();
        let list = docs
            .indicators
            .get_mut(&case_id)
            .ok_or_else(|| MemoryError::Missing(format!("case {}", case_id)))?;
        let pos = list
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| MemoryError::Missing(format!("indicator {}", id)))?;
        list.remove(pos);
        Ok(())
    }

    async fn list_indicators(&self, case_id: CaseId) -> Result<Vec<Indicator>, Self::Error> {
        self.enter("list_indicators")?;
        let docs = self.documents.lock().unwrap();
        let mut list = docs.indicators.get(&case_id).cloned().unwrap_or_default();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(list)
    }

    async fn create_message(&self, message: &Message) -> Result<MessageId, Self::Error> {
        self.enter("create_message")?;
        let mut stored = message.clone();
        if self.reassign_ids {
            stored.id = MessageId::new();
        }
        let id = stored.id;
        self.documents
            .lock()
            .unwrap()
            .messages
            .entry(stored.case_id)
            .or_default()
            .push(stored);
        Ok(id)
    }

    async fn list_messages(
        &self,
        case_id: CaseId,
        limit: usize,
        after: Option<&Cursor>,
    ) -> Result<Page<Message>, Self::Error> {
        self.enter("list_messages")?;
        let docs = self.documents.lock().unwrap();
        let mut list = docs.messages.get(&case_id).cloned().unwrap_or_default();
        list.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        Ok(page_after(&list, after, limit, |m| m.id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casewell_domain::message::Sender;

    #[tokio::test]
    async fn test_injected_failure_and_call_count() {
        let store = MemoryStore::new();
        store.fail_on("list_indicators");

        let result = store.list_indicators(CaseId::new()).await;
        assert!(matches!(result, Err(MemoryError::Injected(_))));
        assert_eq!(store.call_count("list_indicators"), 1);

        store.clear_failures();
        assert!(store.list_indicators(CaseId::new()).await.is_ok());
        assert_eq!(store.call_count("list_indicators"), 2);
    }

    #[tokio::test]
    async fn test_case_pagination_orders_newest_first() {
        let store = MemoryStore::new();
        for n in 0..5 {
            let mut case = Case::new("worker-1", format!("case {}", n));
            case.created_at = 1000 + n;
            store.seed_case(case);
        }

        let page = store.list_cases("worker-1", 3, None).await.unwrap();
        assert_eq!(page.items.len(), 3);
        assert!(page.has_more);
        assert_eq!(page.items[0].created_at, 1004);

        let rest = store
            .list_cases("worker-1", 3, page.next_cursor.as_ref())
            .await
            .unwrap();
        assert_eq!(rest.items.len(), 2);
        assert!(!rest.has_more);
    }

    #[tokio::test]
    async fn test_messages_order_by_timestamp_ascending() {
        let store = MemoryStore::new();
        let case_id = CaseId::new();
        for n in [30u64, 10, 20] {
            let mut msg = Message::user(case_id, format!("m{}", n), Sender::Anonymous);
            msg.timestamp = n;
            store.seed_message(msg);
        }

        let page = store.list_messages(case_id, 10, None).await.unwrap();
        let stamps: Vec<u64> = page.items.iter().map(|m| m.timestamp).collect();
        assert_eq!(stamps, vec![10, 20, 30]);
        assert!(!page.has_more);
    }
}
