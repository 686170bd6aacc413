//! Price Update Form
//!
//! One `PriceUpdateForm` owns one visitor's pending edits and submission
//! status. State only changes through the operations below.
//!
//! ```text
//! record_edit ──► pending edits ──► compute_change_set ──► PriceStore::append
//!                                                            │
//!                       Success ◄── clear edits ◄── Ok ──────┤
//!                       Error   ◄── keep edits  ◄── Err ─────┘
//! ```

use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::changeset::{compute_change_set, PendingEdits};
use super::error::{SubmissionError, ValidationError};
use super::input::{format_for_display, strip_non_digits, NumberLocale};
use crate::catalog::PriceCatalog;
use crate::store::{PriceStore, PriceUpdate, PriceUpdateRecord, StoredRecord, StoreError};

pub const SUCCESS_MESSAGE: &str = "¡Precios enviados correctamente!";
pub const FAILURE_MESSAGE: &str = "Error al enviar los precios. Inténtalo de nuevo.";

/// Behaviour knobs for a form instance
#[derive(Debug, Clone)]
pub struct FormConfig {
    /// How long a success message stays visible
    pub status_reset: Duration,
    /// Grouping used for display strings
    pub locale: NumberLocale,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            status_reset: Duration::from_secs(5),
            locale: NumberLocale::default(),
        }
    }
}

/// User-visible outcome of the last submission attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "lowercase")]
pub enum SubmissionStatus {
    None,
    Success(String),
    Error(String),
}

impl SubmissionStatus {
    pub fn is_none(&self) -> bool {
        matches!(self, SubmissionStatus::None)
    }
}

/// One pending edit as shown to the visitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditView {
    pub code: String,
    /// Cleaned digits as stored
    pub digits: String,
    /// Grouped for display
    pub display: String,
}

/// Read-only view of a form
#[derive(Debug, Clone, Serialize)]
pub struct FormSnapshot {
    pub edits: Vec<EditView>,
    pub status: SubmissionStatus,
    pub submitting: bool,
    pub has_changes: bool,
    /// Whether the submit control is enabled
    pub can_submit: bool,
}

struct FormState {
    pending: PendingEdits,
    /// Highest sequence number applied per code
    edit_seq: HashMap<String, u64>,
    status: SubmissionStatus,
    /// Bumped on every status change so a stale reset never clears a newer status
    status_generation: u64,
    submitting: bool,
    reset_task: Option<JoinHandle<()>>,
}

impl FormState {
    fn set_status(&mut self, status: SubmissionStatus) -> u64 {
        self.status = status;
        self.status_generation += 1;
        self.status_generation
    }

    fn cancel_reset(&mut self) {
        if let Some(task) = self.reset_task.take() {
            task.abort();
        }
    }

    fn has_changes(&self) -> bool {
        self.pending.values().any(|digits| !digits.is_empty())
    }
}

/// Collects proposed prices and submits them as one record
pub struct PriceUpdateForm {
    catalog: Arc<PriceCatalog>,
    store: Arc<dyn PriceStore>,
    config: FormConfig,
    state: Arc<RwLock<FormState>>,
}

impl PriceUpdateForm {
    pub fn new(catalog: Arc<PriceCatalog>, store: Arc<dyn PriceStore>, config: FormConfig) -> Self {
        Self {
            catalog,
            store,
            config,
            state: Arc::new(RwLock::new(FormState {
                pending: PendingEdits::new(),
                edit_seq: HashMap::new(),
                status: SubmissionStatus::None,
                status_generation: 0,
                submitting: false,
                reset_task: None,
            })),
        }
    }

    pub fn catalog(&self) -> &PriceCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    /// Store the digits of `raw` as the pending value for `code`.
    ///
    /// Replaces any earlier value; the code keeps its original position.
    /// Returns the stored digits. `code` is expected to come from the catalog.
    pub async fn record_edit(&self, code: &str, raw: &str) -> String {
        let digits = strip_non_digits(raw);
        let mut state = self.state.write().await;
        state.pending.insert(code.to_string(), digits.clone());
        digits
    }

    /// Like `record_edit`, for callers that may deliver edits out of order.
    ///
    /// `seq` must grow with every edit the caller makes to `code`. An edit
    /// whose `seq` is not above the last one applied for that code is dropped
    /// and `None` is returned.
    pub async fn record_edit_ordered(&self, code: &str, raw: &str, seq: u64) -> Option<String> {
        let digits = strip_non_digits(raw);
        let mut state = self.state.write().await;

        if state.edit_seq.get(code).is_some_and(|&last| seq <= last) {
            return None;
        }

        state.edit_seq.insert(code.to_string(), seq);
        state.pending.insert(code.to_string(), digits.clone());
        Some(digits)
    }

    /// Current pending edits, in insertion order
    pub async fn pending(&self) -> PendingEdits {
        self.state.read().await.pending.clone()
    }

    pub async fn status(&self) -> SubmissionStatus {
        self.state.read().await.status.clone()
    }

    /// Preview the updates a submission would append
    pub async fn change_set(&self) -> Result<Vec<PriceUpdate>, ValidationError> {
        let state = self.state.read().await;
        compute_change_set(&self.catalog, &state.pending)
    }

    pub async fn snapshot(&self) -> FormSnapshot {
        let state = self.state.read().await;
        let has_changes = state.has_changes();

        FormSnapshot {
            edits: state
                .pending
                .iter()
                .map(|(code, digits)| EditView {
                    code: code.clone(),
                    digits: digits.clone(),
                    display: format_for_display(digits, self.config.locale),
                })
                .collect(),
            status: state.status.clone(),
            submitting: state.submitting,
            has_changes,
            can_submit: has_changes && !state.submitting,
        }
    }

    /// Submit the current change-set as a single record.
    ///
    /// Empty change-sets and submissions made while another one is pending
    /// never reach the store. The append runs on its own task, so a caller
    /// that stops waiting cannot leave the form stuck in the submitting state.
    pub async fn submit(&self) -> Result<StoredRecord, SubmissionError> {
        let record = {
            let mut state = self.state.write().await;
            if state.submitting {
                return Err(SubmissionError::InFlight);
            }

            let updates = match compute_change_set(&self.catalog, &state.pending) {
                Ok(updates) if !updates.is_empty() => updates,
                Ok(_) => {
                    let err = ValidationError::EmptyChangeSet;
                    state.set_status(SubmissionStatus::Error(err.user_message()));
                    return Err(err.into());
                }
                Err(e) => {
                    state.set_status(SubmissionStatus::Error(e.user_message()));
                    return Err(e.into());
                }
            };

            state.cancel_reset();
            state.set_status(SubmissionStatus::None);
            state.submitting = true;
            PriceUpdateRecord::new(updates)
        };

        let store = Arc::clone(&self.store);
        let state = Arc::clone(&self.state);
        let status_reset = self.config.status_reset;

        let task = tokio::spawn(async move {
            let result = store.append(&record).await;
            finish_submission(&state, &record, store.backend(), result, status_reset).await
        });

        match task.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "Price submission task did not complete");
                let mut state = self.state.write().await;
                state.submitting = false;
                state.set_status(SubmissionStatus::Error(FAILURE_MESSAGE.to_string()));
                Err(SubmissionError::Transport(StoreError::Unavailable))
            }
        }
    }
}

impl Drop for PriceUpdateForm {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.try_write() {
            state.cancel_reset();
        }
    }
}

async fn finish_submission(
    state: &Arc<RwLock<FormState>>,
    record: &PriceUpdateRecord,
    backend: &'static str,
    result: Result<StoredRecord, StoreError>,
    status_reset: Duration,
) -> Result<StoredRecord, SubmissionError> {
    let mut guard = state.write().await;
    guard.submitting = false;

    match result {
        Ok(stored) => {
            guard.pending.clear();
            let generation = guard.set_status(SubmissionStatus::Success(SUCCESS_MESSAGE.to_string()));
            guard.reset_task = Some(schedule_status_reset(
                Arc::downgrade(state),
                generation,
                status_reset,
            ));

            tracing::info!(
                record_id = %stored.id,
                updates = stored.updates.len(),
                backend,
                "Price updates submitted"
            );
            Ok(stored)
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                updates = record.len(),
                backend,
                "Failed to submit price updates"
            );
            guard.set_status(SubmissionStatus::Error(FAILURE_MESSAGE.to_string()));
            Err(SubmissionError::Transport(e))
        }
    }
}

/// Clear the success status after `delay`, unless the status changed since
fn schedule_status_reset(
    state: Weak<RwLock<FormState>>,
    generation: u64,
    delay: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;

        let Some(state) = state.upgrade() else {
            return;
        };
        let mut state = state.write().await;
        if state.status_generation == generation {
            state.set_status(SubmissionStatus::None);
            state.reset_task = None;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use indexmap::IndexMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Notify;

    use crate::catalog::PricedItem;
    use crate::form::EMPTY_CHANGE_SET_MESSAGE;
    use crate::store::StoreResult;

    /// Counts appends; can fail on demand or hold each append until released
    #[derive(Default)]
    struct TestStore {
        calls: AtomicUsize,
        fail: AtomicBool,
        gate: Option<Arc<Notify>>,
    }

    impl TestStore {
        fn gated(gate: Arc<Notify>) -> Self {
            Self {
                gate: Some(gate),
                ..Default::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PriceStore for TestStore {
        async fn append(&self, record: &PriceUpdateRecord) -> StoreResult<StoredRecord> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(StoreError::ApiError {
                    status: 403,
                    message: "PERMISSION_DENIED".to_string(),
                });
            }
            Ok(StoredRecord {
                id: "doc-1".to_string(),
                updates: record.updates.clone(),
                submitted_at: Utc::now(),
            })
        }

        fn backend(&self) -> &'static str {
            "test"
        }
    }

    fn catalog() -> Arc<PriceCatalog> {
        let mut sections = IndexMap::new();
        sections.insert(
            "01_diagnostico".to_string(),
            vec![
                PricedItem::new("D0120", "Examen", 15000),
                PricedItem::new("D0140", "Evaluación de emergencia", 18000),
            ],
        );
        Arc::new(PriceCatalog::from_sections(sections).unwrap())
    }

    fn form_with(store: Arc<TestStore>) -> PriceUpdateForm {
        PriceUpdateForm::new(catalog(), store, FormConfig::default())
    }

    #[tokio::test]
    async fn test_record_edit_strips_and_replaces() {
        let form = form_with(Arc::new(TestStore::default()));

        assert_eq!(form.record_edit("D0140", "1a2b3").await, "123");
        form.record_edit("D0120", "9").await;
        form.record_edit("D0140", "₡ 20.000").await;

        let pending = form.pending().await;
        let entries: Vec<(&str, &str)> = pending
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(entries, vec![("D0140", "20000"), ("D0120", "9")]);
    }

    #[tokio::test]
    async fn test_ordered_edit_ignores_older_value() {
        let form = form_with(Arc::new(TestStore::default()));

        assert_eq!(form.record_edit_ordered("D0120", "12", 2).await.as_deref(), Some("12"));
        assert_eq!(form.record_edit_ordered("D0120", "1", 1).await, None);
        assert_eq!(form.record_edit_ordered("D0120", "13", 2).await, None);

        // Sequence numbers are tracked per code
        assert!(form.record_edit_ordered("D0140", "7", 1).await.is_some());

        let pending = form.pending().await;
        assert_eq!(pending.get("D0120").unwrap(), "12");
        assert_eq!(pending.get("D0140").unwrap(), "7");

        assert_eq!(form.record_edit_ordered("D0120", "123", 3).await.as_deref(), Some("123"));
        assert_eq!(form.pending().await.get("D0120").unwrap(), "123");
    }

    #[tokio::test]
    async fn test_snapshot_flags() {
        let form = form_with(Arc::new(TestStore::default()));

        let snapshot = form.snapshot().await;
        assert!(!snapshot.has_changes);
        assert!(!snapshot.can_submit);

        form.record_edit("D0120", "").await;
        assert!(!form.snapshot().await.can_submit);

        form.record_edit("D0120", "25000").await;
        let snapshot = form.snapshot().await;
        assert!(snapshot.can_submit);
        assert_eq!(snapshot.edits[0].display, "25\u{a0}000");
    }

    #[tokio::test]
    async fn test_empty_submit_makes_no_store_call() {
        let store = Arc::new(TestStore::default());
        let form = form_with(Arc::clone(&store));
        form.record_edit("D0120", "abc").await;

        let err = form.submit().await.unwrap_err();

        assert!(matches!(
            err,
            SubmissionError::Validation(ValidationError::EmptyChangeSet)
        ));
        assert_eq!(store.calls(), 0);
        assert_eq!(
            form.status().await,
            SubmissionStatus::Error(EMPTY_CHANGE_SET_MESSAGE.to_string())
        );
    }

    #[tokio::test]
    async fn test_oversized_amount_makes_no_store_call() {
        let store = Arc::new(TestStore::default());
        let form = form_with(Arc::clone(&store));
        form.record_edit("D0120", &"9".repeat(13)).await;

        let err = form.submit().await.unwrap_err();

        assert!(matches!(
            err,
            SubmissionError::Validation(ValidationError::AmountTooLarge { .. })
        ));
        assert_eq!(store.calls(), 0);
        assert_eq!(form.pending().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_clears_edits_and_status_expires() {
        let store = Arc::new(TestStore::default());
        let form = form_with(Arc::clone(&store));
        form.record_edit("D0120", "25000").await;
        form.record_edit("D0140", "").await;

        let stored = form.submit().await.unwrap();

        assert_eq!(stored.updates, vec![PriceUpdate::new("D0120", "Examen", 25000)]);
        assert_eq!(store.calls(), 1);
        assert!(form.pending().await.is_empty());
        assert_eq!(
            form.status().await,
            SubmissionStatus::Success(SUCCESS_MESSAGE.to_string())
        );

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(!form.status().await.is_none());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(form.status().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_edits_and_error_persists() {
        let store = Arc::new(TestStore::default());
        store.fail.store(true, Ordering::SeqCst);
        let form = form_with(Arc::clone(&store));
        form.record_edit("D0120", "25000").await;

        let err = form.submit().await.unwrap_err();

        assert!(matches!(err, SubmissionError::Transport(_)));
        assert_eq!(form.pending().await.get("D0120").unwrap(), "25000");

        let expected = SubmissionStatus::Error(FAILURE_MESSAGE.to_string());
        assert_eq!(form.status().await, expected);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(form.status().await, expected);
        assert!(!form.snapshot().await.submitting);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_reset_does_not_clear_later_error() {
        let store = Arc::new(TestStore::default());
        let form = form_with(Arc::clone(&store));

        form.record_edit("D0120", "25000").await;
        form.submit().await.unwrap();

        tokio::time::sleep(Duration::from_secs(2)).await;
        store.fail.store(true, Ordering::SeqCst);
        form.record_edit("D0140", "19000").await;
        form.submit().await.unwrap_err();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(
            form.status().await,
            SubmissionStatus::Error(FAILURE_MESSAGE.to_string())
        );
    }

    #[tokio::test]
    async fn test_rapid_double_submit_appends_once() {
        let gate = Arc::new(Notify::new());
        let store = Arc::new(TestStore::gated(Arc::clone(&gate)));
        let form = Arc::new(form_with(Arc::clone(&store)));
        form.record_edit("D0120", "25000").await;

        let first = {
            let form = Arc::clone(&form);
            tokio::spawn(async move { form.submit().await })
        };

        while store.calls() == 0 {
            tokio::task::yield_now().await;
        }

        let snapshot = form.snapshot().await;
        assert!(snapshot.submitting);
        assert!(!snapshot.can_submit);

        let second = form.submit().await;
        assert!(matches!(second, Err(SubmissionError::InFlight)));

        gate.notify_one();
        first.await.unwrap().unwrap();

        assert_eq!(store.calls(), 1);
        assert!(!form.snapshot().await.submitting);
    }
}
