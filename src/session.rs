//! Builder Session - Single Entry Point for Seal Configuration
//!
//! Owns the catalog state, the current selection and the displayed preview.
//! Every network operation reads a snapshot of the selection when invoked.
//! No lock is held across an await.

use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

use crate::catalog::{Attribute, CatalogState, OptionCatalog};
use crate::client::{ApiError, HttpSealApi, SealApi, SealId};
use crate::compositor::{Composition, PreviewResult};
use crate::config::ClientConfig;
use crate::hashing::selection_fingerprint;
use crate::selection::{SealSubmission, Selection};
use crate::validation::{ValidationResult, Validator};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Option catalog is not loaded")]
    CatalogNotLoaded,

    #[error("A save is already in progress")]
    SaveInProgress,

    #[error("Save failed: {0}")]
    SaveFailed(#[source] ApiError),
}

/// Source of save timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// ISO-8601 UTC with millisecond precision, e.g. `2026-10-18T09:30:00.000Z`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The preview currently on display, with the request that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewState {
    pub result: PreviewResult,
    pub ticket: u64,
    pub fingerprint: String,
}

#[derive(Debug)]
pub enum PreviewOutcome {
    /// Replaced the displayed preview.
    Applied(PreviewResult),
    /// A newer request already landed; this response was discarded.
    Superseded,
    /// The request failed; the displayed preview is unchanged.
    Failed(ApiError),
}

impl PreviewOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, PreviewOutcome::Applied(_))
    }
}

#[derive(Debug, Default)]
struct SessionState {
    catalog: CatalogState,
    selection: Selection,
    preview: Option<PreviewState>,
}

/// Clears the saving flag when the save call settles or is dropped.
struct SavingGuard<'a>(&'a AtomicBool);

impl Drop for SavingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Session {
    api: Arc<dyn SealApi>,
    clock: Arc<dyn Clock>,
    validator: Validator,
    state: Mutex<SessionState>,
    next_ticket: AtomicU64,
    saving: AtomicBool,
}

impl Session {
    pub fn new(api: Arc<dyn SealApi>) -> Self {
        Self::with_clock(api, Arc::new(SystemClock))
    }

    pub fn with_clock(api: Arc<dyn SealApi>, clock: Arc<dyn Clock>) -> Self {
        Self {
            api,
            clock,
            validator: Validator::new(),
            state: Mutex::new(SessionState::default()),
            next_ticket: AtomicU64::new(0),
            saving: AtomicBool::new(false),
        }
    }

    /// Session backed by the HTTP client.
    pub fn connect(config: ClientConfig) -> Self {
        Self::new(Arc::new(HttpSealApi::new(config)))
    }

    pub fn api(&self) -> &Arc<dyn SealApi> {
        &self.api
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // --- Option Catalog ---

    /// Fetch the catalog and seed the selection from it.
    ///
    /// Issues no request when the catalog is already loaded or loading.
    /// From `Failed` this retries.
    pub async fn load_catalog(&self) -> CatalogState {
        {
            let mut state = self.state();
            if matches!(state.catalog, CatalogState::Loaded(_) | CatalogState::Loading) {
                return state.catalog.clone();
            }
            state.catalog = CatalogState::Loading;
        }

        tracing::debug!("loading option catalog");
        let fetched = self.api.fetch_options().await;

        let mut state = self.state();
        let next = match fetched {
            Ok(catalog) => match Selection::seeded_from(&catalog) {
                Some(seeded) => {
                    tracing::info!(selection = %selection_fingerprint(&seeded), "option catalog loaded");
                    state.selection = seeded;
                    CatalogState::Loaded(catalog)
                }
                None => {
                    let reason = format!("empty option domain: {}", catalog.empty_domains().join(", "));
                    tracing::warn!(%reason, "option catalog unusable");
                    CatalogState::Failed(reason)
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "option catalog load failed");
                CatalogState::Failed(e.to_string())
            }
        };
        state.catalog = next.clone();
        next
    }

    pub fn catalog_state(&self) -> CatalogState {
        self.state().catalog.clone()
    }

    pub fn catalog(&self) -> Option<OptionCatalog> {
        self.state().catalog.catalog().cloned()
    }

    // --- Selection State ---

    /// Snapshot of the current selection.
    pub fn selection(&self) -> Selection {
        self.state().selection
    }

    /// Unconditionally replace one attribute. No validation, no network call.
    pub fn set_attribute(&self, attribute: Attribute, value: i64) {
        self.state().selection.set_attribute(attribute, value);
    }

    pub fn get_attribute(&self, attribute: Attribute) -> i64 {
        self.state().selection.get(attribute)
    }

    /// Check the current selection against the loaded catalog.
    pub fn validate_selection(&self) -> Result<ValidationResult, SessionError> {
        let state = self.state();
        let catalog = state.catalog.catalog().ok_or(SessionError::CatalogNotLoaded)?;
        Ok(self.validator.validate(&state.selection, catalog))
    }

    // --- Preview Resolver ---

    /// Resolve a preview for the current selection.
    pub async fn resolve_preview(&self) -> PreviewOutcome {
        let snapshot = self.selection();
        self.resolve_preview_for(snapshot).await
    }

    /// Resolve a preview for `selection`.
    ///
    /// On success the displayed preview is replaced whole, unless a newer
    /// request has already been applied. On failure nothing changes.
    pub async fn resolve_preview_for(&self, selection: Selection) -> PreviewOutcome {
        let ticket = self.next_ticket.fetch_add(1, Ordering::AcqRel) + 1;
        let fingerprint = selection_fingerprint(&selection);
        tracing::debug!(ticket, selection = %fingerprint, "resolving preview");

        let result = match self.api.resolve_preview(&selection).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(ticket, selection = %fingerprint, error = %e, "preview resolution failed");
                return PreviewOutcome::Failed(e);
            }
        };

        let mut state = self.state();
        if let Some(current) = &state.preview {
            if current.ticket > ticket {
                tracing::debug!(ticket, applied = current.ticket, "discarding superseded preview");
                return PreviewOutcome::Superseded;
            }
        }

        let missing = result.missing_urls();
        if !missing.is_empty() {
            tracing::debug!(ticket, ?missing, "preview layers without urls will be skipped");
        }

        state.preview = Some(PreviewState {
            result: result.clone(),
            ticket,
            fingerprint,
        });
        PreviewOutcome::Applied(result)
    }

    pub fn preview(&self) -> Option<PreviewResult> {
        self.state().preview.as_ref().map(|p| p.result.clone())
    }

    pub fn preview_state(&self) -> Option<PreviewState> {
        self.state().preview.clone()
    }

    /// Stack for the displayed preview; empty before the first success.
    pub fn composition(&self) -> Composition {
        self.state()
            .preview
            .as_ref()
            .map(|p| Composition::from_preview(&p.result))
            .unwrap_or_default()
    }

    // --- Seal Persister ---

    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }

    /// Persist the current selection.
    pub async fn save_seal(&self) -> Result<SealId, SessionError> {
        let snapshot = self.selection();
        self.save_seal_for(snapshot).await
    }

    /// Persist `selection` with a timestamp taken now.
    ///
    /// At most one save is in flight; a call made while another is
    /// outstanding returns `SaveInProgress` without sending anything.
    pub async fn save_seal_for(&self, selection: Selection) -> Result<SealId, SessionError> {
        if self
            .saving
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("save ignored: another save is in flight");
            return Err(SessionError::SaveInProgress);
        }
        let _guard = SavingGuard(&self.saving);

        let submission = SealSubmission {
            timestamp: format_timestamp(self.clock.now()),
            selection,
        };
        let fingerprint = selection_fingerprint(&selection);
        tracing::debug!(selection = %fingerprint, timestamp = %submission.timestamp, "saving seal");

        match self.api.submit_seal(&submission).await {
            Ok(id) => {
                tracing::info!(%id, selection = %fingerprint, "seal saved");
                Ok(id)
            }
            Err(e) => {
                tracing::warn!(selection = %fingerprint, error = %e, "seal save failed");
                Err(SessionError::SaveFailed(e))
            }
        }
    }

    /// Ask the server's predictor to value the current selection.
    pub async fn predict_value(&self) -> Result<f64, ApiError> {
        let snapshot = self.selection();
        self.api.predict_value(&snapshot).await
    }
}
