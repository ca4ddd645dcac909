//! # Form Binding
//!
//! A [`Form`] edits a private [`Draft`] of a record and commits it in one step.
//!
//! ```text
//!   Idle ──set_field──► Editing ◄──────────────┐
//!                         │  ▲                 │
//!                  submit │  │ field errors    │ set_field
//!                         ▼  │                 │
//!                     Validating               │
//!                         │                    │
//!                         ▼                    │
//!                     Submitting ──failure──► Error
//!                         │
//!                         ▼ success
//!                     Submitted
//! ```
//!
//! Nothing reaches the store while editing. On submit the edited fields become a [`Patch`],
//! the injected [`FormSubmit`] collaborator is awaited, and only when it succeeds is the
//! patch merged into the bound record. A failed submit keeps the draft so the user can
//! retry. Discarding the form, or dropping the `submit` future before it resolves,
//! leaves the store untouched.

use crate::error::{FormError, SubmitError};
use crate::key::RecordKey;
use crate::store::RecordStore;
use crate::value::{Draft, Fields, Patch};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Field id → error message.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Idle,
    Editing,
    Validating,
    Submitting,
    Error,
    Submitted,
}

impl Display for FormState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FormState::Idle => "idle",
            FormState::Editing => "editing",
            FormState::Validating => "validating",
            FormState::Submitting => "submitting",
            FormState::Error => "error",
            FormState::Submitted => "submitted",
        };
        f.write_str(name)
    }
}

/// Field-level validation collaborator.
pub trait Validator: Send + Sync {
    fn validate(&self, values: &Draft) -> FieldErrors;
}

impl<F> Validator for F
where
    F: Fn(&Draft) -> FieldErrors + Send + Sync,
{
    fn validate(&self, values: &Draft) -> FieldErrors {
        self(values)
    }
}

/// Remote persistence collaborator awaited on submit.
#[async_trait]
pub trait FormSubmit: Send + Sync {
    async fn submit(&self, patch: Patch) -> Result<(), SubmitError>;
}

/// Adapts an async closure into a [`FormSubmit`].
pub struct SubmitFn<F>(F);

/// Wraps `f` so it can be handed to [`Form::new`].
pub fn submit_fn<F, Fut>(f: F) -> SubmitFn<F>
where
    F: Fn(Patch) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), SubmitError>> + Send + 'static,
{
    SubmitFn(f)
}

#[async_trait]
impl<F, Fut> FormSubmit for SubmitFn<F>
where
    F: Fn(Patch) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), SubmitError>> + Send + 'static,
{
    async fn submit(&self, patch: Patch) -> Result<(), SubmitError> {
        (self.0)(patch).await
    }
}

/// Collaborator for forms whose only effect is the local commit.
pub struct CommitLocally;

#[async_trait]
impl FormSubmit for CommitLocally {
    async fn submit(&self, _patch: Patch) -> Result<(), SubmitError> {
        Ok(())
    }
}

/// What the UI needs to render one input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldState {
    /// The user changed the field (or tried to submit).
    pub touched: bool,
    /// Draft value differs from the value the draft started with.
    pub dirty: bool,
    /// A submit carrying this field is in flight.
    pub pending: bool,
    pub error: Option<String>,
}

/// A form editing one record (or, unbound, producing a patch for the submitter only).
pub struct Form {
    id: String,
    store: RecordStore,
    target: Option<RecordKey>,
    inputs: Option<BTreeSet<String>>,
    defaults: Fields,
    validator: Option<Arc<dyn Validator>>,
    submitter: Arc<dyn FormSubmit>,
    state: FormState,
    draft: Option<Draft>,
    baseline: Fields,
    touched: BTreeSet<String>,
    errors: FieldErrors,
    submit_error: Option<SubmitError>,
}

impl Form {
    pub fn new(id: impl Into<String>, store: &RecordStore, submitter: impl FormSubmit + 'static) -> Self {
        Self {
            id: id.into(),
            store: store.clone(),
            target: None,
            inputs: None,
            defaults: Fields::new(),
            validator: None,
            submitter: Arc::new(submitter),
            state: FormState::Idle,
            draft: None,
            baseline: Fields::new(),
            touched: BTreeSet::new(),
            errors: FieldErrors::new(),
            submit_error: None,
        }
    }

    /// Record the draft starts from and the patch is merged into.
    pub fn bound_to(mut self, key: RecordKey) -> Self {
        self.target = Some(key);
        self
    }

    /// Restricts the draft to these input ids.
    pub fn with_inputs<I, S>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs = Some(inputs.into_iter().map(Into::into).collect());
        self
    }

    /// Values used for fields the bound record doesn't have.
    pub fn with_defaults(mut self, defaults: Fields) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    /// Current draft; `None` until the first edit.
    pub fn values(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    /// Errors of touched fields.
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn submit_error(&self) -> Option<&SubmitError> {
        self.submit_error.as_ref()
    }

    pub fn field_state(&self, field: &str) -> FieldState {
        let value = self.draft.as_ref().and_then(|draft| draft.get(field));
        FieldState {
            touched: self.touched.contains(field),
            dirty: value.is_some() && value != self.baseline.get(field),
            pending: self.state == FormState::Submitting,
            error: self.errors.get(field).cloned(),
        }
    }

    /// Updates one input and re-validates it.
    pub fn set_field(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        let field = field.into();
        self.ensure_draft();
        self.state = FormState::Validating;
        self.submit_error = None;
        if let Some(draft) = self.draft.as_mut() {
            draft.set(field.clone(), value.into());
        }
        self.touched.insert(field.clone());
        let errors = self.run_validator();
        self.errors = errors
            .into_iter()
            .filter(|(name, _)| self.touched.contains(name))
            .collect();
        self.state = FormState::Editing;
        debug!(form = %self.id, %field, error = ?self.errors.get(&field), "Field changed");
    }

    /// Validates every field, marking all of them touched.
    pub fn validate(&mut self) -> &FieldErrors {
        self.ensure_draft();
        let previous = self.state;
        self.state = FormState::Validating;
        let errors = self.run_validator();
        if let Some(draft) = &self.draft {
            self.touched.extend(draft.fields().keys().cloned());
        }
        self.touched.extend(errors.keys().cloned());
        self.errors = errors;
        self.state = match previous {
            FormState::Error => FormState::Error,
            _ => FormState::Editing,
        };
        &self.errors
    }

    /// Validates, hands the patch to the submitter, and commits it on success.
    #[instrument(skip(self), fields(form = %self.id))]
    pub async fn submit(&mut self) -> Result<(), FormError> {
        if self.state == FormState::Submitted {
            return Err(FormError::InvalidState {
                action: "submit",
                state: self.state,
            });
        }
        self.validate();
        if !self.errors.is_empty() {
            self.state = FormState::Editing;
            warn!(errors = ?self.errors, "Submit blocked by validation");
            return Err(FormError::Validation(self.errors.clone()));
        }

        // Edited fields only; the rest of the record may have changed since the first edit.
        let patch = self
            .draft
            .as_ref()
            .map(|draft| draft.changes_from(&self.baseline))
            .unwrap_or_default();
        self.state = FormState::Submitting;
        self.submit_error = None;
        debug!(?patch, "Submitting");

        if let Err(e) = self.submitter.submit(patch.clone()).await {
            warn!(error = %e, "Submit failed");
            self.state = FormState::Error;
            self.submit_error = Some(e.clone());
            return Err(FormError::Submit(e));
        }

        if let Some(key) = &self.target {
            if let Err(e) = self.store.merge(key, &patch) {
                warn!(%key, error = %e, "Commit rejected");
                self.state = FormState::Error;
                self.submit_error = Some(SubmitError::new(e.to_string()));
                return Err(FormError::Store(e));
            }
        }

        info!(key = ?self.target.as_ref().map(ToString::to_string), fields = patch.fields().len(), "Submitted");
        self.state = FormState::Submitted;
        self.draft = None;
        self.baseline.clear();
        self.touched.clear();
        Ok(())
    }

    /// Drops the draft without touching the store.
    pub fn discard(self) {
        debug!(form = %self.id, state = %self.state, "Discarded");
    }

    fn ensure_draft(&mut self) {
        if self.draft.is_some() && self.state != FormState::Submitted {
            return;
        }
        let mut fields = self.defaults.clone();
        if let Some(Value::Object(record)) = self.target.as_ref().and_then(|key| self.store.get(key)) {
            fields.extend(record);
        }
        if let Some(inputs) = &self.inputs {
            fields.retain(|name, _| inputs.contains(name));
        }
        self.baseline = fields.clone();
        self.draft = Some(Draft::new(fields));
        self.touched.clear();
        self.errors.clear();
        self.state = FormState::Editing;
    }

    fn run_validator(&self) -> FieldErrors {
        match (&self.validator, &self.draft) {
            (Some(validator), Some(draft)) => validator.validate(draft),
            _ => FieldErrors::new(),
        }
    }
}
