//! Per-form state: values, errors, touched flags, dirty tracking and submit.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use shared::{
    domain::{Record, Value},
    error::{ApiError, ErrorCode},
    protocol::{ApiOutcome, ExecuteOptions, Notification},
    schema::{collect_required_fields, Element, ElementKind},
};
use tracing::{debug, warn};

use crate::controller::{ViewController, SAVE_ACTION};

pub const REQUIRED_MESSAGE: &str = "This field is required";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormSpec {
    pub action: Option<String>,
    pub use_active_record: bool,
    pub default_values: Option<Record>,
    pub notification: Option<Notification>,
    pub required_fields: Vec<String>,
}

impl FormSpec {
    pub fn from_element(element: &Element) -> Option<Self> {
        let ElementKind::Form {
            action,
            use_active_record,
            default_values,
            notification,
            elements,
        } = &element.kind
        else {
            return None;
        };
        Some(Self {
            action: action.clone(),
            use_active_record: *use_active_record,
            default_values: default_values.clone(),
            notification: notification.clone(),
            required_fields: collect_required_fields(elements),
        })
    }

    pub fn action(&self) -> &str {
        self.action.as_deref().unwrap_or(SAVE_ACTION)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    pub values: Record,
    pub errors: BTreeMap<String, String>,
    pub touched: BTreeMap<String, bool>,
    pub is_submitting: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    Pristine,
    Editing,
    Submitting,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Required fields were missing; nothing was sent.
    Invalid(Vec<String>),
    /// A submission was already in flight; nothing was sent.
    Busy,
    Completed(ApiOutcome),
}

impl SubmitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmitOutcome::Completed(outcome) if outcome.success)
    }

    pub fn into_outcome(self) -> ApiOutcome {
        match self {
            SubmitOutcome::Completed(outcome) => outcome,
            SubmitOutcome::Busy => ApiOutcome::failed(ApiError::new(
                ErrorCode::Busy,
                "a submission is already in progress",
            )),
            SubmitOutcome::Invalid(fields) => ApiOutcome::failed(ApiError::new(
                ErrorCode::Validation,
                format!("required fields missing: {}", fields.join(", ")),
            )),
        }
    }
}

#[derive(Debug)]
struct FormInner {
    state: FormState,
    snapshot: Record,
    seed: Record,
}

impl FormInner {
    fn reseed(&mut self, seed: Record) {
        self.state = FormState {
            values: seed.clone(),
            ..FormState::default()
        };
        self.snapshot = seed.clone();
        self.seed = seed;
    }
}

/// Clears the submitting flag however the submit future ends.
struct SubmittingGuard<'a> {
    inner: &'a Mutex<FormInner>,
}

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .state
            .is_submitting = false;
    }
}

pub struct FormController {
    spec: FormSpec,
    view: Arc<ViewController>,
    inner: Mutex<FormInner>,
}

impl FormController {
    pub fn new(view: Arc<ViewController>, spec: FormSpec) -> Self {
        let seed = seed_for(&spec, &view);
        let mut inner = FormInner {
            state: FormState::default(),
            snapshot: Record::new(),
            seed: Record::new(),
        };
        inner.reseed(seed);
        Self {
            spec,
            view,
            inner: Mutex::new(inner),
        }
    }

    fn lock_raw(&self) -> MutexGuard<'_, FormInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks the form after catching it up with its seed. An in-flight
    /// submit keeps its values until it completes.
    fn lock(&self) -> MutexGuard<'_, FormInner> {
        let seed = seed_for(&self.spec, &self.view);
        let mut inner = self.lock_raw();
        if !inner.state.is_submitting && inner.seed != seed {
            debug!("form: seed changed, resetting values");
            inner.reseed(seed);
        }
        inner
    }

    pub fn state(&self) -> FormState {
        self.lock().state.clone()
    }

    pub fn values(&self) -> Record {
        self.lock().state.values.clone()
    }

    pub fn value(&self, name: &str) -> Option<Value> {
        self.lock().state.values.get(name).cloned()
    }

    pub fn set_value(&self, name: &str, value: Value) {
        let mut inner = self.lock();
        inner.state.values.insert(name.to_string(), value);
        inner.state.errors.remove(name);
    }

    pub fn set_touched(&self, name: &str) {
        self.lock().state.touched.insert(name.to_string(), true);
    }

    pub fn is_touched(&self, name: &str) -> bool {
        self.lock().state.touched.get(name).copied().unwrap_or(false)
    }

    pub fn error(&self, name: &str) -> Option<String> {
        self.lock().state.errors.get(name).cloned()
    }

    /// The error to display for `name`; untouched fields show none.
    pub fn visible_error(&self, name: &str) -> Option<String> {
        let inner = self.lock();
        if !inner.state.touched.get(name).copied().unwrap_or(false) {
            return None;
        }
        inner.state.errors.get(name).cloned()
    }

    pub fn is_submitting(&self) -> bool {
        self.lock().state.is_submitting
    }

    pub fn is_dirty(&self) -> bool {
        let inner = self.lock();
        serde_json::to_string(&inner.state.values).ok() != serde_json::to_string(&inner.snapshot).ok()
    }

    pub fn phase(&self) -> FormPhase {
        let inner = self.lock();
        if inner.state.is_submitting {
            return FormPhase::Submitting;
        }
        let touched = inner.state.touched.values().any(|t| *t);
        let dirty = serde_json::to_string(&inner.state.values).ok()
            != serde_json::to_string(&inner.snapshot).ok();
        if touched || dirty {
            FormPhase::Editing
        } else {
            FormPhase::Pristine
        }
    }

    /// Checks required fields, recording an error and a touch for each one
    /// missing. Returns the missing field names.
    pub fn validate(&self) -> Vec<String> {
        let mut inner = self.lock();
        self.validate_locked(&mut inner)
    }

    fn validate_locked(&self, inner: &mut FormInner) -> Vec<String> {
        let missing: Vec<String> = self
            .spec
            .required_fields
            .iter()
            .filter(|name| is_blank(inner.state.values.get(name.as_str())))
            .cloned()
            .collect();

        if !missing.is_empty() {
            let message = self.view.translate(REQUIRED_MESSAGE);
            for name in &missing {
                inner.state.errors.insert(name.clone(), message.clone());
                inner.state.touched.insert(name.clone(), true);
            }
        }
        missing
    }

    pub async fn submit(&self) -> SubmitOutcome {
        let values = {
            let mut inner = self.lock();
            if inner.state.is_submitting {
                warn!("form: submit rejected while in flight action={}", self.spec.action());
                return SubmitOutcome::Busy;
            }
            let missing = self.validate_locked(&mut inner);
            if !missing.is_empty() {
                debug!("form: validation failed fields={}", missing.join(","));
                return SubmitOutcome::Invalid(missing);
            }
            inner.state.is_submitting = true;
            inner.state.values.clone()
        };

        let outcome = {
            let _guard = SubmittingGuard { inner: &self.inner };
            let item = if self.spec.use_active_record {
                self.view.drawer().payload()
            } else {
                Some(values.clone())
            };
            self.view
                .execute_api(
                    self.spec.action(),
                    item.as_ref(),
                    ExecuteOptions::with_data(Value::Object(values)),
                    self.spec.notification.as_ref(),
                )
                .await
        };

        if outcome.success && self.spec.use_active_record {
            self.refresh_seed();
        }
        SubmitOutcome::Completed(outcome)
    }

    /// Re-reads the seed and, if it changed, resets the form to it.
    /// Returns whether a reset happened.
    pub fn refresh_seed(&self) -> bool {
        let seed = seed_for(&self.spec, &self.view);
        let mut inner = self.lock_raw();
        if inner.state.is_submitting || inner.seed == seed {
            return false;
        }
        debug!("form: seed changed, resetting values");
        inner.reseed(seed);
        true
    }
}

fn seed_for(spec: &FormSpec, view: &ViewController) -> Record {
    if spec.use_active_record {
        if let Some(payload) = view.drawer().payload() {
            return payload;
        }
    }
    spec.default_values.clone().unwrap_or_default()
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
