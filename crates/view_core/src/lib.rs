//! Interpreter for declarative screens.
//!
//! Screens are authored as data ([`shared::schema::ScreenSchema`]). This crate
//! gives that data behaviour: rule resolution for visibility/enablement, the
//! per-screen [`ViewController`] that turns symbolic actions into remote calls,
//! the single-slot [`Drawer`] and per-form [`FormController`] state machines.
//!
//! Everything outside the interpreter (transport, toasts, navigation, prompts,
//! translation) is reached through the collaborator traits below and injected
//! via [`Collaborators`].

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::protocol::{FetchRequest, FetchResponse, Toast};

pub mod context;
pub mod controller;
pub mod drawer;
pub mod form;
pub mod http;
pub mod path;
pub mod rules;

pub use context::{ScreenContext, TriggerOutcome};
pub use controller::{resolve_action, CachedList, ListCache, ViewController};
pub use drawer::{Drawer, DrawerState};
pub use form::{FormController, FormPhase, FormSpec, FormState, SubmitOutcome};
pub use http::{FetchError, HttpFetcher};
pub use path::{interpolate, join_url};
pub use rules::{resolve, ResolvedState};

/// Performs one remote call. An `Err` is a rejected fetch.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, request: FetchRequest) -> Result<FetchResponse>;
}

pub struct MissingFetcher;

#[async_trait]
impl Fetcher for MissingFetcher {
    async fn fetch(&self, url: &str, _request: FetchRequest) -> Result<FetchResponse> {
        Err(anyhow!("no fetch backend configured for {url}"))
    }
}

pub trait Notifier: Send + Sync {
    fn toast(&self, toast: Toast);
}

pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn toast(&self, _toast: Toast) {}
}

/// Fire-and-forget route change.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate(&self, path: &str) {
        tracing::debug!("view: navigation ignored path={path}");
    }
}

/// Asks the user to approve a destructive step.
#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, message: &str) -> bool;
}

/// Approves every prompt.
pub struct AutoConfirm;

#[async_trait]
impl Confirmer for AutoConfirm {
    async fn confirm(&self, _message: &str) -> bool {
        true
    }
}

pub trait Translator: Send + Sync {
    fn translate(&self, text: &str) -> String;
}

pub struct IdentityTranslator;

impl Translator for IdentityTranslator {
    fn translate(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Host services a screen talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub fetcher: Arc<dyn Fetcher>,
    pub notifier: Arc<dyn Notifier>,
    pub navigator: Arc<dyn Navigator>,
    pub confirmer: Arc<dyn Confirmer>,
    pub translator: Arc<dyn Translator>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            fetcher: Arc::new(MissingFetcher),
            notifier: Arc::new(SilentNotifier),
            navigator: Arc::new(NoopNavigator),
            confirmer: Arc::new(AutoConfirm),
            translator: Arc::new(IdentityTranslator),
        }
    }
}

impl Collaborators {
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    pub fn with_confirmer(mut self, confirmer: Arc<dyn Confirmer>) -> Self {
        self.confirmer = confirmer;
        self
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }
}

#[cfg(test)]
pub(crate) mod testing;
