//! Recording fakes for the collaborator traits.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::protocol::{FetchRequest, FetchResponse, Toast};
use tokio::sync::Notify;

use crate::{Collaborators, Confirmer, Fetcher, Navigator, Notifier, Translator};

#[derive(Default)]
pub struct RecordingFetcher {
    pub calls: Mutex<Vec<(String, FetchRequest)>>,
    responses: Mutex<VecDeque<Result<FetchResponse, String>>>,
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl RecordingFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call signals `started` and then waits for `release`.
    pub fn gated(started: Arc<Notify>, release: Arc<Notify>) -> Self {
        Self {
            gate: Some((started, release)),
            ..Self::default()
        }
    }

    pub fn respond(&self, response: FetchResponse) {
        self.responses
            .lock()
            .expect("responses")
            .push_back(Ok(response));
    }

    pub fn fail(&self, message: &str) {
        self.responses
            .lock()
            .expect("responses")
            .push_back(Err(message.to_string()));
    }

    pub fn calls(&self) -> Vec<(String, FetchRequest)> {
        self.calls.lock().expect("calls").clone()
    }
}

#[async_trait]
impl Fetcher for RecordingFetcher {
    async fn fetch(&self, url: &str, request: FetchRequest) -> Result<FetchResponse> {
        self.calls
            .lock()
            .expect("calls")
            .push((url.to_string(), request));
        if let Some((started, release)) = &self.gate {
            started.notify_one();
            release.notified().await;
        }
        let next = self.responses.lock().expect("responses").pop_front();
        match next {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Ok(FetchResponse::empty()),
        }
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub toasts: Mutex<Vec<Toast>>,
}

impl RecordingNotifier {
    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().expect("toasts").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn toast(&self, toast: Toast) {
        self.toasts.lock().expect("toasts").push(toast);
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    pub paths: Mutex<Vec<String>>,
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        self.paths.lock().expect("paths").push(path.to_string());
    }
}

pub struct ScriptedConfirmer {
    pub answer: bool,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedConfirmer {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Confirmer for ScriptedConfirmer {
    async fn confirm(&self, message: &str) -> bool {
        self.prompts
            .lock()
            .expect("prompts")
            .push(message.to_string());
        self.answer
    }
}

/// Marks translated text so tests can tell it went through translation.
pub struct BracketTranslator;

impl Translator for BracketTranslator {
    fn translate(&self, text: &str) -> String {
        format!("[{text}]")
    }
}

pub struct Harness {
    pub fetcher: Arc<RecordingFetcher>,
    pub notifier: Arc<RecordingNotifier>,
    pub navigator: Arc<RecordingNavigator>,
    pub confirmer: Arc<ScriptedConfirmer>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_fetcher(RecordingFetcher::new())
    }

    pub fn with_fetcher(fetcher: RecordingFetcher) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            notifier: Arc::new(RecordingNotifier::default()),
            navigator: Arc::new(RecordingNavigator::default()),
            confirmer: Arc::new(ScriptedConfirmer::answering(true)),
        }
    }

    pub fn declining(mut self) -> Self {
        self.confirmer = Arc::new(ScriptedConfirmer::answering(false));
        self
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators::default()
            .with_fetcher(self.fetcher.clone())
            .with_notifier(self.notifier.clone())
            .with_navigator(self.navigator.clone())
            .with_confirmer(self.confirmer.clone())
            .with_translator(Arc::new(BracketTranslator))
    }
}
