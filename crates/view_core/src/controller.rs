//! Per-screen orchestration: symbolic action to endpoint, remote execution,
//! record hand-off to the drawer, list cache invalidation and toasts.

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use shared::{
    domain::{has_identity, Record, Value},
    error::{ApiError, ErrorCode},
    protocol::{ApiOutcome, ExecuteOptions, FetchRequest, Notification, Toast, ToastKind},
    schema::{ApiEndpoint, ApiRegistry, ScreenSchema},
};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::{
    drawer::Drawer,
    path::{interpolate, join_url},
    Collaborators,
};

pub const SAVE_ACTION: &str = "save";
pub const CREATE_ACTION: &str = "create";
pub const UPDATE_ACTION: &str = "update";
pub const INDEX_ACTION: &str = "index";

/// `save` becomes `update` for a persisted item and `create` otherwise.
/// Other names pass through.
pub fn resolve_action<'a>(action: &'a str, item: Option<&Record>) -> &'a str {
    if action != SAVE_ACTION {
        return action;
    }
    if has_identity(item) {
        UPDATE_ACTION
    } else {
        CREATE_ACTION
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CachedList {
    pub data: Value,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct ListCache {
    entries: RwLock<HashMap<String, CachedList>>,
}

impl ListCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> Option<CachedList> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn store(&self, key: impl Into<String>, data: Value) {
        self.entries.write().await.insert(
            key.into(),
            CachedList {
                data,
                fetched_at: Utc::now(),
            },
        );
    }

    /// Drops `base_url` and any query variant of it. Returns how many entries
    /// were removed.
    pub async fn invalidate(&self, base_url: &str) -> usize {
        let query_prefix = format!("{base_url}?");
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| key != base_url && !key.starts_with(&query_prefix));
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

pub struct ViewController {
    base_url: String,
    registry: ApiRegistry,
    drawer: Drawer,
    cache: Arc<ListCache>,
    collaborators: Collaborators,
}

impl ViewController {
    pub fn new(
        base_url: impl Into<String>,
        registry: ApiRegistry,
        drawer: Drawer,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            registry,
            drawer,
            cache: Arc::new(ListCache::new()),
            collaborators,
        }
    }

    pub fn from_schema(schema: &ScreenSchema, drawer: Drawer, collaborators: Collaborators) -> Self {
        Self::new(
            schema.base_url.clone(),
            schema.api.clone(),
            drawer,
            collaborators,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn drawer(&self) -> &Drawer {
        &self.drawer
    }

    pub fn cache(&self) -> &Arc<ListCache> {
        &self.cache
    }

    pub fn translate(&self, text: &str) -> String {
        self.collaborators.translator.translate(text)
    }

    pub fn endpoint_for(
        &self,
        action: &str,
        item: Option<&Record>,
    ) -> Result<(ApiEndpoint, String), ApiError> {
        let resolved = resolve_action(action, item);
        let endpoint = self
            .registry
            .get(resolved)
            .ok_or_else(|| ApiError::not_configured(resolved))?;
        let url = join_url(&self.base_url, &interpolate(&endpoint.path, item));
        Ok((endpoint.clone(), url))
    }

    /// Runs `action` against the screen's API. Never fails: errors come back
    /// inside the outcome.
    pub async fn execute_api(
        &self,
        action: &str,
        item: Option<&Record>,
        options: ExecuteOptions,
        notification: Option<&Notification>,
    ) -> ApiOutcome {
        let (endpoint, url) = match self.endpoint_for(action, item) {
            Ok(found) => found,
            Err(err) => {
                warn!(
                    "view: action not configured action={action} base_url={} reason={}",
                    self.base_url, err.message
                );
                self.notify_error(notification);
                return ApiOutcome::failed(err);
            }
        };

        let request = FetchRequest {
            method: endpoint.method.clone(),
            body: options.data,
        };

        match self.collaborators.fetcher.fetch(&url, request).await {
            Ok(response) => {
                if let Some(record) = response.record() {
                    self.drawer.set_payload(Some(record.clone()));
                }
                let dropped = self.cache.invalidate(&self.base_url).await;
                info!(
                    "view: executed action={action} method={} url={url} invalidated={dropped}",
                    endpoint.method
                );
                if let Some(text) = notification.and_then(|n| n.success.as_deref()) {
                    self.toast(ToastKind::Success, text);
                }
                ApiOutcome::ok(response.data)
            }
            Err(err) => {
                error!(
                    "view: remote call failed action={action} method={} url={url} error={err:#}",
                    endpoint.method
                );
                self.notify_error(notification);
                ApiOutcome::failed(ApiError::new(ErrorCode::Remote, format!("{err:#}")))
            }
        }
    }

    pub async fn confirm_and_execute(
        &self,
        message: &str,
        action: &str,
        item: Option<&Record>,
        options: ExecuteOptions,
        notification: Option<&Notification>,
    ) -> ApiOutcome {
        let prompt = self.translate(message);
        if !self.collaborators.confirmer.confirm(&prompt).await {
            debug!("view: confirmation declined action={action}");
            return ApiOutcome::failed(ApiError::new(
                ErrorCode::Cancelled,
                format!("action '{action}' was not confirmed"),
            ));
        }
        self.execute_api(action, item, options, notification).await
    }

    pub async fn fetch_list(&self) -> ApiOutcome {
        if let Some(hit) = self.cache.get(&self.base_url).await {
            debug!(
                "view: list cache hit base_url={} fetched_at={}",
                self.base_url, hit.fetched_at
            );
            return ApiOutcome::ok(Some(hit.data));
        }

        let (endpoint, url) = match self.endpoint_for(INDEX_ACTION, None) {
            Ok(found) => found,
            Err(err) => {
                warn!("view: list not configured base_url={}", self.base_url);
                return ApiOutcome::failed(err);
            }
        };

        let request = FetchRequest {
            method: endpoint.method,
            body: None,
        };
        match self.collaborators.fetcher.fetch(&url, request).await {
            Ok(response) => {
                let data = response.data.unwrap_or_else(|| Value::Array(Vec::new()));
                self.cache.store(self.base_url.clone(), data.clone()).await;
                ApiOutcome::ok(Some(data))
            }
            Err(err) => {
                error!("view: list fetch failed url={url} error={err:#}");
                ApiOutcome::failed(ApiError::new(ErrorCode::Remote, format!("{err:#}")))
            }
        }
    }

    pub fn navigate(&self, template: &str, item: Option<&Record>) -> String {
        let path = interpolate(template, item);
        info!("view: navigate path={path}");
        self.collaborators.navigator.navigate(&path);
        path
    }

    fn notify_error(&self, notification: Option<&Notification>) {
        if let Some(text) = notification.and_then(|n| n.error.as_deref()) {
            self.toast(ToastKind::Error, text);
        }
    }

    fn toast(&self, kind: ToastKind, text: &str) {
        self.collaborators.notifier.toast(Toast {
            kind,
            message: self.translate(text),
        });
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
