//! Single-slot side panel state shared by every panel-aware widget on a screen.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shared::domain::Record;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawerState {
    pub active_name: Option<String>,
    pub payload: Option<Record>,
}

impl DrawerState {
    pub fn is_open(&self) -> bool {
        self.active_name.is_some()
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.active_name.as_deref() == Some(name)
    }
}

/// Cloneable handle; clones observe the same drawer.
#[derive(Debug, Clone, Default)]
pub struct Drawer {
    inner: Arc<Mutex<DrawerState>>,
}

impl Drawer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, DrawerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Opens `name`, replacing whatever panel was open.
    pub fn open(&self, name: impl Into<String>, payload: Option<Record>) {
        let name = name.into();
        debug!("drawer: open name={name} payload={}", payload.is_some());
        *self.lock() = DrawerState {
            active_name: Some(name),
            payload,
        };
    }

    pub fn close(&self) {
        debug!("drawer: close");
        *self.lock() = DrawerState::default();
    }

    /// Replaces the payload without changing which panel is open. A closed
    /// drawer holds no payload, so the call is ignored and returns false.
    pub fn set_payload(&self, payload: Option<Record>) -> bool {
        let mut state = self.lock();
        if !state.is_open() {
            debug!("drawer: set_payload ignored while closed");
            return false;
        }
        state.payload = payload;
        true
    }

    pub fn snapshot(&self) -> DrawerState {
        self.lock().clone()
    }

    pub fn active_name(&self) -> Option<String> {
        self.lock().active_name.clone()
    }

    pub fn payload(&self) -> Option<Record> {
        self.lock().payload.clone()
    }

    pub fn is_open(&self) -> bool {
        self.lock().is_open()
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.lock().is_active(name)
    }
}
