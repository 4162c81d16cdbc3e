//! Explicit screen context handed to widgets instead of ambient lookups.

use std::{collections::BTreeMap, sync::Arc};

use shared::{
    domain::{Record, Value},
    error::{ApiError, ErrorCode},
    protocol::{ApiOutcome, ExecuteOptions},
    schema::{ButtonAction, DrawerDef, Element, ScreenSchema},
};
use tracing::warn;

use crate::{
    controller::ViewController,
    drawer::Drawer,
    form::{FormController, FormSpec},
    rules::{resolve, ResolvedState},
    Collaborators,
};

#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    DrawerOpened(String),
    Navigated(String),
    Executed(ApiOutcome),
    Rejected(ApiError),
}

#[derive(Clone)]
pub struct ScreenContext {
    view: Arc<ViewController>,
    drawers: Arc<BTreeMap<String, DrawerDef>>,
}

impl ScreenContext {
    pub fn new(schema: &ScreenSchema, collaborators: Collaborators) -> Self {
        let view = ViewController::from_schema(schema, Drawer::new(), collaborators);
        Self::with_view(Arc::new(view), schema.drawers.clone())
    }

    pub fn with_view(view: Arc<ViewController>, drawers: BTreeMap<String, DrawerDef>) -> Self {
        Self {
            view,
            drawers: Arc::new(drawers),
        }
    }

    pub fn view(&self) -> &Arc<ViewController> {
        &self.view
    }

    pub fn drawer(&self) -> &Drawer {
        self.view.drawer()
    }

    pub fn drawer_def(&self, name: &str) -> Option<&DrawerDef> {
        self.drawers.get(name)
    }

    /// The definition of the drawer currently open, if any.
    pub fn active_drawer(&self) -> Option<(String, &DrawerDef)> {
        let name = self.drawer().active_name()?;
        let def = self.drawers.get(&name)?;
        Some((name, def))
    }

    pub fn resolve(&self, element: &Element, record: &Record) -> ResolvedState {
        resolve(element.rules(), record)
    }

    /// Mounts a form controller for a `form` element.
    pub fn form(&self, element: &Element) -> Option<FormController> {
        let spec = FormSpec::from_element(element)?;
        Some(FormController::new(Arc::clone(&self.view), spec))
    }

    pub fn open_drawer(&self, name: &str, payload: Option<Record>) -> Result<(), ApiError> {
        if !self.drawers.contains_key(name) {
            warn!("drawer: unknown drawer name={name}");
            return Err(ApiError::new(
                ErrorCode::NotConfigured,
                format!("no drawer named '{name}'"),
            ));
        }
        self.drawer().open(name, payload);
        Ok(())
    }

    /// Hands a picker selection to the open drawer. Returns false when no
    /// drawer is open to receive it.
    pub fn confirm_picker(&self, selection: Record) -> bool {
        self.drawer().set_payload(Some(selection))
    }

    /// Runs a button or row action against `row`.
    pub async fn trigger(&self, action: &ButtonAction, row: Option<&Record>) -> TriggerOutcome {
        match action {
            ButtonAction::Drawer { drawer } => match self.open_drawer(drawer, row.cloned()) {
                Ok(()) => TriggerOutcome::DrawerOpened(drawer.clone()),
                Err(err) => TriggerOutcome::Rejected(err),
            },
            ButtonAction::Navigate { path } => {
                TriggerOutcome::Navigated(self.view.navigate(path, row))
            }
            ButtonAction::Api {
                action,
                confirm,
                notification,
                send_row,
            } => {
                let options = match row {
                    Some(row) if *send_row => ExecuteOptions::with_data(Value::Object(row.clone())),
                    _ => ExecuteOptions::default(),
                };
                let outcome = match confirm {
                    Some(message) => {
                        self.view
                            .confirm_and_execute(message, action, row, options, notification.as_ref())
                            .await
                    }
                    None => {
                        self.view
                            .execute_api(action, row, options, notification.as_ref())
                            .await
                    }
                };
                TriggerOutcome::Executed(outcome)
            }
        }
    }
}
