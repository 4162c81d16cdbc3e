use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::{
    domain::{Record, Value},
    protocol::Notification,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    Eq,
    Neq,
    Null,
    Nnull,
    Empty,
    Nempty,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    Nin,
    Contains,
}

impl Operator {
    pub fn is_unary(self) -> bool {
        matches!(
            self,
            Operator::Null | Operator::Nnull | Operator::Empty | Operator::Nempty
        )
    }

    pub fn min_values(self) -> usize {
        if self.is_unary() {
            0
        } else {
            1
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Effect {
    Hide,
    Show,
    Disable,
    Enable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    #[serde(default)]
    pub values: Vec<Value>,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: Operator, values: Vec<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            values,
        }
    }

    pub fn is_well_formed(&self) -> bool {
        self.values.len() >= self.operator.min_values()
    }
}

// Conditions are AND-ed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub effect: Effect,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Rule {
    pub fn new(effect: Effect, conditions: Vec<Condition>) -> Self {
        Self { effect, conditions }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEndpoint {
    pub method: String,
    pub path: String,
}

impl ApiEndpoint {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiRegistry(HashMap<String, ApiEndpoint>);

impl ApiRegistry {
    pub fn get(&self, action: &str) -> Option<&ApiEndpoint> {
        self.0.get(action)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, ApiEndpoint)> for ApiRegistry {
    fn from_iter<T: IntoIterator<Item = (K, ApiEndpoint)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ButtonAction {
    Api {
        action: String,
        #[serde(default)]
        confirm: Option<String>,
        #[serde(default)]
        notification: Option<Notification>,
        // off for deletes
        #[serde(default)]
        send_row: bool,
    },
    Drawer {
        drawer: String,
    },
    Navigate {
        path: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<Rule>>,
    #[serde(flatten)]
    pub kind: ElementKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementKind {
    Page {
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        elements: Vec<Element>,
    },
    Group {
        #[serde(default)]
        elements: Vec<Element>,
    },
    Table {
        #[serde(default)]
        columns: Vec<Element>,
        #[serde(default)]
        row_actions: Vec<Element>,
    },
    Form {
        #[serde(default)]
        action: Option<String>,
        #[serde(default)]
        use_active_record: bool,
        #[serde(default)]
        default_values: Option<Record>,
        #[serde(default)]
        notification: Option<Notification>,
        #[serde(default)]
        elements: Vec<Element>,
    },
    Input {
        #[serde(default)]
        format: Option<String>,
    },
    Display,
    Button {
        action: ButtonAction,
    },
}

impl ElementKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ElementKind::Page { .. } => "page",
            ElementKind::Group { .. } => "group",
            ElementKind::Table { .. } => "table",
            ElementKind::Form { .. } => "form",
            ElementKind::Input { .. } => "input",
            ElementKind::Display => "display",
            ElementKind::Button { .. } => "button",
        }
    }
}

impl Element {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            id: None,
            name: None,
            label: None,
            required: false,
            rules: None,
            kind,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn input(name: impl Into<String>) -> Self {
        Self::new(ElementKind::Input { format: None }).with_name(name)
    }

    pub fn rules(&self) -> Option<&[Rule]> {
        self.rules.as_deref()
    }

    pub fn children(&self) -> Vec<&Element> {
        match &self.kind {
            ElementKind::Page { elements, .. }
            | ElementKind::Group { elements }
            | ElementKind::Form { elements, .. } => elements.iter().collect(),
            ElementKind::Table {
                columns,
                row_actions,
            } => columns.iter().chain(row_actions.iter()).collect(),
            ElementKind::Input { .. } | ElementKind::Display | ElementKind::Button { .. } => {
                Vec::new()
            }
        }
    }

    pub fn find(&self, id: &str) -> Option<&Element> {
        if self.id.as_deref() == Some(id) {
            return Some(self);
        }
        self.children().into_iter().find_map(|child| child.find(id))
    }
}

pub fn collect_required_fields(elements: &[Element]) -> Vec<String> {
    let mut names = Vec::new();
    for element in elements {
        collect_into(element, &mut names);
    }
    names
}

fn collect_into(element: &Element, names: &mut Vec<String>) {
    if element.required {
        if let Some(name) = &element.name {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
    }
    for child in element.children() {
        collect_into(child, names);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrawerDef {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenSchema {
    pub base_url: String,
    #[serde(default)]
    pub api: ApiRegistry,
    #[serde(default)]
    pub drawers: BTreeMap<String, DrawerDef>,
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl ScreenSchema {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn find_element(&self, id: &str) -> Option<&Element> {
        self.elements
            .iter()
            .chain(self.drawers.values().flat_map(|d| d.elements.iter()))
            .find_map(|element| element.find(id))
    }
}
