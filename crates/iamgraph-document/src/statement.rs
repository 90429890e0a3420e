//! Statement classification
//!
//! A statement selects resources through `Resource` or `NotResource` and
//! actions through `Action` or `NotAction`. Each axis may be written as a
//! scalar or as a list; both are normalized to sequences here. When a
//! statement carries both keys of one axis, the positive key wins.
//!
//! The four combinations map onto [`StatementShape`]; [`Statement::grants`]
//! expands a statement into the full resource × action cross product.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key of the positive resource selector
pub const RESOURCE_KEY: &str = "Resource";
/// Key of the negative resource selector
pub const NOT_RESOURCE_KEY: &str = "NotResource";
/// Key of the positive action selector
pub const ACTION_KEY: &str = "Action";
/// Key of the negative action selector
pub const NOT_ACTION_KEY: &str = "NotAction";

/// Whether a selector lists what is covered or what is excluded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarity {
    /// `Resource` / `Action`
    Positive,
    /// `NotResource` / `NotAction`
    Negative,
}

impl Polarity {
    /// Check if negative
    #[inline]
    #[must_use]
    pub fn is_negative(self) -> bool {
        matches!(self, Self::Negative)
    }
}

/// The four mutually exclusive statement shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementShape {
    /// `Resource` + `Action`
    ResourceAction,
    /// `NotResource` + `Action`
    NotResourceAction,
    /// `NotResource` + `NotAction`
    NotResourceNotAction,
    /// `Resource` + `NotAction`
    ResourceNotAction,
}

impl StatementShape {
    /// Shape for the given axis polarities
    #[must_use]
    pub fn from_polarities(resource: Polarity, action: Polarity) -> Self {
        match (resource, action) {
            (Polarity::Positive, Polarity::Positive) => Self::ResourceAction,
            (Polarity::Negative, Polarity::Positive) => Self::NotResourceAction,
            (Polarity::Negative, Polarity::Negative) => Self::NotResourceNotAction,
            (Polarity::Positive, Polarity::Negative) => Self::ResourceNotAction,
        }
    }

    /// Polarity of the resource axis
    #[must_use]
    pub fn resource_polarity(self) -> Polarity {
        match self {
            Self::ResourceAction | Self::ResourceNotAction => Polarity::Positive,
            Self::NotResourceAction | Self::NotResourceNotAction => Polarity::Negative,
        }
    }

    /// Polarity of the action axis
    #[must_use]
    pub fn action_polarity(self) -> Polarity {
        match self {
            Self::ResourceAction | Self::NotResourceAction => Polarity::Positive,
            Self::NotResourceNotAction | Self::ResourceNotAction => Polarity::Negative,
        }
    }

    /// Both axes positive
    #[must_use]
    pub fn is_plain_grant(self) -> bool {
        matches!(self, Self::ResourceAction)
    }
}

/// One normalized selector axis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Axis {
    /// Positive or negative selector
    pub polarity: Polarity,
    /// Selected values, always a sequence
    pub values: Vec<String>,
}

impl Axis {
    fn resolve(body: &Map<String, Value>, positive: &str, negative: &str) -> Option<Self> {
        if let Some(value) = body.get(positive) {
            Some(Self {
                polarity: Polarity::Positive,
                values: sequence_of(value),
            })
        } else {
            body.get(negative).map(|value| Self {
                polarity: Polarity::Negative,
                values: sequence_of(value),
            })
        }
    }
}

/// One (resource, action) pairing produced by a statement
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grant {
    /// Resource or NotResource value
    pub resource: String,
    /// Action or NotAction value
    pub action: String,
    /// Shape of the statement the pairing came from
    pub shape: StatementShape,
}

impl Grant {
    /// Resource value is a `NotResource` entry
    #[inline]
    #[must_use]
    pub fn is_negative_resource(&self) -> bool {
        self.shape.resource_polarity().is_negative()
    }

    /// Action value is a `NotAction` entry
    #[inline]
    #[must_use]
    pub fn is_negative_action(&self) -> bool {
        self.shape.action_polarity().is_negative()
    }
}

/// A classified statement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statement {
    resources: Option<Axis>,
    actions: Option<Axis>,
}

impl Statement {
    /// Classify one statement value
    ///
    /// Values that are not objects carry no selectors and classify to an
    /// empty statement.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Some(body) = value.as_object() else {
            tracing::debug!("ignoring non-object statement: {}", value);
            return Self::default();
        };

        Self {
            resources: Axis::resolve(body, RESOURCE_KEY, NOT_RESOURCE_KEY),
            actions: Axis::resolve(body, ACTION_KEY, NOT_ACTION_KEY),
        }
    }

    /// Resource axis, if the statement declares one
    #[inline]
    #[must_use]
    pub fn resource_axis(&self) -> Option<&Axis> {
        self.resources.as_ref()
    }

    /// Action axis, if the statement declares one
    #[inline]
    #[must_use]
    pub fn action_axis(&self) -> Option<&Axis> {
        self.actions.as_ref()
    }

    /// Shape, when both axes are declared
    #[must_use]
    pub fn shape(&self) -> Option<StatementShape> {
        match (&self.resources, &self.actions) {
            (Some(r), Some(a)) => Some(StatementShape::from_polarities(r.polarity, a.polarity)),
            _ => None,
        }
    }

    /// Full resource × action cross product
    ///
    /// Empty when either axis is missing or lists nothing.
    #[must_use]
    pub fn grants(&self) -> Vec<Grant> {
        let (Some(resources), Some(actions)) = (&self.resources, &self.actions) else {
            return Vec::new();
        };
        let shape = StatementShape::from_polarities(resources.polarity, actions.polarity);

        let mut grants = Vec::with_capacity(resources.values.len() * actions.values.len());
        for resource in &resources.values {
            for action in &actions.values {
                grants.push(Grant {
                    resource: resource.clone(),
                    action: action.clone(),
                    shape,
                });
            }
        }
        grants
    }
}

/// Normalize a scalar-or-list field into a sequence of strings
fn sequence_of(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().filter_map(scalar_text).collect(),
        other => scalar_text(other).into_iter().collect(),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
