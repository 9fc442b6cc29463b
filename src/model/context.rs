//! Context: a situational modifier attached to an encounter

use crate::error::{check_range, ChoraResult};
use crate::graph::PropertyValue;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextType {
    Temporal,
    Social,
    Purposive,
    Environmental,
}

impl std::fmt::Display for ContextType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ContextType::Temporal => "temporal",
            ContextType::Social => "social",
            ContextType::Purposive => "purposive",
            ContextType::Environmental => "environmental",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub context_type: ContextType,
    /// Free-form value: "morning", a purpose, a list of companions, ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<PropertyValue>,
    #[serde(default)]
    pub description: String,
    /// How strongly the context modifies the encounter, in [0, 1]
    pub intensity: f64,
}

impl Context {
    pub fn new(context_type: ContextType, value: PropertyValue) -> Self {
        Self {
            context_type,
            value: Some(value),
            description: String::new(),
            intensity: 1.0,
        }
    }

    pub fn temporal(label: impl Into<String>) -> Self {
        Self::new(ContextType::Temporal, PropertyValue::String(label.into()))
    }

    pub fn purposive(purpose: impl Into<String>) -> Self {
        Self::new(ContextType::Purposive, PropertyValue::String(purpose.into()))
    }

    /// Social context; an empty companion list means "alone"
    pub fn social(companions: Vec<String>) -> Self {
        let value = if companions.is_empty() {
            PropertyValue::String("alone".to_string())
        } else {
            PropertyValue::Array(companions.into_iter().map(PropertyValue::String).collect())
        };
        Self::new(ContextType::Social, value)
    }

    pub fn environmental(conditions: impl Into<String>) -> Self {
        Self::new(ContextType::Environmental, PropertyValue::String(conditions.into()))
    }

    pub fn with_intensity(mut self, intensity: f64) -> ChoraResult<Self> {
        check_range("context.intensity", intensity, 0.0, 1.0)?;
        self.intensity = intensity;
        Ok(self)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// The value as text, if it is a string
    pub fn value_str(&self) -> Option<&str> {
        match &self.value {
            Some(PropertyValue::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn is_alone(&self) -> bool {
        self.context_type == ContextType::Social && self.value_str() == Some("alone")
    }
}
