//! Response template parsing and rendering
//!
//! Variable syntax: `${var:variable-name:default-value}`
//! - `${var:name}` - Required variable, error if not provided
//! - `${var:name:default}` - Optional variable with default value

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::domain::DomainError;

static VARIABLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{var:([a-zA-Z0-9][-a-zA-Z0-9]*)(?::([^}]*))?\}").unwrap()
});

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TemplateError {
    #[error("Missing required variable: {name}")]
    MissingVariable { name: String },
}

impl From<TemplateError> for DomainError {
    fn from(err: TemplateError) -> Self {
        DomainError::internal(format!("Response template: {}", err))
    }
}

/// A variable referenced by a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateVariable {
    pub name: String,
    pub default: Option<String>,
}

impl TemplateVariable {
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// A parsed response template
#[derive(Debug, Clone)]
pub struct ResponseTemplate {
    content: String,
    variables: Vec<TemplateVariable>,
}

impl ResponseTemplate {
    /// Parse a template string and extract its variables (first occurrence
    /// of each name wins)
    pub fn parse(content: impl Into<String>) -> Self {
        let content = content.into();
        let mut variables: Vec<TemplateVariable> = Vec::new();

        for cap in VARIABLE_PATTERN.captures_iter(&content) {
            let Some(name) = cap.get(1).map(|m| m.as_str().to_string()) else {
                continue;
            };
            if variables.iter().any(|v| v.name == name) {
                continue;
            }
            variables.push(TemplateVariable {
                name,
                default: cap.get(2).map(|m| m.as_str().to_string()),
            });
        }

        Self { content, variables }
    }

    pub fn variables(&self) -> &[TemplateVariable] {
        &self.variables
    }

    /// Substitute every variable; fails on a missing required variable
    pub fn render(&self, values: &HashMap<&str, String>) -> Result<String, TemplateError> {
        if let Some(missing) = self
            .variables
            .iter()
            .find(|v| v.is_required() && !values.contains_key(v.name.as_str()))
        {
            return Err(TemplateError::MissingVariable {
                name: missing.name.clone(),
            });
        }

        let rendered = VARIABLE_PATTERN.replace_all(&self.content, |cap: &regex::Captures<'_>| {
            let name = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
            values
                .get(name)
                .cloned()
                .or_else(|| cap.get(2).map(|m| m.as_str().to_string()))
                .unwrap_or_default()
        });

        Ok(rendered.into_owned())
    }
}

/// Render a template string directly
pub fn render_template(
    template: &str,
    values: &HashMap<&str, String>,
) -> Result<String, TemplateError> {
    ResponseTemplate::parse(template).render(values)
}
