// src/cards/mod.rs
//! Visual cards for the chat surface.
//!
//! Each tool with a formatter gets a declarative card (title, sections of facts, action
//! links). Everything else, including error results, is shown as pretty-printed JSON.
//! The formatter table is fixed at compile time and checked against the catalog when the
//! renderer is built.

mod formatters;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::tools::{ContentPart, ToolDefinition, ToolResult};
use crate::utils::pretty_json;

pub use formatters::RAW_FALLBACK_TOOLS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    #[serde(rename = "type")]
    pub card_type: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<CardSection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<CardAction>,
}

impl Card {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            card_type: "card".to_string(),
            title: title.into(),
            subtitle: None,
            sections: Vec::new(),
            actions: Vec::new(),
        }
    }

    pub fn subtitle(mut self, subtitle: Option<String>) -> Self {
        self.subtitle = subtitle;
        self
    }

    pub fn section(mut self, section: CardSection) -> Self {
        if !section.is_empty() {
            self.sections.push(section);
        }
        self
    }

    pub fn action(mut self, title: impl Into<String>, url: Option<String>) -> Self {
        if let Some(url) = url {
            self.actions.push(CardAction {
                title: title.into(),
                url,
            });
        }
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub facts: Vec<Fact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CardSection {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Adds the fact only when there is a value to show.
    pub fn fact(mut self, label: &str, value: Option<String>) -> Self {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.facts.push(Fact {
                label: label.to_string(),
                value,
            });
        }
        self
    }

    pub fn text(mut self, text: Option<String>) -> Self {
        self.text = text.filter(|t| !t.is_empty());
        self
    }

    fn is_empty(&self) -> bool {
        self.facts.is_empty() && self.text.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardAction {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderedCard {
    Card(Card),
    /// Shown as-is: pretty JSON, or text that was not JSON.
    Raw(String),
}

impl RenderedCard {
    /// Text placed in the chat response's content block.
    pub fn payload(&self) -> String {
        match self {
            RenderedCard::Card(card) => {
                serde_json::to_string(card).unwrap_or_else(|_| card.title.clone())
            }
            RenderedCard::Raw(text) => text.clone(),
        }
    }

    pub fn is_card(&self) -> bool {
        matches!(self, RenderedCard::Card(_))
    }
}

/// Formatter table does not line up with the catalog.
#[derive(Debug, Error, PartialEq)]
pub enum CardError {
    #[error("Tool '{tool}' has neither a card formatter nor a raw fallback entry")]
    MissingFormatter { tool: String },
    #[error("Card formatter registered for unknown tool '{tool}'")]
    UnknownTool { tool: String },
}

type Formatter = fn(&Value) -> Option<Card>;

pub struct CardRenderer {
    formatters: HashMap<&'static str, Formatter>,
}

impl CardRenderer {
    pub fn new(catalog: &[ToolDefinition]) -> Result<Self, CardError> {
        Self::with_table(catalog, formatters::FORMATTERS, RAW_FALLBACK_TOOLS)
    }

    fn with_table(
        catalog: &[ToolDefinition],
        table: &[(&'static str, Formatter)],
        raw_fallback: &[&str],
    ) -> Result<Self, CardError> {
        for (tool, _) in table {
            if !catalog.iter().any(|d| d.name == *tool) {
                return Err(CardError::UnknownTool {
                    tool: tool.to_string(),
                });
            }
        }
        for definition in catalog {
            let covered = table.iter().any(|(tool, _)| *tool == definition.name)
                || raw_fallback.contains(&definition.name.as_str());
            if !covered {
                return Err(CardError::MissingFormatter {
                    tool: definition.name.clone(),
                });
            }
        }

        Ok(Self {
            formatters: table.iter().copied().collect(),
        })
    }

    /// Card for structured data. No formatter, or data the formatter cannot read, gives
    /// the pretty-printed original.
    pub fn render(&self, tool: &str, data: &Value) -> RenderedCard {
        match self.formatters.get(tool) {
            Some(format) => match format(data) {
                Some(card) => RenderedCard::Card(card),
                None => {
                    warn!("Formatter for '{}' could not read the result, showing raw", tool);
                    RenderedCard::Raw(pretty_json(data))
                }
            },
            None => {
                debug!("No card formatter for '{}'", tool);
                RenderedCard::Raw(pretty_json(data))
            }
        }
    }

    pub fn render_result(&self, tool: &str, result: &ToolResult) -> RenderedCard {
        if result.is_error {
            return RenderedCard::Raw(result.text_content());
        }

        match result.content.first() {
            Some(ContentPart::Json { data }) => self.render(tool, data),
            Some(ContentPart::Text { text }) => match serde_json::from_str::<Value>(text) {
                Ok(data) => self.render(tool, &data),
                Err(_) => RenderedCard::Raw(text.clone()),
            },
            None => RenderedCard::Raw(String::new()),
        }
    }
}
