//! Prompt templates with `{placeholder}` slots.
//!
//! `{{` and `}}` are literal-brace escapes, so templates can carry JSON
//! examples. Rendering fails on a placeholder with no supplied value;
//! values supplied for placeholders the template never mentions are
//! ignored.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A system + user message pair before substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub system: String,
    pub user: String,
}

impl PromptTemplate {
    /// Substitute placeholders in both messages.
    pub fn render(&self, vars: &[(&str, &str)]) -> Result<RenderedPrompt, TemplateError> {
        Ok(RenderedPrompt {
            system: substitute(&self.system, vars)?,
            user: substitute(&self.user, vars)?,
        })
    }
}

/// The system + user message pair after substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub system: String,
    pub user: String,
}

/// Error rendering a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("no value supplied for placeholder {{{placeholder}}}")]
    MissingValue { placeholder: String },
    #[error("unterminated placeholder at byte {at}")]
    Unterminated { at: usize },
    #[error("stray closing brace at byte {at}")]
    StrayBrace { at: usize },
}

fn substitute(text: &str, vars: &[(&str, &str)]) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(i) = rest.find(['{', '}']) {
        let at = text.len() - rest.len() + i;
        out.push_str(&rest[..i]);
        let bytes = rest.as_bytes();

        if bytes[i] == b'{' {
            if bytes.get(i + 1) == Some(&b'{') {
                out.push('{');
                rest = &rest[i + 2..];
                continue;
            }
            let after = &rest[i + 1..];
            let close = after
                .find('}')
                .ok_or(TemplateError::Unterminated { at })?;
            let name = &after[..close];
            let value = vars
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| *v)
                .ok_or_else(|| TemplateError::MissingValue {
                    placeholder: name.to_string(),
                })?;
            out.push_str(value);
            rest = &after[close + 1..];
        } else {
            if bytes.get(i + 1) == Some(&b'}') {
                out.push('}');
                rest = &rest[i + 2..];
                continue;
            }
            return Err(TemplateError::StrayBrace { at });
        }
    }

    out.push_str(rest);
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
