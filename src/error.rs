/*
 * SPDX-FileCopyrightText: 2025 Wavelens UG <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::resources::ResourceKind;
use connector::ConnectorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{kind} already exists.")]
    AlreadyExists { kind: ResourceKind, id: String },
    #[error("Expected valid response from existing {kind}, got {detail}")]
    NotFound {
        kind: ResourceKind,
        id: String,
        detail: String,
    },
    #[error("Parent project does not exist.")]
    ParentNotFound { project: String },
    #[error("{kind} has no identifier yet, create or import it first.")]
    MissingId { kind: ResourceKind },
    #[error("unexpected format of ID ({0}), expected project/jobset")]
    MalformedId(String),
    #[error("{}", .0.join("\n"))]
    ValidationConflict(Vec<String>),
    #[error("Expected valid {context}, got {detail}")]
    UnexpectedResponse { context: String, detail: String },
    #[error("Unrecognized {field} value {value} in server response.")]
    UnrecognizedEnumValue { field: &'static str, value: i32 },
    #[error(transparent)]
    Network(#[from] ConnectorError),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

impl ProviderError {
    pub fn unexpected_response(context: &str, detail: String) -> Self {
        ProviderError::UnexpectedResponse {
            context: context.to_string(),
            detail,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ProviderError::Network(ConnectorError::Cancelled))
    }

    /// Validation conflicts become one diagnostic per message so they can all
    /// be fixed in a single pass.
    pub fn into_diagnostics(self, summary: &str) -> Diagnostics {
        match self {
            ProviderError::ValidationConflict(messages) => messages
                .into_iter()
                .map(|detail| Diagnostic::error(summary, detail))
                .collect(),
            other => Diagnostics::from(Diagnostic::error(summary, other.to_string())),
        }
    }
}
