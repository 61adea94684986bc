/*
 * SPDX-FileCopyrightText: 2025 Wavelens UG <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

pub mod jobset;
pub mod project;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

pub const DEFAULT_DESCRIPTION: &str = "Managed by hydra-provider.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum ResourceKind {
    Project,
    Jobset,
}

/// Identity plus declared attributes of one managed resource.
///
/// `id` is `None` while the resource is absent remotely; controllers set it on
/// create and clear it on delete or when a read finds the resource gone.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceData<T> {
    pub id: Option<String>,
    pub attributes: T,
}

impl<T> ResourceData<T> {
    pub fn new(attributes: T) -> Self {
        ResourceData {
            id: None,
            attributes,
        }
    }

    pub fn with_id(id: impl Into<String>, attributes: T) -> Self {
        ResourceData {
            id: Some(id.into()),
            attributes,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    pub fn clear_id(&mut self) {
        self.id = None;
    }

    pub fn exists(&self) -> bool {
        self.id.is_some()
    }
}

pub(crate) fn default_true() -> bool {
    true
}

pub(crate) fn default_description() -> String {
    DEFAULT_DESCRIPTION.to_string()
}

pub(crate) fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.is_empty()).cloned()
}

fn check_identifier(kind: &str, name: &str, extra: &[char]) -> Result<(), String> {
    let mut chars = name.chars();
    let valid_start = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let valid_rest =
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || extra.contains(&c));

    if valid_start && valid_rest {
        return Ok(());
    }

    let allowed = extra
        .iter()
        .map(|c| format!(", `{}`", c))
        .collect::<String>();

    Err(format!(
        "Invalid {} identifier `{}`: must start with a letter and contain only letters, digits, `_`, `-`{}.",
        kind, name, allowed
    ))
}

pub fn check_project_identifier(name: &str) -> Result<(), String> {
    check_identifier("project", name, &[])
}

pub fn check_jobset_identifier(name: &str) -> Result<(), String> {
    check_identifier("jobset", name, &['.'])
}
