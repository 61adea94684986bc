/*
 * SPDX-FileCopyrightText: 2025 Wavelens UG <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use crate::error::ProviderError;
use crate::resources::jobset::{self, Jobset};
use crate::resources::project::Project;
use crate::resources::{ResourceData, check_project_identifier};
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

pub const STATE_VERSION: u32 = 1;

/// Desired state as written by the operator:
///
/// ```toml
/// [project.nixpkgs]
/// name = "nixpkgs"
/// display_name = "Nixpkgs"
///
/// [jobset.trunk]
/// project = "nixpkgs"
/// name = "trunk"
/// ...
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateConfiguration {
    #[serde(default)]
    pub project: BTreeMap<String, Project>,
    #[serde(default)]
    pub jobset: BTreeMap<String, Jobset>,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("Validation error in field '{field}': {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub is_valid: bool,
}

impl StateConfiguration {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state configuration {}", path.display()))?;

        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse state configuration {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();

        let mut seen_project_names = HashMap::new();
        for (address, project) in &self.project {
            if let Some(other) = seen_project_names.insert(&project.name, address) {
                errors.push(ValidationError {
                    field: format!("project.{}.name", address),
                    message: format!(
                        "Duplicate project name `{}`, already declared by project.{}",
                        project.name, other
                    ),
                });
            }

            if let Err(message) = check_project_identifier(&project.name) {
                errors.push(ValidationError {
                    field: format!("project.{}.name", address),
                    message,
                });
            }
        }

        let mut seen_jobset_ids = HashMap::new();
        for (address, jobset) in &self.jobset {
            if let Some(other) = seen_jobset_ids.insert(jobset.id(), address) {
                errors.push(ValidationError {
                    field: format!("jobset.{}.name", address),
                    message: format!(
                        "Duplicate jobset `{}`, already declared by jobset.{}",
                        jobset.id(),
                        other
                    ),
                });
            }

            if let Err(ProviderError::ValidationConflict(messages)) =
                jobset::build_request(&jobset.project, &jobset.name, jobset)
            {
                errors.extend(messages.into_iter().map(|message| ValidationError {
                    field: format!("jobset.{}", address),
                    message,
                }));
            }
        }

        ValidationResult {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// What the provider last observed for every resource it manages, keyed by the
/// address used in [`StateConfiguration`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateFile {
    pub version: u32,
    #[serde(default)]
    pub projects: BTreeMap<String, ResourceData<Project>>,
    #[serde(default)]
    pub jobsets: BTreeMap<String, ResourceData<Jobset>>,
}

impl Default for StateFile {
    fn default() -> Self {
        StateFile {
            version: STATE_VERSION,
            projects: BTreeMap::new(),
            jobsets: BTreeMap::new(),
        }
    }
}

impl StateFile {
    /// A missing file is an empty state.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(StateFile::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file {}", path.display()))?;
        let state: StateFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file {}", path.display()))?;

        if state.version != STATE_VERSION {
            return Err(anyhow!(
                "Unsupported state file version {} in {}, expected {}",
                state.version,
                path.display(),
                STATE_VERSION
            ));
        }

        Ok(state)
    }

    /// Writes through a temporary file next to `path`, then renames it over.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory {}", dir.display()))?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");

        fs::write(&tmp, contents)
            .with_context(|| format!("Failed to write state file {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace state file {}", path.display()))?;

        Ok(())
    }

    /// Follows a project rename: every tracked jobset of `old` moves to `new`.
    pub fn rename_project(&mut self, old: &str, new: &str) {
        for data in self.jobsets.values_mut() {
            if data.attributes.project != old {
                continue;
            }

            data.attributes.project = new.to_string();
            if data.exists() {
                data.set_id(jobset::jobset_id(new, &data.attributes.name));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty() && self.jobsets.is_empty()
    }
}

pub fn is_tracked(state: &StateFile, address: &str) -> bool {
    state.projects.contains_key(address) || state.jobsets.contains_key(address)
}
