/*
 * SPDX-FileCopyrightText: 2025 Wavelens UG <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use super::*;
use crate::client::HydraClient;
use crate::error::{ProviderError, ProviderResult};
use connector::jobsets::{JobsetInput as WireInput, JobsetRequest, JobsetResponse};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::collections::{BTreeMap, BTreeSet};
use strum_macros::EnumIter;

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoPrimitive,
    TryFromPrimitive,
)]
#[repr(i32)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum JobsetState {
    Disabled = 0,
    #[default]
    Enabled = 1,
    OneShot = 2,
    OneAtATime = 3,
}

impl JobsetState {
    pub fn code(self) -> i32 {
        self.into()
    }

    pub fn from_code(code: i32) -> ProviderResult<Self> {
        JobsetState::try_from(code).map_err(|_| ProviderError::UnrecognizedEnumValue {
            field: "state",
            value: code,
        })
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoPrimitive,
    TryFromPrimitive,
)]
#[repr(i32)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum JobsetType {
    #[default]
    Legacy = 0,
    Flake = 1,
}

impl JobsetType {
    pub fn code(self) -> i32 {
        self.into()
    }

    pub fn from_code(code: i32) -> ProviderResult<Self> {
        JobsetType::try_from(code).map_err(|_| ProviderError::UnrecognizedEnumValue {
            field: "type",
            value: code,
        })
    }
}

/// Entrypoint of a legacy jobset: `file` inside the input named `input`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NixExpression {
    pub file: String,
    pub input: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobsetInput {
    pub name: String,
    #[serde(rename = "type")]
    pub input_type: String,
    pub value: String,
    #[serde(default)]
    pub notify_committers: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Jobset {
    pub project: String,
    pub name: String,
    pub state: JobsetState,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(rename = "type")]
    pub jobset_type: JobsetType,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flake_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nix_expression: Option<NixExpression>,
    pub check_interval: i64,
    pub scheduling_shares: i64,
    #[serde(default)]
    pub email_notifications: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_override: Option<String>,
    pub keep_evaluations: i64,
    #[serde(default, alias = "input", skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<JobsetInput>,
}

impl Jobset {
    pub fn id(&self) -> String {
        jobset_id(&self.project, &self.name)
    }

    /// Comparable form: inputs ordered by name, empty optionals dropped.
    pub fn normalized(&self) -> Jobset {
        let mut jobset = self.clone();
        jobset.inputs.sort_by(|a, b| a.name.cmp(&b.name));
        jobset.flake_uri = non_empty(jobset.flake_uri.as_ref());
        jobset.email_override = non_empty(jobset.email_override.as_ref());
        jobset.nix_expression = jobset
            .nix_expression
            .filter(|expr| !expr.file.is_empty() && !expr.input.is_empty());
        jobset
    }
}

pub fn jobset_id(project: &str, name: &str) -> String {
    format!("{}/{}", project, name)
}

/// Splits `project/jobset`. Anything but two non-empty segments is rejected.
pub fn parse_id(id: &str) -> ProviderResult<(String, String)> {
    let parts = id.split('/').collect::<Vec<&str>>();

    match parts.as_slice() {
        [project, name] if !project.is_empty() && !name.is_empty() => {
            Ok((project.to_string(), name.to_string()))
        }
        _ => Err(ProviderError::MalformedId(id.to_string())),
    }
}

fn check_type_invariants(jobset: &Jobset, errors: &mut Vec<String>) {
    let flake_uri = jobset.flake_uri.as_deref().unwrap_or_default();
    let expression = jobset.nix_expression.as_ref();
    let has_expression =
        expression.is_some_and(|expr| !expr.file.is_empty() && !expr.input.is_empty());
    let any_expression =
        expression.is_some_and(|expr| !expr.file.is_empty() || !expr.input.is_empty());

    match jobset.jobset_type {
        JobsetType::Legacy => {
            if !flake_uri.is_empty() {
                errors.push("You cannot specify a flake_uri when using type \"legacy\".".to_string());
            }
        }
        JobsetType::Flake => {
            if flake_uri.is_empty() {
                errors.push("Jobset type \"flake\" requires a non-empty flake_uri.".to_string());
            }
        }
    }

    match jobset.jobset_type {
        JobsetType::Flake if any_expression => {
            errors.push(
                "You cannot specify a nix_expression when using type \"flake\".".to_string(),
            );
        }
        JobsetType::Legacy if !has_expression => {
            errors.push(
                "Jobset type \"legacy\" requires a non-empty nix_expression.".to_string(),
            );
        }
        _ => {}
    }

    match jobset.jobset_type {
        JobsetType::Flake if !jobset.inputs.is_empty() => {
            errors.push(
                "You cannot specify one or more inputs when using type \"flake\".".to_string(),
            );
        }
        JobsetType::Legacy if jobset.inputs.is_empty() => {
            errors.push("Jobset type \"legacy\" requires non-empty input(s).".to_string());
        }
        _ => {}
    }
}

fn check_inputs(inputs: &[JobsetInput], errors: &mut Vec<String>) {
    let mut seen = BTreeSet::new();
    for input in inputs {
        if !seen.insert(input.name.as_str()) {
            errors.push(format!(
                "Duplicate input name `{}`: input names must be unique.",
                input.name
            ));
        }
    }
}

/// Builds the upsert body for `project/name`, collecting every problem before
/// giving up.
pub fn build_request(project: &str, name: &str, jobset: &Jobset) -> ProviderResult<JobsetRequest> {
    let mut errors = Vec::new();

    if let Err(e) = check_project_identifier(project) {
        errors.push(e);
    }

    if let Err(e) = check_jobset_identifier(name) {
        errors.push(e);
    }

    check_type_invariants(jobset, &mut errors);
    check_inputs(&jobset.inputs, &mut errors);

    if !errors.is_empty() {
        return Err(ProviderError::ValidationConflict(errors));
    }

    let mut body = JobsetRequest {
        project: Some(project.to_string()),
        name: Some(name.to_string()),
        enabled: Some(jobset.state.code()),
        jobset_type: Some(jobset.jobset_type.code()),
        description: Some(jobset.description.clone()),
        checkinterval: Some(jobset.check_interval),
        schedulingshares: Some(jobset.scheduling_shares),
        keepnr: Some(jobset.keep_evaluations),
        visible: Some(jobset.visible),
        enableemail: Some(jobset.email_notifications),
        emailoverride: Some(jobset.email_override.clone().unwrap_or_default()),
        flake: non_empty(jobset.flake_uri.as_ref()),
        ..Default::default()
    };

    if let Some(expr) = &jobset.nix_expression {
        body.nixexprinput = Some(expr.input.clone());
        body.nixexprpath = Some(expr.file.clone());
    }

    if !jobset.inputs.is_empty() {
        let inputs = jobset
            .inputs
            .iter()
            .map(|input| {
                (
                    input.name.clone(),
                    WireInput {
                        name: Some(input.name.clone()),
                        input_type: Some(input.input_type.clone()),
                        value: Some(input.value.clone()),
                        emailresponsible: Some(input.notify_committers),
                    },
                )
            })
            .collect::<BTreeMap<String, WireInput>>();

        body.inputs = Some(inputs);
    }

    Ok(body)
}

fn flatten(response: &JobsetResponse, fallback: &(String, String)) -> ProviderResult<Jobset> {
    let state = match response.enabled {
        Some(code) => JobsetState::from_code(code)?,
        None => JobsetState::default(),
    };

    let jobset_type = match response.jobset_type {
        Some(code) => JobsetType::from_code(code)?,
        None => JobsetType::default(),
    };

    let visible = match (response.visible, response.hidden) {
        (Some(visible), _) => visible,
        (None, Some(hidden)) => !hidden,
        (None, None) => true,
    };

    let nix_expression = match (
        non_empty(response.nixexprpath.as_ref()),
        non_empty(response.nixexprinput.as_ref()),
    ) {
        (Some(file), Some(input)) => Some(NixExpression { file, input }),
        _ => None,
    };

    let inputs = response
        .inputs
        .as_ref()
        .map(|inputs| {
            inputs
                .iter()
                .map(|(key, input)| JobsetInput {
                    name: input.name.clone().unwrap_or_else(|| key.clone()),
                    input_type: input.input_type.clone().unwrap_or_default(),
                    value: input.value.clone().unwrap_or_default(),
                    notify_committers: input.emailresponsible.unwrap_or(false),
                })
                .collect::<Vec<JobsetInput>>()
        })
        .unwrap_or_default();

    Ok(Jobset {
        project: response.project.clone().unwrap_or_else(|| fallback.0.clone()),
        name: response.name.clone().unwrap_or_else(|| fallback.1.clone()),
        state,
        visible,
        jobset_type,
        description: response.description.clone().unwrap_or_default(),
        flake_uri: non_empty(response.flake.as_ref()),
        nix_expression,
        check_interval: response.checkinterval.unwrap_or_default(),
        scheduling_shares: response.schedulingshares.unwrap_or_default(),
        email_notifications: response.enableemail.unwrap_or(false),
        email_override: non_empty(response.emailoverride.as_ref()),
        keep_evaluations: response.keepnr.unwrap_or_default(),
        inputs,
    })
}

fn current_id(data: &ResourceData<Jobset>) -> ProviderResult<(String, String)> {
    let id = data.id().ok_or(ProviderError::MissingId {
        kind: ResourceKind::Jobset,
    })?;

    parse_id(id)
}

pub async fn create<C: HydraClient + ?Sized>(
    client: &C,
    data: &mut ResourceData<Jobset>,
) -> ProviderResult<()> {
    let project = data.attributes.project.clone();
    let name = data.attributes.name.clone();
    let body = build_request(&project, &name, &data.attributes)?;

    let parent = client.get_project(&project).await?;
    if parent.is_not_found() {
        return Err(ProviderError::ParentNotFound { project });
    }

    let get = client.get_jobset(&project, &name).await?;
    if !get.is_not_found() {
        return Err(ProviderError::AlreadyExists {
            kind: ResourceKind::Jobset,
            id: jobset_id(&project, &name),
        });
    }

    let put = client.put_jobset(&project, &name, &body).await?;
    if put.json201().is_none() {
        return Err(ProviderError::unexpected_response(
            "jobset creation response",
            put.describe(),
        ));
    }

    let id = jobset_id(&project, &name);
    tracing::info!("Created jobset: {}", id);
    data.set_id(id);

    Ok(())
}

pub async fn read<C: HydraClient + ?Sized>(
    client: &C,
    data: &mut ResourceData<Jobset>,
) -> ProviderResult<()> {
    let key = current_id(data)?;

    let get = client.get_jobset(&key.0, &key.1).await?;
    if !get.is_ok() {
        data.clear_id();
        return Err(ProviderError::NotFound {
            kind: ResourceKind::Jobset,
            id: jobset_id(&key.0, &key.1),
            detail: get.describe(),
        });
    }

    let Some(response) = get.json200() else {
        return Err(ProviderError::unexpected_response(
            "response from existing jobset",
            get.describe(),
        ));
    };

    if let Some(message) = non_empty(response.fetcherrormsg.as_ref()) {
        tracing::warn!("Jobset {} has fetch errors: {}", jobset_id(&key.0, &key.1), message);
    }

    data.attributes = flatten(response, &key)?;
    data.set_id(data.attributes.id());

    Ok(())
}

/// PUTs the new attributes to the key the jobset is currently stored under.
/// Moving it to another project or name happens on the server side.
pub async fn update<C: HydraClient + ?Sized>(
    client: &C,
    data: &mut ResourceData<Jobset>,
) -> ProviderResult<()> {
    let (project, name) = current_id(data)?;
    let body = build_request(
        &data.attributes.project,
        &data.attributes.name,
        &data.attributes,
    )?;

    let put = client.put_jobset(&project, &name, &body).await?;
    if put.json200().is_none() {
        return Err(ProviderError::unexpected_response(
            "response from existing jobset",
            put.describe(),
        ));
    }

    let old = jobset_id(&project, &name);
    let new = data.attributes.id();
    if old != new {
        tracing::info!("Moved jobset: {} -> {}", old, new);
        data.set_id(new);
    } else {
        tracing::info!("Updated jobset: {}", old);
    }

    read(client, data).await
}

pub async fn delete<C: HydraClient + ?Sized>(
    client: &C,
    data: &mut ResourceData<Jobset>,
) -> ProviderResult<()> {
    let (project, name) = current_id(data)?;

    let del = client.delete_jobset(&project, &name).await?;
    if !del.is_ok() {
        return Err(ProviderError::unexpected_response(
            "jobset deletion response",
            del.describe(),
        ));
    }

    tracing::info!("Deleted jobset: {}", jobset_id(&project, &name));
    data.clear_id();

    Ok(())
}

pub async fn import<C: HydraClient + ?Sized>(
    client: &C,
    id: &str,
) -> ProviderResult<ResourceData<Jobset>> {
    let (project, name) = parse_id(id)?;
    let mut data = ResourceData::with_id(
        id,
        Jobset {
            project,
            name,
            ..Default::default()
        },
    );

    read(client, &mut data).await?;
    Ok(data)
}
