/*
 * SPDX-FileCopyrightText: 2025 Wavelens UG <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use super::*;
use crate::client::HydraClient;
use crate::error::{ProviderError, ProviderResult};
use connector::projects::{DeclarativeInput, ProjectRequest};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Declarative {
    /// Spec file inside `value`, relative to the root of the input.
    pub file: String,
    #[serde(rename = "type")]
    pub input_type: String,
    pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Project {
    pub name: String,
    pub display_name: String,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default)]
    pub homepage: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declarative: Option<Declarative>,
}

impl Project {
    /// Comparable form: an all-empty declarative block reads back as absent.
    pub fn normalized(&self) -> Project {
        let mut project = self.clone();
        project.declarative = project.declarative.filter(|decl| {
            !(decl.file.is_empty() && decl.input_type.is_empty() && decl.value.is_empty())
        });
        project
    }
}

/// Upsert body shared by create and update. Every declared value is sent
/// explicitly, so `enabled = false` reaches the server as `false`.
pub fn build_request(project: &Project) -> ProviderResult<ProjectRequest> {
    check_project_identifier(&project.name)
        .map_err(|e| ProviderError::ValidationConflict(vec![e]))?;

    let mut body = ProjectRequest {
        name: Some(project.name.clone()),
        displayname: Some(project.display_name.clone()),
        description: Some(project.description.clone()),
        homepage: Some(project.homepage.clone()),
        owner: Some(project.owner.clone()),
        enabled: Some(project.enabled),
        visible: Some(project.visible),
        ..Default::default()
    };

    if let Some(decl) = &project.declarative {
        body.declarative = Some(DeclarativeInput {
            file: Some(decl.file.clone()),
            input_type: Some(decl.input_type.clone()),
            value: Some(decl.value.clone()),
        });
        body.declfile = Some(decl.file.clone());
        body.decltype = Some(decl.input_type.clone());
        body.declvalue = Some(decl.value.clone());
    }

    Ok(body)
}

fn flatten_declarative(decl: Option<&DeclarativeInput>) -> Option<Declarative> {
    let decl = decl?;
    let (file, input_type, value) = (
        decl.file.as_ref()?,
        decl.input_type.as_ref()?,
        decl.value.as_ref()?,
    );

    if file.is_empty() && input_type.is_empty() && value.is_empty() {
        return None;
    }

    Some(Declarative {
        file: file.clone(),
        input_type: input_type.clone(),
        value: value.clone(),
    })
}

fn current_id(data: &ResourceData<Project>) -> ProviderResult<String> {
    data.id()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or(ProviderError::MissingId {
            kind: ResourceKind::Project,
        })
}

pub async fn create<C: HydraClient + ?Sized>(
    client: &C,
    data: &mut ResourceData<Project>,
) -> ProviderResult<()> {
    let name = data.attributes.name.clone();
    let body = build_request(&data.attributes)?;

    let get = client.get_project(&name).await?;
    if !get.is_not_found() {
        return Err(ProviderError::AlreadyExists {
            kind: ResourceKind::Project,
            id: name,
        });
    }

    let put = client.put_project(&name, &body).await?;

    if put.json201().is_none() {
        return Err(ProviderError::unexpected_response(
            "project creation response",
            put.describe(),
        ));
    }

    tracing::info!("Created project: {}", name);
    data.set_id(name);

    Ok(())
}

pub async fn read<C: HydraClient + ?Sized>(
    client: &C,
    data: &mut ResourceData<Project>,
) -> ProviderResult<()> {
    let id = current_id(data)?;

    let get = client.get_project(&id).await?;
    if !get.is_ok() {
        data.clear_id();
        return Err(ProviderError::NotFound {
            kind: ResourceKind::Project,
            id,
            detail: get.describe(),
        });
    }

    let Some(project) = get.json200() else {
        return Err(ProviderError::unexpected_response(
            "project response",
            get.describe(),
        ));
    };

    let name = project.name.clone().unwrap_or_else(|| id.clone());

    data.attributes = Project {
        name: name.clone(),
        display_name: project.displayname.clone().unwrap_or_default(),
        description: project.description.clone().unwrap_or_default(),
        homepage: project.homepage.clone().unwrap_or_default(),
        owner: project.owner.clone().unwrap_or_default(),
        enabled: project.enabled.unwrap_or(false),
        visible: !project.hidden.unwrap_or(false),
        declarative: flatten_declarative(project.declarative.as_ref()),
    };
    data.set_id(name);

    Ok(())
}

/// Sends the new attributes to the identifier the project currently has, which
/// is how a rename reaches the server.
pub async fn update<C: HydraClient + ?Sized>(
    client: &C,
    data: &mut ResourceData<Project>,
) -> ProviderResult<()> {
    let id = current_id(data)?;
    let body = build_request(&data.attributes)?;

    let put = client.put_project(&id, &body).await?;
    if put.json200().is_none() {
        return Err(ProviderError::unexpected_response(
            "response from existing project",
            put.describe(),
        ));
    }

    if data.attributes.name != id {
        tracing::info!("Renamed project: {} -> {}", id, data.attributes.name);
        data.set_id(data.attributes.name.clone());
    } else {
        tracing::info!("Updated project: {}", id);
    }

    read(client, data).await
}

pub async fn delete<C: HydraClient + ?Sized>(
    client: &C,
    data: &mut ResourceData<Project>,
) -> ProviderResult<()> {
    let id = current_id(data)?;

    let del = client.delete_project(&id).await?;
    if !del.is_ok() {
        return Err(ProviderError::unexpected_response(
            "project deletion response",
            del.describe(),
        ));
    }

    tracing::info!("Deleted project: {}", id);
    data.clear_id();

    Ok(())
}

/// Adopts an existing remote project by its name.
pub async fn import<C: HydraClient + ?Sized>(
    client: &C,
    id: &str,
) -> ProviderResult<ResourceData<Project>> {
    let mut data = ResourceData::with_id(id, Project::default());
    read(client, &mut data).await?;
    Ok(data)
}
