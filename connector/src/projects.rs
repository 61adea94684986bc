/*
 * SPDX-FileCopyrightText: 2025 Wavelens UG <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use crate::*;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarativeInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Body of `PUT /project/{id}`. `None` leaves a field out of the request.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub displayname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declarative: Option<DeclarativeInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declfile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decltype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declvalue: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectResponse {
    pub name: Option<String>,
    pub displayname: Option<String>,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub owner: Option<String>,
    pub enabled: Option<bool>,
    pub hidden: Option<bool>,
    pub declarative: Option<DeclarativeInput>,
    #[serde(default)]
    pub jobsets: Vec<String>,
}

/// Success body of the upsert and delete endpoints.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectResponse {
    pub redirect: Option<String>,
    pub uri: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl HydraConnection {
    pub async fn get_project(&self, id: &str) -> Result<ApiResponse<ProjectResponse>, ConnectorError> {
        self.execute::<(), _>(RequestType::GET, &["project", id], None)
            .await
    }

    pub async fn put_project(
        &self,
        id: &str,
        body: &ProjectRequest,
    ) -> Result<ApiResponse<RedirectResponse>, ConnectorError> {
        self.execute(RequestType::PUT, &["project", id], Some(body))
            .await
    }

    pub async fn delete_project(
        &self,
        id: &str,
    ) -> Result<ApiResponse<RedirectResponse>, ConnectorError> {
        self.execute::<(), _>(RequestType::DELETE, &["project", id], None)
            .await
    }
}
