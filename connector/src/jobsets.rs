/*
 * SPDX-FileCopyrightText: 2025 Wavelens UG <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use crate::projects::RedirectResponse;
use crate::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct JobsetInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emailresponsible: Option<bool>,
}

/// Body of `PUT /jobset/{project}/{jobset}`. `None` leaves a field out of the request.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct JobsetRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<i32>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub jobset_type: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkinterval: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedulingshares: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keepnr: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enableemail: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emailoverride: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flake: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nixexprinput: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nixexprpath: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs: Option<BTreeMap<String, JobsetInput>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct JobsetResponse {
    pub project: Option<String>,
    pub name: Option<String>,
    pub enabled: Option<i32>,
    #[serde(rename = "type")]
    pub jobset_type: Option<i32>,
    pub description: Option<String>,
    pub checkinterval: Option<i64>,
    pub schedulingshares: Option<i64>,
    pub keepnr: Option<i64>,
    pub visible: Option<bool>,
    pub hidden: Option<bool>,
    pub enableemail: Option<bool>,
    pub emailoverride: Option<String>,
    pub flake: Option<String>,
    pub nixexprinput: Option<String>,
    pub nixexprpath: Option<String>,
    pub errormsg: Option<String>,
    pub fetcherrormsg: Option<String>,
    pub inputs: Option<BTreeMap<String, JobsetInput>>,
}

impl HydraConnection {
    pub async fn get_jobset(
        &self,
        project: &str,
        id: &str,
    ) -> Result<ApiResponse<JobsetResponse>, ConnectorError> {
        self.execute::<(), _>(RequestType::GET, &["jobset", project, id], None)
            .await
    }

    pub async fn put_jobset(
        &self,
        project: &str,
        id: &str,
        body: &JobsetRequest,
    ) -> Result<ApiResponse<RedirectResponse>, ConnectorError> {
        self.execute(RequestType::PUT, &["jobset", project, id], Some(body))
            .await
    }

    pub async fn delete_jobset(
        &self,
        project: &str,
        id: &str,
    ) -> Result<ApiResponse<RedirectResponse>, ConnectorError> {
        self.execute::<(), _>(RequestType::DELETE, &["jobset", project, id], None)
            .await
    }
}
