/*
 * SPDX-FileCopyrightText: 2025 Wavelens UG <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use async_trait::async_trait;
use connector::jobsets::{JobsetRequest, JobsetResponse};
use connector::projects::{ProjectRequest, ProjectResponse, RedirectResponse};
use connector::{ApiResponse, ConnectorError, HydraConnection};

/// CRUD capability the resource controllers are written against.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HydraClient: Send + Sync {
    async fn get_project(&self, id: &str)
    -> Result<ApiResponse<ProjectResponse>, ConnectorError>;

    async fn put_project(
        &self,
        id: &str,
        body: &ProjectRequest,
    ) -> Result<ApiResponse<RedirectResponse>, ConnectorError>;

    async fn delete_project(&self, id: &str)
    -> Result<ApiResponse<RedirectResponse>, ConnectorError>;

    async fn get_jobset(
        &self,
        project: &str,
        id: &str,
    ) -> Result<ApiResponse<JobsetResponse>, ConnectorError>;

    async fn put_jobset(
        &self,
        project: &str,
        id: &str,
        body: &JobsetRequest,
    ) -> Result<ApiResponse<RedirectResponse>, ConnectorError>;

    async fn delete_jobset(
        &self,
        project: &str,
        id: &str,
    ) -> Result<ApiResponse<RedirectResponse>, ConnectorError>;
}

#[async_trait]
impl HydraClient for HydraConnection {
    async fn get_project(
        &self,
        id: &str,
    ) -> Result<ApiResponse<ProjectResponse>, ConnectorError> {
        HydraConnection::get_project(self, id).await
    }

    async fn put_project(
        &self,
        id: &str,
        body: &ProjectRequest,
    ) -> Result<ApiResponse<RedirectResponse>, ConnectorError> {
        HydraConnection::put_project(self, id, body).await
    }

    async fn delete_project(
        &self,
        id: &str,
    ) -> Result<ApiResponse<RedirectResponse>, ConnectorError> {
        HydraConnection::delete_project(self, id).await
    }

    async fn get_jobset(
        &self,
        project: &str,
        id: &str,
    ) -> Result<ApiResponse<JobsetResponse>, ConnectorError> {
        HydraConnection::get_jobset(self, project, id).await
    }

    async fn put_jobset(
        &self,
        project: &str,
        id: &str,
        body: &JobsetRequest,
    ) -> Result<ApiResponse<RedirectResponse>, ConnectorError> {
        HydraConnection::put_jobset(self, project, id, body).await
    }

    async fn delete_jobset(
        &self,
        project: &str,
        id: &str,
    ) -> Result<ApiResponse<RedirectResponse>, ConnectorError> {
        HydraConnection::delete_jobset(self, project, id).await
    }
}
