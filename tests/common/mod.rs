/*
 * SPDX-FileCopyrightText: 2025 Wavelens UG <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

#![allow(dead_code)]

use async_trait::async_trait;
use connector::jobsets::{JobsetRequest, JobsetResponse};
use connector::projects::{ProjectRequest, ProjectResponse, RedirectResponse};
use connector::{ApiResponse, ConnectorError, StatusCode};
use hydra_provider::HydraClient;
use hydra_provider::resources::DEFAULT_DESCRIPTION;
use hydra_provider::resources::jobset::{Jobset, JobsetInput, JobsetState, JobsetType, NixExpression};
use hydra_provider::resources::project::Project;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

type ApiResult<T> = Result<ApiResponse<T>, ConnectorError>;

/// Hydra's project and jobset endpoints backed by in-process maps.
#[derive(Default)]
pub struct MemoryHydra {
    projects: Mutex<BTreeMap<String, ProjectResponse>>,
    jobsets: Mutex<BTreeMap<(String, String), JobsetResponse>>,
    writes: AtomicUsize,
}

fn reply<T>(status: StatusCode, body: Option<T>) -> ApiResult<T> {
    Ok(ApiResponse {
        status,
        body,
        raw: String::new(),
    })
}

fn error<T>(status: StatusCode, message: &str) -> ApiResult<T> {
    Ok(ApiResponse {
        status,
        body: None,
        raw: format!("{{\"error\":\"{}\"}}", message),
    })
}

fn redirect(kind: &str, path: &str) -> Option<RedirectResponse> {
    Some(RedirectResponse {
        redirect: Some(format!("http://localhost:3000/{}/{}", kind, path)),
        uri: Some(format!("http://localhost:3000/{}/{}", kind, path)),
        name: path.rsplit('/').next().map(str::to_string),
        kind: Some(kind.to_string()),
    })
}

impl MemoryHydra {
    pub fn new() -> Self {
        MemoryHydra::default()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn has_project(&self, name: &str) -> bool {
        self.projects.lock().unwrap().contains_key(name)
    }

    pub fn has_jobset(&self, project: &str, name: &str) -> bool {
        self.jobsets
            .lock()
            .unwrap()
            .contains_key(&(project.to_string(), name.to_string()))
    }

    pub fn seed_project(&self, name: &str) {
        self.projects.lock().unwrap().insert(
            name.to_string(),
            ProjectResponse {
                name: Some(name.to_string()),
                displayname: Some(name.to_string()),
                description: Some(String::new()),
                homepage: Some(String::new()),
                owner: Some("admin".to_string()),
                enabled: Some(true),
                hidden: Some(false),
                declarative: None,
                jobsets: Vec::new(),
            },
        );
    }

    /// Changes a field behind the provider's back.
    pub fn edit_jobset(&self, project: &str, name: &str, edit: impl FnOnce(&mut JobsetResponse)) {
        if let Some(jobset) = self
            .jobsets
            .lock()
            .unwrap()
            .get_mut(&(project.to_string(), name.to_string()))
        {
            edit(jobset);
        }
    }

    fn project_response(&self, name: &str) -> Option<ProjectResponse> {
        let mut project = self.projects.lock().unwrap().get(name).cloned()?;
        project.jobsets = self
            .jobsets
            .lock()
            .unwrap()
            .keys()
            .filter(|(p, _)| p == name)
            .map(|(_, j)| j.clone())
            .collect();
        Some(project)
    }
}

#[async_trait]
impl HydraClient for MemoryHydra {
    async fn get_project(&self, id: &str) -> ApiResult<ProjectResponse> {
        match self.project_response(id) {
            Some(project) => reply(StatusCode::OK, Some(project)),
            None => error(StatusCode::NOT_FOUND, "Project not found"),
        }
    }

    async fn put_project(&self, id: &str, body: &ProjectRequest) -> ApiResult<RedirectResponse> {
        self.writes.fetch_add(1, Ordering::SeqCst);

        let name = body.name.clone().unwrap_or_else(|| id.to_string());
        let record = ProjectResponse {
            name: Some(name.clone()),
            displayname: body.displayname.clone(),
            description: body.description.clone(),
            homepage: body.homepage.clone(),
            owner: body.owner.clone(),
            enabled: Some(body.enabled.unwrap_or(false)),
            hidden: Some(!body.visible.unwrap_or(false)),
            declarative: body.declarative.clone(),
            jobsets: Vec::new(),
        };

        let mut projects = self.projects.lock().unwrap();
        let existed = projects.remove(id).is_some();
        projects.insert(name.clone(), record);
        drop(projects);

        if !existed {
            return reply(StatusCode::CREATED, redirect("project", &name));
        }

        if name != id {
            let mut jobsets = self.jobsets.lock().unwrap();
            let moved = jobsets
                .keys()
                .filter(|(p, _)| p == id)
                .cloned()
                .collect::<Vec<(String, String)>>();

            for key in moved {
                if let Some(mut jobset) = jobsets.remove(&key) {
                    jobset.project = Some(name.clone());
                    jobsets.insert((name.clone(), key.1), jobset);
                }
            }
        }

        reply(StatusCode::OK, redirect("project", &name))
    }

    async fn delete_project(&self, id: &str) -> ApiResult<RedirectResponse> {
        self.writes.fetch_add(1, Ordering::SeqCst);

        if self.projects.lock().unwrap().remove(id).is_none() {
            return error(StatusCode::NOT_FOUND, "Project not found");
        }

        self.jobsets.lock().unwrap().retain(|(p, _), _| p != id);
        reply(
            StatusCode::OK,
            Some(RedirectResponse {
                redirect: Some("http://localhost:3000/".to_string()),
                ..Default::default()
            }),
        )
    }

    async fn get_jobset(&self, project: &str, id: &str) -> ApiResult<JobsetResponse> {
        if !self.has_project(project) {
            return error(StatusCode::NOT_FOUND, "Project not found");
        }

        match self
            .jobsets
            .lock()
            .unwrap()
            .get(&(project.to_string(), id.to_string()))
        {
            Some(jobset) => reply(StatusCode::OK, Some(jobset.clone())),
            None => error(StatusCode::NOT_FOUND, "Jobset not found"),
        }
    }

    async fn put_jobset(
        &self,
        project: &str,
        id: &str,
        body: &JobsetRequest,
    ) -> ApiResult<RedirectResponse> {
        self.writes.fetch_add(1, Ordering::SeqCst);

        if !self.has_project(project) {
            return error(StatusCode::NOT_FOUND, "Project not found");
        }

        let new_project = body.project.clone().unwrap_or_else(|| project.to_string());
        let new_name = body.name.clone().unwrap_or_else(|| id.to_string());

        let record = JobsetResponse {
            project: Some(new_project.clone()),
            name: Some(new_name.clone()),
            enabled: body.enabled,
            jobset_type: body.jobset_type,
            description: body.description.clone(),
            checkinterval: body.checkinterval,
            schedulingshares: body.schedulingshares,
            keepnr: body.keepnr,
            visible: None,
            hidden: Some(!body.visible.unwrap_or(false)),
            enableemail: body.enableemail,
            emailoverride: body.emailoverride.clone(),
            flake: Some(body.flake.clone().unwrap_or_default()),
            nixexprinput: body.nixexprinput.clone(),
            nixexprpath: body.nixexprpath.clone(),
            errormsg: Some(String::new()),
            fetcherrormsg: Some(String::new()),
            inputs: body.inputs.clone(),
        };

        let mut jobsets = self.jobsets.lock().unwrap();
        let existed = jobsets
            .remove(&(project.to_string(), id.to_string()))
            .is_some();
        let path = format!("{}/{}", new_project, new_name);
        jobsets.insert((new_project, new_name), record);

        if existed {
            reply(StatusCode::OK, redirect("jobset", &path))
        } else {
            reply(StatusCode::CREATED, redirect("jobset", &path))
        }
    }

    async fn delete_jobset(&self, project: &str, id: &str) -> ApiResult<RedirectResponse> {
        self.writes.fetch_add(1, Ordering::SeqCst);

        match self
            .jobsets
            .lock()
            .unwrap()
            .remove(&(project.to_string(), id.to_string()))
        {
            Some(_) => reply(StatusCode::OK, redirect("project", project)),
            None => error(StatusCode::NOT_FOUND, "Jobset not found"),
        }
    }
}

pub fn create_project(name: &str) -> Project {
    Project {
        name: name.to_string(),
        display_name: name.to_string(),
        description: DEFAULT_DESCRIPTION.to_string(),
        homepage: format!("https://github.com/NixOS/{}", name),
        owner: "admin".to_string(),
        enabled: true,
        visible: true,
        declarative: None,
    }
}

pub fn create_legacy_jobset(project: &str, name: &str) -> Jobset {
    Jobset {
        project: project.to_string(),
        name: name.to_string(),
        state: JobsetState::Enabled,
        visible: true,
        jobset_type: JobsetType::Legacy,
        description: DEFAULT_DESCRIPTION.to_string(),
        flake_uri: None,
        nix_expression: Some(NixExpression {
            file: "release.nix".to_string(),
            input: project.to_string(),
        }),
        check_interval: 60,
        scheduling_shares: 100,
        email_notifications: false,
        email_override: None,
        keep_evaluations: 3,
        inputs: vec![JobsetInput {
            name: "nixpkgs".to_string(),
            input_type: "git".to_string(),
            value: "https://github.com/NixOS/nixpkgs.git nixpkgs-unstable".to_string(),
            notify_committers: false,
        }],
    }
}

pub fn create_flake_jobset(project: &str, name: &str) -> Jobset {
    Jobset {
        jobset_type: JobsetType::Flake,
        flake_uri: Some(format!("github:NixOS/{}", project)),
        nix_expression: None,
        inputs: Vec::new(),
        ..create_legacy_jobset(project, name)
    }
}
