/*
 * SPDX-FileCopyrightText: 2025 Wavelens UG <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use crate::client::HydraClient;
use crate::diagnostics::{Diagnostic, Diagnostics, Operation, summary};
use crate::error::{ProviderError, ProviderResult};
use crate::resources::jobset::{self, Jobset};
use crate::resources::project::{self, Project};
use crate::resources::{ResourceData, ResourceKind};
use crate::state::{StateConfiguration, StateFile, is_tracked};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action<T> {
    Create(T),
    Update(T),
    Delete,
}

impl<T> Action<T> {
    pub fn operation(&self) -> Operation {
        match self {
            Action::Create(_) => Operation::Create,
            Action::Update(_) => Operation::Update,
            Action::Delete => Operation::Delete,
        }
    }

    fn symbol(&self) -> char {
        match self {
            Action::Create(_) => '+',
            Action::Update(_) => '~',
            Action::Delete => '-',
        }
    }

    fn is_delete(&self) -> bool {
        matches!(self, Action::Delete)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Change<T> {
    pub address: String,
    pub action: Action<T>,
}

#[derive(Clone, Copy, Debug)]
pub enum Step<'a> {
    Project(&'a Change<Project>),
    Jobset(&'a Change<Jobset>),
}

impl Step<'_> {
    fn kind(&self) -> ResourceKind {
        match self {
            Step::Project(_) => ResourceKind::Project,
            Step::Jobset(_) => ResourceKind::Jobset,
        }
    }

    fn operation(&self) -> Operation {
        match self {
            Step::Project(change) => change.action.operation(),
            Step::Jobset(change) => change.action.operation(),
        }
    }
}

impl fmt::Display for Step<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Project(change) => {
                write!(f, "  {} project.{}", change.action.symbol(), change.address)
            }
            Step::Jobset(change) => {
                write!(f, "  {} jobset.{}", change.action.symbol(), change.address)
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Plan {
    pub projects: Vec<Change<Project>>,
    pub jobsets: Vec<Change<Jobset>>,
    pub unchanged: usize,
}

impl Plan {
    /// Execution order: jobset deletions, project creates and updates, jobset
    /// creates and updates, project deletions.
    pub fn steps(&self) -> Vec<Step<'_>> {
        let jobset_deletes = self.jobsets.iter().filter(|c| c.action.is_delete());
        let project_upserts = self.projects.iter().filter(|c| !c.action.is_delete());
        let jobset_upserts = self.jobsets.iter().filter(|c| !c.action.is_delete());
        let project_deletes = self.projects.iter().filter(|c| c.action.is_delete());

        jobset_deletes
            .map(Step::Jobset)
            .chain(project_upserts.map(Step::Project))
            .chain(jobset_upserts.map(Step::Jobset))
            .chain(project_deletes.map(Step::Project))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty() && self.jobsets.is_empty()
    }

    pub fn summary(&self) -> String {
        let (mut add, mut change, mut destroy) = (0, 0, 0);
        for step in self.steps() {
            match step.operation() {
                Operation::Create => add += 1,
                Operation::Update => change += 1,
                _ => destroy += 1,
            }
        }

        format!(
            "Plan: {} to add, {} to change, {} to destroy.",
            add, change, destroy
        )
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "No changes. Hydra matches the configuration.");
        }

        for step in self.steps() {
            writeln!(f, "{}", step)?;
        }

        write!(f, "\n{}", self.summary())
    }
}

/// Reads every tracked resource back from the server. Resources that vanished
/// are dropped from `state` with a warning.
pub async fn refresh<C: HydraClient + ?Sized>(client: &C, state: &mut StateFile) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();

    for (address, data) in state.projects.iter_mut() {
        if !data.exists() {
            continue;
        }

        if let Err(err) = project::read(client, data).await {
            let cancelled = err.is_cancelled();
            record_read_failure(&mut diagnostics, ResourceKind::Project, address, err);
            if cancelled {
                return diagnostics;
            }
        }
    }

    for (address, data) in state.jobsets.iter_mut() {
        if !data.exists() {
            continue;
        }

        if let Err(err) = jobset::read(client, data).await {
            let cancelled = err.is_cancelled();
            record_read_failure(&mut diagnostics, ResourceKind::Jobset, address, err);
            if cancelled {
                return diagnostics;
            }
        }
    }

    state.projects.retain(|_, data| data.exists());
    state.jobsets.retain(|_, data| data.exists());

    diagnostics
}

fn record_read_failure(
    diagnostics: &mut Diagnostics,
    kind: ResourceKind,
    address: &str,
    err: ProviderError,
) {
    if err.is_not_found() {
        tracing::warn!("{} {} was removed outside of hydra-provider", kind, address);
        diagnostics.push(Diagnostic::warning(
            "Drift detected",
            format!(
                "{}.{} no longer exists on the server and will be recreated if still declared.",
                kind.to_string().to_lowercase(),
                address
            ),
        ));
    } else {
        diagnostics.extend(err.into_diagnostics(&summary(Operation::Read, kind)));
    }
}

/// Diffs the declared resources against the last refreshed state.
pub fn plan(desired: &StateConfiguration, state: &StateFile) -> Plan {
    let mut plan = Plan::default();

    for (address, project) in &desired.project {
        match state.projects.get(address).filter(|data| data.exists()) {
            None => plan.projects.push(Change {
                address: address.clone(),
                action: Action::Create(project.clone()),
            }),
            Some(current) if current.attributes.normalized() != project.normalized() => {
                plan.projects.push(Change {
                    address: address.clone(),
                    action: Action::Update(project.clone()),
                })
            }
            Some(_) => plan.unchanged += 1,
        }
    }

    for (address, data) in &state.projects {
        if data.exists() && !desired.project.contains_key(address) {
            plan.projects.push(Change {
                address: address.clone(),
                action: Action::Delete,
            });
        }
    }

    for (address, jobset) in &desired.jobset {
        match state.jobsets.get(address).filter(|data| data.exists()) {
            None => plan.jobsets.push(Change {
                address: address.clone(),
                action: Action::Create(jobset.clone()),
            }),
            Some(current) if current.attributes.normalized() != jobset.normalized() => {
                plan.jobsets.push(Change {
                    address: address.clone(),
                    action: Action::Update(jobset.clone()),
                })
            }
            Some(_) => plan.unchanged += 1,
        }
    }

    for (address, data) in &state.jobsets {
        if data.exists() && !desired.jobset.contains_key(address) {
            plan.jobsets.push(Change {
                address: address.clone(),
                action: Action::Delete,
            });
        }
    }

    plan
}

async fn apply_project<C: HydraClient + ?Sized>(
    client: &C,
    state: &mut StateFile,
    change: &Change<Project>,
) -> ProviderResult<()> {
    match &change.action {
        Action::Create(attributes) => {
            let mut data = ResourceData::new(attributes.clone());
            project::create(client, &mut data).await?;
            state.projects.insert(change.address.clone(), data);
        }
        Action::Update(attributes) => {
            let mut data = state
                .projects
                .get(&change.address)
                .cloned()
                .unwrap_or_default();
            let old = data.id().map(str::to_string);

            data.attributes = attributes.clone();
            project::update(client, &mut data).await?;

            if let Some(old) = old.filter(|old| data.id() != Some(old.as_str())) {
                state.rename_project(&old, &data.attributes.name);
            }

            state.projects.insert(change.address.clone(), data);
        }
        Action::Delete => {
            if let Some(data) = state.projects.get_mut(&change.address) {
                project::delete(client, data).await?;
            }

            state.projects.remove(&change.address);
        }
    }

    Ok(())
}

async fn apply_jobset<C: HydraClient + ?Sized>(
    client: &C,
    state: &mut StateFile,
    change: &Change<Jobset>,
) -> ProviderResult<()> {
    match &change.action {
        Action::Create(attributes) => {
            let mut data = ResourceData::new(attributes.clone());
            jobset::create(client, &mut data).await?;
            state.jobsets.insert(change.address.clone(), data);
        }
        Action::Update(attributes) => {
            let mut data = state
                .jobsets
                .get(&change.address)
                .cloned()
                .unwrap_or_default();

            data.attributes = attributes.clone();
            jobset::update(client, &mut data).await?;
            state.jobsets.insert(change.address.clone(), data);
        }
        Action::Delete => {
            if let Some(data) = state.jobsets.get_mut(&change.address) {
                jobset::delete(client, data).await?;
            }

            state.jobsets.remove(&change.address);
        }
    }

    Ok(())
}

/// Executes `plan`, calling `persist` after every successful change. A failed
/// change is reported and the remaining steps still run, except after
/// cancellation.
pub async fn apply<C, F>(
    client: &C,
    state: &mut StateFile,
    plan: &Plan,
    mut persist: F,
) -> Diagnostics
where
    C: HydraClient + ?Sized,
    F: FnMut(&StateFile) -> anyhow::Result<()>,
{
    let mut diagnostics = Diagnostics::new();

    for step in plan.steps() {
        let result = match step {
            Step::Project(change) => apply_project(client, state, change).await,
            Step::Jobset(change) => apply_jobset(client, state, change).await,
        };

        match result {
            Ok(()) => {
                if let Err(err) = persist(state) {
                    diagnostics.push(Diagnostic::error("Failed to save state", format!("{:#}", err)));
                    return diagnostics;
                }
            }
            Err(err) => {
                let cancelled = err.is_cancelled();
                diagnostics.extend(err.into_diagnostics(&summary(step.operation(), step.kind())));

                if cancelled {
                    return diagnostics;
                }
            }
        }
    }

    diagnostics
}

/// Deletes every tracked resource.
pub async fn destroy<C, F>(client: &C, state: &mut StateFile, persist: F) -> Diagnostics
where
    C: HydraClient + ?Sized,
    F: FnMut(&StateFile) -> anyhow::Result<()>,
{
    let plan = plan(&StateConfiguration::default(), state);
    apply(client, state, &plan, persist).await
}

/// Starts tracking an existing remote resource under `address`.
pub async fn import<C: HydraClient + ?Sized>(
    client: &C,
    state: &mut StateFile,
    kind: ResourceKind,
    address: &str,
    id: &str,
) -> Diagnostics {
    let failure = summary(Operation::Import, kind);

    if is_tracked(state, address) {
        return Diagnostic::error(
            &failure,
            format!("Address `{}` is already managed, remove it from the state first.", address),
        )
        .into();
    }

    let result = match kind {
        ResourceKind::Project => project::import(client, id)
            .await
            .map(|data| state.projects.insert(address.to_string(), data))
            .map(drop),
        ResourceKind::Jobset => jobset::import(client, id)
            .await
            .map(|data| state.jobsets.insert(address.to_string(), data))
            .map(drop),
    };

    match result {
        Ok(()) => {
            tracing::info!("Imported {} {} as {}", kind, id, address);
            Diagnostics::new()
        }
        Err(err) => err.into_diagnostics(&failure),
    }
}
