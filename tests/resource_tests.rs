/*
 * SPDX-FileCopyrightText: 2025 Wavelens UG <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

mod common;

use common::*;
use hydra_provider::resources::jobset::{self, JobsetState, NixExpression};
use hydra_provider::resources::project::{self, Declarative};
use hydra_provider::{ProviderError, ResourceData};
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_ofborg_release_round_trip() {
    let hydra = MemoryHydra::new();

    let mut ofborg = ResourceData::new(create_project("ofborg"));
    assert_ok!(project::create(&hydra, &mut ofborg).await);
    assert_eq!(ofborg.id(), Some("ofborg"));

    let declared = create_legacy_jobset("ofborg", "release");
    let mut release = ResourceData::new(declared.clone());
    assert_ok!(jobset::create(&hydra, &mut release).await);
    assert_eq!(release.id(), Some("ofborg/release"));

    assert_ok!(jobset::read(&hydra, &mut release).await);
    assert_eq!(
        release.attributes.nix_expression,
        Some(NixExpression {
            file: "release.nix".to_string(),
            input: "ofborg".to_string(),
        })
    );
    assert_eq!(release.attributes.inputs.len(), 1);
    assert_eq!(release.attributes.inputs[0].name, "nixpkgs");
    assert_eq!(release.attributes, declared);
}

#[tokio::test]
async fn test_project_visibility_round_trip() {
    let hydra = MemoryHydra::new();

    let mut attributes = create_project("nixpkgs");
    attributes.visible = false;
    attributes.enabled = false;
    attributes.declarative = Some(Declarative {
        file: "spec.json".to_string(),
        input_type: "git".to_string(),
        value: "https://github.com/NixOS/nixpkgs master".to_string(),
    });

    let mut data = ResourceData::new(attributes.clone());
    assert_ok!(project::create(&hydra, &mut data).await);
    assert_ok!(project::read(&hydra, &mut data).await);

    assert_eq!(data.attributes, attributes);
}

#[tokio::test]
async fn test_project_rename_moves_identity() {
    let hydra = MemoryHydra::new();

    let mut data = ResourceData::new(create_project("ofborg"));
    assert_ok!(project::create(&hydra, &mut data).await);

    let mut jobset_data = ResourceData::new(create_legacy_jobset("ofborg", "release"));
    assert_ok!(jobset::create(&hydra, &mut jobset_data).await);

    data.attributes.name = "ofborg-ci".to_string();
    assert_ok!(project::update(&hydra, &mut data).await);
    assert_eq!(data.id(), Some("ofborg-ci"));
    assert_eq!(data.attributes.name, "ofborg-ci");

    let mut old = ResourceData::with_id("ofborg", create_project("ofborg"));
    let err = assert_err!(project::read(&hydra, &mut old).await);
    assert!(err.is_not_found());
    assert!(!old.exists());

    assert!(hydra.has_jobset("ofborg-ci", "release"));
}

#[tokio::test]
async fn test_jobset_delete_then_read() {
    let hydra = MemoryHydra::new();
    hydra.seed_project("ofborg");

    let mut data = ResourceData::new(create_flake_jobset("ofborg", "main"));
    assert_ok!(jobset::create(&hydra, &mut data).await);
    assert_ok!(jobset::delete(&hydra, &mut data).await);
    assert!(!data.exists());

    data.set_id("ofborg/main");
    let err = assert_err!(jobset::read(&hydra, &mut data).await);
    assert!(err.is_not_found());
    assert!(!data.exists());
}

#[tokio::test]
async fn test_legacy_without_nix_expression_conflict() {
    let hydra = MemoryHydra::new();
    hydra.seed_project("ofborg");

    let mut attributes = create_legacy_jobset("ofborg", "release");
    attributes.nix_expression = None;
    let mut data = ResourceData::new(attributes);

    let err = assert_err!(jobset::create(&hydra, &mut data).await);
    assert!(
        err.to_string()
            .contains("Jobset type \"legacy\" requires a non-empty nix_expression.")
    );
    assert_eq!(hydra.writes(), 0);
    assert!(!hydra.has_jobset("ofborg", "release"));
}

#[tokio::test]
async fn test_jobset_create_twice() {
    let hydra = MemoryHydra::new();
    hydra.seed_project("patchelf");

    let mut first = ResourceData::new(create_flake_jobset("patchelf", "master"));
    assert_ok!(jobset::create(&hydra, &mut first).await);

    let mut second = ResourceData::new(create_flake_jobset("patchelf", "master"));
    let err = assert_err!(jobset::create(&hydra, &mut second).await);
    assert!(matches!(err, ProviderError::AlreadyExists { .. }));
    assert_eq!(hydra.writes(), 1);
}

#[tokio::test]
async fn test_jobset_move_between_names() {
    let hydra = MemoryHydra::new();
    hydra.seed_project("ofborg");

    let mut data = ResourceData::new(create_legacy_jobset("ofborg", "release"));
    assert_ok!(jobset::create(&hydra, &mut data).await);

    data.attributes.name = "release-24.05".to_string();
    data.attributes.state = JobsetState::OneAtATime;
    assert_ok!(jobset::update(&hydra, &mut data).await);

    assert_eq!(data.id(), Some("ofborg/release-24.05"));
    assert_eq!(data.attributes.state, JobsetState::OneAtATime);
    assert!(!hydra.has_jobset("ofborg", "release"));
}

#[tokio::test]
async fn test_import_existing_jobset() {
    let hydra = MemoryHydra::new();
    hydra.seed_project("ofborg");

    let mut data = ResourceData::new(create_legacy_jobset("ofborg", "release"));
    assert_ok!(jobset::create(&hydra, &mut data).await);

    let imported = assert_ok!(jobset::import(&hydra, "ofborg/release").await);
    assert_eq!(imported.attributes, data.attributes);

    let err = assert_err!(jobset::import(&hydra, "ofborg/release/extra").await);
    assert!(matches!(err, ProviderError::MalformedId(_)));
}
