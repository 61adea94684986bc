/*
 * SPDX-FileCopyrightText: 2025 Wavelens UG <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

pub mod client;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod reconcile;
pub mod resources;
pub mod state;


pub use client::HydraClient;
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{ProviderError, ProviderResult};
pub use resources::{ResourceData, ResourceKind};
