/*
 * SPDX-FileCopyrightText: 2025 Wavelens UG <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use crate::*;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Debug)]
struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ErrorResponse {
    pub error: Option<String>,
}

/// Hydra compares the `Origin` header against its own host, so it must carry
/// only scheme, host and port, never user-info or a path.
pub fn origin_of(server: &Url) -> String {
    server.origin().ascii_serialization()
}

impl HydraConnection {
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ConnectorError> {
        let url = self.endpoint(&["login"])?;
        let payload = serde_json::to_vec(&LoginRequest { username, password })?;
        let origin = origin_of(&self.base);

        let res = self
            .send(RequestType::POST, url, Some(payload), Some(&origin))
            .await?;
        let res: ApiResponse<serde_json::Value> = parse_response(res).await;

        if res.status.is_success() {
            tracing::debug!(username, "Logged in to Hydra");
            return Ok(());
        }

        let detail = serde_json::from_str::<ErrorResponse>(&res.raw)
            .ok()
            .and_then(|e| e.error)
            .unwrap_or_else(|| res.describe());

        Err(ConnectorError::Authentication(detail))
    }
}
