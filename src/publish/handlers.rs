// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::{PublishOptionsOverride, PublishRequest};
use crate::ade::errors::{AdeError, AdeResult};
use crate::ade::protocol::{AdeRequestParams, PublishAction};
use crate::app_state::AppState;
use crate::repository::{ResourceId, UserInfo};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
struct RemoveRequest {
    #[serde(default)]
    resources: Vec<ResourceId>,
}

pub fn dispatch(
    action: PublishAction,
    params: &AdeRequestParams,
    state: &AppState,
    user: &UserInfo,
) -> AdeResult<Value> {
    match action {
        PublishAction::PublishList => {
            let overrides: PublishOptionsOverride = params.data_or_default()?;
            let options = state.publish.default_options().overridden_by(overrides);
            let list = state.publish.publish_list(user, options)?;
            Ok(json!({
                "count": list.grouped_count(),
                "groups": list.groups,
                "already_published": list.already_published,
                "skipped": list.skipped,
            }))
        }
        PublishAction::Publish => {
            let request: PublishRequest = params.data()?;
            let outcome = state.publish.publish(user, &request)?;
            serde_json::to_value(outcome)
                .map_err(|e| AdeError::internal(format!("Failed to encode publish outcome: {}", e)))
        }
        PublishAction::Remove => {
            let request: RemoveRequest = params.data()?;
            state
                .publish
                .remove_from_list(user, &request.resources)?;
            Ok(json!({ "removed": request.resources }))
        }
    }
}
