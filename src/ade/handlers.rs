// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::actions::{self, ActionContext};
use super::errors::{AdeError, AdeResult};
use super::protocol::{
    AdeRequestParams, PublishAction, ServerAction, error_response, ok_envelope,
};
use super::session::EditorSession;
use crate::app_state::AppState;
use crate::publish::handlers as publish_handlers;
use crate::repository::UserInfo;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use log::{debug, error, warn};
use serde_json::Value;
use std::sync::Arc;

/// The authenticated user and editor session behind one request.
pub(crate) struct EditorRequest {
    pub user: UserInfo,
    pub session: Arc<EditorSession>,
    new_session: bool,
}

impl EditorRequest {
    /// Reads the user header and attaches the session. On failure the
    /// returned response is final.
    pub fn begin(req: &HttpRequest, state: &AppState) -> Result<Self, HttpResponse> {
        let ade = &state.config.ade;
        let user_name = req
            .headers()
            .get(ade.user_header.as_str())
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty());
        let Some(user_name) = user_name else {
            warn!("Rejected ADE request without {} header", ade.user_header);
            return Err(error_response(
                StatusCode::UNAUTHORIZED,
                "Authentication required",
            ));
        };

        let user = match state.repository.read_user(user_name) {
            Ok(user) => user,
            Err(err) => {
                warn!("Rejected ADE request for {}: {}", user_name, err);
                return Err(error_response(StatusCode::FORBIDDEN, err.message()));
            }
        };

        let cookie = req.cookie(&ade.session_cookie);
        let session_id = cookie.as_ref().map(|cookie| cookie.value());
        let (session, new_session) = state
            .sessions
            .session_for(session_id, &user.name)
            .map_err(|err| err.to_response())?;

        Ok(Self {
            user,
            session,
            new_session,
        })
    }

    /// Converts the action result into the response envelope, attaching the
    /// session cookie when a session was created for this request.
    pub fn finish(
        &self,
        state: &AppState,
        action: &str,
        result: AdeResult<Value>,
    ) -> HttpResponse {
        let mut response = match result {
            Ok(payload) => {
                debug!("ADE action {} for {} succeeded", action, self.user.name);
                HttpResponse::Ok()
                    .insert_header(("Cache-Control", "no-store"))
                    .json(ok_envelope(payload))
            }
            Err(err) => {
                error!("ADE action {} for {} failed: {}", action, self.user.name, err);
                err.to_response()
            }
        };

        if self.new_session {
            let ade = &state.config.ade;
            let cookie = Cookie::build(ade.session_cookie.clone(), self.session.id().to_string())
                .path(ade.path.clone())
                .http_only(true)
                .same_site(SameSite::Lax)
                .finish();
            if let Err(err) = response.add_cookie(&cookie) {
                error!("Failed to set ADE session cookie: {}", err);
            }
        }
        response
    }
}

pub async fn server(
    req: HttpRequest,
    form: web::Form<AdeRequestParams>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let params = form.into_inner();
    let request = match EditorRequest::begin(&req, &state) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let result = match ServerAction::parse(&params.action) {
        Some(action) => {
            let ctx = ActionContext {
                state: &state,
                user: &request.user,
                session: &request.session,
            };
            actions::dispatch(action, &params, &ctx)
        }
        None => Err(AdeError::bad_request(format!(
            "Unknown action '{}'",
            params.action
        ))),
    };
    request.finish(&state, &params.action, result)
}

pub async fn publish(
    req: HttpRequest,
    form: web::Form<AdeRequestParams>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let params = form.into_inner();
    let request = match EditorRequest::begin(&req, &state) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let result = match PublishAction::parse(&params.action) {
        Some(action) => publish_handlers::dispatch(action, &params, &state, &request.user),
        None => Err(AdeError::bad_request(format!(
            "Unknown publish action '{}'",
            params.action
        ))),
    };
    request.finish(&state, &params.action, result)
}
