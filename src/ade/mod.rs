// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

pub mod actions;
pub mod client_id;
pub mod container_page;
pub mod element;
pub mod element_cache;
pub mod errors;
pub mod favorites;
pub mod handlers;
pub mod protocol;
pub mod recent;
pub mod search;
pub mod session;

use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::web;
use log::warn;

pub use client_id::ClientId;
pub use container_page::{ContainerPage, ContainerPageCache};
pub use element::ElementDescriptor;
pub use element_cache::SessionElementCache;
pub use errors::{AdeError, AdeErrorKind, AdeResult};
pub use favorites::FavoriteListManager;
pub use recent::RecentListManager;
pub use search::{SearchListManager, SearchPage};
pub use session::{EditorSession, SessionRegistry};

/// Mounts `{ade_path}/server` and `{ade_path}/publish`.
pub fn configure(cfg: &mut web::ServiceConfig, ade_path: &str) {
    let form_config = web::FormConfig::default().error_handler(|err, _req| {
        let message = format!("Malformed request: {}", err);
        warn!("{}", message);
        InternalError::from_response(
            err,
            protocol::error_response(StatusCode::BAD_REQUEST, &message),
        )
        .into()
    });

    cfg.service(
        web::scope(ade_path)
            .app_data(form_config)
            .route("/server", web::post().to(handlers::server))
            .route("/publish", web::post().to(handlers::publish)),
    );
}
