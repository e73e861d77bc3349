// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::protocol::error_response;
use crate::repository::{RepositoryError, RepositoryErrorKind};
use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdeErrorKind {
    BadRequest,
    NotFound,
    Locked,
    PermissionDenied,
    Internal,
}

#[derive(Debug, Clone)]
pub struct AdeError {
    kind: AdeErrorKind,
    message: String,
}

impl AdeError {
    pub fn new(kind: AdeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(AdeErrorKind::BadRequest, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(AdeErrorKind::NotFound, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(AdeErrorKind::Internal, message)
    }

    pub fn kind(&self) -> AdeErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Action failures travel inside a 200 response; the editor reads `state`.
    pub fn to_response(&self) -> HttpResponse {
        error_response(StatusCode::OK, &self.message)
    }
}

impl fmt::Display for AdeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} error: {}", self.kind, self.message)
    }
}

impl Error for AdeError {}

impl From<RepositoryError> for AdeError {
    fn from(error: RepositoryError) -> Self {
        let kind = match error.kind() {
            RepositoryErrorKind::NotFound => AdeErrorKind::NotFound,
            RepositoryErrorKind::Locked => AdeErrorKind::Locked,
            RepositoryErrorKind::PermissionDenied => AdeErrorKind::PermissionDenied,
            RepositoryErrorKind::InvalidState | RepositoryErrorKind::Conflict => {
                AdeErrorKind::BadRequest
            }
            RepositoryErrorKind::Internal => AdeErrorKind::Internal,
        };
        Self::new(kind, error.message())
    }
}

impl From<serde_json::Error> for AdeError {
    fn from(error: serde_json::Error) -> Self {
        Self::bad_request(format!("Invalid data: {}", error))
    }
}

pub type AdeResult<T> = Result<T, AdeError>;
