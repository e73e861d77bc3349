// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Request/response framing shared by the ADE endpoints.
//!
//! Requests are form posts with an `action` name and an optional `data`
//! field holding JSON text. Responses are JSON objects carrying `state`
//! (`ok` or `error`); errors add an `error` message.

use super::errors::{AdeError, AdeResult};
use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

pub const FIELD_STATE: &str = "state";
pub const FIELD_ERROR: &str = "error";
pub const STATE_OK: &str = "ok";
pub const STATE_ERROR: &str = "error";

pub const ACTION_ALL: &str = "all";
pub const ACTION_ELEM: &str = "elem";
pub const ACTION_FAV: &str = "fav";
pub const ACTION_REC: &str = "rec";
pub const ACTION_STORE_FAV: &str = "storefav";
pub const ACTION_STORE_REC: &str = "storerec";
pub const ACTION_CNT: &str = "cnt";
pub const ACTION_START_EDIT: &str = "startedit";
pub const ACTION_STOP_EDIT: &str = "stopedit";
pub const ACTION_SEARCH: &str = "search";
pub const ACTION_LS: &str = "ls";
pub const ACTION_NEW: &str = "new";
pub const ACTION_DEL: &str = "del";

pub const ACTION_PUBLISH_LIST: &str = "publish_list";
pub const ACTION_PUBLISH: &str = "publish";
pub const ACTION_REMOVE: &str = "remove";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerAction {
    All,
    Elem,
    Fav,
    Rec,
    StoreFav,
    StoreRec,
    Cnt,
    StartEdit,
    StopEdit,
    Search,
    Ls,
    New,
    Del,
}

impl ServerAction {
    pub fn parse(name: &str) -> Option<Self> {
        let action = match name {
            ACTION_ALL => ServerAction::All,
            ACTION_ELEM => ServerAction::Elem,
            ACTION_FAV => ServerAction::Fav,
            ACTION_REC => ServerAction::Rec,
            ACTION_STORE_FAV => ServerAction::StoreFav,
            ACTION_STORE_REC => ServerAction::StoreRec,
            ACTION_CNT => ServerAction::Cnt,
            ACTION_START_EDIT => ServerAction::StartEdit,
            ACTION_STOP_EDIT => ServerAction::StopEdit,
            ACTION_SEARCH => ServerAction::Search,
            ACTION_LS => ServerAction::Ls,
            ACTION_NEW => ServerAction::New,
            ACTION_DEL => ServerAction::Del,
            _ => return None,
        };
        Some(action)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishAction {
    PublishList,
    Publish,
    Remove,
}

impl PublishAction {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            ACTION_PUBLISH_LIST => Some(PublishAction::PublishList),
            ACTION_PUBLISH => Some(PublishAction::Publish),
            ACTION_REMOVE => Some(PublishAction::Remove),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdeRequestParams {
    pub action: String,
    #[serde(default)]
    pub data: Option<String>,
}

impl AdeRequestParams {
    /// Parses the `data` field; a missing or blank field is an error.
    pub fn data<T: DeserializeOwned>(&self) -> AdeResult<T> {
        match self.data.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Ok(serde_json::from_str(raw)?),
            _ => Err(AdeError::bad_request(format!(
                "Action '{}' requires a data parameter",
                self.action
            ))),
        }
    }

    /// Parses the `data` field when present. Blank and `null` count as absent.
    fn data_opt<T: DeserializeOwned>(&self) -> AdeResult<Option<T>> {
        match self.data.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() && raw != "null" => Ok(Some(serde_json::from_str(raw)?)),
            _ => Ok(None),
        }
    }

    pub fn data_or_default<T: DeserializeOwned + Default>(&self) -> AdeResult<T> {
        Ok(self.data_opt()?.unwrap_or_default())
    }
}

/// Wraps an action payload into the success envelope. Non-object payloads
/// are placed under `result`.
pub fn ok_envelope(payload: Value) -> Value {
    let mut object = match payload {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("result".to_string(), other);
            map
        }
    };
    object.insert(FIELD_STATE.to_string(), Value::from(STATE_OK));
    Value::Object(object)
}

pub fn error_envelope(message: &str) -> Value {
    let mut object = Map::new();
    object.insert(FIELD_STATE.to_string(), Value::from(STATE_ERROR));
    object.insert(FIELD_ERROR.to_string(), Value::from(message));
    Value::Object(object)
}

pub fn error_response(status: StatusCode, message: &str) -> HttpResponse {
    HttpResponse::build(status)
        .insert_header(("Cache-Control", "no-store"))
        .json(error_envelope(message))
}
