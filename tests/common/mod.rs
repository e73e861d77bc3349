// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

#![allow(dead_code)]

use actix_web::cookie::Cookie;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, test, web};
use ade::app_state::AppState;
use ade::config::ValidatedConfig;
use ade::repository::MemoryRepository;
use ade::util::TestConfigBuilder;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

pub const USER_HEADER: &str = "x-remote-user";

pub const PAGE_ID: &str = "11111111-1111-4111-8111-111111111111";
pub const ALPINE_ID: &str = "22222222-2222-4222-8222-222222222222";
pub const BEACH_ID: &str = "33333333-3333-4333-8333-333333333333";
pub const DRAFT_ID: &str = "44444444-4444-4444-8444-444444444444";
pub const TEMPLATE_ID: &str = "55555555-5555-4555-8555-555555555555";
pub const LOCKED_ID: &str = "66666666-6666-4666-8666-666666666666";
pub const OUTSIDE_ID: &str = "77777777-7777-4777-8777-777777777777";

/// alice may publish below /sites/; bob may not publish anything.
///
/// alice's pending changes: alpine (10:00) and draft (09:00) on 2 March,
/// locked (20 Feb, locked by bob) and outside (10 Jan, no permission).
pub const SEED: &str = r#"
users:
  - name: alice
    publish_paths: ["/sites/"]
  - name: bob
    recent_list_size: 2
resources:
  - id: 11111111-1111-4111-8111-111111111111
    path: /sites/default/index.html
    type_name: containerpage
    title: Home
    state: unchanged
    date_last_modified: 2026-02-01T08:00:00Z
    user_last_modified: admin
    content: |
      {"containers":[
        {"name":"main","type":"center","max_elements":3,
         "elements":[{"id":"22222222-2222-4222-8222-222222222222"}]},
        {"name":"side","type":"right",
         "elements":[{"id":"33333333-3333-4333-8333-333333333333","properties":{"style":"wide"}}]}
      ]}
  - id: 22222222-2222-4222-8222-222222222222
    path: /sites/default/.content/article/article_00001.json
    type_name: article
    title: Alpine news
    state: changed
    date_last_modified: 2026-03-02T10:00:00Z
    user_last_modified: alice
    relations: [44444444-4444-4444-8444-444444444444]
  - id: 33333333-3333-4333-8333-333333333333
    path: /sites/default/.content/article/article_00002.json
    type_name: article
    title: Beach report
    state: unchanged
    date_last_modified: 2026-01-05T12:00:00Z
    user_last_modified: admin
  - id: 44444444-4444-4444-8444-444444444444
    path: /sites/default/.content/article/article_00003.json
    type_name: article
    title: Draft
    state: new
    date_last_modified: 2026-03-02T09:00:00Z
    user_last_modified: alice
  - id: 55555555-5555-4555-8555-555555555555
    path: /system/templates/article.json
    type_name: article
    title: Article template
    state: unchanged
    date_last_modified: 2025-12-01T00:00:00Z
    user_last_modified: admin
    content: '{"title":"New article"}'
  - id: 66666666-6666-4666-8666-666666666666
    path: /sites/default/locked.json
    type_name: article
    title: Locked story
    state: changed
    date_last_modified: 2026-02-20T15:00:00Z
    user_last_modified: alice
    lock: { owner: bob }
  - id: 77777777-7777-4777-8777-777777777777
    path: /other/outside.json
    type_name: article
    title: Outside story
    state: changed
    date_last_modified: 2026-01-10T11:00:00Z
    user_last_modified: alice
"#;

pub fn id(value: &str) -> Uuid {
    Uuid::parse_str(value).expect("uuid")
}

pub struct TestHarness {
    pub config: Arc<ValidatedConfig>,
    pub repository: Arc<MemoryRepository>,
    pub app_state: Arc<AppState>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(TestConfigBuilder::new().build())
    }

    pub fn with_config(config: ValidatedConfig) -> Self {
        let config = Arc::new(config);
        let repository = Arc::new(MemoryRepository::from_seed_str(SEED).expect("seed"));
        let app_state = Arc::new(AppState::with_memory_repository(
            config.clone(),
            repository.clone(),
        ));
        Self {
            config,
            repository,
            app_state,
        }
    }

    pub fn server_uri(&self) -> String {
        format!("{}/server", self.config.ade.path)
    }

    pub fn publish_uri(&self) -> String {
        format!("{}/publish", self.config.ade.path)
    }
}

pub fn build_test_app(
    harness: &TestHarness,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    > + use<>,
> {
    let ade_path = harness.config.ade.path.clone();
    App::new()
        .app_data(web::Data::from(harness.app_state.clone()))
        .configure(move |cfg| ade::ade::configure(cfg, &ade_path))
}

/// Form-encoded editor request for `user`, optionally carrying a session cookie.
pub fn action_request(
    uri: &str,
    user: &str,
    action: &str,
    data: Option<Value>,
    session: Option<&Cookie<'static>>,
) -> test::TestRequest {
    let mut form = vec![("action".to_string(), action.to_string())];
    if let Some(data) = data {
        form.push(("data".to_string(), data.to_string()));
    }
    let mut req = test::TestRequest::post()
        .uri(uri)
        .insert_header((USER_HEADER, user))
        .set_form(form);
    if let Some(cookie) = session {
        req = req.cookie(cookie.clone());
    }
    req
}

pub fn session_cookie<B>(resp: &ServiceResponse<B>, name: &str) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.into_owned())
}

pub async fn read_json(resp: ServiceResponse) -> Value {
    let body = test::read_body(resp).await;
    serde_json::from_slice(&body).expect("json body")
}
