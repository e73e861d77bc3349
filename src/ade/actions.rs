// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Server actions of the page editor. Each action takes the parsed request
//! and returns the payload merged into the success envelope.

use super::client_id::ClientId;
use super::container_page::{Container, ContainerElement, ContainerPage};
use super::element::ElementDescriptor;
use super::errors::{AdeError, AdeErrorKind, AdeResult};
use super::protocol::{AdeRequestParams, ServerAction};
use super::search::SearchPage;
use super::session::EditorSession;
use crate::app_state::AppState;
use crate::config::expand_name_pattern;
use crate::repository::{RepositoryErrorKind, ResourceId, SearchQuery, UserInfo};
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// Highest counter tried when looking for a free name for a new element.
const MAX_NEW_ELEMENT_NUMBER: u32 = 99_999;

pub struct ActionContext<'a> {
    pub state: &'a AppState,
    pub user: &'a UserInfo,
    pub session: &'a EditorSession,
}

#[derive(Debug, Deserialize)]
struct PageRef {
    page: ResourceId,
}

#[derive(Debug, Deserialize)]
struct SavePageRequest {
    page: ResourceId,
    #[serde(default)]
    containers: Vec<Container>,
}

#[derive(Debug, Deserialize)]
struct NewElementRequest {
    #[serde(rename = "type")]
    type_name: String,
}

#[derive(Debug, Deserialize)]
struct ElementRef {
    id: String,
}

pub fn dispatch(
    action: ServerAction,
    params: &AdeRequestParams,
    ctx: &ActionContext<'_>,
) -> AdeResult<Value> {
    match action {
        ServerAction::All => load_all(ctx, params.data()?),
        ServerAction::Elem => load_elements(ctx, params.data()?),
        ServerAction::Fav => load_favorites(ctx),
        ServerAction::Rec => load_recent(ctx),
        ServerAction::StoreFav => store_favorites(ctx, params.data()?),
        ServerAction::StoreRec => store_recent(ctx, params.data()?),
        ServerAction::Cnt => save_page(ctx, params.data()?),
        ServerAction::StartEdit => start_edit(ctx, params.data()?),
        ServerAction::StopEdit => stop_edit(ctx, params.data()?),
        ServerAction::Search => start_search(ctx, params.data_or_default()?),
        ServerAction::Ls => next_search_page(ctx),
        ServerAction::New => create_element(ctx, params.data()?),
        ServerAction::Del => delete_element(ctx, params.data()?),
    }
}

fn resolve(ctx: &ActionContext<'_>, client_id: &str) -> AdeResult<ElementDescriptor> {
    ctx.session
        .elements
        .resolve(ctx.state.repository.as_ref(), &ctx.user.name, client_id)
}

/// Resolves every id it can; unresolvable ids are logged and returned separately.
fn resolve_many<'i, I>(
    ctx: &ActionContext<'_>,
    ids: I,
) -> (BTreeMap<String, ElementDescriptor>, Vec<String>)
where
    I: IntoIterator<Item = &'i String>,
{
    let mut elements = BTreeMap::new();
    let mut missing = Vec::new();
    for id in ids {
        if elements.contains_key(id) {
            continue;
        }
        match resolve(ctx, id) {
            Ok(descriptor) => {
                elements.insert(id.clone(), descriptor);
            }
            Err(error) => {
                warn!("Skipping element {}: {}", id, error);
                missing.push(id.clone());
            }
        }
    }
    (elements, missing)
}

fn load_all(ctx: &ActionContext<'_>, data: PageRef) -> AdeResult<Value> {
    let repository = ctx.state.repository.as_ref();
    let resource = repository.read_resource(data.page)?;
    let page = ctx.state.page_cache.get(repository, data.page)?;

    let mut elements = BTreeMap::new();
    let mut containers = Vec::with_capacity(page.containers.len());
    for container in &page.containers {
        let mut placed = Vec::with_capacity(container.elements.len());
        for element in &container.elements {
            let client_id = match ClientId::parse(&element.id) {
                Ok(client_id) => client_id,
                Err(error) => {
                    warn!("Skipping element {} on {}: {}", element.id, resource.path, error);
                    continue;
                }
            };
            let registered = ctx.session.elements.register(
                repository,
                &ctx.user.name,
                client_id.structure_id(),
                element.properties.clone(),
            );
            match registered {
                Ok(descriptor) => {
                    placed.push(descriptor.client_id.clone());
                    elements.insert(descriptor.client_id.clone(), descriptor);
                }
                Err(error) => warn!("Skipping element {} on {}: {}", element.id, resource.path, error),
            }
        }
        containers.push(json!({
            "name": container.name,
            "type": container.type_name,
            "max_elements": container.max_elements,
            "elements": placed,
        }));
    }

    let favorites = ctx.state.favorites.get(&ctx.user.name);
    let recent = ctx.state.recent.get(ctx.user);
    let (listed, _) = resolve_many(ctx, favorites.iter().chain(recent.iter()));
    for (client_id, descriptor) in listed {
        elements.entry(client_id).or_insert(descriptor);
    }

    Ok(json!({
        "page": {
            "id": resource.id,
            "path": resource.path,
            "locked_by": resource.lock.as_ref().map(|lock| lock.owner.clone()),
        },
        "containers": containers,
        "elements": elements,
        "favorites": favorites,
        "recent": recent,
    }))
}

fn load_elements(ctx: &ActionContext<'_>, ids: Vec<String>) -> AdeResult<Value> {
    let (elements, missing) = resolve_many(ctx, ids.iter());
    Ok(json!({ "elements": elements, "missing": missing }))
}

fn load_favorites(ctx: &ActionContext<'_>) -> AdeResult<Value> {
    let favorites = ctx.state.favorites.get(&ctx.user.name);
    let (elements, _) = resolve_many(ctx, favorites.iter());
    Ok(json!({ "favorites": favorites, "elements": elements }))
}

fn load_recent(ctx: &ActionContext<'_>) -> AdeResult<Value> {
    let recent = ctx.state.recent.get(ctx.user);
    let (elements, _) = resolve_many(ctx, recent.iter());
    Ok(json!({ "recent": recent, "elements": elements }))
}

fn check_client_ids(ids: &[String]) -> AdeResult<()> {
    for id in ids {
        ClientId::parse(id)?;
    }
    Ok(())
}

fn store_favorites(ctx: &ActionContext<'_>, ids: Vec<String>) -> AdeResult<Value> {
    check_client_ids(&ids)?;
    let stored = ctx.state.favorites.set(&ctx.user.name, &ids);
    debug!("Stored {} favorites for {}", stored.len(), ctx.user.name);
    Ok(json!({ "favorites": stored }))
}

fn store_recent(ctx: &ActionContext<'_>, ids: Vec<String>) -> AdeResult<Value> {
    check_client_ids(&ids)?;
    let stored = ctx.state.recent.set(ctx.user, &ids);
    Ok(json!({ "recent": stored }))
}

/// Stores the page with plain structure ids; element properties are taken
/// from the request or, for hashed ids, from the session cache.
fn save_page(ctx: &ActionContext<'_>, data: SavePageRequest) -> AdeResult<Value> {
    let mut containers = Vec::with_capacity(data.containers.len());
    for container in data.containers {
        let mut elements = Vec::with_capacity(container.elements.len());
        for element in container.elements {
            let descriptor = resolve(ctx, &element.id).map_err(|error| {
                AdeError::new(
                    error.kind(),
                    format!("Cannot place element {}: {}", element.id, error.message()),
                )
            })?;
            let properties = if element.properties.is_empty() {
                descriptor.properties
            } else {
                element.properties
            };
            elements.push(ContainerElement {
                id: descriptor.structure_id.to_string(),
                properties,
            });
        }
        containers.push(Container {
            name: container.name,
            type_name: container.type_name,
            max_elements: container.max_elements,
            elements,
        });
    }

    let page = ContainerPage { containers };
    ctx.state.page_cache.save(
        ctx.state.repository.as_ref(),
        &ctx.user.name,
        data.page,
        &page,
    )?;
    Ok(json!({ "page": data.page }))
}

fn start_edit(ctx: &ActionContext<'_>, data: PageRef) -> AdeResult<Value> {
    ctx.state
        .repository
        .lock_resource(&ctx.user.name, data.page)?;
    info!("{} started editing {}", ctx.user.name, data.page);
    Ok(json!({ "page": data.page, "locked_by": ctx.user.name }))
}

fn stop_edit(ctx: &ActionContext<'_>, data: PageRef) -> AdeResult<Value> {
    ctx.state
        .repository
        .unlock_resource(&ctx.user.name, data.page)?;
    info!("{} stopped editing {}", ctx.user.name, data.page);
    Ok(json!({ "page": data.page }))
}

fn search_response(ctx: &ActionContext<'_>, page: SearchPage) -> AdeResult<Value> {
    let ids: Vec<String> = page.ids.iter().map(|id| ClientId::plain(*id).to_string()).collect();
    let (descriptors, missing) = resolve_many(ctx, ids.iter());
    let elements: Vec<&String> = ids.iter().filter(|id| !missing.contains(id)).collect();
    Ok(json!({
        "count": page.count,
        "page": page.page,
        "has_more": page.has_more,
        "elements": elements,
        "descriptors": descriptors,
    }))
}

fn start_search(ctx: &ActionContext<'_>, query: SearchQuery) -> AdeResult<Value> {
    let page = ctx.session.search.start(
        ctx.state.search_index.as_ref(),
        query,
        ctx.state.config.ade.search_page_size,
    )?;
    search_response(ctx, page)
}

fn next_search_page(ctx: &ActionContext<'_>) -> AdeResult<Value> {
    let page = ctx.session.search.next_page()?;
    search_response(ctx, page)
}

fn create_element(ctx: &ActionContext<'_>, data: NewElementRequest) -> AdeResult<Value> {
    let settings = ctx
        .state
        .config
        .ade
        .new_element(&data.type_name)
        .ok_or_else(|| {
            AdeError::bad_request(format!("Elements of type '{}' cannot be created", data.type_name))
        })?;
    let repository = ctx.state.repository.as_ref();
    let template = repository.read_resource_by_path(&settings.template)?;
    let folder = settings.folder.trim_end_matches('/');

    let mut target = None;
    for number in 1..=MAX_NEW_ELEMENT_NUMBER {
        let path = format!("{}/{}", folder, expand_name_pattern(&settings.name_pattern, number));
        match repository.read_resource_by_path(&path) {
            Ok(_) => continue,
            Err(error) if error.kind() == RepositoryErrorKind::NotFound => {
                target = Some(path);
                break;
            }
            Err(error) => return Err(error.into()),
        }
    }
    let target = target.ok_or_else(|| {
        AdeError::new(
            AdeErrorKind::Internal,
            format!("No free name left in {}", settings.folder),
        )
    })?;

    let created = repository.copy_resource(&ctx.user.name, template.id, &target)?;
    let descriptor = resolve(ctx, &ClientId::plain(created.id).to_string())?;
    ctx.state.recent.touch(ctx.user, &descriptor.client_id);
    info!("{} created {} from {}", ctx.user.name, created.path, template.path);
    Ok(json!({ "element": descriptor }))
}

fn delete_element(ctx: &ActionContext<'_>, data: ElementRef) -> AdeResult<Value> {
    let client_id = ClientId::parse(&data.id)?;
    let id = client_id.structure_id();
    let repository = ctx.state.repository.as_ref();
    repository.lock_resource(&ctx.user.name, id)?;
    repository.delete_resource(&ctx.user.name, id)?;

    ctx.session.elements.invalidate(id);
    ctx.state.page_cache.invalidate(id);
    ctx.state.recent.remove_structure(ctx.user, id);
    ctx.state.favorites.remove_structure(&ctx.user.name, id);
    info!("{} deleted element {}", ctx.user.name, id);
    Ok(json!({ "deleted": id }))
}
