use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};

use crate::client::{ApiRequest, HttpClient};
use crate::fetch::{self, FetchPolicy};
use crate::handler::{bad_request, not_found, server_error};

pub struct ProxyState<C> {
    upstream: Arc<C>,
    resources: Arc<HashSet<String>>,
    read: FetchPolicy,
    write: FetchPolicy,
}

impl<C> Clone for ProxyState<C> {
    fn clone(&self) -> Self {
        ProxyState {
            upstream: self.upstream.clone(),
            resources: self.resources.clone(),
            read: self.read,
            write: self.write,
        }
    }
}

impl<C: HttpClient> ProxyState<C> {
    pub fn new(
        upstream: Arc<C>,
        resources: impl IntoIterator<Item = String>,
        read: FetchPolicy,
        write: FetchPolicy,
    ) -> Self {
        ProxyState {
            upstream,
            resources: Arc::new(resources.into_iter().collect()),
            read,
            write,
        }
    }

    fn allows(&self, resource: &str) -> bool {
        self.resources.contains(resource)
    }

    async fn forward(&self, request: ApiRequest, policy: FetchPolicy, failure: String) -> Response {
        match fetch::execute(&*self.upstream, &request, &policy).await {
            Ok(response) => {
                tracing::info!(method = %request.method, path = %request.path, status = %response.status, "forwarded");
                (response.status, [(CONTENT_TYPE, "application/json")], response.body).into_response()
            }
            Err(err) => {
                tracing::error!(method = %request.method, path = %request.path, error = %err, "upstream call failed");
                server_error(&failure)
            }
        }
    }
}

fn upstream_path(resource: &str, id: Option<&str>) -> String {
    match id {
        Some(id) => format!("api/{resource}/{}", urlencoding::encode(id)),
        None => format!("api/{resource}"),
    }
}

/// Undecodable bodies get the same error shape as upstream failures.
fn rejected_body(resource: &str, rejection: JsonRejection) -> Response {
    tracing::info!(resource, error = %rejection, "rejected request body");
    bad_request(&format!("Invalid JSON body for {resource}"))
}

fn unknown(resource: &str) -> Response {
    tracing::info!(resource, "rejected request for unknown resource");
    not_found(&format!("Unknown resource: {resource}"))
}

pub async fn list<C: HttpClient + 'static>(
    State(state): State<ProxyState<C>>,
    Path(resource): Path<String>,
) -> Response {
    if !state.allows(&resource) {
        return unknown(&resource);
    }

    let request = ApiRequest::get(upstream_path(&resource, None));
    state
        .forward(request, state.read, format!("Failed to fetch {resource}"))
        .await
}

pub async fn create<C: HttpClient + 'static>(
    State(state): State<ProxyState<C>>,
    Path(resource): Path<String>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Response {
    if !state.allows(&resource) {
        return unknown(&resource);
    }
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return rejected_body(&resource, rejection),
    };

    let request = ApiRequest::post(upstream_path(&resource, None), body);
    state
        .forward(request, state.write, format!("Failed to create {resource}"))
        .await
}

pub async fn update<C: HttpClient + 'static>(
    State(state): State<ProxyState<C>>,
    Path((resource, id)): Path<(String, String)>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Response {
    if !state.allows(&resource) {
        return unknown(&resource);
    }
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return rejected_body(&resource, rejection),
    };

    let request = ApiRequest::patch(upstream_path(&resource, Some(&id)), body);
    state
        .forward(request, state.write, format!("Failed to update {resource}"))
        .await
}

pub async fn remove<C: HttpClient + 'static>(
    State(state): State<ProxyState<C>>,
    Path((resource, id)): Path<(String, String)>,
) -> Response {
    if !state.allows(&resource) {
        return unknown(&resource);
    }

    let request = ApiRequest::delete(upstream_path(&resource, Some(&id)));
    state
        .forward(request, state.write, format!("Failed to delete {resource}"))
        .await
}
