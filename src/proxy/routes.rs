use axum::{
    Router,
    routing::{get, patch},
};

use super::handler::{self, ProxyState};
use crate::client::HttpClient;

pub fn routes<C: HttpClient + 'static>() -> Router<ProxyState<C>> {
    Router::new()
        .route("/:resource", get(handler::list::<C>).post(handler::create::<C>))
        .route(
            "/:resource/:id",
            patch(handler::update::<C>).delete(handler::remove::<C>),
        )
}
