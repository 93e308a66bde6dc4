use std::error::Error;

pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod handler;
pub mod hook;
pub mod model;
pub mod prompt;
pub mod proxy;
pub mod stats;
pub mod validation;
pub mod view;

pub use client::{ApiRequest, HttpClient, RawResponse, ReqwestClient};
pub use error::{ErrorInfo, ErrorKind, FieldErrors, TransportError};
pub use fetch::FetchPolicy;
pub use hook::{MutationState, Outcome, RequestState, ResourceHook, Snapshot};
pub use model::Resource;
pub use prompt::{NoticeKind, Prompter};

/// Flattens an error and its chain of sources into one line.
pub fn unpack_error(err: &(dyn Error)) -> String {
    let mut parts = Vec::new();
    parts.push(err.to_string());
    let mut current = err.source();
    while let Some(source) = current {
        parts.push(source.to_string());
        current = source.source();
    }
    parts.join(": ")
}
