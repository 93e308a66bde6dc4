use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct APIResponse {
    pub status: String,
}

impl APIResponse {
    pub fn new_from_msg(msg: &str) -> Self {
        APIResponse {
            status: msg.to_owned(),
        }
    }
}

/// Body of every failed passthrough call. Upstream details are never
/// forwarded.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProxyError {
    pub status_code: u16,
    pub status_message: String,
}

impl ProxyError {
    pub fn new(status_code: u16, status_message: impl Into<String>) -> Self {
        ProxyError {
            status_code,
            status_message: status_message.into(),
        }
    }
}
