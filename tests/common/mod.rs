#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use katalog::model::Book;
use katalog::{ApiRequest, HttpClient, NoticeKind, Prompter, RawResponse, TransportError};
use reqwest::StatusCode;

pub enum Scripted {
    Respond(StatusCode, String),
    Delayed(Duration, StatusCode, String),
    Fail(TransportError),
    Hang,
}

/// Backend double: answers requests from a script, in order, and records
/// every request it sees.
#[derive(Default)]
pub struct MockClient {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, step: Scripted) -> &Self {
        self.script.lock().unwrap().push_back(step);
        self
    }

    pub fn respond(&self, status: u16, body: serde_json::Value) -> &Self {
        self.push(Scripted::Respond(status_code(status), body.to_string()))
    }

    pub fn respond_raw(&self, status: u16, body: &str) -> &Self {
        self.push(Scripted::Respond(status_code(status), body.to_string()))
    }

    pub fn respond_after(&self, delay: Duration, status: u16, body: serde_json::Value) -> &Self {
        self.push(Scripted::Delayed(delay, status_code(status), body.to_string()))
    }

    pub fn fail(&self, err: TransportError) -> &Self {
        self.push(Scripted::Fail(err))
    }

    pub fn refuse(&self) -> &Self {
        self.fail(TransportError::Connect("connection refused".to_string()))
    }

    pub fn hang(&self) -> &Self {
        self.push(Scripted::Hang)
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// "METHOD path" for each request seen so far.
    pub fn calls(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }
}

fn status_code(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap()
}

impl HttpClient for MockClient {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.script.lock().unwrap().pop_front();

        match next {
            Some(Scripted::Respond(status, body)) => Ok(RawResponse { status, body }),
            Some(Scripted::Delayed(delay, status, body)) => {
                tokio::time::sleep(delay).await;
                Ok(RawResponse { status, body })
            }
            Some(Scripted::Fail(err)) => Err(err),
            Some(Scripted::Hang) => std::future::pending().await,
            None => Err(TransportError::Connect("no scripted response".to_string())),
        }
    }
}

/// Answers every confirmation with a fixed value and keeps what it was told.
pub struct RecordingPrompter {
    answer: bool,
    prompts: Mutex<Vec<String>>,
    notices: Mutex<Vec<(String, NoticeKind)>>,
}

impl RecordingPrompter {
    pub fn answering(answer: bool) -> Self {
        RecordingPrompter {
            answer,
            prompts: Mutex::new(Vec::new()),
            notices: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn notices(&self) -> Vec<(String, NoticeKind)> {
        self.notices.lock().unwrap().clone()
    }

    pub fn last_notice(&self) -> Option<(String, NoticeKind)> {
        self.notices().last().cloned()
    }
}

impl Prompter for RecordingPrompter {
    async fn confirm(&self, message: &str) -> bool {
        self.prompts.lock().unwrap().push(message.to_string());
        self.answer
    }

    fn notify(&self, message: &str, kind: NoticeKind) {
        self.notices.lock().unwrap().push((message.to_string(), kind));
    }
}

pub fn book(isbn: &str, year_pub: i32, title: &str) -> Book {
    Book {
        isbn: isbn.to_string(),
        title: title.to_string(),
        author_id: 1,
        publisher_id: Some(2),
        year_pub,
        description: None,
    }
}

pub fn json_of(books: &[Book]) -> serde_json::Value {
    serde_json::to_value(books).unwrap()
}
