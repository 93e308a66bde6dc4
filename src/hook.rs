//! CRUD resource hook.
//!
//! A [`ResourceHook`] owns one collection of `R`, fetched from
//! `R::ENDPOINT` through an injected [`HttpClient`]. Renderers read
//! [`Snapshot`]s (request state plus filter key) from a `watch` channel and
//! recompute the view from them. Nothing derived is ever stored.
//!
//! Mutations go through a single slot. A second create/update/delete waits
//! for the first one, including its refetch, to finish. A mutation never
//! edits the collection locally. On success the collection is dropped to
//! `Loading` and refetched, and on failure it is left untouched.
//!
//! Every read takes a new generation. Only the latest read started may
//! publish its result; older ones are dropped when they complete.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::{Mutex, watch};

use crate::client::{ApiRequest, HttpClient, RawResponse};
use crate::error::{ErrorInfo, ErrorKind, FieldErrors};
use crate::fetch::{self, FetchPolicy};
use crate::model::Resource;
use crate::prompt::{NoticeKind, Prompter};
use crate::view::{self, ALL};

#[derive(Debug, Clone, PartialEq)]
pub enum RequestState<R> {
    Idle,
    Loading,
    Loaded(Vec<R>),
    Error(ErrorInfo),
}

impl<R> RequestState<R> {
    pub fn collection(&self) -> Option<&[R]> {
        match self {
            RequestState::Loaded(collection) => Some(collection),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, RequestState::Loading)
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        match self {
            RequestState::Error(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<R> {
    pub state: RequestState<R>,
    pub filter: String,
}

impl<R: Resource> Snapshot<R> {
    /// Empty unless the collection is loaded.
    pub fn view(&self) -> Vec<&R> {
        self.state
            .collection()
            .map(|collection| view::derive_view(collection, &self.filter))
            .unwrap_or_default()
    }

    pub fn filter_keys(&self) -> Vec<String> {
        view::filter_keys(self.state.collection().unwrap_or_default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    Idle,
    Confirming,
    Submitting,
    Succeeded,
    Failed(ErrorKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Create,
    Update,
    Delete,
}

impl Mutation {
    fn verb(&self) -> &'static str {
        match self {
            Mutation::Create => "create",
            Mutation::Update => "update",
            Mutation::Delete => "delete",
        }
    }

    pub fn success_message(&self, noun: &str) -> String {
        match self {
            Mutation::Create => format!("{noun} created successfully!"),
            Mutation::Update => format!("{noun} updated successfully!"),
            Mutation::Delete => format!("{noun} has been deleted."),
        }
    }

    /// Rejected input names the field; anything else points at connectivity.
    pub fn failure_message(&self, noun: &str, err: &ErrorInfo) -> String {
        if err.kind == ErrorKind::Validation {
            return match err.first_field_error() {
                Some((field, message)) => format!("Invalid {field}: {message}"),
                None => format!("Your input was rejected: {}", err.message),
            };
        }

        format!(
            "Failed to {} {}. Please check that the backend server is running.",
            self.verb(),
            noun.to_lowercase()
        )
    }
}

/// Result of a mutation that may need the user's consent.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Completed(T),
    Declined,
}

pub struct ResourceHook<R, C, P> {
    client: C,
    prompter: P,
    read: FetchPolicy,
    write: FetchPolicy,
    snapshot: watch::Sender<Snapshot<R>>,
    mutation: watch::Sender<MutationState>,
    slot: Mutex<()>,
    generation: AtomicU64,
}

impl<R, C, P> ResourceHook<R, C, P>
where
    R: Resource,
    C: HttpClient,
    P: Prompter,
{
    pub fn new(client: C, prompter: P) -> Self {
        let (snapshot, _) = watch::channel(Snapshot {
            state: RequestState::Idle,
            filter: ALL.to_string(),
        });
        let (mutation, _) = watch::channel(MutationState::Idle);

        ResourceHook {
            client,
            prompter,
            read: FetchPolicy::read(),
            write: FetchPolicy::write(),
            snapshot,
            mutation,
            slot: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn with_policies(mut self, read: FetchPolicy, write: FetchPolicy) -> Self {
        self.read = read;
        self.write = write;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<R>> {
        self.snapshot.subscribe()
    }

    pub fn subscribe_mutations(&self) -> watch::Receiver<MutationState> {
        self.mutation.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot<R> {
        self.snapshot.borrow().clone()
    }

    pub fn state(&self) -> RequestState<R> {
        self.snapshot.borrow().state.clone()
    }

    pub fn mutation_state(&self) -> MutationState {
        *self.mutation.borrow()
    }

    pub fn filter(&self) -> String {
        self.snapshot.borrow().filter.clone()
    }

    pub fn set_filter(&self, key: impl Into<String>) {
        let key = key.into();
        tracing::debug!(resource = R::NOUN, filter = %key, "filter changed");
        self.snapshot.send_modify(|s| s.filter = key);
    }

    pub fn view(&self) -> Vec<R> {
        self.snapshot.borrow().view().into_iter().cloned().collect()
    }

    pub fn filter_keys(&self) -> Vec<String> {
        self.snapshot.borrow().filter_keys()
    }

    /// Replaces the collection with a fresh read. On failure the state
    /// becomes `Error` and no partial data is kept.
    ///
    /// A read overtaken by a later one is discarded and publishes nothing.
    pub async fn refresh(&self) -> Result<(), ErrorInfo> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.snapshot.send_modify(|s| s.state = RequestState::Loading);

        let request = ApiRequest::get(R::ENDPOINT);
        let fetched = fetch::execute(&self.client, &request, &self.read)
            .await
            .and_then(|response| R::decode_collection(&response.body).map_err(ErrorInfo::malformed));

        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(resource = R::NOUN, generation, "discarding superseded read");
            return fetched.map(|_| ());
        }

        match fetched {
            Ok(collection) => {
                tracing::info!(resource = R::NOUN, count = collection.len(), "collection loaded");
                self.snapshot.send_modify(|s| {
                    if !view::has_key(&collection, &s.filter) {
                        tracing::debug!(resource = R::NOUN, filter = %s.filter, "filter key gone, falling back to all");
                        s.filter = ALL.to_string();
                    }
                    s.state = RequestState::Loaded(collection);
                });
                Ok(())
            }
            Err(err) => {
                self.snapshot.send_modify(|s| s.state = RequestState::Error(err.clone()));
                Err(err)
            }
        }
    }

    /// POSTs `body` to the collection. Returns the created record when the
    /// backend echoes one back.
    pub async fn create<B: Serialize>(&self, body: &B) -> Result<Option<R>, ErrorInfo> {
        let _slot = self.slot.lock().await;

        let request = ApiRequest::post(R::ENDPOINT, encode(body)?);
        let response = self.submit(Mutation::Create, &request).await?;
        Ok(serde_json::from_str(&response.body).ok())
    }

    /// Runs `check` on the form first; a rejected form is reported and
    /// nothing is sent.
    pub async fn create_checked<B, F>(&self, body: &B, check: F) -> Result<Option<R>, ErrorInfo>
    where
        B: Serialize,
        F: FnOnce(&B) -> Result<(), FieldErrors>,
    {
        if let Err(field_errors) = check(body) {
            let err = ErrorInfo::from_field_errors(field_errors);
            tracing::info!(resource = R::NOUN, "form rejected before submit");
            self.prompter
                .notify(&Mutation::Create.failure_message(R::NOUN, &err), NoticeKind::Error);
            return Err(err);
        }

        self.create(body).await
    }

    pub async fn update<B: Serialize>(&self, id: &R::Id, patch: &B) -> Result<Option<R>, ErrorInfo> {
        let _slot = self.slot.lock().await;

        let request = ApiRequest::patch(item_path::<R>(id), encode(patch)?);
        let response = self.submit(Mutation::Update, &request).await?;
        Ok(serde_json::from_str(&response.body).ok())
    }

    /// Asks for confirmation, then DELETEs the record. Declining sends
    /// nothing and leaves the hook idle.
    pub async fn delete(&self, id: &R::Id) -> Result<Outcome<()>, ErrorInfo> {
        let _slot = self.slot.lock().await;

        self.set_mutation(MutationState::Confirming);
        let prompt = format!("Delete {} {id}? You won't be able to undo this!", R::NOUN);
        if !self.prompter.confirm(&prompt).await {
            tracing::info!(resource = R::NOUN, id = %id, "delete declined");
            self.set_mutation(MutationState::Idle);
            return Ok(Outcome::Declined);
        }

        let request = ApiRequest::delete(item_path::<R>(id));
        self.submit(Mutation::Delete, &request).await?;
        Ok(Outcome::Completed(()))
    }

    /// Must be called with the slot held.
    async fn submit(&self, mutation: Mutation, request: &ApiRequest) -> Result<RawResponse, ErrorInfo> {
        self.set_mutation(MutationState::Submitting);

        match fetch::execute(&self.client, request, &self.write).await {
            Ok(response) => {
                tracing::info!(resource = R::NOUN, mutation = mutation.verb(), path = %request.path, "mutation succeeded");
                self.set_mutation(MutationState::Succeeded);
                self.prompter
                    .notify(&mutation.success_message(R::NOUN), NoticeKind::Success);

                if let Err(err) = self.refresh().await {
                    tracing::warn!(resource = R::NOUN, error = %err, "refetch after mutation failed");
                }
                Ok(response)
            }
            Err(err) => {
                self.set_mutation(MutationState::Failed(err.kind));
                self.prompter
                    .notify(&mutation.failure_message(R::NOUN, &err), NoticeKind::Error);
                Err(err)
            }
        }
    }

    fn set_mutation(&self, state: MutationState) {
        self.mutation.send_replace(state);
    }
}

fn item_path<R: Resource>(id: &R::Id) -> String {
    format!("{}/{}", R::ENDPOINT, urlencoding::encode(&id.to_string()))
}

fn encode<B: Serialize>(body: &B) -> Result<serde_json::Value, ErrorInfo> {
    serde_json::to_value(body)
        .map_err(|e| ErrorInfo::new(ErrorKind::Validation, format!("request body could not be encoded: {e}")))
}
