mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{MockClient, RecordingPrompter, book, json_of};
use katalog::model::{Assignment, Book, BookPatch, ContentKind, NewContent, SiteContent, TitleUpdate};
use katalog::stats::{StatCount, StatsSummary};
use katalog::validation::validate_book;
use katalog::{ErrorKind, MutationState, NoticeKind, Outcome, RequestState, ResourceHook};
use reqwest::Method;
use serde_json::json;

type Hook<R> = ResourceHook<R, Arc<MockClient>, Arc<RecordingPrompter>>;

fn setup<R: katalog::Resource>(confirm: bool) -> (Hook<R>, Arc<MockClient>, Arc<RecordingPrompter>) {
    let client = Arc::new(MockClient::new());
    let prompter = Arc::new(RecordingPrompter::answering(confirm));
    let hook = ResourceHook::new(client.clone(), prompter.clone());
    (hook, client, prompter)
}

#[tokio::test]
async fn refresh_loads_collection_and_filters_by_tag() {
    let (hook, client, _) = setup::<Assignment>(true);
    client.respond(
        200,
        json!([{"id": 1, "name": "A", "tag": "x"}, {"id": 2, "name": "B", "tag": "y"}]),
    );

    assert_eq!(hook.state(), RequestState::Idle);
    hook.refresh().await.unwrap();
    hook.set_filter("x");

    let view = hook.view();
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].id, 1);
    assert_eq!(view[0].tag, "x");
    assert_eq!(hook.filter_keys(), vec!["all", "x", "y"]);
    assert_eq!(client.calls(), vec!["GET api/assignments"]);
}

#[tokio::test(start_paused = true)]
async fn read_timing_out_twice_ends_in_timeout_error() {
    let (hook, client, _) = setup::<Book>(true);
    client.hang().hang();

    let started = tokio::time::Instant::now();
    let err = hook.refresh().await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Timeout);
    assert_eq!(client.calls(), vec!["GET api/books", "GET api/books"]);
    assert!(started.elapsed() >= Duration::from_millis(10_500));
    assert_eq!(hook.state().error().map(|e| e.kind), Some(ErrorKind::Timeout));
    assert!(hook.state().collection().is_none());
    assert!(hook.view().is_empty());
}

#[tokio::test]
async fn duplicate_isbn_is_reported_and_collection_untouched() {
    let (hook, client, prompter) = setup::<Book>(true);
    let books = vec![book("111", 1965, "Dune"), book("222", 1999, "Cryptonomicon")];
    client.respond(200, json_of(&books));
    hook.refresh().await.unwrap();
    let before = hook.snapshot();

    client.respond(
        422,
        json!({
            "message": "The given data was invalid.",
            "errors": {"isbn": ["The isbn has already been taken."]}
        }),
    );
    let err = hook.create(&book("111", 2001, "Dune Messiah")).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(err.field_error("isbn"), Some("The isbn has already been taken."));
    assert_eq!(hook.snapshot(), before);
    assert_eq!(client.calls(), vec!["GET api/books", "POST api/books"]);
    assert_eq!(hook.mutation_state(), MutationState::Failed(ErrorKind::Validation));
    assert_eq!(
        prompter.last_notice(),
        Some(("Invalid isbn: The isbn has already been taken.".to_string(), NoticeKind::Error))
    );
}

#[tokio::test]
async fn server_rejects_missing_isbn() {
    let (hook, client, _) = setup::<Book>(true);
    client.respond(200, json!([]));
    hook.refresh().await.unwrap();

    client.respond(422, json!({"errors": {"isbn": ["The isbn field is required."]}}));
    let err = hook.create(&json!({"title": "Untitled"})).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(err.field_error("isbn"), Some("The isbn field is required."));
    assert_eq!(hook.state(), RequestState::Loaded(vec![]));

    let post = &client.requests()[1];
    assert_eq!(post.method, Method::POST);
    assert_eq!(post.body, Some(json!({"title": "Untitled"})));
}

#[tokio::test]
async fn declined_delete_sends_nothing() {
    let (hook, client, prompter) = setup::<Book>(false);
    client.respond(200, json_of(&[book("A", 1965, "Dune"), book("B", 1999, "Snow Crash")]));
    hook.refresh().await.unwrap();
    let before = hook.snapshot();

    let outcome = hook.delete(&"B".to_string()).await.unwrap();

    assert_eq!(outcome, Outcome::Declined);
    assert_eq!(client.calls(), vec!["GET api/books"]);
    assert_eq!(hook.snapshot(), before);
    assert_eq!(hook.mutation_state(), MutationState::Idle);
    assert_eq!(prompter.prompts(), vec!["Delete Book B? You won't be able to undo this!"]);
    assert!(prompter.notices().is_empty());
}

#[tokio::test]
async fn delete_refetches_and_falls_back_to_all_when_key_disappears() {
    let (hook, client, prompter) = setup::<Book>(true);
    client.respond(200, json_of(&[book("A", 1965, "Dune"), book("B", 1999, "Snow Crash")]));
    hook.refresh().await.unwrap();
    hook.set_filter("1999");
    assert_eq!(hook.view().len(), 1);

    client
        .respond(200, json!({"success": true}))
        .respond(200, json_of(&[book("A", 1965, "Dune")]));
    let outcome = hook.delete(&"B".to_string()).await.unwrap();

    assert_eq!(outcome, Outcome::Completed(()));
    assert_eq!(client.calls(), vec!["GET api/books", "DELETE api/books/B", "GET api/books"]);
    assert_eq!(hook.filter(), "all");
    assert_eq!(hook.view(), vec![book("A", 1965, "Dune")]);
    assert_eq!(hook.mutation_state(), MutationState::Succeeded);
    assert!(prompter.notices().contains(&("Book has been deleted.".to_string(), NoticeKind::Success)));
}

#[tokio::test]
async fn delete_keeps_filter_while_key_still_exists() {
    let (hook, client, _) = setup::<Book>(true);
    client.respond(
        200,
        json_of(&[book("A", 1965, "Dune"), book("B", 1965, "Stand on Zanzibar"), book("C", 1999, "Snow Crash")]),
    );
    hook.refresh().await.unwrap();
    hook.set_filter("1965");

    client
        .respond(204, json!(null))
        .respond(200, json_of(&[book("B", 1965, "Stand on Zanzibar"), book("C", 1999, "Snow Crash")]));
    hook.delete(&"A".to_string()).await.unwrap();

    assert_eq!(hook.filter(), "1965");
    assert_eq!(hook.view(), vec![book("B", 1965, "Stand on Zanzibar")]);
}

#[tokio::test]
async fn unreachable_backend_gets_generic_message() {
    let (hook, client, prompter) = setup::<Book>(true);
    client.respond(200, json_of(&[book("A", 1965, "Dune")]));
    hook.refresh().await.unwrap();
    let before = hook.snapshot();

    client.refuse().respond(201, json_of(&[book("B", 1999, "Snow Crash")]));
    let err = hook.create(&book("B", 1999, "Snow Crash")).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Network);
    // writes are never retried
    assert_eq!(client.calls(), vec!["GET api/books", "POST api/books"]);
    assert_eq!(hook.snapshot(), before);
    assert_eq!(
        prompter.last_notice(),
        Some((
            "Failed to create book. Please check that the backend server is running.".to_string(),
            NoticeKind::Error
        ))
    );
}

#[tokio::test]
async fn update_patches_item_and_refetches() {
    let (hook, client, prompter) = setup::<Book>(true);
    client.respond(200, json_of(&[book("978 1", 1965, "Dune")]));
    hook.refresh().await.unwrap();

    let renamed = book("978 1", 1965, "Dune (50th anniversary)");
    client
        .respond(200, serde_json::to_value(&renamed).unwrap())
        .respond(200, json_of(&[renamed.clone()]));
    let patch = BookPatch {
        title: Some(renamed.title.clone()),
        ..Default::default()
    };
    let updated = hook.update(&"978 1".to_string(), &patch).await.unwrap();

    assert_eq!(updated, Some(renamed.clone()));
    let requests = client.requests();
    assert_eq!(requests[1].method, Method::PATCH);
    assert_eq!(requests[1].path, "api/books/978%201");
    assert_eq!(requests[1].body, Some(json!({"title": "Dune (50th anniversary)"})));
    assert_eq!(hook.view(), vec![renamed]);
    assert_eq!(
        prompter.last_notice(),
        Some(("Book updated successfully!".to_string(), NoticeKind::Success))
    );
}

#[tokio::test(start_paused = true)]
async fn concurrent_mutations_run_one_after_another() {
    let (hook, client, _) = setup::<Book>(true);
    let a = book("A", 1965, "Dune");
    let c = book("C", 1999, "Snow Crash");
    let d = book("D", 2003, "Quicksilver");
    client.respond(200, json_of(&[a.clone()]));
    hook.refresh().await.unwrap();

    client
        .respond_after(Duration::from_millis(300), 201, serde_json::to_value(&c).unwrap())
        .respond_after(Duration::from_millis(300), 200, json_of(&[a.clone(), c.clone()]))
        .respond(201, serde_json::to_value(&d).unwrap())
        .respond(200, json_of(&[a.clone(), c.clone(), d.clone()]));

    let (first, second) = tokio::join!(hook.create(&c), hook.create(&d));

    assert_eq!(first.unwrap(), Some(c.clone()));
    assert_eq!(second.unwrap(), Some(d.clone()));
    assert_eq!(
        client.calls(),
        vec!["GET api/books", "POST api/books", "GET api/books", "POST api/books", "GET api/books"]
    );
    let requests = client.requests();
    assert_eq!(requests[1].body.as_ref().unwrap()["isbn"], "C");
    assert_eq!(requests[3].body.as_ref().unwrap()["isbn"], "D");
    assert_eq!(hook.view(), vec![a, c, d]);
}

#[tokio::test]
async fn invalid_form_is_rejected_locally() {
    let (hook, client, prompter) = setup::<Book>(true);

    let err = hook
        .create_checked(&book("  ", 1965, "Dune"), validate_book)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(err.field_error("isbn"), Some("ISBN is required"));
    assert!(client.requests().is_empty());
    assert_eq!(
        prompter.last_notice(),
        Some(("Invalid isbn: ISBN is required".to_string(), NoticeKind::Error))
    );
}

#[tokio::test]
async fn failed_refetch_after_successful_delete_surfaces_in_state() {
    let (hook, client, _) = setup::<Book>(true);
    client.respond(200, json_of(&[book("A", 1965, "Dune")]));
    hook.refresh().await.unwrap();

    client
        .respond(200, json!({"success": true}))
        .respond(500, json!({"message": "boom"}));
    let outcome = hook.delete(&"A".to_string()).await.unwrap();

    assert_eq!(outcome, Outcome::Completed(()));
    assert_eq!(hook.mutation_state(), MutationState::Succeeded);
    assert_eq!(hook.state().error().map(|e| e.kind), Some(ErrorKind::Server));
}

#[tokio::test]
async fn subscribers_see_each_published_snapshot() {
    let (hook, client, _) = setup::<Book>(true);
    let mut rx = hook.subscribe();
    let mut mutations = hook.subscribe_mutations();
    client.respond(200, json_of(&[book("A", 1965, "Dune"), book("B", 1999, "Snow Crash")]));

    hook.refresh().await.unwrap();
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().view().len(), 2);

    hook.set_filter("1999");
    assert!(rx.has_changed().unwrap());
    let snapshot = rx.borrow_and_update().clone();
    assert_eq!(snapshot.view(), vec![&book("B", 1999, "Snow Crash")]);
    assert!(!mutations.has_changed().unwrap());
}

#[tokio::test(start_paused = true)]
async fn stats_summary_tracks_hook_state() {
    let (hook, client, prompter) = setup::<SiteContent>(true);
    client.respond(
        200,
        json!({"series": [{"id": 1, "title": "Rust"}], "lessons": [{"id": 2, "title": "Ownership"}]}),
    );
    hook.refresh().await.unwrap();

    let snapshot = hook.snapshot();
    let summary = StatsSummary::from_snapshot(&snapshot);
    assert_eq!(summary.series_count(), StatCount::Available(1));
    assert_eq!(summary.lessons()[0].title, "Ownership");

    client.respond(200, json!({})).refuse().refuse();
    hook.delete(&2).await.unwrap();
    assert_eq!(client.requests()[1].path, "api/site-stats/2");
    assert_eq!(prompter.prompts(), vec!["Delete Content 2? You won't be able to undo this!"]);

    let snapshot = hook.snapshot();
    let summary = StatsSummary::from_snapshot(&snapshot);
    assert_eq!(summary.series_count().to_string(), "N/A");
    assert!(summary.lessons().is_empty());
}

#[tokio::test(start_paused = true)]
async fn slow_refresh_does_not_overwrite_refetch_after_delete() {
    let (hook, client, _) = setup::<Book>(true);
    let a = book("A", 1965, "Dune");
    let b = book("B", 1999, "Snow Crash");
    client.respond(200, json_of(&[a.clone(), b.clone()]));
    hook.refresh().await.unwrap();

    client
        .respond_after(Duration::from_millis(1000), 200, json_of(&[a.clone(), b.clone()]))
        .respond(200, json!({"success": true}))
        .respond(200, json_of(&[a.clone()]));

    let (refreshed, deleted) = tokio::join!(hook.refresh(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(hook.state().is_loading());
        hook.delete(&"B".to_string()).await
    });

    refreshed.unwrap();
    assert_eq!(deleted.unwrap(), Outcome::Completed(()));
    assert_eq!(
        client.calls(),
        vec!["GET api/books", "GET api/books", "DELETE api/books/B", "GET api/books"]
    );
    assert_eq!(hook.view(), vec![a]);
    assert!(!hook.state().is_loading());
}

#[tokio::test]
async fn stats_create_and_rename_send_content_bodies() {
    let (hook, client, prompter) = setup::<SiteContent>(true);

    client
        .respond(201, json!({"id": 3, "title": "Async", "type": "series"}))
        .respond(200, json!({"series": [{"id": 3, "title": "Async"}], "lessons": []}));
    let created = hook
        .create(&NewContent {
            title: "Async".to_string(),
            kind: ContentKind::Series,
        })
        .await
        .unwrap();

    assert_eq!(created.map(|c| c.kind), Some(ContentKind::Series));
    assert_eq!(
        prompter.last_notice(),
        Some(("Content created successfully!".to_string(), NoticeKind::Success))
    );

    client
        .respond(200, json!({"id": 3, "title": "Async Rust", "type": "series"}))
        .respond(200, json!({"series": [{"id": 3, "title": "Async Rust"}], "lessons": []}));
    hook.update(&3, &TitleUpdate {
        title: "Async Rust".to_string(),
    })
    .await
    .unwrap();

    let requests = client.requests();
    assert_eq!(
        client.calls(),
        vec!["POST api/site-stats", "GET api/site-stats", "PATCH api/site-stats/3", "GET api/site-stats"]
    );
    assert_eq!(requests[0].body, Some(json!({"title": "Async", "type": "series"})));
    assert_eq!(requests[2].body, Some(json!({"title": "Async Rust"})));
    assert_eq!(hook.view()[0].title, "Async Rust");
}

#[tokio::test]
async fn deleting_a_missing_item_reports_failure_and_keeps_collection() {
    let (hook, client, prompter) = setup::<Book>(true);
    client.respond(200, json_of(&[book("A", 1965, "Dune")]));
    hook.refresh().await.unwrap();
    let before = hook.snapshot();

    client.respond(404, json!({"message": "Book not found"}));
    let err = hook.delete(&"Z".to_string()).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(hook.mutation_state(), MutationState::Failed(ErrorKind::NotFound));
    assert_eq!(hook.snapshot(), before);
    assert_eq!(client.calls(), vec!["GET api/books", "DELETE api/books/Z"]);
    assert_eq!(
        prompter.last_notice(),
        Some((
            "Failed to delete book. Please check that the backend server is running.".to_string(),
            NoticeKind::Error
        ))
    );
}
