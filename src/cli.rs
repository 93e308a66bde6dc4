//! Terminal front-end for the resource hooks.

use anyhow::Result;

use crate::client::ReqwestClient;
use crate::config::{BookAction, Config, StatsAction};
use crate::hook::{Outcome, ResourceHook, Snapshot};
use crate::model::{Book, BookPatch, Destination, NewContent, Resource, SiteContent, TitleUpdate, UserData};
use crate::prompt::TerminalPrompter;
use crate::stats::StatsSummary;
use crate::validation;
use crate::view;

fn hook<R: Resource>(cfg: &Config, base_url: &str, assume_yes: bool) -> ResourceHook<R, ReqwestClient, TerminalPrompter> {
    ResourceHook::new(ReqwestClient::new(base_url), TerminalPrompter::new(assume_yes))
        .with_policies(cfg.fetch.read.policy(), cfg.fetch.write.policy())
}

pub async fn run_books(cfg: &Config, action: BookAction) -> Result<()> {
    match action {
        BookAction::List { filter } => {
            let books = hook::<Book>(cfg, &cfg.app.backend_url, false);
            books.refresh().await?;
            books.set_filter(filter);

            println!("years: {}", books.filter_keys().join(", "));
            for book in books.view() {
                println!("{}\t{}\t{}", book.isbn, book.year_pub, book.title);
            }
        }
        BookAction::Add {
            isbn,
            title,
            author_id,
            publisher_id,
            year,
            description,
        } => {
            let books = hook::<Book>(cfg, &cfg.app.backend_url, false);
            let book = Book {
                isbn,
                title,
                author_id,
                publisher_id,
                year_pub: year,
                description,
            };
            books.create_checked(&book, validation::validate_book).await?;
        }
        BookAction::Rename { isbn, title } => {
            let books = hook::<Book>(cfg, &cfg.app.backend_url, false);
            let patch = BookPatch {
                title: Some(title),
                ..Default::default()
            };
            books.update(&isbn, &patch).await?;
        }
        BookAction::Delete { isbn, yes } => {
            let books = hook::<Book>(cfg, &cfg.app.backend_url, yes);
            if let Outcome::Declined = books.delete(&isbn).await? {
                println!("nothing deleted");
            }
        }
    }

    Ok(())
}

/// Runs a stats mutation when one is given, otherwise prints the counts.
/// Counts print even when the stats backend is down ("N/A").
pub async fn run_stats(cfg: &Config, action: Option<StatsAction>) -> Result<()> {
    match action {
        None => {
            let stats = hook::<SiteContent>(cfg, &cfg.app.backend_url, false);
            if let Err(err) = stats.refresh().await {
                tracing::warn!(error = %err, "stats unavailable");
            }
            print_stats(&stats.snapshot());
        }
        Some(StatsAction::Add { title, kind }) => {
            let stats = hook::<SiteContent>(cfg, &cfg.app.backend_url, false);
            stats.create(&NewContent { title, kind }).await?;
        }
        Some(StatsAction::Rename { id, title }) => {
            let stats = hook::<SiteContent>(cfg, &cfg.app.backend_url, false);
            stats.update(&id, &TitleUpdate { title }).await?;
        }
        Some(StatsAction::Delete { id, yes }) => {
            let stats = hook::<SiteContent>(cfg, &cfg.app.backend_url, yes);
            if let Outcome::Declined = stats.delete(&id).await? {
                println!("nothing deleted");
            }
        }
    }

    Ok(())
}

fn print_stats(snapshot: &Snapshot<SiteContent>) {
    let summary = StatsSummary::from_snapshot(snapshot);
    println!("series:  {}", summary.series_count());
    for content in summary.series() {
        println!("  {}\t{}", content.id, content.title);
    }
    println!("lessons: {}", summary.lesson_count());
    for content in summary.lessons() {
        println!("  {}\t{}", content.id, content.title);
    }
}

pub async fn run_users(cfg: &Config, search: Option<String>) -> Result<()> {
    let users = hook::<UserData>(cfg, &cfg.app.directory_url, false);
    users.refresh().await?;

    let snapshot = users.snapshot();
    let term = search.unwrap_or_default();
    for user in view::search(snapshot.view(), &term) {
        println!("{}\t{}\t{}", user.id, user.name, user.email);
    }

    Ok(())
}

pub async fn run_destinations(cfg: &Config, city: String, search: Option<String>) -> Result<()> {
    let destinations = hook::<Destination>(cfg, &cfg.app.directory_url, false);
    destinations.refresh().await?;
    destinations.set_filter(city);

    let snapshot = destinations.snapshot();
    let term = search.unwrap_or_default();
    for destination in view::search(snapshot.view(), &term) {
        println!(
            "{}\t{}\t{}, {}",
            destination.id, destination.name, destination.address.street, destination.address.city
        );
    }

    Ok(())
}
