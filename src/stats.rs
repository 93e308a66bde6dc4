//! Series/lesson breakdown of the site stats.
//!
//! A failed stats read keeps the hook in `Error`. The summary then reports
//! empty lists, and both counts are [`StatCount::Unavailable`], which renders as "N/A".

use std::fmt;

use crate::hook::{RequestState, Snapshot};
use crate::model::{ContentKind, SiteContent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatCount {
    Pending,
    Available(usize),
    Unavailable,
}

impl fmt::Display for StatCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatCount::Pending => write!(f, "..."),
            StatCount::Available(n) => write!(f, "{n}"),
            StatCount::Unavailable => write!(f, "N/A"),
        }
    }
}

pub struct StatsSummary<'a> {
    series: Vec<&'a SiteContent>,
    lessons: Vec<&'a SiteContent>,
    availability: Availability,
}

#[derive(Clone, Copy)]
enum Availability {
    Pending,
    Loaded,
    Failed,
}

impl<'a> StatsSummary<'a> {
    pub fn from_snapshot(snapshot: &'a Snapshot<SiteContent>) -> Self {
        let availability = match &snapshot.state {
            RequestState::Idle | RequestState::Loading => Availability::Pending,
            RequestState::Loaded(_) => Availability::Loaded,
            RequestState::Error(_) => Availability::Failed,
        };
        let collection = snapshot.state.collection().unwrap_or_default();

        StatsSummary {
            series: of_kind(collection, ContentKind::Series),
            lessons: of_kind(collection, ContentKind::Lesson),
            availability,
        }
    }

    pub fn series(&self) -> &[&'a SiteContent] {
        &self.series
    }

    pub fn lessons(&self) -> &[&'a SiteContent] {
        &self.lessons
    }

    pub fn series_count(&self) -> StatCount {
        self.count(self.series.len())
    }

    pub fn lesson_count(&self) -> StatCount {
        self.count(self.lessons.len())
    }

    fn count(&self, n: usize) -> StatCount {
        match self.availability {
            Availability::Pending => StatCount::Pending,
            Availability::Loaded => StatCount::Available(n),
            Availability::Failed => StatCount::Unavailable,
        }
    }
}

fn of_kind(collection: &[SiteContent], kind: ContentKind) -> Vec<&SiteContent> {
    crate::view::derive_view(collection, kind.as_str())
}
