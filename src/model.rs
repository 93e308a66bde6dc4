use std::borrow::Cow;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A record the backend serves as a collection under [`Resource::ENDPOINT`]
/// and addresses individually as `ENDPOINT/{id}`.
pub trait Resource: Clone + fmt::Debug + DeserializeOwned + Send + Sync + 'static {
    type Id: fmt::Display + Clone + PartialEq + Send + Sync;

    const ENDPOINT: &'static str;
    /// Human name used in prompts and notices, e.g. "Book".
    const NOUN: &'static str;

    fn id(&self) -> Self::Id;

    /// The field views are filtered on.
    fn classification(&self) -> Cow<'_, str>;

    /// The text name searches match against.
    fn display_name(&self) -> &str;

    fn decode_collection(body: &str) -> Result<Vec<Self>, serde_json::Error> {
        serde_json::from_str(body)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub isbn: String,
    pub title: String,
    pub author_id: i64,
    pub publisher_id: Option<i64>,
    pub year_pub: i32,
    pub description: Option<String>,
}

impl Resource for Book {
    type Id = String;

    const ENDPOINT: &'static str = "api/books";
    const NOUN: &'static str = "Book";

    fn id(&self) -> String {
        self.isbn.clone()
    }

    fn classification(&self) -> Cow<'_, str> {
        Cow::Owned(self.year_pub.to_string())
    }

    fn display_name(&self) -> &str {
        &self.title
    }
}

/// Partial book update. Unset fields are left out of the PATCH body.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BookPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_pub: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Series,
    Lesson,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Series => "series",
            ContentKind::Lesson => "lesson",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the site stats: a series or a lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteContent {
    pub id: i64,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ContentKind,
}

#[derive(Debug, Deserialize)]
struct StatsPayload {
    #[serde(default)]
    series: Vec<StatsEntry>,
    #[serde(default)]
    lessons: Vec<StatsEntry>,
}

#[derive(Debug, Deserialize)]
struct StatsEntry {
    id: i64,
    title: String,
}

impl Resource for SiteContent {
    type Id = i64;

    const ENDPOINT: &'static str = "api/site-stats";
    const NOUN: &'static str = "Content";

    fn id(&self) -> i64 {
        self.id
    }

    fn classification(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.kind.as_str())
    }

    fn display_name(&self) -> &str {
        &self.title
    }

    /// The stats endpoint answers `{ "series": [...], "lessons": [...] }`;
    /// entries are flattened series first.
    fn decode_collection(body: &str) -> Result<Vec<Self>, serde_json::Error> {
        let payload: StatsPayload = serde_json::from_str(body)?;
        let series = payload.series.into_iter().map(|e| (e, ContentKind::Series));
        let lessons = payload.lessons.into_iter().map(|e| (e, ContentKind::Lesson));

        Ok(series
            .chain(lessons)
            .map(|(entry, kind)| SiteContent {
                id: entry.id,
                title: entry.title,
                kind,
            })
            .collect())
    }
}

/// Body of a stats create: `{"title": .., "type": "series"|"lesson"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewContent {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ContentKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleUpdate {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub suite: String,
    pub city: String,
    #[serde(default)]
    pub zipcode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
    #[serde(rename = "catchPhrase", default)]
    pub catch_phrase: String,
    #[serde(default)]
    pub bs: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub email: String,
    pub address: Address,
    pub phone: String,
    pub website: String,
    pub company: Company,
}

impl Resource for UserData {
    type Id = i64;

    const ENDPOINT: &'static str = "users";
    const NOUN: &'static str = "User";

    fn id(&self) -> i64 {
        self.id
    }

    fn classification(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.company.name)
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub address: Address,
    pub phone: String,
    pub website: String,
    pub company: Company,
}

impl Resource for Destination {
    type Id = i64;

    const ENDPOINT: &'static str = "users";
    const NOUN: &'static str = "Destination";

    fn id(&self) -> i64 {
        self.id
    }

    fn classification(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.address.city)
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

/// Tagged to-do item. Assignments have no backend route of their own; the
/// type exists to exercise tag filtering, and `ENDPOINT` is only reached by
/// injected clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub complete: bool,
    pub tag: String,
}

impl Resource for Assignment {
    type Id = i64;

    const ENDPOINT: &'static str = "api/assignments";
    const NOUN: &'static str = "Assignment";

    fn id(&self) -> i64 {
        self.id
    }

    fn classification(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.tag)
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}
