use chrono::Datelike;

use crate::error::FieldErrors;
use crate::model::Book;

/// Checks a book form against the catalogue rules using this year's calendar.
pub fn validate_book(book: &Book) -> Result<(), FieldErrors> {
    validate_book_in(book, chrono::Local::now().year())
}

/// Same as [`validate_book`], with the current year pinned.
pub fn validate_book_in(book: &Book, current_year: i32) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    let checks = [
        ("isbn", required(&book.isbn, "ISBN is required")),
        ("title", required(&book.title, "Title is required")),
        ("author_id", positive(Some(book.author_id), "Valid author ID is required")),
        ("publisher_id", optional_positive(book.publisher_id, "Valid publisher ID is required")),
        ("year_pub", year_in_range(book.year_pub, current_year)),
    ];

    for (field, outcome) in checks {
        if let Some(message) = outcome {
            errors.insert(field.to_string(), vec![message]);
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn required(value: &str, message: &str) -> Option<String> {
    value.trim().is_empty().then(|| message.to_string())
}

fn positive(value: Option<i64>, message: &str) -> Option<String> {
    match value {
        Some(v) if v > 0 => None,
        _ => Some(message.to_string()),
    }
}

// A missing publisher is fine; a present one must be a real id.
fn optional_positive(value: Option<i64>, message: &str) -> Option<String> {
    value.and_then(|v| positive(Some(v), message))
}

fn year_in_range(year: i32, current_year: i32) -> Option<String> {
    let max = current_year + 1;
    (year < 1000 || year > max).then(|| format!("Year must be between 1000 and {max}"))
}
