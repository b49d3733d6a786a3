//! Appends a `Genre: <genre>` annotation to free-text comments.
//!
//! Duplicate detection is a plain substring test on the exact annotation text, so
//! `genre: rock` or `Genre:Rock` already in a comment do not count as present.

const GENRE_ANNOTATION_PREFIX: &str = "Genre: ";

/// The literal annotation written into comments for `genre`.
pub fn genre_annotation(genre: &str) -> String {
    format!("{GENRE_ANNOTATION_PREFIX}{}", genre.trim())
}

/// Returns the comment text that should be stored for `genre`.
///
/// If the annotation already occurs in `existing_comment`, the comment is returned
/// unchanged, which tells the caller no write is needed. Otherwise the annotation is
/// appended after a single space and the result is trimmed.
pub fn merge_genre_into_comment(existing_comment: Option<&str>, genre: &str) -> String {
    let existing_comment = existing_comment.unwrap_or_default();
    let annotation = genre_annotation(genre);
    if existing_comment.contains(&annotation) {
        return existing_comment.to_string();
    }

    format!("{existing_comment} {annotation}").trim().to_string()
}
