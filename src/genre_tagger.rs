//! Per-file pipeline: read tags, resolve a genre when missing, merge it into the comment.

use std::path::Path;

use log::{debug, error, info, warn};

use crate::catalog::genre_resolver::{GenreLookupResult, GenreSource};
use crate::media_file_discovery::{resolve_target_files, InputError};
use crate::metadata::comment_merge::merge_genre_into_comment;
use crate::metadata::{TagError, TagStore, DEFAULT_COMMENT_LANGUAGE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggerOptions {
    /// Also store a newly resolved genre in the genre frame.
    pub write_genre_tag: bool,
    pub comment_language: String,
}

impl Default for TaggerOptions {
    fn default() -> Self {
        Self {
            write_genre_tag: false,
            comment_language: DEFAULT_COMMENT_LANGUAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingArtistOrTitle,
    GenreUnknown,
    GenreLookupFailed,
    UnsupportedFormat,
}

#[derive(Debug)]
pub enum FileOutcome {
    Skipped(SkipReason),
    CommentUpdated,
    /// Only the genre frame was written; the comment already carried the annotation.
    GenreTagUpdated,
    /// The comment already carried the annotation; nothing was written.
    CommentUnchanged,
    Failed(TagError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub files: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &FileOutcome) {
        self.files += 1;
        match outcome {
            FileOutcome::Skipped(_) => self.skipped += 1,
            FileOutcome::CommentUpdated | FileOutcome::GenreTagUpdated => self.updated += 1,
            FileOutcome::CommentUnchanged => self.unchanged += 1,
            FileOutcome::Failed(_) => self.failed += 1,
        }
    }
}

pub struct GenreTagger<S: TagStore, G: GenreSource> {
    tag_store: S,
    genre_source: G,
    options: TaggerOptions,
}

impl<S: TagStore, G: GenreSource> GenreTagger<S, G> {
    pub fn new(tag_store: S, genre_source: G, options: TaggerOptions) -> Self {
        Self {
            tag_store,
            genre_source,
            options,
        }
    }

    /// Runs the pipeline for one file. Never panics on bad input; every problem becomes an
    /// outcome. Codec errors are returned in `FileOutcome::Failed` for the caller to report.
    pub fn process_file(&mut self, path: &Path) -> FileOutcome {
        let language = self.options.comment_language.as_str();
        let tags = match self.tag_store.read_tags(path, language) {
            Ok(tags) => tags,
            Err(TagError::UnsupportedFormat { .. }) => {
                warn!("Skipping {}: not an MPEG audio file", path.display());
                return FileOutcome::Skipped(SkipReason::UnsupportedFormat);
            }
            Err(err) => return FileOutcome::Failed(err),
        };

        let Some((artist, title)) = tags.lookup_key() else {
            warn!(
                "Skipping {}: artist or title tag is missing",
                path.display()
            );
            return FileOutcome::Skipped(SkipReason::MissingArtistOrTitle);
        };

        let mut genre_written = false;
        let genre = match tags.genre.as_deref() {
            Some(existing) => {
                debug!("{} already has genre '{existing}'", path.display());
                existing.to_string()
            }
            None => match self.genre_source.resolve_genre(artist, title) {
                GenreLookupResult::Resolved(genre) => {
                    info!("Resolved genre '{genre}' for '{artist} - {title}'");
                    if self.options.write_genre_tag {
                        if let Err(err) = self.tag_store.write_genre(path, &genre) {
                            return FileOutcome::Failed(err);
                        }
                        genre_written = true;
                    }
                    genre
                }
                GenreLookupResult::Unknown => {
                    warn!(
                        "Skipping {}: no genre found for '{artist} - {title}'",
                        path.display()
                    );
                    return FileOutcome::Skipped(SkipReason::GenreUnknown);
                }
                GenreLookupResult::Failed(reason) => {
                    error!(
                        "Skipping {}: genre lookup for '{artist} - {title}' failed: {reason}",
                        path.display()
                    );
                    return FileOutcome::Skipped(SkipReason::GenreLookupFailed);
                }
            },
        };

        let existing_comment = tags.comment.as_deref();
        let merged = merge_genre_into_comment(existing_comment, &genre);
        if merged == existing_comment.unwrap_or_default() {
            debug!("Comment of {} already mentions the genre", path.display());
            if genre_written {
                info!("Updated genre tag of {}", path.display());
                return FileOutcome::GenreTagUpdated;
            }
            return FileOutcome::CommentUnchanged;
        }

        match self.tag_store.write_comment(path, &merged, language) {
            Ok(()) => {
                info!("Updated comment of {}", path.display());
                FileOutcome::CommentUpdated
            }
            Err(err) => {
                if genre_written {
                    warn!(
                        "{} is partially updated: genre tag written, comment not",
                        path.display()
                    );
                }
                FileOutcome::Failed(err)
            }
        }
    }

    /// Processes a single `.mp3` file or every `.mp3` file directly inside a directory.
    pub fn process_path(&mut self, path: &Path) -> Result<RunSummary, InputError> {
        let files = resolve_target_files(path)?;
        if files.is_empty() {
            info!("No .mp3 files found in {}", path.display());
        }

        let mut summary = RunSummary::default();
        for file in &files {
            debug!("Processing {}", file.display());
            let outcome = self.process_file(file);
            if let FileOutcome::Failed(err) = &outcome {
                error!("{err}");
            }
            summary.record(&outcome);
        }
        Ok(summary)
    }
}
