//! ID3v2 tag codec for MP3 files.
//!
//! Containers are recognised with `lofty` (content-based probe, not the extension),
//! frames are read and written with `id3`.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use id3::frame::Comment;
use id3::{Tag, TagLike, Version};
use lofty::file::FileType;
use lofty::probe::Probe;
use log::{debug, warn};

/// Language of the comment frame the tool reads and writes unless configured otherwise.
pub const DEFAULT_COMMENT_LANGUAGE: &str = "eng";

/// The four fields of one file's tags the tool cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioTagSet {
    pub artist: Option<String>,
    pub title: Option<String>,
    pub genre: Option<String>,
    pub comment: Option<String>,
    /// Language the `comment` was selected with.
    pub comment_language: String,
}

impl Default for AudioTagSet {
    fn default() -> Self {
        Self {
            artist: None,
            title: None,
            genre: None,
            comment: None,
            comment_language: DEFAULT_COMMENT_LANGUAGE.to_string(),
        }
    }
}

impl AudioTagSet {
    /// Artist and title, when both are present.
    pub fn lookup_key(&self) -> Option<(&str, &str)> {
        Some((self.artist.as_deref()?, self.title.as_deref()?))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TagError {
    #[error("{} is not an MPEG audio file", .path.display())]
    UnsupportedFormat { path: PathBuf },
    #[error("failed to open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read ID3 tag from {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: id3::Error,
    },
    #[error("failed to write ID3 tag to {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: id3::Error,
    },
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn ensure_mpeg_audio(path: &Path) -> Result<(), TagError> {
    let io_error = |source| TagError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io_error)?;
    let probe = Probe::new(BufReader::new(file))
        .guess_file_type()
        .map_err(io_error)?;

    match probe.file_type() {
        Some(FileType::Mpeg) => Ok(()),
        other => {
            debug!(
                "Content probe for {} detected {:?}, expected MPEG audio",
                path.display(),
                other
            );
            Err(TagError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    }
}

/// Reads the ID3 tag, `None` when the file carries no tag header at all.
fn read_id3_tag(path: &Path) -> Result<Option<Tag>, TagError> {
    match Tag::read_from_path(path) {
        Ok(tag) => Ok(Some(tag)),
        Err(id3::Error {
            kind: id3::ErrorKind::NoTag,
            ..
        }) => Ok(None),
        Err(id3::Error {
            partial_tag: Some(tag),
            description,
            ..
        }) => {
            warn!(
                "ID3 tag of {} is damaged, continuing with the frames that could be read: {}",
                path.display(),
                description
            );
            Ok(Some(tag))
        }
        Err(source) => Err(TagError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn comment_for_language(tag: &Tag, language: &str) -> Option<String> {
    let in_language: Vec<&Comment> = tag
        .comments()
        .filter(|comment| comment.lang.eq_ignore_ascii_case(language))
        .collect();

    in_language
        .iter()
        .find(|comment| comment.description.is_empty())
        .or_else(|| in_language.first())
        .and_then(|comment| non_blank(Some(comment.text.as_str())))
}

fn tag_set_from_tag(tag: &Tag, comment_language: &str) -> AudioTagSet {
    AudioTagSet {
        artist: non_blank(tag.artist()),
        title: non_blank(tag.title()),
        genre: non_blank(tag.genre_parsed().as_deref()),
        comment: comment_for_language(tag, comment_language),
        comment_language: comment_language.to_string(),
    }
}

/// Reads artist, title, genre and the `comment_language` comment of an MP3 file.
///
/// A file without any ID3 header yields an empty `AudioTagSet`; a file whose content
/// is not MPEG audio yields `TagError::UnsupportedFormat`.
pub fn read_tags(path: &Path, comment_language: &str) -> Result<AudioTagSet, TagError> {
    ensure_mpeg_audio(path)?;
    let tags = match read_id3_tag(path)? {
        Some(tag) => tag_set_from_tag(&tag, comment_language),
        None => {
            debug!("No ID3 tag header in {}", path.display());
            AudioTagSet {
                comment_language: comment_language.to_string(),
                ..AudioTagSet::default()
            }
        }
    };
    debug!("Read tags for {}: {:?}", path.display(), tags);
    Ok(tags)
}

fn load_tag_for_update(path: &Path) -> Result<Tag, TagError> {
    ensure_mpeg_audio(path)?;
    Ok(read_id3_tag(path)?.unwrap_or_else(Tag::new))
}

fn persist_tag(tag: &Tag, path: &Path) -> Result<(), TagError> {
    // v2.3 stays v2.3 for older players, everything else is written as v2.4.
    let version = match tag.version() {
        Version::Id3v23 => Version::Id3v23,
        _ => Version::Id3v24,
    };
    tag.write_to_path(path, version)
        .map_err(|source| TagError::Write {
            path: path.to_path_buf(),
            source,
        })
}

/// Sets (or overwrites) the genre frame and saves the file in place.
pub fn write_genre(path: &Path, genre: &str) -> Result<(), TagError> {
    let mut tag = load_tag_for_update(path)?;
    tag.set_genre(genre);
    persist_tag(&tag, path)
}

/// Replaces the comment frame in `language` with an empty description, adding one if
/// there is none, and saves the file in place. A missing tag header is created.
pub fn write_comment(path: &Path, text: &str, language: &str) -> Result<(), TagError> {
    let mut tag = load_tag_for_update(path)?;
    let replaced = remove_plain_comments(&mut tag, language);
    tag.add_frame(Comment {
        lang: language.to_string(),
        description: String::new(),
        text: text.to_string(),
    });
    debug!(
        "Comment frame ({}) for {} {}",
        language,
        path.display(),
        if replaced > 0 { "replaced" } else { "added" }
    );
    persist_tag(&tag, path)
}

/// Drops the empty-description comments in `language` (any case), keeps every other
/// comment frame. Returns how many were dropped.
fn remove_plain_comments(tag: &mut Tag, language: &str) -> usize {
    let mut removed = 0;
    for frame in tag.remove("COMM") {
        let is_plain_in_language = frame.content().comment().is_some_and(|comment| {
            comment.description.is_empty() && comment.lang.eq_ignore_ascii_case(language)
        });
        if is_plain_in_language {
            removed += 1;
        } else {
            tag.add_frame(frame);
        }
    }
    removed
}
