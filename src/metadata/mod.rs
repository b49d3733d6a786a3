//! Tag codec and comment policy for MP3 files.

pub mod comment_merge;
pub mod metadata_tags;

use std::path::Path;

pub use metadata_tags::{AudioTagSet, TagError, DEFAULT_COMMENT_LANGUAGE};

/// Field-level access to the tags of one file on disk.
pub trait TagStore {
    fn read_tags(&self, path: &Path, comment_language: &str) -> Result<AudioTagSet, TagError>;
    fn write_genre(&self, path: &Path, genre: &str) -> Result<(), TagError>;
    fn write_comment(&self, path: &Path, text: &str, language: &str) -> Result<(), TagError>;
}

/// `TagStore` backed by the ID3v2 codec in [`metadata_tags`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Id3TagStore;

impl TagStore for Id3TagStore {
    fn read_tags(&self, path: &Path, comment_language: &str) -> Result<AudioTagSet, TagError> {
        metadata_tags::read_tags(path, comment_language)
    }

    fn write_genre(&self, path: &Path, genre: &str) -> Result<(), TagError> {
        metadata_tags::write_genre(path, genre)
    }

    fn write_comment(&self, path: &Path, text: &str, language: &str) -> Result<(), TagError> {
        metadata_tags::write_comment(path, text, language)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::time::{SystemTime, UNIX_EPOCH};

    // MPEG-1 Layer III, 128 kbit/s, 44.1 kHz, no padding: 417 byte frames.
    const MPEG_FRAME_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x64];
    const MPEG_FRAME_LEN: usize = 417;

    fn nonce() -> u128 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be valid")
            .as_nanos()
    }

    pub(crate) fn unique_temp_mp3_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("genretag_{name}_{}.mp3", nonce()))
    }

    pub(crate) fn unique_temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("genretag_{name}_{}", nonce()));
        fs::create_dir_all(&dir).expect("should create fixture directory");
        dir
    }

    /// Writes a few silent MPEG frames with no tag header.
    pub(crate) fn write_untagged_mp3(path: &Path) {
        let mut bytes = Vec::with_capacity(MPEG_FRAME_LEN * 8);
        for _ in 0..8 {
            bytes.extend_from_slice(&MPEG_FRAME_HEADER);
            bytes.extend(std::iter::repeat_n(0x00, MPEG_FRAME_LEN - MPEG_FRAME_HEADER.len()));
        }
        fs::write(path, bytes).expect("should write mp3 fixture");
    }

    /// Writes an MP3 fixture carrying the given artist/title frames.
    pub(crate) fn write_tagged_mp3(path: &Path, artist: Option<&str>, title: Option<&str>) {
        use id3::TagLike;

        write_untagged_mp3(path);
        let mut tag = id3::Tag::new();
        if let Some(artist) = artist {
            tag.set_artist(artist);
        }
        if let Some(title) = title {
            tag.set_title(title);
        }
        tag.write_to_path(path, id3::Version::Id3v24)
            .expect("should write id3 fixture tag");
    }
}
