use std::path::{Path, PathBuf};

use log::debug;

pub const MP3_EXTENSION: &str = "mp3";

/// Top-level input path problems; these abort the run.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("path does not exist: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("not an .mp3 file: {}", path.display())]
    NotMp3 { path: PathBuf },
    #[error("path is neither a regular file nor a directory: {}", path.display())]
    UnsupportedKind { path: PathBuf },
    #[error("failed to list directory {}: {source}", path.display())]
    ListDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub fn is_mp3_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(MP3_EXTENSION))
        .unwrap_or(false)
}

/// Immediate `.mp3` files of `folder_path`, sorted by path. Subdirectories are not entered.
pub fn collect_mp3_files_from_folder(folder_path: &Path) -> Result<Vec<PathBuf>, InputError> {
    let entries = std::fs::read_dir(folder_path).map_err(|source| InputError::ListDirectory {
        path: folder_path.to_path_buf(),
        source,
    })?;

    let mut tracks = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!(
                    "Failed to read a directory entry in {}: {}",
                    folder_path.display(),
                    err
                );
                continue;
            }
        };

        let path = entry.path();
        // Follows symlinks, so a link to a regular file counts.
        if path.is_file() && is_mp3_file(&path) {
            tracks.push(path);
        } else {
            debug!("Ignoring {}", path.display());
        }
    }

    tracks.sort_unstable();
    Ok(tracks)
}

/// Files to process for a CLI path: the file itself, or the `.mp3` files of a directory.
pub fn resolve_target_files(path: &Path) -> Result<Vec<PathBuf>, InputError> {
    if !path.exists() {
        return Err(InputError::NotFound {
            path: path.to_path_buf(),
        });
    }
    if path.is_dir() {
        return collect_mp3_files_from_folder(path);
    }
    if !path.is_file() {
        return Err(InputError::UnsupportedKind {
            path: path.to_path_buf(),
        });
    }
    if !is_mp3_file(path) {
        return Err(InputError::NotMp3 {
            path: path.to_path_buf(),
        });
    }
    Ok(vec![path.to_path_buf()])
}

#[cfg(test)]
mod tests {
    use super::{collect_mp3_files_from_folder, is_mp3_file, resolve_target_files, InputError};
    use crate::metadata::fixtures::unique_temp_dir;
    use std::fs;
    use std::path::Path;

    #[test]
    fn test_is_mp3_file_matches_extension_case_insensitively() {
        assert!(is_mp3_file(Path::new("/music/song.mp3")));
        assert!(is_mp3_file(Path::new("/music/SONG.MP3")));
        assert!(is_mp3_file(Path::new("relative/track.Mp3")));
        assert!(!is_mp3_file(Path::new("/music/song.flac")));
        assert!(!is_mp3_file(Path::new("/music/mp3")));
        assert!(!is_mp3_file(Path::new("/music/song.mp3.bak")));
    }

    #[test]
    fn test_collect_mp3_files_is_sorted_and_not_recursive() {
        let dir = unique_temp_dir("discovery_flat");
        fs::write(dir.join("b.mp3"), b"").expect("fixture should be written");
        fs::write(dir.join("a.MP3"), b"").expect("fixture should be written");
        fs::write(dir.join("notes.txt"), b"").expect("fixture should be written");
        fs::create_dir(dir.join("nested.mp3")).expect("nested dir should be created");
        fs::write(dir.join("nested.mp3").join("c.mp3"), b"").expect("fixture should be written");

        let files = collect_mp3_files_from_folder(&dir).expect("directory should be listed");

        assert_eq!(files, vec![dir.join("a.MP3"), dir.join("b.mp3")]);
        fs::remove_dir_all(&dir).expect("fixture dir should be removable");
    }

    #[test]
    fn test_empty_directory_yields_no_files() {
        let dir = unique_temp_dir("discovery_empty");

        let files = resolve_target_files(&dir).expect("empty directory is valid input");

        assert!(files.is_empty());
        fs::remove_dir_all(&dir).expect("fixture dir should be removable");
    }

    #[test]
    fn test_single_mp3_file_resolves_to_itself() {
        let dir = unique_temp_dir("discovery_single");
        let path = dir.join("song.mp3");
        fs::write(&path, b"").expect("fixture should be written");

        assert_eq!(
            resolve_target_files(&path).expect("mp3 path should resolve"),
            vec![path.clone()]
        );
        fs::remove_dir_all(&dir).expect("fixture dir should be removable");
    }

    #[test]
    fn test_wrong_extension_is_rejected() {
        let dir = unique_temp_dir("discovery_wrong_ext");
        let path = dir.join("song.wav");
        fs::write(&path, b"").expect("fixture should be written");

        assert!(matches!(
            resolve_target_files(&path),
            Err(InputError::NotMp3 { .. })
        ));
        fs::remove_dir_all(&dir).expect("fixture dir should be removable");
    }

    #[test]
    fn test_missing_path_is_rejected() {
        let dir = unique_temp_dir("discovery_missing");
        let missing = dir.join("does-not-exist");

        assert!(matches!(
            resolve_target_files(&missing),
            Err(InputError::NotFound { .. })
        ));
        fs::remove_dir_all(&dir).expect("fixture dir should be removable");
    }
}
