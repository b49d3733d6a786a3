use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(version, about = "Update genre metadata in MP3 files.")]
pub struct Cli {
    /// An .mp3 file, or a directory whose .mp3 files are processed (not recursive).
    #[arg(short, long)]
    pub path: String,
}

impl Cli {
    pub fn target_path(&self) -> PathBuf {
        expand_home(&self.path, dirs::home_dir())
    }
}

/// Expands a leading `~` or `~/` to `home`. `~user` forms are left alone.
pub fn expand_home(raw: &str, home: Option<PathBuf>) -> PathBuf {
    let Some(home) = home else {
        return PathBuf::from(raw);
    };
    if raw == "~" {
        return home;
    }
    match raw.strip_prefix("~/") {
        Some(rest) => home.join(rest),
        None => PathBuf::from(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::{expand_home, Cli};
    use clap::Parser;
    use std::path::PathBuf;

    fn home() -> Option<PathBuf> {
        Some(PathBuf::from("/home/listener"))
    }

    #[test]
    fn test_expand_home_handles_tilde_forms() {
        assert_eq!(expand_home("~", home()), PathBuf::from("/home/listener"));
        assert_eq!(
            expand_home("~/Music/a.mp3", home()),
            PathBuf::from("/home/listener/Music/a.mp3")
        );
    }

    #[test]
    fn test_expand_home_leaves_other_paths_alone() {
        assert_eq!(expand_home("/srv/music", home()), PathBuf::from("/srv/music"));
        assert_eq!(expand_home("~other/x", home()), PathBuf::from("~other/x"));
        assert_eq!(expand_home("music/~/x", home()), PathBuf::from("music/~/x"));
        assert_eq!(expand_home("~/x", None), PathBuf::from("~/x"));
    }

    #[test]
    fn test_cli_requires_path() {
        assert!(Cli::try_parse_from(["genretag"]).is_err());

        let short = Cli::try_parse_from(["genretag", "-p", "~/Music"]).expect("short flag parses");
        assert_eq!(short.path, "~/Music");

        let long =
            Cli::try_parse_from(["genretag", "--path", "song.mp3"]).expect("long flag parses");
        assert_eq!(long.target_path(), PathBuf::from("song.mp3"));
    }
}
