use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "furigana")]
#[command(about = "Furigana, Korean pronunciation and translation gateway for Japanese learners.")]
pub struct Args {
    /// Path to config TOML (defaults to ./furigana.toml or the user config dir)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP gateway
    Serve {
        /// Listen address (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Listen port (overrides config and PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Annotate a sentence and print the cumulative reveal frames
    Annotate(AnnotateCmd),
    /// Extract sentences from a subtitle, CSV or text file into the subtitle library
    Import {
        file: PathBuf,
        /// Replace an existing batch from a file with the same name
        #[arg(long)]
        overwrite: bool,
    },
    /// Inspect or edit the saved libraries
    Library {
        #[command(subcommand)]
        action: LibraryCmd,
    },
    /// Print the effective default config as TOML and exit
    PrintDefaultConfig,
}

#[derive(Debug, Parser)]
pub struct AnnotateCmd {
    /// Japanese sentence
    pub text: String,

    /// Insert `/` between segments
    #[arg(long)]
    pub separator: bool,

    /// Save the result to the example library
    #[arg(long)]
    pub save: bool,

    /// Replace an existing example with the same sentence
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Debug, Subcommand)]
pub enum LibraryCmd {
    /// List saved entries, newest first
    List {
        #[arg(long)]
        subtitles: bool,
    },
    /// Print one entry
    Show {
        id: i64,
        #[arg(long)]
        subtitles: bool,
        #[arg(long)]
        separator: bool,
    },
    /// Delete one entry
    Delete {
        id: i64,
        #[arg(long)]
        subtitles: bool,
    },
    /// Delete every entry
    Clear {
        #[arg(long)]
        subtitles: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_annotate() {
        let args = Args::parse_from(["furigana", "annotate", "猫です", "--separator"]);
        match args.command {
            Command::Annotate(cmd) => {
                assert_eq!(cmd.text, "猫です");
                assert!(cmd.separator);
                assert!(!cmd.save);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_library_delete() {
        let args = Args::parse_from(["furigana", "--log-level", "debug", "library", "delete", "42", "--subtitles"]);
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(matches!(
            args.command,
            Command::Library {
                action: LibraryCmd::Delete { id: 42, subtitles: true }
            }
        ));
    }
}
