//! # Command-Line Interface Module
//!
//! Defines the command-line surface with Clap derive macros. Validation that
//! clap cannot express (rule pairs, tweak syntax, value ranges) happens in
//! [`crate::config::Options::from_args`].
//!
//! ## Examples
//!
//! ```bash
//! # Shuffle whole albums, keeping 5 songs queued ahead
//! mushuffle --by-album --queue-buffer 5
//!
//! # Never pick anything by an artist containing "christmas"
//! mushuffle -e artist christmas
//!
//! # Shuffle a fixed list of URIs read from stdin
//! mpc listall jazz | mushuffle -f -
//! ```

use clap::{ArgAction, ArgMatches, CommandFactory, FromArgMatches, Parser, ValueEnum};
use std::ffi::OsString;
use std::path::PathBuf;

use crate::mpd::Tag;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

/// Keeps the MPD queue topped up with randomly chosen songs, albums or
/// artists, avoiding recent repeats.
#[derive(Parser, Debug)]
#[command(name = "mushuffle")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Exclude songs whose TAG contains VALUE (case-insensitive).
    ///
    /// Several TAG VALUE pairs in one occurrence must all match for a song to
    /// be excluded. Repeat the flag for independent rules.
    #[arg(short = 'e', long, value_name = "TAG VALUE", num_args = 1.., action = ArgAction::Append)]
    pub exclude: Vec<String>,

    /// `--exclude` values split per occurrence, one entry per rule. Filled
    /// by [`Args::parse_grouped`] and [`Args::try_parse_grouped_from`].
    #[arg(skip)]
    pub exclude_rules: Vec<Vec<String>>,

    /// Enqueue N songs (whole groups), then exit.
    #[arg(short = 'o', long, value_name = "N")]
    pub only: Option<usize>,

    /// With --file, do not check the listed URIs against the MPD database.
    #[arg(short = 'n', long)]
    pub no_check: bool,

    /// Read song URIs from FILE ("-" for stdin) instead of the MPD database.
    #[arg(short = 'f', long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub file: Option<PathBuf>,

    /// Keep at least N songs queued after the current one.
    #[arg(short = 'q', long, value_name = "N", default_value_t = 0)]
    pub queue_buffer: usize,

    /// MPD host, optionally as password@host.
    #[arg(long, env = "MPD_HOST")]
    pub host: Option<String>,

    /// MPD port.
    #[arg(short = 'p', long, env = "MPD_PORT")]
    pub port: Option<u16>,

    /// Pick songs in groups sharing the same values for these tags.
    #[arg(short = 'g', long, value_name = "TAG", num_args = 1..)]
    pub group_by: Vec<Tag>,

    /// Shorthand for --group-by album date.
    #[arg(long, conflicts_with = "group_by")]
    pub by_album: bool,

    /// Adjust internal behaviour, as NAME=VALUE.
    ///
    /// window-size=N (default 7), play-on-startup=BOOL (default yes),
    /// suspend-timeout=DURATION (e.g. 500ms, 2s; default 0, disabled),
    /// exit-on-db-update=BOOL (default no).
    #[arg(short = 't', long, value_name = "NAME=VALUE", action = ArgAction::Append)]
    pub tweak: Vec<String>,

    /// Print a shell completion script and exit.
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<Shell>,
}

impl Args {
    /// Parse the process arguments, exiting with clap's usage message on
    /// error. Unlike [`Parser::parse`], this keeps `--exclude` occurrences
    /// apart.
    pub fn parse_grouped() -> Self {
        let matches = Self::command().get_matches();
        Self::from_matches(&matches).unwrap_or_else(|err| err.exit())
    }

    pub fn try_parse_grouped_from<I, T>(argv: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::command().try_get_matches_from(argv)?;
        Self::from_matches(&matches)
    }

    fn from_matches(matches: &ArgMatches) -> Result<Self, clap::Error> {
        let mut args = Self::from_arg_matches(matches)?;
        args.exclude_rules = matches
            .get_occurrences::<String>("exclude")
            .map(|occurrences| {
                occurrences
                    .map(|values| values.cloned().collect())
                    .collect()
            })
            .unwrap_or_default();
        Ok(args)
    }
}
