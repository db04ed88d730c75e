//! # Configuration Module
//!
//! Turns parsed command-line [`Args`] into validated runtime [`Options`].
//! Everything that can be rejected is rejected here, before any connection
//! to MPD is made, so a bad invocation never touches the player.
//!
//! ## Tweaks
//!
//! `--tweak NAME=VALUE` adjusts the control loop:
//!
//! | Name | Value | Default |
//! |---|---|---|
//! | `window-size` | integer >= 1 | 7 |
//! | `play-on-startup` | bool | yes |
//! | `suspend-timeout` | duration | 0 (disabled) |
//! | `exit-on-db-update` | bool | no |
//!
//! Booleans accept `1/0`, `true/false`, `yes/no`, `on/off`. Durations are an
//! integer with an optional `ms`, `s`, `m` or `h` suffix; a bare number is
//! milliseconds.

use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Args;
use crate::mpd::Tag;
use crate::rule::Rule;
use crate::shuffle::DEFAULT_WINDOW_SIZE;

/// Control loop knobs set through `--tweak`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tweaks {
    pub window_size: usize,
    pub play_on_startup: bool,
    pub suspend_timeout: Duration,
    pub exit_on_db_update: bool,
}

impl Default for Tweaks {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            play_on_startup: true,
            suspend_timeout: Duration::ZERO,
            exit_on_db_update: false,
        }
    }
}

impl Tweaks {
    /// Apply one `NAME=VALUE` tweak.
    pub fn apply(&mut self, tweak: &str) -> Result<()> {
        let (name, value) = tweak
            .split_once('=')
            .filter(|(name, value)| !name.is_empty() && !value.is_empty())
            .ok_or_else(|| anyhow!("tweak must be of the form <name>=<value>"))?;

        match name {
            "window-size" => {
                let size: i64 = value
                    .parse()
                    .with_context(|| format!("couldn't convert window-size '{value}'"))?;
                if size < 1 {
                    bail!("window-size must be >= 1 ({size} given)");
                }
                self.window_size = usize::try_from(size)
                    .with_context(|| format!("window-size {size} is too large"))?;
            }
            "play-on-startup" => self.play_on_startup = parse_bool(value)?,
            "suspend-timeout" => self.suspend_timeout = parse_duration(value)?,
            "exit-on-db-update" => self.exit_on_db_update = parse_bool(value)?,
            _ => bail!("unrecognized tweak '{name}'"),
        }
        Ok(())
    }
}

/// Validated runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub rules: Vec<Rule>,
    /// Enqueue this many songs and exit, instead of running the loop.
    pub queue_only: Option<usize>,
    /// Read URIs from this file (`-` is stdin) instead of the database.
    pub file_in: Option<PathBuf>,
    pub check_uris: bool,
    pub queue_buffer: usize,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub group_by: Vec<Tag>,
    pub tweaks: Tweaks,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            queue_only: None,
            file_in: None,
            check_uris: true,
            queue_buffer: 0,
            host: None,
            port: None,
            group_by: Vec::new(),
            tweaks: Tweaks::default(),
        }
    }
}

impl Options {
    /// Validate command-line arguments.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed exclusion rules, malformed or unknown
    /// tweaks, and out-of-range tweak values such as `window-size=0`.
    pub fn from_args(args: Args) -> Result<Self> {
        let rules = args
            .exclude_rules
            .iter()
            .map(|pairs| Rule::from_args(pairs))
            .collect::<Result<Vec<_>>>()?;

        let mut tweaks = Tweaks::default();
        for tweak in &args.tweak {
            tweaks.apply(tweak)?;
        }

        let group_by = if args.by_album {
            vec![Tag::Album, Tag::Date]
        } else {
            args.group_by
        };

        Ok(Self {
            rules,
            queue_only: args.only.filter(|n| *n > 0),
            file_in: args.file,
            check_uris: !args.no_check,
            queue_buffer: args.queue_buffer,
            host: args.host,
            port: args.port,
            group_by,
            tweaks,
        })
    }

    /// True when the pool comes from MPD and can be rebuilt on database
    /// changes.
    pub fn reloadable(&self) -> bool {
        self.file_in.is_none()
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("couldn't convert '{value}' to a boolean"),
    }
}

fn parse_duration(value: &str) -> Result<Duration> {
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);
    let amount: u64 = number
        .parse()
        .with_context(|| format!("couldn't convert '{value}' to a duration"))?;

    let duration = match unit {
        "" | "ms" => Duration::from_millis(amount),
        "s" => Duration::from_secs(amount),
        "m" => Duration::from_secs(amount * 60),
        "h" => Duration::from_secs(amount * 60 * 60),
        _ => bail!("unknown duration unit '{unit}' in '{value}'"),
    };
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Result<Options> {
        let args =
            Args::try_parse_grouped_from(std::iter::once("mushuffle").chain(argv.iter().copied()))?;
        Options::from_args(args)
    }

    #[test]
    fn test_defaults() -> Result<()> {
        let opts = parse(&[])?;
        assert!(opts.rules.is_empty());
        assert_eq!(opts.queue_only, None);
        assert_eq!(opts.file_in, None);
        assert!(opts.check_uris);
        assert_eq!(opts.queue_buffer, 0);
        assert!(opts.group_by.is_empty());
        assert_eq!(opts.tweaks.window_size, 7);
        assert!(opts.tweaks.play_on_startup);
        assert_eq!(opts.tweaks.suspend_timeout, Duration::ZERO);
        assert!(!opts.tweaks.exit_on_db_update);
        assert!(opts.reloadable());
        Ok(())
    }

    #[test]
    fn test_short_flags() -> Result<()> {
        let opts = parse(&[
            "-o", "5", "-n", "-q", "10", "-e", "artist", "test artist", "artist", "another one",
            "-f", "/dev/zero", "-p", "1234", "-g", "artist", "-t", "window-size=3",
        ])?;
        assert_eq!(opts.rules.len(), 1);
        assert_eq!(opts.queue_only, Some(5));
        assert_eq!(opts.file_in, Some(PathBuf::from("/dev/zero")));
        assert!(!opts.check_uris);
        assert_eq!(opts.queue_buffer, 10);
        assert_eq!(opts.port, Some(1234));
        assert_eq!(opts.group_by, vec![Tag::Artist]);
        assert_eq!(opts.tweaks.window_size, 3);
        assert!(!opts.reloadable());
        Ok(())
    }

    #[test]
    fn test_repeated_exclude_builds_separate_rules() -> Result<()> {
        let opts = parse(&["-e", "artist", "x", "--exclude", "album", "y"])?;
        assert_eq!(opts.rules.len(), 2);
        Ok(())
    }

    #[test]
    fn test_by_album() -> Result<()> {
        let opts = parse(&["--by-album"])?;
        assert_eq!(opts.group_by, vec![Tag::Album, Tag::Date]);
        assert!(parse(&["--by-album", "-g", "artist"]).is_err());
        Ok(())
    }

    #[test]
    fn test_exclude_without_value() {
        let err = parse(&["-e", "artist"]).unwrap_err();
        assert!(err.to_string().contains("no value supplied for match 'artist'"));
    }

    #[test]
    fn test_tweaks() -> Result<()> {
        let opts = parse(&[
            "-t", "play-on-startup=no",
            "-t", "suspend-timeout=2s",
            "--tweak", "exit-on-db-update=ON",
        ])?;
        assert!(!opts.tweaks.play_on_startup);
        assert_eq!(opts.tweaks.suspend_timeout, Duration::from_secs(2));
        assert!(opts.tweaks.exit_on_db_update);
        Ok(())
    }

    #[test]
    fn test_malformed_tweaks() {
        for bad in ["window-size", "window-size=", "=3"] {
            let err = parse(&["--tweak", bad]).unwrap_err();
            assert!(
                err.to_string().contains("tweak must be of the form <name>=<value>"),
                "{bad}: {err}"
            );
        }
        let err = parse(&["--tweak", "window-size=20=x"]).unwrap_err();
        assert!(err.to_string().contains("couldn't convert"));
        assert!(parse(&["--tweak", "no-such-thing=1"]).is_err());
    }

    #[test]
    fn test_window_size_must_be_positive() {
        let err = parse(&["--tweak", "window-size=0"]).unwrap_err();
        assert!(err.to_string().contains("window-size must be >= 1 (0 given)"));

        let err = parse(&["--tweak", "window-size=-2"]).unwrap_err();
        assert!(err.to_string().contains("window-size must be >= 1 (-2 given)"));
    }

    #[test]
    fn test_parse_duration() -> Result<()> {
        assert_eq!(parse_duration("250")?, Duration::from_millis(250));
        assert_eq!(parse_duration("250ms")?, Duration::from_millis(250));
        assert_eq!(parse_duration("3m")?, Duration::from_secs(180));
        assert_eq!(parse_duration("1h")?, Duration::from_secs(3600));
        assert!(parse_duration("1.5s").is_err());
        assert!(parse_duration("s").is_err());
        assert!(parse_duration("5d").is_err());
        Ok(())
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("Yes").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn test_bad_numbers_rejected_by_clap() {
        assert!(parse(&["--only", "0x5.0"]).is_err());
        assert!(parse(&["--queue-buffer", "20U"]).is_err());
    }
}
