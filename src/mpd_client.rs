//! # MPD Client Module
//!
//! [`Player`] implementation that drives Music Player Daemon through the `mpc`
//! command-line client.
//!
//! ## Design Decision: mpc vs Direct Protocol
//!
//! Every operation spawns `mpc` and parses its output instead of speaking the
//! MPD protocol:
//! - Simplicity: no protocol parsing or connection state to manage
//! - Compatibility: host, port and password handling (`MPD_HOST`,
//!   `MPD_PORT`, `password@host`) come for free
//! - Error Handling: mpc's stderr is surfaced verbatim in error messages
//!
//! ## Positions
//!
//! mpc numbers queue entries from 1, the rest of the crate from 0. The
//! conversion happens here and nowhere else.
//!
//! ## Required mpc Features
//!
//! - `mpc status <format>` with `%songpos%`, `%length%`, `%state%`, `%single%`
//! - `mpc idle <events...>`
//! - `mpc -f <format> listall`

use anyhow::{bail, Context, Result};
use log::{debug, info, trace};
use std::process::{Command, Output};

use crate::mpd::{IdleEvent, IdleEvents, Player, Song, Status, Tag};

/// Separates fields in formatted mpc output. Never appears in tags or URIs.
const FIELD_SEPARATOR: char = '\u{1f}';

const STATUS_FORMAT: &str = "%songpos%\u{1f}%length%\u{1f}%state%\u{1f}%single%";

/// Connection settings passed through to every `mpc` invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MpcClient {
    host: Option<String>,
    port: Option<u16>,
}

impl MpcClient {
    /// Verifies mpc is installed and MPD is reachable.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - mpc command is not found
    /// - MPD is not running
    /// - Connection to MPD fails (including a rejected password)
    pub fn connect(host: Option<String>, port: Option<u16>) -> Result<Self> {
        let client = Self { host, port };

        let output = client
            .command()
            .arg("version")
            .output()
            .context("Failed to execute mpc command. Please install mpc (MPD client)")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("Failed to connect to mpd: {}", stderr.trim());
        }

        info!(
            "Connected to MPD ({})",
            String::from_utf8_lossy(&output.stdout).trim()
        );
        Ok(client)
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new("mpc");
        if let Some(host) = &self.host {
            cmd.args(["--host", host.as_str()]);
        }
        if let Some(port) = self.port {
            cmd.args(["--port", port.to_string().as_str()]);
        }
        cmd
    }

    /// Run mpc with the given arguments and return stdout, failing on a
    /// non-zero exit.
    fn run<I, S>(&self, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut cmd = self.command();
        cmd.args(args);
        trace!("Running {cmd:?}");

        let output = cmd
            .output()
            .with_context(|| format!("Failed to execute {cmd:?}"))?;
        check_output(&cmd, output)
    }
}

fn check_output(cmd: &Command, output: Output) -> Result<String> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("{cmd:?} failed: {}", stderr.trim());
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

impl Player for MpcClient {
    fn status(&mut self) -> Result<Status> {
        let text = self
            .run(["status", STATUS_FORMAT])
            .context("Failed to get MPD status")?;
        parse_status(&text)
    }

    fn idle(&mut self, events: &IdleEvents) -> Result<IdleEvents> {
        let mut args = vec!["idle"];
        args.extend(events.iter().map(IdleEvent::subsystem));

        debug!("Waiting for MPD events...");
        let text = self.run(args).context("mpc idle failed")?;
        let fired = parse_idle(&text).intersect(*events);
        debug!("Idle returned {fired:?}");
        Ok(fired)
    }

    fn add(&mut self, uri: &str) -> Result<()> {
        debug!("Adding song to MPD queue: {uri}");
        self.run(["add", uri])
            .with_context(|| format!("Failed to add '{uri}' to the queue"))?;
        Ok(())
    }

    fn add_all(&mut self, uris: &[String]) -> Result<()> {
        if uris.is_empty() {
            return Ok(());
        }
        debug!("Adding {} songs to MPD queue", uris.len());
        self.run(std::iter::once("add").chain(uris.iter().map(String::as_str)))
            .with_context(|| format!("Failed to add {} songs to the queue", uris.len()))?;
        Ok(())
    }

    fn play_at(&mut self, position: usize) -> Result<()> {
        debug!("Playing queue position {position}");
        self.run(["play", (position + 1).to_string().as_str()])
            .with_context(|| format!("Failed to start playback at position {position}"))?;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.run(["pause"]).context("Failed to pause playback")?;
        Ok(())
    }

    fn list_all(&mut self, tags: &[Tag]) -> Result<Vec<Song>> {
        let format = song_format(tags);
        let text = self
            .run(["-f", format.as_str(), "listall"])
            .context("Failed to list the MPD database")?;
        Ok(text
            .lines()
            .filter_map(|line| parse_song_line(line, tags))
            .collect())
    }
}

/// mpc format printing the URI followed by each tag. A missing tag prints as
/// an empty field thanks to the optional `[...]` section.
fn song_format(tags: &[Tag]) -> String {
    let mut format = String::from("%file%");
    for tag in tags {
        format.push(FIELD_SEPARATOR);
        format.push_str(&format!("[%{tag}%]"));
    }
    format
}

fn parse_song_line(line: &str, tags: &[Tag]) -> Option<Song> {
    let mut fields = line.split(FIELD_SEPARATOR);
    let uri = fields.next()?.trim_end_matches('\r');
    if uri.is_empty() {
        return None;
    }

    let mut song = Song::new(uri);
    for (tag, value) in tags.iter().zip(fields) {
        if !value.is_empty() {
            song.tags.insert(*tag, value.to_string());
        }
    }
    Some(song)
}

/// Parse the output of `mpc status STATUS_FORMAT`.
fn parse_status(text: &str) -> Result<Status> {
    let line = text
        .lines()
        .find(|line| line.contains(FIELD_SEPARATOR))
        .with_context(|| format!("Unexpected mpc status output: {text:?}"))?;

    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).map(str::trim).collect();
    if fields.len() != 4 {
        bail!("Unexpected mpc status output: {line:?}");
    }

    let song_pos: usize = fields[0]
        .parse()
        .with_context(|| format!("Invalid song position '{}'", fields[0]))?;
    let queue_length: usize = fields[1]
        .parse()
        .with_context(|| format!("Invalid queue length '{}'", fields[1]))?;

    Ok(Status {
        queue_length,
        // mpc prints 0 when there is no current song
        song_position: song_pos.checked_sub(1),
        single: matches!(fields[3], "on" | "once"),
        playing: fields[2] == "playing",
    })
}

fn parse_idle(text: &str) -> IdleEvents {
    text.lines().filter_map(IdleEvent::from_subsystem).collect()
}
