//! # Player Abstraction
//!
//! The shuffle core never talks to MPD directly. It works against the
//! [`Player`] trait defined here, which exposes exactly what the queue
//! controller and the loaders need:
//!
//! - a [`Status`] snapshot of the queue and playback state
//! - a blocking [`Player::idle`] wait that reports which [`IdleEvent`]s fired
//! - the enqueue and playback commands (`add`, `play_at`, `pause`)
//! - database listing for the loaders (`list_all`)
//!
//! [`crate::mpd_client::MpcClient`] is the production implementation. Tests
//! use [`fake::FakePlayer`].

use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Song metadata tags understood by rules and grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tag {
    Artist,
    AlbumArtist,
    Album,
    Title,
    Track,
    Name,
    Genre,
    Date,
    Composer,
    Performer,
    Comment,
    Disc,
}

impl Tag {
    pub const ALL: [Tag; 12] = [
        Tag::Artist,
        Tag::AlbumArtist,
        Tag::Album,
        Tag::Title,
        Tag::Track,
        Tag::Name,
        Tag::Genre,
        Tag::Date,
        Tag::Composer,
        Tag::Performer,
        Tag::Comment,
        Tag::Disc,
    ];

    /// Name as used by `mpc` format strings and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Artist => "artist",
            Tag::AlbumArtist => "albumartist",
            Tag::Album => "album",
            Tag::Title => "title",
            Tag::Track => "track",
            Tag::Name => "name",
            Tag::Genre => "genre",
            Tag::Date => "date",
            Tag::Composer => "composer",
            Tag::Performer => "performer",
            Tag::Comment => "comment",
            Tag::Disc => "disc",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tag {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Tag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == wanted)
            .ok_or_else(|| anyhow!("unknown tag '{s}'"))
    }
}

/// A song from the player database: its URI and whatever tags were fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Song {
    pub uri: String,
    pub tags: BTreeMap<Tag, String>,
}

impl Song {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            tags: BTreeMap::new(),
        }
    }

    /// Builder-style tag setter.
    pub fn with_tag(mut self, tag: Tag, value: impl Into<String>) -> Self {
        self.tags.insert(tag, value.into());
        self
    }

    pub fn tag(&self, tag: Tag) -> Option<&str> {
        self.tags.get(&tag).map(String::as_str)
    }
}

/// Snapshot of the player state, read once per control loop iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Status {
    /// Number of entries in the queue.
    pub queue_length: usize,
    /// Zero-based queue position of the current song, `None` when there is
    /// no current song (queue empty, or every entry already played).
    pub song_position: Option<usize>,
    /// MPD "single" mode is on.
    pub single: bool,
    /// The player is actively playing (not paused or stopped).
    pub playing: bool,
}

/// Subsystems whose change ends an idle wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleEvent {
    Database,
    Queue,
    Player,
}

impl IdleEvent {
    fn bit(self) -> u8 {
        match self {
            IdleEvent::Database => 1,
            IdleEvent::Queue => 1 << 1,
            IdleEvent::Player => 1 << 2,
        }
    }

    /// MPD subsystem name. The queue is called "playlist" on the wire.
    pub fn subsystem(self) -> &'static str {
        match self {
            IdleEvent::Database => "database",
            IdleEvent::Queue => "playlist",
            IdleEvent::Player => "player",
        }
    }

    pub fn from_subsystem(name: &str) -> Option<Self> {
        match name.trim() {
            "database" => Some(IdleEvent::Database),
            "playlist" => Some(IdleEvent::Queue),
            "player" => Some(IdleEvent::Player),
            _ => None,
        }
    }
}

/// Small bit set of [`IdleEvent`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdleEvents(u8);

impl IdleEvents {
    pub fn empty() -> Self {
        Self(0)
    }

    /// All events the control loop cares about.
    pub fn all() -> Self {
        Self::from_iter([IdleEvent::Database, IdleEvent::Queue, IdleEvent::Player])
    }

    pub fn insert(&mut self, event: IdleEvent) {
        self.0 |= event.bit();
    }

    pub fn has(&self, event: IdleEvent) -> bool {
        self.0 & event.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Events in a fixed order: database, queue, player.
    pub fn iter(&self) -> impl Iterator<Item = IdleEvent> + '_ {
        [IdleEvent::Database, IdleEvent::Queue, IdleEvent::Player]
            .into_iter()
            .filter(move |event| self.has(*event))
    }

    /// Keep only the events also present in `other`.
    pub fn intersect(self, other: IdleEvents) -> Self {
        Self(self.0 & other.0)
    }
}

impl FromIterator<IdleEvent> for IdleEvents {
    fn from_iter<I: IntoIterator<Item = IdleEvent>>(iter: I) -> Self {
        let mut set = Self::empty();
        for event in iter {
            set.insert(event);
        }
        set
    }
}

/// Command and query surface of a music player.
pub trait Player {
    /// Current queue and playback state.
    fn status(&mut self) -> Result<Status>;

    /// Block until at least one event in `events` fires and return the ones
    /// that did. An empty result means the wait was cancelled.
    fn idle(&mut self, events: &IdleEvents) -> Result<IdleEvents>;

    /// Append one URI to the end of the queue.
    fn add(&mut self, uri: &str) -> Result<()>;

    /// Append several URIs, in order.
    fn add_all(&mut self, uris: &[String]) -> Result<()> {
        for uri in uris {
            self.add(uri)?;
        }
        Ok(())
    }

    /// Start playing the queue entry at the zero-based `position`.
    fn play_at(&mut self, position: usize) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    /// Every song in the database, with the requested tags filled in where
    /// the song has them.
    fn list_all(&mut self, tags: &[Tag]) -> Result<Vec<Song>>;
}

/// In-memory player used by unit tests.
#[cfg(test)]
pub mod fake {
    use super::*;
    use std::collections::VecDeque;

    /// Commands recorded by [`FakePlayer`], in call order.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Add(String),
        PlayAt(usize),
        Pause,
    }

    #[derive(Default)]
    pub struct FakePlayer {
        pub db: Vec<Song>,
        pub queue: Vec<String>,
        pub position: Option<usize>,
        pub playing: bool,
        pub single: bool,
        /// Results handed out by successive `idle` calls. Once drained,
        /// `idle` returns an empty set.
        pub idle_results: VecDeque<IdleEvents>,
        pub calls: Vec<Call>,
        pub status_calls: usize,
        /// Run on every `status` call, before the snapshot is taken. Gets
        /// the queue and the 1-based number of this `status` call.
        pub on_status: Option<Box<dyn FnMut(&mut Vec<String>, usize)>>,
    }

    impl FakePlayer {
        pub fn with_db(db: Vec<Song>) -> Self {
            Self {
                db,
                ..Self::default()
            }
        }

        pub fn added(&self) -> Vec<String> {
            self.calls
                .iter()
                .filter_map(|call| match call {
                    Call::Add(uri) => Some(uri.clone()),
                    _ => None,
                })
                .collect()
        }

        pub fn play_calls(&self) -> Vec<&Call> {
            self.calls
                .iter()
                .filter(|call| !matches!(call, Call::Add(_)))
                .collect()
        }
    }

    impl Player for FakePlayer {
        fn status(&mut self) -> Result<Status> {
            self.status_calls += 1;
            if let Some(hook) = self.on_status.as_mut() {
                hook(&mut self.queue, self.status_calls);
            }
            Ok(Status {
                queue_length: self.queue.len(),
                song_position: self.position,
                single: self.single,
                playing: self.playing,
            })
        }

        fn idle(&mut self, events: &IdleEvents) -> Result<IdleEvents> {
            Ok(self
                .idle_results
                .pop_front()
                .map(|fired| fired.intersect(*events))
                .unwrap_or_default())
        }

        fn add(&mut self, uri: &str) -> Result<()> {
            self.queue.push(uri.to_string());
            self.calls.push(Call::Add(uri.to_string()));
            Ok(())
        }

        fn play_at(&mut self, position: usize) -> Result<()> {
            self.position = Some(position);
            self.playing = true;
            self.calls.push(Call::PlayAt(position));
            Ok(())
        }

        fn pause(&mut self) -> Result<()> {
            self.playing = false;
            self.calls.push(Call::Pause);
            Ok(())
        }

        fn list_all(&mut self, tags: &[Tag]) -> Result<Vec<Song>> {
            Ok(self
                .db
                .iter()
                .map(|song| Song {
                    uri: song.uri.clone(),
                    tags: song
                        .tags
                        .iter()
                        .filter(|(tag, _)| tags.contains(tag))
                        .map(|(tag, value)| (*tag, value.clone()))
                        .collect(),
                })
                .collect())
        }
    }
}
