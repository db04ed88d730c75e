//! # Pool Loading
//!
//! Loaders turn a song source into the groups a [`ShuffleChain`] picks from.
//!
//! - [`MpdLoader`] lists the whole MPD database.
//! - [`FileLoader`] reads URIs, one per line, from a file or stdin, and can
//!   optionally cross-check them against the database.
//!
//! Both apply the exclusion rules and the `--group-by` key the same way: songs
//! with identical values for every group-by tag form one group, groups are
//! ordered by first appearance and keep their songs in listing order. With no
//! group-by tags every song is its own group.
//!
//! A loader always builds the complete batch before touching the chain, so a
//! chain is never observed half loaded.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::mpd::{Player, Song, Tag};
use crate::rule::{self, Rule};
use crate::shuffle::ShuffleChain;

pub trait Loader {
    /// Build every group from the source.
    fn load_groups(&mut self, player: &mut dyn Player) -> Result<Vec<Vec<String>>>;

    /// Build every group and add them to `chain`.
    fn load(&mut self, player: &mut dyn Player, chain: &mut ShuffleChain) -> Result<()> {
        let groups = self.load_groups(player)?;
        for group in groups {
            chain.add(group);
        }
        Ok(())
    }
}

/// Tags that must be fetched to evaluate `rules` and build `group_by` keys.
fn required_tags(rules: &[Rule], group_by: &[Tag]) -> Vec<Tag> {
    let mut tags: Vec<Tag> = rules
        .iter()
        .flat_map(Rule::tags)
        .chain(group_by.iter().copied())
        .collect();
    tags.sort();
    tags.dedup();
    tags
}

/// Group songs by the values of `group_by`, preserving first-seen order.
pub fn group_songs<I>(songs: I, group_by: &[Tag]) -> Vec<Vec<String>>
where
    I: IntoIterator<Item = Song>,
{
    if group_by.is_empty() {
        return songs.into_iter().map(|song| vec![song.uri]).collect();
    }

    let mut groups: Vec<Vec<String>> = Vec::new();
    let mut index: HashMap<Vec<String>, usize> = HashMap::new();

    for song in songs {
        let key: Vec<String> = group_by
            .iter()
            .map(|tag| song.tag(*tag).unwrap_or_default().to_string())
            .collect();
        match index.get(&key) {
            Some(&slot) => groups[slot].push(song.uri),
            None => {
                index.insert(key, groups.len());
                groups.push(vec![song.uri]);
            }
        }
    }
    groups
}

/// Loads every song in the MPD database.
#[derive(Debug, Clone, Default)]
pub struct MpdLoader {
    rules: Vec<Rule>,
    group_by: Vec<Tag>,
}

impl MpdLoader {
    pub fn new(rules: Vec<Rule>, group_by: Vec<Tag>) -> Self {
        Self { rules, group_by }
    }
}

impl Loader for MpdLoader {
    fn load_groups(&mut self, player: &mut dyn Player) -> Result<Vec<Vec<String>>> {
        let tags = required_tags(&self.rules, &self.group_by);
        let songs = player
            .list_all(&tags)
            .context("Failed to load songs from MPD")?;
        let listed = songs.len();

        let accepted: Vec<Song> = songs
            .into_iter()
            .filter(|song| rule::accepts_all(&self.rules, song))
            .collect();
        debug!("{} of {listed} songs accepted by rules", accepted.len());

        let groups = group_songs(accepted, &self.group_by);
        info!("Loaded {} groups from MPD", groups.len());
        Ok(groups)
    }
}

/// Loads URIs listed in a text file.
#[derive(Debug, Clone)]
pub struct FileLoader {
    uris: Vec<String>,
    check: bool,
    rules: Vec<Rule>,
    group_by: Vec<Tag>,
}

impl FileLoader {
    /// Read URIs from `reader`, one per line. Blank lines are skipped.
    ///
    /// With `check` set, URIs are validated against the MPD database during
    /// [`Loader::load_groups`] and `rules`/`group_by` are applied using the
    /// database tags. Without it every URI is its own group.
    pub fn from_reader<R: BufRead>(
        reader: R,
        check: bool,
        rules: Vec<Rule>,
        group_by: Vec<Tag>,
    ) -> Result<Self> {
        let mut uris = Vec::new();
        for line in reader.lines() {
            let line = line.context("Failed to read song list")?;
            let uri = line.trim();
            if !uri.is_empty() {
                uris.push(uri.to_string());
            }
        }
        debug!("Read {} URIs from song list", uris.len());

        Ok(Self {
            uris,
            check,
            rules,
            group_by,
        })
    }

    /// Open `path`, or stdin when `path` is `-`.
    pub fn open(path: &Path, check: bool, rules: Vec<Rule>, group_by: Vec<Tag>) -> Result<Self> {
        if path == Path::new("-") {
            return Self::from_reader(io::stdin().lock(), check, rules, group_by);
        }
        let file = File::open(path)
            .with_context(|| format!("Failed to open song list {}", path.display()))?;
        Self::from_reader(BufReader::new(file), check, rules, group_by)
    }

    pub fn uris(&self) -> &[String] {
        &self.uris
    }
}

impl Loader for FileLoader {
    fn load_groups(&mut self, player: &mut dyn Player) -> Result<Vec<Vec<String>>> {
        if !self.check {
            return Ok(self.uris.iter().map(|uri| vec![uri.clone()]).collect());
        }

        let tags = required_tags(&self.rules, &self.group_by);
        let known: HashMap<String, Song> = player
            .list_all(&tags)
            .context("Failed to load songs from MPD for URI checking")?
            .into_iter()
            .map(|song| (song.uri.clone(), song))
            .collect();

        let mut songs = Vec::with_capacity(self.uris.len());
        for uri in &self.uris {
            // A URI may be listed more than once; each line is its own entry.
            match known.get(uri) {
                Some(song) if rule::accepts_all(&self.rules, song) => songs.push(song.clone()),
                Some(_) => debug!("Excluded by rules: {uri}"),
                None => warn!("Not in the MPD database, skipping: {uri}"),
            }
        }

        Ok(group_songs(songs, &self.group_by))
    }
}
