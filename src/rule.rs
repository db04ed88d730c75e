//! Tag exclusion rules.
//!
//! A [`Rule`] is built from one `--exclude TAG VALUE [TAG VALUE ...]`
//! occurrence. It rejects a song when *every* one of its matchers matches,
//! where a matcher matches if the song's tag contains the value,
//! case-insensitively.

use anyhow::{anyhow, bail, Result};

use crate::mpd::{Song, Tag};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Matcher {
    tag: Tag,
    /// Stored lowercased.
    value: String,
}

impl Matcher {
    fn matches(&self, song: &Song) -> bool {
        song.tag(self.tag)
            .is_some_and(|value| value.to_lowercase().contains(&self.value))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rule {
    matchers: Vec<Matcher>,
}

impl Rule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pattern(&mut self, tag: Tag, value: &str) {
        self.matchers.push(Matcher {
            tag,
            value: value.to_lowercase(),
        });
    }

    /// Build a rule from alternating `TAG VALUE` arguments.
    ///
    /// # Errors
    ///
    /// Fails on an unknown tag, a tag without a value, or no arguments.
    pub fn from_args(args: &[String]) -> Result<Self> {
        if args.is_empty() {
            bail!("no argument supplied for '--exclude'");
        }

        let mut rule = Self::new();
        for pair in args.chunks(2) {
            let tag: Tag = pair[0]
                .parse()
                .map_err(|_| anyhow!("invalid tag '{}' in exclusion rule", pair[0]))?;
            let value = pair
                .get(1)
                .ok_or_else(|| anyhow!("no value supplied for match '{}'", pair[0]))?;
            rule.add_pattern(tag, value);
        }
        Ok(rule)
    }

    /// True if the song passes this rule (is not excluded by it).
    pub fn accepts(&self, song: &Song) -> bool {
        if self.matchers.is_empty() {
            return true;
        }
        !self.matchers.iter().all(|m| m.matches(song))
    }

    /// Tags this rule needs fetched to be evaluated.
    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.matchers.iter().map(|m| m.tag)
    }
}

/// True when no rule in `rules` rejects the song.
pub fn accepts_all(rules: &[Rule], song: &Song) -> bool {
    rules.iter().all(|rule| rule.accepts(song))
}
