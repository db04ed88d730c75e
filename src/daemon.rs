//! # Queue Daemon
//!
//! The long-running control loop. It blocks on MPD's idle notifications and
//! reacts to three of them:
//!
//! - **database**: exit if `exit-on-db-update` is set, otherwise rebuild the
//!   song pool (only when it came from MPD; a `--file` pool is static)
//! - **playlist** (the queue) and **player**: top the queue up through
//!   [`enqueue::try_enqueue`]
//!
//! One wakeup runs at most one of the two branches, the database branch
//! first.
//!
//! ## Suspending
//!
//! With a non-zero `suspend-timeout`, a wakeup that finds the queue empty
//! waits for the timeout before doing anything. If the queue was refilled in
//! the meantime, someone else is using the player: the daemon suspends and
//! stops enqueuing. It resumes after a later wakeup finds the queue empty
//! and still empty once the timeout has passed again.
//!
//! The decision is made on the queue length observed *after* the sleep: a
//! queue that stayed empty means nobody else is driving the player, so the
//! daemon keeps running and refills it. Only a queue that somebody else
//! refilled during the wait suspends the daemon.
//!
//! ## Reporting
//!
//! The new pool size after a reload goes through [`LoopDelegate::report`],
//! so the binary decides where operator messages end up.
//!
//! ## Termination
//!
//! The loop never calls `process::exit`. It returns a [`LoopExit`] saying
//! why it stopped, and the caller decides what that means for the process.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::fmt;
use std::time::Duration;

use crate::config::Options;
use crate::enqueue;
use crate::load::{Loader, MpdLoader};
use crate::mpd::{IdleEvent, IdleEvents, Player};
use crate::shuffle::ShuffleChain;

/// Why the control loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The database changed and `exit-on-db-update` is set.
    DatabaseUpdated,
    /// The idle wait returned no events.
    Cancelled,
    /// The [`LoopDelegate::until`] predicate asked to stop.
    Stopped,
}

/// Whether the daemon is currently enqueuing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Suspended,
}

/// Hooks that let tests drive the loop without real time passing.
pub struct LoopDelegate {
    /// Checked before every wait; the loop stops once it returns false.
    /// `None` loops until the idle wait is cancelled.
    pub until: Option<Box<dyn FnMut() -> bool>>,
    /// Used for the suspend timeout.
    pub sleep: Box<dyn FnMut(Duration)>,
    /// Receives operator-facing status lines. Logs them at info level by
    /// default.
    pub report: Box<dyn FnMut(&str)>,
}

impl Default for LoopDelegate {
    fn default() -> Self {
        Self {
            until: None,
            sleep: Box::new(std::thread::sleep),
            report: Box::new(|line: &str| info!("{line}")),
        }
    }
}

impl fmt::Debug for LoopDelegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopDelegate")
            .field("until", &self.until.is_some())
            .finish_non_exhaustive()
    }
}

/// Describe the pool size for the operator, mentioning groups when grouping
/// is in effect.
pub fn describe_pool(chain: &ShuffleChain) -> String {
    if chain.is_empty() {
        return "Song pool is empty.".to_string();
    }
    if chain.len() != chain.len_uris() {
        format!(
            "Picking from {} groups ({} songs).",
            chain.len(),
            chain.len_uris()
        )
    } else {
        format!("Picking random songs out of a pool of {}.", chain.len())
    }
}

/// Queue-refill daemon that monitors MPD events
#[derive(Debug)]
pub struct QueueDaemon<'a> {
    options: &'a Options,
    delegate: LoopDelegate,
    state: LoopState,
}

impl<'a> QueueDaemon<'a> {
    pub fn new(options: &'a Options, delegate: LoopDelegate) -> Self {
        Self {
            options,
            delegate,
            state: LoopState::Running,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Run until the database-update exit policy fires, the idle wait is
    /// cancelled, or the delegate says stop.
    ///
    /// The chain must not be empty on entry.
    pub fn run<P: Player>(&mut self, player: &mut P, chain: &mut ShuffleChain) -> Result<LoopExit> {
        let options = self.options;
        let events = IdleEvents::all();

        if options.tweaks.play_on_startup {
            enqueue::try_first(player, chain).context("Failed to start playback")?;
            enqueue::try_enqueue(player, chain, options.queue_buffer)
                .context("Failed to fill the queue buffer")?;
        }

        loop {
            if let Some(until) = self.delegate.until.as_mut() {
                if !until() {
                    return Ok(LoopExit::Stopped);
                }
            }

            let fired = player.idle(&events).context("Failed waiting for MPD events")?;
            if fired.is_empty() {
                info!("Idle wait cancelled, stopping");
                return Ok(LoopExit::Cancelled);
            }

            if fired.has(IdleEvent::Database) && options.tweaks.exit_on_db_update {
                info!("Database updated, exiting");
                return Ok(LoopExit::DatabaseUpdated);
            }

            if fired.has(IdleEvent::Database) && options.reloadable() {
                self.reload(player, chain)?;
            } else if fired.has(IdleEvent::Queue) || fired.has(IdleEvent::Player) {
                self.handle_queue_event(player, chain)?;
            }
        }
    }

    fn reload<P: Player>(&mut self, player: &mut P, chain: &mut ShuffleChain) -> Result<()> {
        info!("MPD database changed, rebuilding song pool");
        let mut loader = MpdLoader::new(self.options.rules.clone(), self.options.group_by.clone());
        let groups = loader
            .load_groups(player)
            .context("Failed to reload songs after a database update")?;

        chain.clear();
        for group in groups {
            chain.add(group);
        }
        let summary = describe_pool(chain);
        (self.delegate.report)(summary.as_str());
        Ok(())
    }

    fn handle_queue_event<P: Player>(&mut self, player: &mut P, chain: &mut ShuffleChain) -> Result<()> {
        let timeout = self.options.tweaks.suspend_timeout;
        if !timeout.is_zero() && player.status()?.queue_length == 0 {
            debug!("Queue empty, waiting {timeout:?} before refilling");
            (self.delegate.sleep)(timeout);

            let next = if player.status()?.queue_length == 0 {
                LoopState::Running
            } else {
                LoopState::Suspended
            };
            if next != self.state {
                info!("Queue daemon now {next:?}");
            }
            self.state = next;
        }

        if self.state == LoopState::Suspended {
            debug!("Suspended, leaving the queue alone");
            return Ok(());
        }

        if chain.is_empty() {
            warn!("Song pool is empty, nothing to enqueue");
            return Ok(());
        }

        enqueue::try_enqueue(player, chain, self.options.queue_buffer)?;
        Ok(())
    }
}

/// Run the control loop with the given test hooks.
pub fn run_loop<P: Player>(
    player: &mut P,
    chain: &mut ShuffleChain,
    options: &Options,
    delegate: LoopDelegate,
) -> Result<LoopExit> {
    QueueDaemon::new(options, delegate).run(player, chain)
}
