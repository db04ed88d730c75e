//! # Queue Controller
//!
//! Decides from a player [`Status`] snapshot whether more songs are needed,
//! pulls them from the [`ShuffleChain`] and tells the player what to play.
//!
//! ## Refill Rule
//!
//! ```text
//! past_last   = no current song
//! queue_empty = queue length is 0
//! remaining   = songs queued after the current one (0 when past_last)
//! should_add  = past_last || queue_empty || remaining < queue_buffer
//! ```
//!
//! With a buffer, whole groups are added until at least
//! `queue_buffer - remaining` songs went in, plus one more when nothing is
//! current (the song about to start). Multi-song groups can overshoot the
//! target; the extra songs are left in place. Without a buffer exactly one
//! group is added.
//!
//! When nothing was current, playback restarts at the first song just added.
//! In MPD "single" mode playback is paused again right away, so the new song
//! waits for the user instead of starting on its own.
//!
//! Both entry points require a non-empty chain.

use anyhow::Result;
use log::debug;

use crate::mpd::{Player, Status};
use crate::shuffle::ShuffleChain;

/// If the player is idle, enqueue one group and start playing it.
pub fn try_first<P: Player + ?Sized>(player: &mut P, chain: &mut ShuffleChain) -> Result<()> {
    let status = player.status()?;
    if status.playing {
        debug!("Player already playing, nothing to start");
        return Ok(());
    }

    player.add_all(&chain.pick())?;
    // The queue length before adding is the position of the first new song.
    player.play_at(status.queue_length)?;
    Ok(())
}

/// Songs still queued after the current one, `None` if nothing is current.
fn remaining_after_current(status: &Status) -> Option<usize> {
    status
        .song_position
        .map(|pos| status.queue_length.saturating_sub(pos + 1))
}

/// Top the queue up to `queue_buffer` songs past the current one.
///
/// Returns the number of songs added.
pub fn try_enqueue<P: Player + ?Sized>(
    player: &mut P,
    chain: &mut ShuffleChain,
    queue_buffer: usize,
) -> Result<usize> {
    let status = player.status()?;

    let past_last = status.song_position.is_none();
    let queue_empty = status.queue_length == 0;
    let remaining = remaining_after_current(&status).unwrap_or(0);

    let should_add = past_last || queue_empty || remaining < queue_buffer;
    if !should_add {
        return Ok(0);
    }

    let mut added = 0;
    if queue_buffer > 0 {
        let mut needed = queue_buffer as i64 - remaining as i64;
        if past_last || queue_empty {
            needed += 1;
        }
        while needed > 0 {
            let picked = chain.pick();
            needed -= picked.len() as i64;
            added += picked.len();
            player.add_all(&picked)?;
        }
    } else {
        let picked = chain.pick();
        added += picked.len();
        player.add_all(&picked)?;
    }
    debug!("Enqueued {added} songs ({remaining} were remaining)");

    if past_last || queue_empty {
        player.play_at(status.queue_length)?;
        if status.single {
            player.pause()?;
        }
    }
    Ok(added)
}

/// Enqueue groups until at least `count` songs were added. Does not touch
/// playback.
pub fn enqueue_only<P: Player + ?Sized>(
    player: &mut P,
    chain: &mut ShuffleChain,
    count: usize,
) -> Result<usize> {
    let mut added = 0;
    while added < count {
        let picked = chain.pick();
        added += picked.len();
        player.add_all(&picked)?;
    }
    Ok(added)
}
