//! # mushuffle
//!
//! Keeps MPD's queue topped up with random songs, or whole albums/artists
//! when grouping is enabled, without repeating recent picks.
//!
//! ## Usage
//!
//! ```bash
//! # Shuffle the whole library, one song at a time
//! mushuffle
//!
//! # Shuffle albums, keeping 10 songs queued ahead
//! mushuffle --by-album -q 10
//!
//! # Queue 20 random songs and exit
//! mushuffle --only 20
//! ```
//!
//! ## Logging
//!
//! Controlled via `RUST_LOG`:
//! - `RUST_LOG=info mushuffle` - Lifecycle events (connect, reloads, suspend)
//! - `RUST_LOG=mushuffle::enqueue=debug mushuffle` - Every refill decision

use anyhow::{bail, Result};
use clap::CommandFactory;
use log::info;

use mushuffle::cli::Args;
use mushuffle::completion;
use mushuffle::config::Options;
use mushuffle::daemon::{self, LoopDelegate, LoopExit};
use mushuffle::enqueue;
use mushuffle::load::{FileLoader, Loader, MpdLoader};
use mushuffle::mpd_client::MpcClient;
use mushuffle::shuffle::ShuffleChain;

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse_grouped();

    if let Some(shell) = args.completions {
        let mut cmd = Args::command();
        completion::generate_completions(
            completion::shell_to_completion_shell(&shell),
            &mut cmd,
            &mut std::io::stdout(),
        );
        return Ok(());
    }

    // Reject bad options before talking to MPD at all.
    let options = Options::from_args(args)?;

    let mut mpd = MpcClient::connect(options.host.clone(), options.port)?;
    let mut chain = ShuffleChain::new(options.tweaks.window_size)?;

    let mut loader: Box<dyn Loader> = match &options.file_in {
        Some(path) => Box::new(FileLoader::open(
            path,
            options.check_uris,
            options.rules.clone(),
            options.group_by.clone(),
        )?),
        None => Box::new(MpdLoader::new(options.rules.clone(), options.group_by.clone())),
    };
    loader.load(&mut mpd, &mut chain)?;

    println!("{}", daemon::describe_pool(&chain));
    if chain.is_empty() {
        bail!("Nothing to shuffle. Check the exclusion rules and the song source.");
    }

    if let Some(count) = options.queue_only {
        let added = enqueue::enqueue_only(&mut mpd, &mut chain, count)?;
        println!("Added {added} song{}.", if added == 1 { "" } else { "s" });
        return Ok(());
    }

    let delegate = LoopDelegate {
        report: Box::new(|line: &str| println!("{line}")),
        ..LoopDelegate::default()
    };
    match daemon::run_loop(&mut mpd, &mut chain, &options, delegate)? {
        LoopExit::DatabaseUpdated => println!("Database updated, exiting."),
        exit => info!("Control loop finished: {exit:?}"),
    }

    Ok(())
}
