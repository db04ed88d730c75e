//! Keeps an MPD queue topped up with random songs, albums or artists.
//!
//! Core modules:
//! - [`shuffle`] - Grouped, repeat-avoiding random sampler
//! - [`enqueue`] - Queue refill decisions
//! - [`daemon`] - Idle-driven control loop
//! - [`load`] - Song pool loading from MPD or a file
//!
//! ### Supporting Modules
//!
//! - [`mpd`] - Player abstraction used by the core
//! - [`mpd_client`] - MPD integration via the mpc command-line tool
//! - [`rule`] - Tag exclusion rules
//! - [`config`] - Validated runtime options and tweaks
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//!
//! ## Quick Start Example
//!
//! ```no_run
//! use mushuffle::config::Options;
//! use mushuffle::daemon::{self, LoopDelegate};
//! use mushuffle::load::{Loader, MpdLoader};
//! use mushuffle::mpd_client::MpcClient;
//! use mushuffle::shuffle::ShuffleChain;
//!
//! let options = Options::default();
//! let mut mpd = MpcClient::connect(None, None)?;
//!
//! let mut chain = ShuffleChain::new(options.tweaks.window_size)?;
//! MpdLoader::new(Vec::new(), Vec::new()).load(&mut mpd, &mut chain)?;
//! println!("{}", daemon::describe_pool(&chain));
//!
//! daemon::run_loop(&mut mpd, &mut chain, &options, LoopDelegate::default())?;
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! Fallible functions return `anyhow::Result`. Picking from an empty
//! [`shuffle::ShuffleChain`] is a programming error and panics; callers check
//! the pool size first.

pub mod cli;
pub mod completion;
pub mod config;
pub mod daemon;
pub mod enqueue;
pub mod load;
pub mod mpd;
pub mod mpd_client;
pub mod rule;
pub mod shuffle;
