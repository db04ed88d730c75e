//! # mushuffle Performance Benchmarks
//!
//! Measures the hot paths of the shuffler: picking from large pools and
//! building groups from a full database listing.
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//!
//! # Run one group
//! cargo bench shuffle
//! ```

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use std::hint::black_box;

use mushuffle::load::group_songs;
use mushuffle::mpd::{Song, Tag};
use mushuffle::shuffle::ShuffleChain;

/// A synthetic library of `count` songs spread over albums of 12 tracks.
fn create_test_songs(count: usize) -> Vec<Song> {
    (0..count)
        .map(|i| {
            Song::new(format!("artist_{}/album_{}/{:02}.flac", i / 120, i / 12, i % 12))
                .with_tag(Tag::Artist, format!("Artist {}", i / 120))
                .with_tag(Tag::Album, format!("Album {}", i / 12))
        })
        .collect()
}

fn create_chain(songs: usize, window_size: usize) -> ShuffleChain {
    let mut chain = ShuffleChain::with_seed(window_size, 7).expect("window size is non-zero");
    for i in 0..songs {
        chain.add_uri(format!("song_{i}.flac"));
    }
    chain
}

fn benchmark_shuffle_pick(c: &mut Criterion) {
    let mut group = c.benchmark_group("shuffle");

    for size in [100, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::new("pick", size), &size, |b, &size| {
            let mut chain = create_chain(size, 7);
            b.iter(|| black_box(chain.pick()))
        });
    }

    // A window as large as the pool keeps the expiry loop busy.
    group.bench_function("pick_wide_window", |b| {
        let mut chain = create_chain(1_000, 1_000);
        b.iter(|| black_box(chain.pick()))
    });

    group.bench_function("fill_chain", |b| {
        b.iter_batched(
            || create_test_songs(10_000),
            |songs| {
                let mut chain = ShuffleChain::with_seed(7, 1).expect("window size is non-zero");
                for song in songs {
                    chain.add_uri(song.uri);
                }
                black_box(chain)
            },
            BatchSize::LargeInput,
        )
    });

    group.finish();
}

fn benchmark_grouping(c: &mut Criterion) {
    let mut group = c.benchmark_group("grouping");

    group.bench_function("no_grouping", |b| {
        b.iter_batched(
            || create_test_songs(10_000),
            |songs| black_box(group_songs(songs, &[])),
            BatchSize::LargeInput,
        )
    });

    group.bench_function("by_album", |b| {
        b.iter_batched(
            || create_test_songs(10_000),
            |songs| black_box(group_songs(songs, &[Tag::Album, Tag::AlbumArtist])),
            BatchSize::LargeInput,
        )
    });

    group.bench_function("by_artist", |b| {
        b.iter_batched(
            || create_test_songs(10_000),
            |songs| black_box(group_songs(songs, &[Tag::Artist])),
            BatchSize::LargeInput,
        )
    });

    group.finish();
}

criterion_group!(benches, benchmark_shuffle_pick, benchmark_grouping);

criterion_main!(benches);
