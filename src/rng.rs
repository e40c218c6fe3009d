//! Seeded random streams.
//!
//! Every random draw in a run comes from one master seed. Each concern of
//! the game draws from its own ChaCha stream, so changing how often one of
//! them draws does not shift the others.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// What a stream of random draws is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    /// Colour and power rolls when a registry is built.
    Registry,
    /// Seed cell placement on restart.
    Seeding,
    /// Per-neighbour conversion trials.
    Turns,
}

impl Stream {
    pub const ALL: [Stream; 3] = [Stream::Registry, Stream::Seeding, Stream::Turns];

    fn index(self) -> usize {
        match self {
            Stream::Registry => 0,
            Stream::Seeding => 1,
            Stream::Turns => 2,
        }
    }
}

pub struct RngManager {
    streams: [ChaCha8Rng; 3],
}

impl RngManager {
    pub fn new(seed: u64) -> Self {
        let streams = Stream::ALL.map(|stream| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            rng.set_stream(stream.index() as u64);
            rng
        });
        Self { streams }
    }

    pub fn stream(&mut self, stream: Stream) -> &mut ChaCha8Rng {
        &mut self.streams[stream.index()]
    }
}
