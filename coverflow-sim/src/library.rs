//! Synthetic poster library backing the simulated carousel.

use std::io::Cursor;

use coverflow_core::prelude::*;
use futures::FutureExt;
use image::{ImageFormat, Rgba, RgbaImage};
use rand::{Rng, SeedableRng, rngs::StdRng};

const POSTER_WIDTH: u32 = 20;
const POSTER_HEIGHT: u32 = 30;

#[derive(Debug, Clone, Copy)]
struct Poster {
    id: u64,
    color: [u8; 4],
}

/// Ordered posters, each encoded to PNG on demand.
#[derive(Debug)]
pub struct PosterLibrary {
    posters: Vec<Poster>,
}

impl PosterLibrary {
    pub fn generate(count: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let posters = (0..count as u64)
            .map(|id| Poster {
                id,
                color: [rng.random(), rng.random(), rng.random(), 255],
            })
            .collect();
        Self { posters }
    }

    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.posters.iter().map(|poster| poster.id)
    }
}

fn encode_png(color: [u8; 4]) -> Result<Vec<u8>, ImageError> {
    let poster = RgbaImage::from_pixel(POSTER_WIDTH, POSTER_HEIGHT, Rgba(color));
    let mut bytes = Vec::new();
    poster
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|err| ImageError::Payload(err.to_string()))?;
    Ok(bytes)
}

impl ItemSource for PosterLibrary {
    type Key = u64;

    fn len(&self) -> usize {
        self.posters.len()
    }

    fn image_key(&self, index: usize) -> Option<u64> {
        self.posters.get(index).map(|poster| poster.id)
    }

    fn payload(&self, index: usize) -> Option<PayloadFuture> {
        let color = self.posters.get(index)?.color;
        Some(async move { encode_png(color) }.boxed())
    }

    fn move_item(&mut self, from: usize, to: usize) {
        if from >= self.posters.len() || to >= self.posters.len() {
            log::warn!("ignoring out-of-range move {from} -> {to}");
            return;
        }
        let poster = self.posters.remove(from);
        self.posters.insert(to, poster);
    }
}
