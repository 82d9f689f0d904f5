//! Spiral placement for the displayed performers.
//!
//! Performers arrive ranked. Rank decides where they sit on a multi-turn spiral: the
//! most credited performers wind tightest around the centre, the rest fan outwards. A
//! little jitter from the injected random source keeps neighbours from stacking.
use rand::Rng;
use std::f64::consts::PI;

use crate::models::{Hsl, Performer, PlacedPerformer};
use crate::services::graph::TOP_PERFORMER_COUNT;

const SPIRAL_TURNS: f64 = 4.0;
const INNER_RADIUS: f64 = 0.1;
const RADIUS_SPAN: f64 = 0.4;
/// Total width of the jitter window, split evenly around zero
const JITTER: f64 = 0.04;

/// Places `displayed` (already ranked) on the unit square centred at (0.5, 0.5)
pub fn layout_performers<R: Rng>(
    displayed: &[&Performer],
    rng: &mut R,
) -> Vec<PlacedPerformer> {
    let n = displayed.len();

    displayed
        .iter()
        .enumerate()
        .map(|(rank, performer)| {
            let t = rank as f64 / n as f64;
            let angle = t * SPIRAL_TURNS * 2.0 * PI + jitter(rng);
            let radius = INNER_RADIUS + t * RADIUS_SPAN + jitter(rng);
            let appearances = performer.appearance_count();
            let is_top = rank < TOP_PERFORMER_COUNT;

            PlacedPerformer {
                id: performer.id,
                name: performer.name.clone(),
                image: performer.image.clone(),
                appearance_count: appearances,
                rank,
                is_top,
                x: 0.5 + radius * angle.cos(),
                y: 0.5 + radius * angle.sin(),
                depth: rng.gen_range(0.25..0.75),
                size: node_size(appearances),
                color: node_color(rank, t, appearances, is_top),
            }
        })
        .collect()
}

fn jitter<R: Rng>(rng: &mut R) -> f64 {
    rng.gen_range(-JITTER / 2.0..JITTER / 2.0)
}

/// Grows with the log of the appearance count
pub fn node_size(appearances: usize) -> f64 {
    ((appearances + 1) as f64).log2() * 10.0 + 6.0
}

/// Warm hues for the top performers, a cool band shifting with rank for everyone else
pub fn node_color(rank: usize, t: f64, appearances: usize, is_top: bool) -> Hsl {
    if is_top {
        return Hsl {
            hue: 15.0 + 3.0 * rank as f64,
            saturation: 85.0,
            lightness: 60.0,
        };
    }

    Hsl {
        hue: 180.0 + 40.0 * t,
        saturation: (45.0 + 5.0 * appearances as f64).min(80.0),
        lightness: (45.0 + 2.0 * appearances as f64).min(65.0),
    }
}
