//! Walker-Vose alias sampler over fixed weights.
//!
//! Each draw consumes exactly two PRNG doubles. The worklists are seeded in
//! reverse index order; this matches the reference implementation and is
//! load-bearing for the deterministic part chooser.

#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]

use crate::xoshiro::Xoshiro256;

pub(crate) struct Weighted {
    probs: Vec<f64>,
    aliases: Vec<usize>,
}

impl Weighted {
    pub(crate) fn new(weights: Vec<f64>) -> Self {
        let count = weights.len();
        let total: f64 = weights.iter().sum();
        let mut probs: Vec<f64> = weights
            .iter()
            .map(|weight| weight * count as f64 / total)
            .collect();
        let mut aliases = vec![0usize; count];
        let mut small = Vec::new();
        let mut large = Vec::new();
        for index in (0..count).rev() {
            if probs[index] < 1.0 {
                small.push(index);
            } else {
                large.push(index);
            }
        }
        while let (Some(&lo), Some(&hi)) = (small.last(), large.last()) {
            small.pop();
            large.pop();
            aliases[lo] = hi;
            // Left-associated on purpose; the reference evaluates
            // (P[hi] + P[lo]) - 1 and the rounding is observable.
            #[allow(clippy::assign_op_pattern)]
            {
                probs[hi] = probs[hi] + probs[lo] - 1.0;
            }
            if probs[hi] < 1.0 {
                small.push(hi);
            } else {
                large.push(hi);
            }
        }
        for index in large {
            probs[index] = 1.0;
        }
        for index in small {
            probs[index] = 1.0;
        }
        Self { probs, aliases }
    }

    pub(crate) fn next(&self, rng: &mut Xoshiro256) -> usize {
        let r1 = rng.next_double();
        let r2 = rng.next_double();
        let index = (r1 * self.probs.len() as f64) as usize;
        if r2 < self.probs[index] {
            index
        } else {
            self.aliases[index]
        }
    }
}
