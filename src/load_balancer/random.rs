//! Uniform random selection.

use rand::seq::SliceRandom;

use crate::load_balancer::LoadBalancer;
use crate::registry::Instance;

/// Picks each instance with equal probability.
#[derive(Debug, Default)]
pub struct RandomChoice;

impl RandomChoice {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for RandomChoice {
    fn select<'a>(&self, instances: &'a [Instance]) -> Option<&'a Instance> {
        instances.choose(&mut rand::thread_rng())
    }
}
