use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{ModelError, Result};
use crate::model::BayesNet;
use crate::sample::Sample;

use super::{ChainSampler, ProposalScales};

/// Derive one independent RNG per chain from a master seed.
///
/// Chain `i` gets `StdRng::seed_from_u64(master_seed + i)`, so a run is
/// reproducible from the master seed alone and indifferent to how the
/// chains are scheduled.
pub fn spawn_rngs(master_seed: u64, count: usize) -> Vec<StdRng> {
    (0..count)
        .map(|i| StdRng::seed_from_u64(master_seed.wrapping_add(i as u64)))
        .collect()
}

/// A set of independent chains over the same observation.
///
/// Chains share nothing mutable: each owns its model, its copy of the
/// observation and its history, which is what makes the parallel path a
/// plain data-parallel map.
#[derive(Clone, Debug)]
pub struct MultiChainSampler {
    chains: Vec<ChainSampler>,
}

impl MultiChainSampler {
    pub fn new(
        model: BayesNet,
        observation: Sample,
        scales: ProposalScales,
        burn_in: usize,
        num_samples: usize,
        num_chains: usize,
    ) -> Result<Self> {
        if num_chains == 0 {
            return Err(ModelError::InvalidConfig {
                what: "num_chains",
                value: 0.0,
            });
        }
        let chains = (0..num_chains)
            .map(|_| {
                ChainSampler::new(
                    model.clone(),
                    observation.clone(),
                    scales,
                    burn_in,
                    num_samples,
                )
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { chains })
    }

    pub fn num_chains(&self) -> usize {
        self.chains.len()
    }

    pub fn chains(&self) -> &[ChainSampler] {
        &self.chains
    }

    /// Run every chain to completion, one RNG per chain.
    ///
    /// With the `parallel` feature enabled and more than one chain the
    /// chains run on the Rayon pool; otherwise they run sequentially in
    /// chain order. Results are identical either way because chain `i`
    /// only ever touches `rngs[i]`.
    pub fn run_all(&mut self, rngs: &mut [StdRng]) -> Result<()> {
        if rngs.len() != self.chains.len() {
            return Err(ModelError::ChainCountMismatch {
                chains: self.chains.len(),
                rngs: rngs.len(),
            });
        }

        if self.chains.len() > 1 {
            #[cfg(feature = "parallel")]
            {
                return self.run_all_parallel(rngs);
            }
        }

        self.run_all_sequential(rngs)
    }

    fn run_all_sequential(&mut self, rngs: &mut [StdRng]) -> Result<()> {
        for (chain, rng) in self.chains.iter_mut().zip(rngs.iter_mut()) {
            chain.run_to_completion(rng)?;
        }
        Ok(())
    }

    #[cfg(feature = "parallel")]
    fn run_all_parallel(&mut self, rngs: &mut [StdRng]) -> Result<()> {
        use rayon::prelude::*;

        self.chains
            .par_iter_mut()
            .zip(rngs.par_iter_mut())
            .try_for_each(|(chain, rng)| chain.run_to_completion(rng))
    }

    /// Merge the chains: all kept samples in chain order, plus the single
    /// best sample across chains. Ties keep the earlier chain's sample.
    pub fn into_results(self) -> (Vec<Sample>, Option<Sample>) {
        let num_chains = self.chains.len();
        let mut all = Vec::new();
        let mut best: Option<Sample> = None;
        for chain in self.chains {
            let (saved, chain_best) = chain.into_results();
            all.extend(saved);
            if let Some(b) = chain_best {
                let improved = best
                    .as_ref()
                    .map_or(true, |cur| b.log_prob_value() > cur.log_prob_value());
                if improved {
                    best = Some(b);
                }
            }
        }
        debug!(
            "MultiChainSampler: merged {} samples from {} chains",
            all.len(),
            num_chains
        );
        (all, best)
    }
}
