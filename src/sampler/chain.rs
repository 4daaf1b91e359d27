use log::debug;
use rand::Rng;
use rand_distr::StandardNormal;

use crate::error::{ModelError, Result};
use crate::model::BayesNet;
use crate::sample::Sample;

use super::ProposalScales;

/// One Metropolis-Hastings chain conditioned on an observed sample.
///
/// The first step replaces the six inferable scalars of a copy of the
/// observation with fresh prior draws and accepts the result
/// unconditionally. Every later step perturbs the previous sample with a
/// symmetric Gaussian random walk and applies the Metropolis rule
/// `ln(u) <= log_prob(proposal) - log_prob(previous)`. Samples produced
/// after the burn-in window are kept; the best of the kept samples is
/// tracked separately.
#[derive(Clone, Debug)]
pub struct ChainSampler {
    model: BayesNet,
    observation: Sample,
    scales: ProposalScales,
    burn_in: usize,
    num_samples: usize,
    step: usize,
    accepted: usize,
    prev: Option<Sample>,
    saved: Vec<Sample>,
    best: Option<Sample>,
}

impl ChainSampler {
    pub fn new(
        model: BayesNet,
        observation: Sample,
        scales: ProposalScales,
        burn_in: usize,
        num_samples: usize,
    ) -> Result<Self> {
        if observation.num_ims != model.num_ims() {
            return Err(ModelError::FrameCountMismatch {
                expected: model.num_ims(),
                found: observation.num_ims,
            });
        }
        if observation.im_w != model.im_w() || observation.im_h != model.im_h() {
            return Err(ModelError::InvalidConfig {
                what: "observation image dimensions",
                value: (observation.im_w * observation.im_h) as f64,
            });
        }
        for (what, value) in [
            ("pos proposal scale", scales.pos),
            ("vel proposal scale", scales.vel),
            ("angle proposal scale", scales.angle),
            ("ang_vel proposal scale", scales.ang_vel),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ModelError::InvalidScale { what, value });
            }
        }
        Ok(Self {
            model,
            observation,
            scales,
            burn_in,
            num_samples,
            step: 0,
            accepted: 0,
            prev: None,
            saved: Vec::with_capacity(num_samples),
            best: None,
        })
    }

    fn total_steps(&self) -> usize {
        self.burn_in + self.num_samples
    }

    pub fn is_finished(&self) -> bool {
        self.step >= self.total_steps()
    }

    pub fn steps_taken(&self) -> usize {
        self.step
    }

    /// Fraction of random-walk proposals accepted so far. The seeding step
    /// is not a proposal and does not count.
    pub fn acceptance_rate(&self) -> f64 {
        let proposals = self.step.saturating_sub(1);
        if proposals == 0 {
            0.0
        } else {
            self.accepted as f64 / proposals as f64
        }
    }

    /// Samples kept after the burn-in window, in chain order.
    pub fn saved(&self) -> &[Sample] {
        &self.saved
    }

    /// Highest-scoring kept sample, if any step past burn-in has run.
    pub fn best(&self) -> Option<&Sample> {
        self.best.as_ref()
    }

    /// Consume the chain, yielding the kept samples and the best of them.
    pub fn into_results(self) -> (Vec<Sample>, Option<Sample>) {
        (self.saved, self.best)
    }

    /// Advance the chain by one step. A no-op once the chain has run
    /// `burn_in + num_samples` steps.
    pub fn step(&mut self, rng: &mut impl Rng) -> Result<()> {
        if self.is_finished() {
            return Ok(());
        }
        let cur = match self.prev.take() {
            None => self.sample_from_observation(rng)?,
            Some(prev) => self.sample_from_previous(prev, rng)?,
        };
        if self.step >= self.burn_in {
            self.saved.push(cur.clone());
            let improved = self
                .best
                .as_ref()
                .map_or(true, |b| cur.log_prob_value() > b.log_prob_value());
            if improved {
                self.best = Some(cur.clone());
            }
        }
        self.prev = Some(cur);
        self.step += 1;
        if self.is_finished() {
            debug!(
                "ChainSampler: finished {} steps, accepted {}/{} proposals ({:.1}%)",
                self.step,
                self.accepted,
                self.step.saturating_sub(1),
                100.0 * self.acceptance_rate()
            );
        }
        Ok(())
    }

    /// Run every remaining step of the chain.
    pub fn run_to_completion(&mut self, rng: &mut impl Rng) -> Result<()> {
        while !self.is_finished() {
            self.step(rng)?;
        }
        Ok(())
    }

    /// Seed the chain: copy the observation and redraw the inferable
    /// scalars from their priors. Camera, stick length, fracture plan and
    /// observed endpoints stay fixed.
    fn sample_from_observation(&self, rng: &mut impl Rng) -> Result<Sample> {
        let mut cur = self.observation.clone();
        let cam_right = cur.cam_right();
        cur.pos_x = self
            .model
            .pos_x_dist(cur.cam_left, cam_right)?
            .sample(rng);
        cur.pos_y = self
            .model
            .pos_y_dist(cur.cam_bottom, cur.cam_top)?
            .sample(rng);
        cur.vel_x_m_s = self.model.vel_x_dist().sample(rng);
        cur.vel_y_m_s = self.model.vel_y_dist().sample(rng);
        cur.angle = self.model.angle_dist().sample(rng);
        cur.ang_vel_rad_s = self.model.ang_vel_dist().sample(rng);
        cur.recompute_states()?;
        self.model.calc_and_set_log_prob(&mut cur)?;
        Ok(cur)
    }

    /// Propose a perturbed sample and apply the Metropolis rule, returning
    /// whichever of proposal and previous sample survives.
    pub(super) fn sample_from_previous(
        &mut self,
        prev: Sample,
        rng: &mut impl Rng,
    ) -> Result<Sample> {
        let mut cur = self.perturb(&prev, rng);
        cur.recompute_states()?;
        self.model.calc_and_set_log_prob(&mut cur)?;

        let log_diff = cur.log_prob_value() - prev.log_prob_value();
        let u: f64 = rng.random();
        if u.ln() <= log_diff {
            self.accepted += 1;
            Ok(cur)
        } else {
            Ok(prev)
        }
    }

    fn perturb(&self, prev: &Sample, rng: &mut impl Rng) -> Sample {
        let mut cur = prev.clone();
        cur.pos_x += self.scales.pos * standard_normal(rng);
        cur.pos_y += self.scales.pos * standard_normal(rng);
        cur.vel_x_m_s += self.scales.vel * standard_normal(rng);
        cur.vel_y_m_s += self.scales.vel * standard_normal(rng);
        cur.angle += self.scales.angle * standard_normal(rng);
        cur.ang_vel_rad_s += self.scales.ang_vel * standard_normal(rng);
        cur
    }
}

fn standard_normal(rng: &mut impl Rng) -> f64 {
    rng.sample(StandardNormal)
}
