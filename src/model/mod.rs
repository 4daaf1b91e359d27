//! The generative Bayes net over fracturing-stick scenes.
//!
//! Overview:
//! - fixed priors over the latent initial conditions, parameterized once by
//!   the frame count and image dimensions;
//! - forward sampling of complete scenes, observation noise included;
//! - exact joint log-probability of any consistent sample, the single
//!   source of truth the Metropolis-Hastings samplers compare against.
//!
//! Fracture timing is sampled with supports trimmed to the remaining tree
//! depth: a node that still has `d` generations below it never breaks later
//! than frame `num_ims - d`, so every descendant's lifetime window is
//! non-empty by construction rather than by rejection.

use std::f64::consts::PI;

use log::debug;
use rand::Rng;

use crate::error::{ModelError, Result};
use crate::prob::{BoundedGeometric, DiscreteUniform, Normal, Uniform};
use crate::sample::{
    camera_right, FractureSample, InitialConditions, Sample, CAM_BOTTOM, CAM_LEFT,
};

/// Exclusive upper bound of the fracture-depth prior. Short sequences trim
/// it further: depth `d` needs `d` strictly increasing fracture frames
/// before `num_ims`, so only depths below `num_ims` are admissible.
const FRAC_DEPTH_HIGH: i64 = 4;
/// The first fracture falls uniformly within this fraction of the sequence.
const EARLY_FRACTURE_DIV: f64 = 4.0;
/// Per-frame success probability of the later-fracture waiting times.
const FRACTURE_CONTINUE_P: f64 = 0.5;
/// Divisor turning the geometric mean of the image dimensions into the
/// per-axis endpoint noise standard deviation, in pixels.
const OBS_NOISE_DIV: f64 = 64.0;

/// Priors and likelihood of the stick scene.
///
/// Stateless between samples: the struct owns only distribution parameters
/// fixed at construction from the frame count and image dimensions.
#[derive(Clone, Debug)]
pub struct BayesNet {
    num_ims: usize,
    im_w: usize,
    im_h: usize,
    frac_depth_dist: DiscreteUniform,
    cam_top_dist: Uniform,
    vel_x_dist: Normal,
    vel_y_dist: Normal,
    angle_dist: Uniform,
    ang_vel_dist: Normal,
    obs_noise_dist: Normal,
}

impl BayesNet {
    pub fn new(num_ims: usize, im_w: usize, im_h: usize) -> Result<Self> {
        if num_ims < 2 {
            return Err(ModelError::InvalidConfig {
                what: "num_ims",
                value: num_ims as f64,
            });
        }
        if im_w == 0 || im_h == 0 {
            return Err(ModelError::InvalidConfig {
                what: "image dimensions",
                value: (im_w * im_h) as f64,
            });
        }
        let obs_std = ((im_w * im_h) as f64).sqrt() / OBS_NOISE_DIV;
        Ok(Self {
            num_ims,
            im_w,
            im_h,
            frac_depth_dist: DiscreteUniform::new(
                "frac_tree_depth",
                0,
                FRAC_DEPTH_HIGH.min(num_ims as i64),
            )?,
            cam_top_dist: Uniform::new("cam_top", 2.0, 12.0)?,
            vel_x_dist: Normal::new("vel_x_m_s", 0.0, 2.0)?,
            vel_y_dist: Normal::new("vel_y_m_s", 1.0, 2.0)?,
            angle_dist: Uniform::new("angle", 0.0, 2.0 * PI)?,
            ang_vel_dist: Normal::new("ang_vel_rad_s", 0.0, 8.0 * PI)?,
            obs_noise_dist: Normal::new("observation noise", 0.0, obs_std)?,
        })
    }

    pub fn num_ims(&self) -> usize {
        self.num_ims
    }

    pub fn im_w(&self) -> usize {
        self.im_w
    }

    pub fn im_h(&self) -> usize {
        self.im_h
    }

    /// Prior over the initial x position given the camera's horizontal
    /// bounds. The scale guard keeps the prior usable even if a pathological
    /// chain state inverts the bounds.
    pub fn pos_x_dist(&self, cam_left: f64, cam_right: f64) -> Result<Normal> {
        Normal::new(
            "pos_x",
            0.5 * (cam_left + cam_right),
            ((cam_right - cam_left) / 16.0).abs(),
        )
    }

    /// Prior over the initial y position given the camera's vertical bounds.
    pub fn pos_y_dist(&self, cam_bottom: f64, cam_top: f64) -> Result<Normal> {
        Normal::new(
            "pos_y",
            0.5 * (cam_bottom + cam_top),
            ((cam_top - cam_bottom) / 16.0).abs(),
        )
    }

    /// Prior over the stick length: uniform over the second eighth of the
    /// camera height.
    pub fn stick_len_dist(&self, cam_bottom: f64, cam_top: f64) -> Result<Uniform> {
        let eighth = (cam_top - cam_bottom) / 8.0;
        Uniform::new("stick_len", eighth, eighth + eighth.abs())
    }

    /// Prior over a break position along a stick of the given length.
    pub fn frac_loc_dist(&self, stick_len: f64) -> Result<Uniform> {
        Uniform::new("fr_loc", 0.0, stick_len)
    }

    /// Timing prior of the root fracture: uniform over the first quarter of
    /// the sequence, capped so `depth` generations still fit afterwards.
    pub fn first_frac_time_dist(&self, depth: usize) -> Result<DiscreteUniform> {
        let quarter = (self.num_ims as f64 / EARLY_FRACTURE_DIV).round() as i64;
        let cap = self.num_ims as i64 - depth as i64 + 1;
        DiscreteUniform::new("fr_time", 1, quarter.max(2).min(cap))
    }

    /// Timing prior of a non-root fracture: truncated geometric waiting time
    /// after the parent's break at `start`, capped so `depth` generations
    /// still fit before `end`.
    pub fn later_frac_time_dist(
        &self,
        start: usize,
        end: usize,
        depth: usize,
    ) -> Result<BoundedGeometric> {
        let high = (end + 1).saturating_sub(depth);
        BoundedGeometric::new("fr_time", start, high, FRACTURE_CONTINUE_P)
    }

    pub fn vel_x_dist(&self) -> Normal {
        self.vel_x_dist
    }

    pub fn vel_y_dist(&self) -> Normal {
        self.vel_y_dist
    }

    pub fn angle_dist(&self) -> Uniform {
        self.angle_dist
    }

    pub fn ang_vel_dist(&self) -> Normal {
        self.ang_vel_dist
    }

    /// Draw a complete scene: latents, fracture plan, trajectory,
    /// observations.
    pub fn forward(&self, rng: &mut impl Rng) -> Result<Sample> {
        // 1) scalar latents, in the model's topological order
        let frac_tree_depth = self.frac_depth_dist.sample(rng) as usize;
        let cam_top = self.cam_top_dist.sample(rng);
        let cam_right = camera_right(CAM_LEFT, CAM_BOTTOM, cam_top, self.im_w, self.im_h);
        let stick_len = self.stick_len_dist(CAM_BOTTOM, cam_top)?.sample(rng);
        let pos_x = self.pos_x_dist(CAM_LEFT, cam_right)?.sample(rng);
        let vel_x_m_s = self.vel_x_dist.sample(rng);
        let pos_y = self.pos_y_dist(CAM_BOTTOM, cam_top)?.sample(rng);
        let vel_y_m_s = self.vel_y_dist.sample(rng);
        let angle = self.angle_dist.sample(rng);
        let ang_vel_rad_s = self.ang_vel_dist.sample(rng);

        // 2) fracture plan, then the trajectory it implies
        let fracture =
            self.sample_fracture_tree(frac_tree_depth, 0, self.num_ims, stick_len, rng)?;
        let init = InitialConditions {
            cam_top,
            stick_len,
            pos_x,
            vel_x_m_s,
            pos_y,
            vel_y_m_s,
            angle,
            ang_vel_rad_s,
        };
        let mut sample = Sample::new(
            self.num_ims,
            self.im_w,
            self.im_h,
            init,
            frac_tree_depth,
            fracture,
        )?;

        // 3) noisy projections of every frame
        self.observe(&mut sample, rng)?;
        debug!(
            "BayesNet::forward depth={} cam_top={:.3} stick_len={:.3}",
            frac_tree_depth, cam_top, stick_len
        );
        Ok(sample)
    }

    /// Sample the fracture plan for a stick of `stick_len` alive over
    /// `[start, end)`. `depth == 0` yields no fracture.
    pub fn sample_fracture_tree(
        &self,
        depth: usize,
        start: usize,
        end: usize,
        stick_len: f64,
        rng: &mut impl Rng,
    ) -> Result<Option<FractureSample>> {
        self.sample_fracture_node(depth, start, end, stick_len, true, rng)
    }

    fn sample_fracture_node(
        &self,
        depth: usize,
        start: usize,
        end: usize,
        len: f64,
        first: bool,
        rng: &mut impl Rng,
    ) -> Result<Option<FractureSample>> {
        if depth == 0 {
            return Ok(None);
        }
        let fr_time = if first {
            self.first_frac_time_dist(depth)?.sample(rng) as usize
        } else {
            self.later_frac_time_dist(start, end, depth)?.sample(rng)
        };
        let fr_loc = self.frac_loc_dist(len)?.sample(rng);
        let childl = self.sample_fracture_node(depth - 1, fr_time, end, fr_loc, false, rng)?;
        let childr =
            self.sample_fracture_node(depth - 1, fr_time, end, len - fr_loc, false, rng)?;
        Ok(Some(FractureSample {
            fr_time,
            fr_loc,
            childl: childl.map(Box::new),
            childr: childr.map(Box::new),
        }))
    }

    /// Project every frame of the trajectory and add independent Gaussian
    /// pixel noise to each endpoint coordinate, replacing any previous
    /// observations.
    pub fn observe(&self, sample: &mut Sample, rng: &mut impl Rng) -> Result<()> {
        let mut observed = Vec::with_capacity(sample.num_ims);
        for frame in 0..sample.num_ims {
            let mut pts = sample.project_endpoints(frame)?;
            for p in &mut pts {
                p[0] += self.obs_noise_dist.sample(rng);
                p[1] += self.obs_noise_dist.sample(rng);
            }
            observed.push(pts);
        }
        sample.observed_endpoints = observed;
        Ok(())
    }

    /// Joint log-probability of `sample`: every latent under its prior plus
    /// the Gaussian likelihood of the observed endpoints around the
    /// projection recomputed from the current stick states. Stores the value
    /// on the sample and returns it.
    pub fn calc_and_set_log_prob(&self, sample: &mut Sample) -> Result<f64> {
        let cam_right = sample.cam_right();
        let mut lp = self.frac_depth_dist.log_pmf(sample.frac_tree_depth as i64);
        lp += self.cam_top_dist.log_density(sample.cam_top);
        lp += self
            .stick_len_dist(sample.cam_bottom, sample.cam_top)?
            .log_density(sample.stick_len);
        lp += self
            .pos_x_dist(sample.cam_left, cam_right)?
            .log_density(sample.pos_x);
        lp += self.vel_x_dist.log_density(sample.vel_x_m_s);
        lp += self
            .pos_y_dist(sample.cam_bottom, sample.cam_top)?
            .log_density(sample.pos_y);
        lp += self.vel_y_dist.log_density(sample.vel_y_m_s);
        lp += self.angle_dist.log_density(sample.angle);
        lp += self.ang_vel_dist.log_density(sample.ang_vel_rad_s);
        lp += self.fracture_log_prob(
            sample.fracture.as_ref(),
            0,
            sample.num_ims,
            sample.stick_len,
            true,
        )?;
        lp += self.observation_log_prob(sample)?;
        sample.log_prob = Some(lp);
        Ok(lp)
    }

    fn fracture_log_prob(
        &self,
        node: Option<&FractureSample>,
        start: usize,
        end: usize,
        len: f64,
        first: bool,
    ) -> Result<f64> {
        let node = match node {
            Some(node) => node,
            None => return Ok(0.0),
        };
        // Generated trees are full, so the subtree depth recovers the
        // remaining-depth trim the timing prior was sampled with.
        let depth = node.depth();
        let time_lp = if first {
            self.first_frac_time_dist(depth)?.log_pmf(node.fr_time as i64)
        } else {
            self.later_frac_time_dist(start, end, depth)?
                .log_pmf(node.fr_time)
        };
        let loc_lp = self.frac_loc_dist(len)?.log_density(node.fr_loc);
        let left = self.fracture_log_prob(
            node.childl.as_deref(),
            node.fr_time,
            end,
            node.fr_loc,
            false,
        )?;
        let right = self.fracture_log_prob(
            node.childr.as_deref(),
            node.fr_time,
            end,
            len - node.fr_loc,
            false,
        )?;
        Ok(time_lp + loc_lp + left + right)
    }

    fn observation_log_prob(&self, sample: &Sample) -> Result<f64> {
        let mut lp = 0.0;
        for (frame, observed) in sample.observed_endpoints.iter().enumerate() {
            let projected = sample.project_endpoints(frame)?;
            if projected.len() != observed.len() {
                return Err(ModelError::EndpointCountMismatch {
                    frame,
                    expected: projected.len(),
                    found: observed.len(),
                });
            }
            for (o, p) in observed.iter().zip(projected.iter()) {
                lp += self.obs_noise_dist.log_density(o[0] - p[0]);
                lp += self.obs_noise_dist.log_density(o[1] - p[1]);
            }
        }
        Ok(lp)
    }
}
