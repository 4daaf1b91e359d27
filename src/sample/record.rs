//! Persisted form of a [`Sample`].
//!
//! Records carry only what is needed to regenerate the sample: the fixed
//! nodes, the sampled scalars, the fracture plan, and the observations.
//! Stick states are never persisted; loading recomputes them, so a record
//! round trip reproduces a numerically identical trajectory.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::sample::{FractureSample, Sample, StickStates};

/// Format tag written into every persisted sample. Loading any other tag is
/// a hard error; bump this on breaking layout or semantics changes.
pub const SAMPLE_FORMAT_VERSION: &str = "20250514-00";

/// JSON-serializable snapshot of a [`Sample`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SampleRecord {
    pub version: String,
    pub num_ims: usize,
    pub im_w: usize,
    pub im_h: usize,
    pub cam_left: f64,
    pub cam_bottom: f64,
    pub cam_top: f64,
    pub cam_fps: f64,
    pub gravity: f64,
    pub frac_tree_depth: usize,
    pub stick_len: f64,
    pub pos_x: f64,
    pub vel_x_m_s: f64,
    pub pos_y: f64,
    pub vel_y_m_s: f64,
    pub angle: f64,
    pub ang_vel_rad_s: f64,
    pub fracture: Option<FractureSample>,
    pub observed_endpoints: Vec<Vec<[f64; 2]>>,
    pub log_prob: Option<f64>,
}

impl Sample {
    pub fn to_record(&self) -> SampleRecord {
        SampleRecord {
            version: SAMPLE_FORMAT_VERSION.to_string(),
            num_ims: self.num_ims,
            im_w: self.im_w,
            im_h: self.im_h,
            cam_left: self.cam_left,
            cam_bottom: self.cam_bottom,
            cam_top: self.cam_top,
            cam_fps: self.cam_fps,
            gravity: self.gravity,
            frac_tree_depth: self.frac_tree_depth,
            stick_len: self.stick_len,
            pos_x: self.pos_x,
            vel_x_m_s: self.vel_x_m_s,
            pos_y: self.pos_y,
            vel_y_m_s: self.vel_y_m_s,
            angle: self.angle,
            ang_vel_rad_s: self.ang_vel_rad_s,
            fracture: self.fracture.clone(),
            observed_endpoints: self.observed_endpoints.clone(),
            log_prob: self.log_prob,
        }
    }

    /// Rehydrate a sample from its persisted form, recomputing the stick
    /// state tree. An empty observation list means the sample was persisted
    /// before being observed; anything else must cover every frame.
    pub fn from_record(record: SampleRecord) -> Result<Self> {
        if record.version != SAMPLE_FORMAT_VERSION {
            return Err(ModelError::VersionMismatch {
                expected: SAMPLE_FORMAT_VERSION,
                found: record.version,
            });
        }
        if record.num_ims == 0 {
            return Err(ModelError::InvalidConfig {
                what: "num_ims",
                value: record.num_ims as f64,
            });
        }
        if record.im_w == 0 || record.im_h == 0 {
            return Err(ModelError::InvalidConfig {
                what: "image dimensions",
                value: (record.im_w * record.im_h) as f64,
            });
        }
        if record.cam_fps <= 0.0 {
            return Err(ModelError::InvalidConfig {
                what: "cam_fps",
                value: record.cam_fps,
            });
        }
        if record.cam_top <= record.cam_bottom {
            return Err(ModelError::InvalidConfig {
                what: "cam_top",
                value: record.cam_top,
            });
        }
        if !record.observed_endpoints.is_empty()
            && record.observed_endpoints.len() != record.num_ims
        {
            return Err(ModelError::FrameCountMismatch {
                expected: record.num_ims,
                found: record.observed_endpoints.len(),
            });
        }
        if let Some(fr_time) = record.fracture.as_ref().and_then(|f| f.first_lopsided()) {
            return Err(ModelError::MalformedFractureTree { fr_time });
        }

        let mut sample = Sample {
            num_ims: record.num_ims,
            im_w: record.im_w,
            im_h: record.im_h,
            cam_left: record.cam_left,
            cam_bottom: record.cam_bottom,
            cam_top: record.cam_top,
            cam_fps: record.cam_fps,
            gravity: record.gravity,
            frac_tree_depth: record.frac_tree_depth,
            stick_len: record.stick_len,
            pos_x: record.pos_x,
            vel_x_m_s: record.vel_x_m_s,
            pos_y: record.pos_y,
            vel_y_m_s: record.vel_y_m_s,
            angle: record.angle,
            ang_vel_rad_s: record.ang_vel_rad_s,
            fracture: record.fracture,
            stick_states: StickStates::empty(),
            observed_endpoints: record.observed_endpoints,
            log_prob: record.log_prob,
        };
        sample.recompute_states()?;
        Ok(sample)
    }
}
