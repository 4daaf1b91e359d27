//! One full latent-variable assignment of the stick scene.
//!
//! A [`Sample`] bundles the fixed scene constants, the scalars drawn from
//! the priors, the fracture plan, the per-frame stick states derived from
//! them, and the noisy observed endpoints. It knows its own camera geometry
//! and can project any frame of the trajectory into image coordinates.

pub mod fracture;
pub mod record;
pub mod states;

pub use fracture::FractureSample;
pub use record::{SampleRecord, SAMPLE_FORMAT_VERSION};
pub use states::{
    propagate, split_states, transition_matrix, State, StickStates, Transition, ACCEL_Y, ANGLE,
    ANG_VEL, POS_X, POS_Y, VEL_X, VEL_Y,
};

use nalgebra::Matrix3;

use crate::error::{ModelError, Result};
use crate::transform::apply_transform;

/// Camera frame left bound, world units. Fixed node of the model.
pub const CAM_LEFT: f64 = 0.0;
/// Camera frame bottom bound, world units. Fixed node of the model.
pub const CAM_BOTTOM: f64 = 0.0;
/// Frames per second of the synthetic camera. Fixed node of the model.
pub const CAM_FPS: f64 = 30.0;
/// Gravitational acceleration, world units per second squared. Fixed node.
pub const GRAVITY: f64 = -9.8;

/// Right camera bound implied by the image aspect ratio: both axes share
/// one pixels-per-unit scale.
pub(crate) fn camera_right(
    cam_left: f64,
    cam_bottom: f64,
    cam_top: f64,
    im_w: usize,
    im_h: usize,
) -> f64 {
    cam_left + im_w as f64 * (cam_top - cam_bottom) / im_h as f64
}

/// Scalars drawn from the priors when a scene is generated.
#[derive(Clone, Copy, Debug)]
pub struct InitialConditions {
    pub cam_top: f64,
    pub stick_len: f64,
    pub pos_x: f64,
    pub vel_x_m_s: f64,
    pub pos_y: f64,
    pub vel_y_m_s: f64,
    pub angle: f64,
    pub ang_vel_rad_s: f64,
}

/// A complete assignment of the scene's latent variables.
///
/// Velocities and the angular rate are stored in per-second units exactly as
/// drawn; the per-frame quantities the propagation needs are derived through
/// the camera frame rate. `stick_states` is always consistent with the
/// scalars: every mutation goes through [`Sample::recompute_states`].
#[derive(Clone, Debug)]
pub struct Sample {
    /// Number of simulated frames.
    pub num_ims: usize,
    /// Image width in pixels.
    pub im_w: usize,
    /// Image height in pixels.
    pub im_h: usize,
    pub cam_left: f64,
    pub cam_bottom: f64,
    pub cam_top: f64,
    pub cam_fps: f64,
    pub gravity: f64,
    /// Depth of the fracture plan (0 means the stick never breaks).
    pub frac_tree_depth: usize,
    pub stick_len: f64,
    /// Initial centre-of-mass position, world units.
    pub pos_x: f64,
    pub pos_y: f64,
    /// Initial velocities, world units per second.
    pub vel_x_m_s: f64,
    pub vel_y_m_s: f64,
    /// Initial orientation, radians.
    pub angle: f64,
    /// Angular rate, radians per second.
    pub ang_vel_rad_s: f64,
    pub fracture: Option<FractureSample>,
    pub stick_states: StickStates,
    /// Per-frame observed endpoints in image `(row, col)` coordinates, two
    /// per segment active on that frame.
    pub observed_endpoints: Vec<Vec<[f64; 2]>>,
    pub log_prob: Option<f64>,
}

impl Sample {
    /// Assemble a sample from its latents and compute the stick state tree.
    /// The fixed nodes (camera left/bottom, frame rate, gravity) take their
    /// model constants.
    pub fn new(
        num_ims: usize,
        im_w: usize,
        im_h: usize,
        init: InitialConditions,
        frac_tree_depth: usize,
        fracture: Option<FractureSample>,
    ) -> Result<Self> {
        if num_ims == 0 {
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
        if init.cam_top <= CAM_BOTTOM {
            return Err(ModelError::InvalidConfig {
                what: "cam_top",
                value: init.cam_top,
            });
        }
        let mut sample = Self {
            num_ims,
            im_w,
            im_h,
            cam_left: CAM_LEFT,
            cam_bottom: CAM_BOTTOM,
            cam_top: init.cam_top,
            cam_fps: CAM_FPS,
            gravity: GRAVITY,
            frac_tree_depth,
            stick_len: init.stick_len,
            pos_x: init.pos_x,
            pos_y: init.pos_y,
            vel_x_m_s: init.vel_x_m_s,
            vel_y_m_s: init.vel_y_m_s,
            angle: init.angle,
            ang_vel_rad_s: init.ang_vel_rad_s,
            fracture,
            stick_states: StickStates::empty(),
            observed_endpoints: Vec::new(),
            log_prob: None,
        };
        sample.recompute_states()?;
        Ok(sample)
    }

    /// Rebuild `stick_states` from the current scalars and fracture plan.
    pub fn recompute_states(&mut self) -> Result<()> {
        self.stick_states = StickStates::build(
            self.fracture.as_ref(),
            0,
            self.num_ims,
            self.stick_len,
            self.initial_state(),
            &transition_matrix(),
        )?;
        Ok(())
    }

    pub fn cam_right(&self) -> f64 {
        camera_right(
            self.cam_left,
            self.cam_bottom,
            self.cam_top,
            self.im_w,
            self.im_h,
        )
    }

    /// Isotropic pixels-per-world-unit scale of the camera.
    pub fn px_per_unit(&self) -> f64 {
        self.im_h as f64 / (self.cam_top - self.cam_bottom)
    }

    /// World `(x, y)` to image `(row, col)`, with the vertical axis flipped
    /// so that row 0 is the camera's top bound.
    pub fn camera_matrix(&self) -> Matrix3<f64> {
        let ppu = self.px_per_unit();
        Matrix3::new(
            0.0,
            -ppu,
            self.cam_top * ppu,
            ppu,
            0.0,
            -self.cam_left * ppu,
            0.0,
            0.0,
            1.0,
        )
    }

    /// Horizontal velocity in world units per frame.
    pub fn vel_x(&self) -> f64 {
        self.vel_x_m_s / self.cam_fps
    }

    /// Vertical velocity in world units per frame.
    pub fn vel_y(&self) -> f64 {
        self.vel_y_m_s / self.cam_fps
    }

    /// Angular rate in radians per frame.
    pub fn ang_vel(&self) -> f64 {
        self.ang_vel_rad_s / self.cam_fps
    }

    /// Vertical acceleration in world units per frame squared.
    pub fn accel_y(&self) -> f64 {
        self.gravity / (self.cam_fps * self.cam_fps)
    }

    /// Frame-0 state vector of the unbroken stick.
    pub fn initial_state(&self) -> State {
        let mut s = State::zeros();
        s[POS_X] = self.pos_x;
        s[VEL_X] = self.vel_x();
        s[POS_Y] = self.pos_y;
        s[VEL_Y] = self.vel_y();
        s[ACCEL_Y] = self.accel_y();
        s[ANGLE] = self.angle;
        s[ANG_VEL] = self.ang_vel();
        s
    }

    /// Noiseless image-space endpoints of every segment active on `frame`,
    /// flattened two per segment.
    pub fn project_endpoints(&self, frame: usize) -> Result<Vec<[f64; 2]>> {
        let lines = self.stick_states.lines_at(frame)?;
        let mut pts = Vec::with_capacity(lines.len() * 2);
        for line in lines {
            pts.push(line[0]);
            pts.push(line[1]);
        }
        apply_transform(&self.camera_matrix(), &pts)
    }

    /// Log-probability, `-inf` when the sample has not been scored yet.
    pub fn log_prob_value(&self) -> f64 {
        self.log_prob.unwrap_or(f64::NEG_INFINITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn centred_stick() -> Sample {
        let init = InitialConditions {
            cam_top: 3.0,
            stick_len: 1.0,
            pos_x: 2.0,
            vel_x_m_s: 0.0,
            pos_y: 1.5,
            vel_y_m_s: 0.0,
            angle: 0.0,
            ang_vel_rad_s: 0.0,
        };
        Sample::new(5, 320, 240, init, 0, None).expect("valid sample")
    }

    #[test]
    fn camera_bounds_follow_the_aspect_ratio() {
        let s = centred_stick();
        assert!(approx_eq(s.cam_right(), 4.0));
        assert!(approx_eq(s.px_per_unit(), 80.0));
    }

    #[test]
    fn camera_matrix_maps_bounds_to_image_corners() {
        let s = centred_stick();
        let m = s.camera_matrix();
        let corners = apply_transform(
            &m,
            &[[s.cam_left, s.cam_top], [s.cam_right(), s.cam_bottom]],
        )
        .unwrap();
        // top-left world corner -> (row 0, col 0)
        assert!(approx_eq(corners[0][0], 0.0) && approx_eq(corners[0][1], 0.0));
        // bottom-right world corner -> (row h, col w)
        assert!(approx_eq(corners[1][0], 240.0) && approx_eq(corners[1][1], 320.0));
    }

    #[test]
    fn projection_of_a_horizontal_stick_is_a_pixel_row() {
        let s = centred_stick();
        let pts = s.project_endpoints(0).unwrap();
        assert_eq!(pts.len(), 2);
        assert!(approx_eq(pts[0][0], 120.0) && approx_eq(pts[0][1], 120.0));
        assert!(approx_eq(pts[1][0], 120.0) && approx_eq(pts[1][1], 200.0));
    }

    #[test]
    fn initial_state_uses_per_frame_units() {
        let init = InitialConditions {
            cam_top: 3.0,
            stick_len: 1.0,
            pos_x: 1.0,
            vel_x_m_s: 3.0,
            pos_y: 2.0,
            vel_y_m_s: -6.0,
            angle: 0.5,
            ang_vel_rad_s: 9.0,
        };
        let s = Sample::new(4, 64, 48, init, 0, None).unwrap();
        let v = s.initial_state();
        assert!(approx_eq(v[VEL_X], 0.1));
        assert!(approx_eq(v[VEL_Y], -0.2));
        assert!(approx_eq(v[ANG_VEL], 0.3));
        assert!(approx_eq(v[ACCEL_Y], -9.8 / 900.0));
        assert_eq!(s.stick_states.states.len(), 4);
    }

    #[test]
    fn unscored_sample_reports_neg_inf() {
        let s = centred_stick();
        assert!(s.log_prob_value().is_infinite() && s.log_prob_value() < 0.0);
    }
}
