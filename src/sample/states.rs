//! Per-frame kinematic states of every stick segment.
//!
//! A [`StickStates`] tree mirrors the fracture plan: each node owns the
//! per-frame 7-vector states of one segment over its lifetime window
//! `[start, end)`, and a fractured node hands adjusted initial states to the
//! two fragment nodes below it. All motion is one linear operator applied
//! once per frame.

use nalgebra::{Matrix3, SMatrix, SVector};

use crate::error::{ModelError, Result};
use crate::sample::FractureSample;
use crate::transform::apply_transform_point;

/// Kinematic state `[pos_x, vel_x, pos_y, vel_y, accel_y, angle, ang_vel]`
/// in per-frame units.
pub type State = SVector<f64, 7>;
/// Linear per-frame update shared by every segment and generation.
pub type Transition = SMatrix<f64, 7, 7>;

pub const POS_X: usize = 0;
pub const VEL_X: usize = 1;
pub const POS_Y: usize = 2;
pub const VEL_Y: usize = 3;
pub const ACCEL_Y: usize = 4;
pub const ANGLE: usize = 5;
pub const ANG_VEL: usize = 6;

const MIN_LENGTH: f64 = 1e-9;

/// The per-frame transition.
///
/// Horizontal position advances by the (constant) horizontal velocity, the
/// vertical axis is gravity-driven with the velocity update folded into the
/// same frame's position update, and the angle advances by the constant
/// angular rate:
///
/// ```text
/// pos_x += vel_x
/// pos_y += vel_y + accel_y
/// vel_y += accel_y
/// angle += ang_vel
/// ```
#[rustfmt::skip]
pub fn transition_matrix() -> Transition {
    Transition::from_row_slice(&[
        1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0,
        0.0, 0.0, 1.0, 1.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0,
        0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0,
    ])
}

/// States over `[start, end)`: the initial state followed by one transition
/// application per subsequent frame. An empty window yields no states.
pub fn propagate(initial: State, start: usize, end: usize, transition: &Transition) -> Vec<State> {
    let mut states = Vec::with_capacity(end.saturating_sub(start));
    if end <= start {
        return states;
    }
    let mut cur = initial;
    states.push(cur);
    for _ in (start + 1)..end {
        cur = transition * cur;
        states.push(cur);
    }
    states
}

/// Initial states of the two fragments replacing a fractured parent.
///
/// Each fragment's centre of mass sits along the parent's axis, offset from
/// the parent's centre by half the length difference, so the position moves
/// by `offset * (cos a, sin a)` and the linear velocity picks up the
/// tangential contribution of the rotation over one frame. Both fragments
/// are then advanced one frame so their state is valid on the fracture
/// frame itself.
pub fn split_states(
    parent_final: &State,
    parent_len: f64,
    len_l: f64,
    len_r: f64,
    transition: &Transition,
) -> (State, State) {
    let left = transition * offset_state(parent_final, 0.5 * (len_l - parent_len));
    let right = transition * offset_state(parent_final, 0.5 * (parent_len - len_r));
    (left, right)
}

fn offset_state(parent: &State, offset: f64) -> State {
    let angle = parent[ANGLE];
    let angle_next = angle + parent[ANG_VEL];
    let mut s = *parent;
    s[POS_X] += offset * angle.cos();
    s[VEL_X] += offset * (angle_next.cos() - angle.cos());
    s[POS_Y] += offset * angle.sin();
    s[VEL_Y] += offset * (angle_next.sin() - angle.sin());
    s
}

/// Kinematic history of one segment plus the fragments it breaks into.
#[derive(Clone, Debug)]
pub struct StickStates {
    /// First frame the segment exists on (inclusive).
    pub start: usize,
    /// Frame the segment stops existing on (exclusive).
    pub end: usize,
    /// Segment length in world units.
    pub length: f64,
    /// One state per frame of `[start, end)`.
    pub states: Vec<State>,
    pub childl: Option<Box<StickStates>>,
    pub childr: Option<Box<StickStates>>,
}

impl StickStates {
    /// Build the full history tree for a stick of `length` alive from
    /// `start`, breaking up according to `fracture`, simulated until
    /// `seq_end`.
    pub fn build(
        fracture: Option<&FractureSample>,
        start: usize,
        seq_end: usize,
        length: f64,
        initial: State,
        transition: &Transition,
    ) -> Result<Self> {
        if !length.is_finite() || length <= MIN_LENGTH {
            return Err(ModelError::DegenerateLength { length });
        }
        let end = fracture.map_or(seq_end, |f| f.fr_time);
        if end <= start || end > seq_end {
            return Err(ModelError::InvalidLifetime { start, end });
        }
        let states = propagate(initial, start, end, transition);
        let (childl, childr) = match fracture {
            Some(f) => {
                let final_state = states[states.len() - 1];
                let len_l = f.fr_loc;
                let len_r = length - f.fr_loc;
                let (init_l, init_r) =
                    split_states(&final_state, length, len_l, len_r, transition);
                let l = Self::build(f.childl.as_deref(), end, seq_end, len_l, init_l, transition)?;
                let r = Self::build(f.childr.as_deref(), end, seq_end, len_r, init_r, transition)?;
                (Some(Box::new(l)), Some(Box::new(r)))
            }
            None => (None, None),
        };
        Ok(Self {
            start,
            end,
            length,
            states,
            childl,
            childr,
        })
    }

    /// Placeholder replaced by the first state recomputation.
    pub(crate) fn empty() -> Self {
        Self {
            start: 0,
            end: 0,
            length: 0.0,
            states: Vec::new(),
            childl: None,
            childr: None,
        }
    }

    /// True when this segment owns frame `t`.
    pub fn is_active(&self, t: usize) -> bool {
        self.start <= t && t < self.end
    }

    /// Rigid world transform of the segment at frame `t` (must be active).
    pub fn stick_transform(&self, t: usize) -> Matrix3<f64> {
        let s = &self.states[t - self.start];
        let (sin, cos) = s[ANGLE].sin_cos();
        Matrix3::new(cos, -sin, s[POS_X], sin, cos, s[POS_Y], 0.0, 0.0, 1.0)
    }

    /// Endpoint geometry in the segment frame, centred on the centre of mass.
    pub fn geometry(&self) -> [[f64; 2]; 2] {
        [[-0.5 * self.length, 0.0], [0.5 * self.length, 0.0]]
    }

    /// World endpoints of every segment active at frame `t`, in depth-first
    /// fragment order.
    pub fn lines_at(&self, t: usize) -> Result<Vec<[[f64; 2]; 2]>> {
        let mut lines = Vec::new();
        self.collect_lines(t, &mut lines)?;
        Ok(lines)
    }

    fn collect_lines(&self, t: usize, out: &mut Vec<[[f64; 2]; 2]>) -> Result<()> {
        if self.is_active(t) {
            let m = self.stick_transform(t);
            let [g0, g1] = self.geometry();
            out.push([apply_transform_point(&m, g0)?, apply_transform_point(&m, g1)?]);
        } else if t >= self.end {
            if let Some(l) = &self.childl {
                l.collect_lines(t, out)?;
            }
            if let Some(r) = &self.childr {
                r.collect_lines(t, out)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    fn assert_state(actual: &State, expected: [f64; 7]) {
        for (i, &e) in expected.iter().enumerate() {
            assert!(
                approx_eq(actual[i], e),
                "component {i}: got {}, expected {e}",
                actual[i]
            );
        }
    }

    #[test]
    fn propagation_follows_the_linear_transition() {
        let initial = State::from_column_slice(&[0.0, 1.0, 10.0, 0.0, -0.1, 0.0, 0.0]);
        let states = propagate(initial, 0, 3, &transition_matrix());
        assert_eq!(states.len(), 3);
        assert_state(&states[0], [0.0, 1.0, 10.0, 0.0, -0.1, 0.0, 0.0]);
        assert_state(&states[1], [1.0, 1.0, 9.9, -0.1, -0.1, 0.0, 0.0]);
        assert_state(&states[2], [2.0, 1.0, 9.7, -0.2, -0.1, 0.0, 0.0]);
    }

    #[test]
    fn empty_window_yields_no_states() {
        let initial = State::from_column_slice(&[0.0, 1.0, 10.0, 0.0, -0.1, 0.0, 0.0]);
        assert!(propagate(initial, 3, 3, &transition_matrix()).is_empty());
        assert!(propagate(initial, 5, 2, &transition_matrix()).is_empty());
    }

    #[test]
    fn split_offsets_fragments_along_the_axis() {
        // Parent at rest, axis-aligned: fragments just translate along x.
        let parent = State::zeros();
        let (l, r) = split_states(&parent, 1.0, 0.6, 0.4, &transition_matrix());
        assert_state(&l, [-0.2, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_state(&r, [0.3, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn split_of_spinning_parent_adds_tangential_velocity() {
        let mut parent = State::zeros();
        parent[ANG_VEL] = std::f64::consts::FRAC_PI_2;
        let (l, _) = split_states(&parent, 1.0, 0.6, 0.4, &transition_matrix());
        // offset -0.2: vel_x += -0.2*(cos(pi/2)-1) = 0.2, vel_y += -0.2*sin(pi/2)
        assert!(approx_eq(l[VEL_X], 0.2));
        assert!(approx_eq(l[VEL_Y], -0.2));
        // one transition applied on top of the adjustment
        assert!(approx_eq(l[POS_X], -0.2 + 0.2));
        assert!(approx_eq(l[POS_Y], -0.2));
        assert!(approx_eq(l[ANGLE], std::f64::consts::FRAC_PI_2));
    }

    fn fractured_tree() -> StickStates {
        let fracture = FractureSample {
            fr_time: 4,
            fr_loc: 0.6,
            childl: None,
            childr: None,
        };
        let mut initial = State::zeros();
        initial[POS_Y] = 5.0;
        initial[ACCEL_Y] = -0.01;
        StickStates::build(
            Some(&fracture),
            0,
            10,
            1.0,
            initial,
            &transition_matrix(),
        )
        .expect("valid fracture tree")
    }

    #[test]
    fn children_lengths_sum_to_parent_length() {
        let tree = fractured_tree();
        let (l, r) = (tree.childl.as_ref().unwrap(), tree.childr.as_ref().unwrap());
        assert!(approx_eq(l.length + r.length, tree.length));
        assert_eq!(l.start, tree.end);
        assert_eq!(r.start, tree.end);
    }

    #[test]
    fn every_frame_is_owned_by_exactly_the_live_segments() {
        let tree = fractured_tree();
        for t in 0..10 {
            let lines = tree.lines_at(t).unwrap();
            let expected = if t < 4 { 1 } else { 2 };
            assert_eq!(lines.len(), expected, "frame {t}");
            for line in &lines {
                let dx = line[1][0] - line[0][0];
                let dy = line[1][1] - line[0][1];
                let len = (dx * dx + dy * dy).sqrt();
                assert!(
                    approx_eq(len, 0.6) || approx_eq(len, 0.4) || approx_eq(len, 1.0),
                    "frame {t}: unexpected segment length {len}"
                );
            }
        }
    }

    #[test]
    fn fracture_on_an_out_of_range_frame_is_rejected() {
        let fracture = FractureSample {
            fr_time: 12,
            fr_loc: 0.5,
            childl: None,
            childr: None,
        };
        let err = StickStates::build(
            Some(&fracture),
            0,
            10,
            1.0,
            State::zeros(),
            &transition_matrix(),
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidLifetime { .. }));
    }

    #[test]
    fn non_positive_length_is_rejected() {
        let err = StickStates::build(None, 0, 5, 0.0, State::zeros(), &transition_matrix())
            .unwrap_err();
        assert!(matches!(err, ModelError::DegenerateLength { .. }));
    }
}
