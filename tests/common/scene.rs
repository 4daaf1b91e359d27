use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

use stick_bayes::model::BayesNet;
use stick_bayes::sample::{FractureSample, InitialConditions, Sample};

/// Forward-sample a small observed scene with a fixed seed.
pub fn observed_scene(seed: u64) -> (BayesNet, Sample) {
    let bn = BayesNet::new(10, 64, 48).expect("valid model dimensions");
    let mut rng = StdRng::seed_from_u64(seed);
    let truth = bn.forward(&mut rng).expect("forward sampling succeeds");
    (bn, truth)
}

/// A hand-built scene whose stick fractures twice, observed with noise.
///
/// Every latent sits inside its prior's support, so the scene can be scored
/// as well as persisted.
pub fn depth_two_scene(seed: u64) -> (BayesNet, Sample) {
    let bn = BayesNet::new(12, 64, 48).expect("valid model dimensions");
    let fracture = FractureSample {
        fr_time: 2,
        fr_loc: 0.25,
        childl: Some(Box::new(leaf(5, 0.1))),
        childr: Some(Box::new(leaf(6, 0.15))),
    };
    let init = InitialConditions {
        cam_top: 4.0,
        stick_len: 0.6,
        pos_x: 2.5,
        vel_x_m_s: 1.0,
        pos_y: 2.0,
        vel_y_m_s: 2.0,
        angle: 0.8,
        ang_vel_rad_s: -2.0,
    };
    let mut sample = Sample::new(12, 64, 48, init, 2, Some(fracture)).expect("valid scene");
    let mut rng = StdRng::seed_from_u64(seed);
    bn.observe(&mut sample, &mut rng).expect("projection succeeds");
    (bn, sample)
}

fn leaf(fr_time: usize, fr_loc: f64) -> FractureSample {
    FractureSample {
        fr_time,
        fr_loc,
        childl: None,
        childr: None,
    }
}

/// Per-process scratch directory for files written by a test.
pub fn scratch_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("stick-bayes-e2e-{}-{name}", std::process::id()))
}
