use rand::rngs::StdRng;
use rand::SeedableRng;

use super::*;
use crate::model::BayesNet;
use crate::sample::Sample;

fn tiny_scene(seed: u64) -> (BayesNet, Sample) {
    let bn = BayesNet::new(8, 32, 24).unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    let truth = bn.forward(&mut rng).unwrap();
    (bn, truth)
}

#[test]
fn chain_keeps_exactly_the_requested_window() {
    let (bn, obs) = tiny_scene(1);
    let mut chain = ChainSampler::new(bn, obs, ProposalScales::default(), 5, 10).unwrap();
    let mut rng = StdRng::seed_from_u64(2);
    chain.run_to_completion(&mut rng).unwrap();

    assert!(chain.is_finished());
    assert_eq!(chain.steps_taken(), 15);
    assert_eq!(chain.saved().len(), 10);
    for s in chain.saved() {
        assert!(
            s.log_prob_value().is_finite(),
            "kept sample has log-prob {}",
            s.log_prob_value()
        );
    }
    let max_lp = chain
        .saved()
        .iter()
        .map(|s| s.log_prob_value())
        .fold(f64::NEG_INFINITY, f64::max);
    let best = chain.best().expect("a kept window implies a best sample");
    assert_eq!(best.log_prob_value(), max_lp);
}

#[test]
fn zero_scale_proposals_are_always_accepted() {
    let (bn, obs) = tiny_scene(3);
    let scales = ProposalScales {
        pos: 0.0,
        vel: 0.0,
        angle: 0.0,
        ang_vel: 0.0,
    };
    let mut chain = ChainSampler::new(bn, obs, scales, 0, 6).unwrap();
    let mut rng = StdRng::seed_from_u64(4);
    chain.run_to_completion(&mut rng).unwrap();

    assert_eq!(
        chain.acceptance_rate(),
        1.0,
        "identical proposals have log-difference zero and must always pass"
    );
    let first = chain.saved()[0].log_prob_value();
    for s in chain.saved() {
        assert!((s.log_prob_value() - first).abs() < 1e-12);
    }
}

#[test]
fn seeding_redraws_only_the_inferable_scalars() {
    let (bn, obs) = tiny_scene(5);
    let mut chain =
        ChainSampler::new(bn, obs.clone(), ProposalScales::default(), 0, 1).unwrap();
    let mut rng = StdRng::seed_from_u64(6);
    chain.step(&mut rng).unwrap();

    let seeded = &chain.saved()[0];
    assert_eq!(seeded.cam_top, obs.cam_top);
    assert_eq!(seeded.stick_len, obs.stick_len);
    assert_eq!(seeded.frac_tree_depth, obs.frac_tree_depth);
    assert_eq!(seeded.fracture, obs.fracture);
    assert_eq!(seeded.observed_endpoints, obs.observed_endpoints);
    assert!(seeded.log_prob.is_some());

    assert!(seeded.pos_x != obs.pos_x);
    assert!(seeded.pos_y != obs.pos_y);
    assert!(seeded.vel_x_m_s != obs.vel_x_m_s);
    assert!(seeded.vel_y_m_s != obs.vel_y_m_s);
    assert!(seeded.angle != obs.angle);
    assert!(seeded.ang_vel_rad_s != obs.ang_vel_rad_s);
}

#[test]
fn an_unbeatable_previous_sample_survives_the_metropolis_rule() {
    let (bn, obs) = tiny_scene(7);
    let mut chain = ChainSampler::new(bn, obs, ProposalScales::default(), 0, 4).unwrap();
    let mut rng = StdRng::seed_from_u64(8);
    chain.step(&mut rng).unwrap();

    let mut prev = chain.saved()[0].clone();
    prev.log_prob = Some(f64::INFINITY);
    let pos_x = prev.pos_x;
    let kept = chain.sample_from_previous(prev, &mut rng).unwrap();
    assert_eq!(kept.log_prob, Some(f64::INFINITY));
    assert_eq!(kept.pos_x, pos_x, "rejection must hand back the previous sample");
}

#[test]
fn empty_window_yields_no_samples() {
    let (bn, obs) = tiny_scene(9);
    let mut chain = ChainSampler::new(bn, obs, ProposalScales::default(), 4, 0).unwrap();
    let mut rng = StdRng::seed_from_u64(10);
    chain.run_to_completion(&mut rng).unwrap();

    assert!(chain.is_finished());
    assert!(chain.saved().is_empty());
    assert!(chain.best().is_none());
}

#[test]
fn multi_chain_merges_all_saved_samples() {
    let (bn, obs) = tiny_scene(11);
    let mut multi =
        MultiChainSampler::new(bn, obs, ProposalScales::default(), 2, 4, 3).unwrap();
    let mut rngs = spawn_rngs(42, 3);
    multi.run_all(&mut rngs).unwrap();

    let (all, best) = multi.into_results();
    assert_eq!(all.len(), 12, "3 chains x 4 kept samples");
    let max_lp = all
        .iter()
        .map(|s| s.log_prob_value())
        .fold(f64::NEG_INFINITY, f64::max);
    let best = best.expect("chains with kept samples produce a best");
    assert_eq!(best.log_prob_value(), max_lp);
}

#[test]
fn multi_chain_runs_are_reproducible() {
    let run = || {
        let (bn, obs) = tiny_scene(13);
        let mut multi =
            MultiChainSampler::new(bn, obs, ProposalScales::default(), 3, 5, 2).unwrap();
        let mut rngs = spawn_rngs(7, 2);
        multi.run_all(&mut rngs).unwrap();
        let (all, _) = multi.into_results();
        all.iter().map(|s| s.log_prob_value()).collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
fn mismatched_rng_count_is_an_error() {
    let (bn, obs) = tiny_scene(15);
    let mut multi =
        MultiChainSampler::new(bn, obs, ProposalScales::default(), 1, 1, 2).unwrap();
    let mut rngs = spawn_rngs(0, 1);
    assert!(matches!(
        multi.run_all(&mut rngs),
        Err(crate::error::ModelError::ChainCountMismatch { chains: 2, rngs: 1 })
    ));
}

#[test]
fn observation_must_match_the_model() {
    let (_, obs) = tiny_scene(17);
    let other_frames = BayesNet::new(10, 32, 24).unwrap();
    assert!(matches!(
        ChainSampler::new(
            other_frames,
            obs.clone(),
            ProposalScales::default(),
            1,
            1
        ),
        Err(crate::error::ModelError::FrameCountMismatch { .. })
    ));

    let other_dims = BayesNet::new(8, 64, 24).unwrap();
    assert!(ChainSampler::new(other_dims, obs, ProposalScales::default(), 1, 1).is_err());
}

#[test]
fn negative_proposal_scales_are_rejected() {
    let (bn, obs) = tiny_scene(19);
    let scales = ProposalScales {
        pos: -0.1,
        ..ProposalScales::default()
    };
    assert!(matches!(
        ChainSampler::new(bn, obs, scales, 1, 1),
        Err(crate::error::ModelError::InvalidScale { .. })
    ));
}
