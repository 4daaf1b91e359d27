use std::env;
use std::path::PathBuf;

use stick_bayes::config::load_config;
use stick_bayes::io::{read_json_file, write_json_file};
use stick_bayes::model::BayesNet;
use stick_bayes::sample::{Sample, SampleRecord};
use stick_bayes::sampler::{spawn_rngs, MultiChainSampler, ProposalScales};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let program = env::args().next().unwrap_or_else(|| "mh_infer".to_string());
    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .ok_or_else(|| usage(&program))?;
    let config = load_config(&config_path)?;
    let num_chains = config.resolved_num_chains();

    for sample_num in 0..config.num_samples {
        let record: SampleRecord = read_json_file(&config.forward_sample_path(sample_num))?;
        let observation = Sample::from_record(record).map_err(|e| e.to_string())?;
        let bn = BayesNet::new(observation.num_ims, observation.im_w, observation.im_h)
            .map_err(|e| e.to_string())?;

        let mut sampler = MultiChainSampler::new(
            bn,
            observation,
            ProposalScales::default(),
            config.num_burn_in_samples,
            config.num_saved_samples,
            num_chains,
        )
        .map_err(|e| e.to_string())?;
        // Offset the master seed per sample so no two samples reuse a chain
        // seed.
        let sample_seed = config.seed.wrapping_add(sample_num as u64 * num_chains as u64);
        let mut rngs = spawn_rngs(sample_seed, num_chains);
        sampler.run_all(&mut rngs).map_err(|e| e.to_string())?;

        let (saved, best) = sampler.into_results();
        let records: Vec<SampleRecord> = saved.iter().map(Sample::to_record).collect();
        write_json_file(&config.inference_path(sample_num), &records)?;

        match best {
            Some(best) => {
                println!("sample {sample_num:06}: best.pos_x = {}", best.pos_x);
                println!("sample {sample_num:06}: best.pos_y = {}", best.pos_y);
                println!(
                    "sample {sample_num:06}: best.log_prob = {}",
                    best.log_prob_value()
                );
            }
            None => println!("sample {sample_num:06}: no samples kept (empty window)"),
        }
    }

    Ok(())
}

fn usage(program: &str) -> String {
    format!("Usage: {program} <config.json>")
}
