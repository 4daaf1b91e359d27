use rand::rngs::StdRng;
use rand::SeedableRng;
use std::env;
use std::path::PathBuf;

use stick_bayes::config::{load_config, RunConfig};
use stick_bayes::io::{save_intensity_image, write_json_file};
use stick_bayes::model::BayesNet;
use stick_bayes::sample::Sample;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let program = env::args()
        .next()
        .unwrap_or_else(|| "forward_sample".to_string());
    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .ok_or_else(|| usage(&program))?;
    let config = load_config(&config_path)?;

    let bn = BayesNet::new(config.num_ims, config.im_w, config.im_h).map_err(|e| e.to_string())?;
    let mut rng = StdRng::seed_from_u64(config.seed);

    for sample_num in 0..config.num_samples {
        let sample = bn.forward(&mut rng).map_err(|e| e.to_string())?;
        write_json_file(&config.forward_sample_path(sample_num), &sample.to_record())?;
        save_observed_images(&config, sample_num, &sample)?;
        println!(
            "sample {sample_num:06}: depth={} cam_top={:.3} stick_len={:.3} -> {}",
            sample.frac_tree_depth,
            sample.cam_top,
            sample.stick_len,
            config.forward_sample_path(sample_num).display()
        );
    }

    Ok(())
}

fn usage(program: &str) -> String {
    format!("Usage: {program} <config.json>")
}

/// Render each frame's observed endpoints as white segments on black.
fn save_observed_images(
    config: &RunConfig,
    sample_num: usize,
    sample: &Sample,
) -> Result<(), String> {
    let (w, h) = (sample.im_w, sample.im_h);
    for (im_num, endpoints) in sample.observed_endpoints.iter().enumerate() {
        let mut intensities = vec![0.0f64; w * h];
        for pair in endpoints.chunks_exact(2) {
            draw_segment(&mut intensities, w, h, pair[0], pair[1]);
        }
        save_intensity_image(
            w,
            h,
            &intensities,
            &config.observed_image_path(sample_num, im_num),
        )?;
    }
    Ok(())
}

/// Rasterize the segment between two `(row, col)` endpoints by stepping one
/// pixel at a time along the longer axis.
fn draw_segment(intensities: &mut [f64], w: usize, h: usize, a: [f64; 2], b: [f64; 2]) {
    let steps = (b[0] - a[0]).abs().max((b[1] - a[1]).abs()).ceil() as usize;
    for i in 0..=steps {
        let t = if steps == 0 { 0.0 } else { i as f64 / steps as f64 };
        let row = (a[0] + t * (b[0] - a[0])).round();
        let col = (a[1] + t * (b[1] - a[1])).round();
        if row >= 0.0 && col >= 0.0 && (row as usize) < h && (col as usize) < w {
            intensities[row as usize * w + col as usize] = 1.0;
        }
    }
}
