//! Run configuration for the demo binaries.
//!
//! Both binaries read one JSON file (path given as the first CLI argument)
//! describing the scene dimensions, the sampling budgets and the output
//! folder. Missing fields fall back to the defaults below.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use crate::error::{ModelError, Result};

/// Configuration shared by forward sampling and inference runs.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Image width of the generated observations, pixels.
    pub im_w: usize,
    /// Image height of the generated observations, pixels.
    pub im_h: usize,
    /// Number of frames per simulated sequence.
    pub num_ims: usize,
    /// Number of ground-truth scenes to generate / infer.
    pub num_samples: usize,
    /// Chain iterations discarded as warm-up.
    pub num_burn_in_samples: usize,
    /// Chain iterations kept after warm-up.
    pub num_saved_samples: usize,
    /// Number of Metropolis-Hastings chains; `None` means one per core.
    pub num_chains: Option<usize>,
    /// Master RNG seed; chain `i` is seeded with `seed + i`.
    pub seed: u64,
    /// Folder holding one numbered sub-folder per sample.
    pub folder: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            im_w: 320,
            im_h: 240,
            num_ims: 30,
            num_samples: 1,
            num_burn_in_samples: 1000,
            num_saved_samples: 1000,
            num_chains: None,
            seed: 42,
            folder: PathBuf::from("samples"),
        }
    }
}

impl RunConfig {
    /// Chain count with the one-per-core default applied.
    pub fn resolved_num_chains(&self) -> usize {
        self.num_chains.unwrap_or_else(|| {
            thread::available_parallelism().map_or(1, |n| n.get())
        })
    }

    pub fn validate(&self) -> Result<()> {
        for (what, value) in [
            ("im_w", self.im_w),
            ("im_h", self.im_h),
            ("num_samples", self.num_samples),
        ] {
            if value == 0 {
                return Err(ModelError::InvalidConfig {
                    what,
                    value: value as f64,
                });
            }
        }
        if self.num_ims < 2 {
            return Err(ModelError::InvalidConfig {
                what: "num_ims",
                value: self.num_ims as f64,
            });
        }
        if self.num_chains == Some(0) {
            return Err(ModelError::InvalidConfig {
                what: "num_chains",
                value: 0.0,
            });
        }
        Ok(())
    }

    /// Directory holding everything produced for one generated sample.
    pub fn sample_dir(&self, sample_num: usize) -> PathBuf {
        self.folder.join(format!("{sample_num:06}"))
    }

    /// Path of the persisted ground-truth sample.
    pub fn forward_sample_path(&self, sample_num: usize) -> PathBuf {
        self.sample_dir(sample_num)
            .join("forward-sampling")
            .join(format!("{sample_num:06}-forward-sample.json"))
    }

    /// Path of one rendered observed-endpoints frame.
    pub fn observed_image_path(&self, sample_num: usize, im_num: usize) -> PathBuf {
        self.sample_dir(sample_num)
            .join("forward-sampling")
            .join("observed-images")
            .join(format!("{sample_num:06}_{im_num:06}-observed.png"))
    }

    /// Path of the persisted posterior draws.
    pub fn inference_path(&self, sample_num: usize) -> PathBuf {
        self.sample_dir(sample_num)
            .join("inference")
            .join(format!("{sample_num:06}-inference.json"))
    }
}

pub fn load_config(path: &Path) -> std::result::Result<RunConfig, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let config: RunConfig = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config: RunConfig = serde_json::from_str(r#"{"num_ims": 10}"#).unwrap();
        assert_eq!(config.num_ims, 10);
        assert_eq!(config.im_w, 320);
        assert_eq!(config.im_h, 240);
        assert_eq!(config.seed, 42);
        assert!(config.resolved_num_chains() >= 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn degenerate_counts_fail_validation() {
        let mut config = RunConfig::default();
        config.num_ims = 1;
        assert!(config.validate().is_err());

        let mut config = RunConfig::default();
        config.num_chains = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn output_paths_are_numbered() {
        let config = RunConfig::default();
        assert_eq!(
            config.forward_sample_path(3),
            PathBuf::from("samples/000003/forward-sampling/000003-forward-sample.json")
        );
        assert_eq!(
            config.observed_image_path(3, 12),
            PathBuf::from(
                "samples/000003/forward-sampling/observed-images/000003_000012-observed.png"
            )
        );
        assert_eq!(
            config.inference_path(0),
            PathBuf::from("samples/000000/inference/000000-inference.json")
        );
    }
}
