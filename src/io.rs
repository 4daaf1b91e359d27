//! I/O helpers for JSON records and intensity images.
//!
//! - `write_json_file`: pretty-print a serializable value to disk.
//! - `read_json_file`: parse a JSON file into a deserializable value.
//! - `save_intensity_image`: write a row-major `[0, 1]` intensity buffer to
//!   a grayscale PNG, clamping out-of-range values before the 8-bit write.

use image::{GrayImage, Luma};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write JSON {}: {e}", path.display()))
}

/// Read and parse a JSON file.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&contents).map_err(|e| format!("Failed to parse {}: {e}", path.display()))
}

/// Save a row-major intensity buffer to a grayscale PNG.
///
/// Values are clamped to `[0, 1]` before quantization, so callers may hand
/// over accumulated intensities without pre-scaling.
pub fn save_intensity_image(
    width: usize,
    height: usize,
    values: &[f64],
    path: &Path,
) -> Result<(), String> {
    if values.len() != width * height {
        return Err(format!(
            "Intensity buffer holds {} values, expected {}x{}",
            values.len(),
            width,
            height
        ));
    }
    ensure_parent_dir(path)?;
    let mut out = GrayImage::new(width as u32, height as u32);
    for y in 0..height {
        for x in 0..width {
            let v = (values[y * width + x].clamp(0.0, 1.0) * 255.0).round();
            out.put_pixel(x as u32, y as u32, Luma([v as u8]));
        }
    }
    out.save(path)
        .map_err(|e| format!("Failed to save {}: {e}", path.display()))
}

fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}
