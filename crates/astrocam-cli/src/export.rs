use std::path::Path;

use anyhow::{Context, Result};
use astrocam_core::render::RgbField;
use image::{ImageBuffer, ImageFormat, Luma, Rgb};
use ndarray::Array2;

/// Black and white points at the given percentiles (0.0..=1.0) of `values`.
pub fn percentile_bounds(values: &[f32], low: f32, high: f32) -> (f32, f32) {
    if values.is_empty() {
        return (0.0, 1.0);
    }
    let mut sorted = values.to_vec();
    let n = sorted.len();
    let lo_idx = ((n as f32 * low) as usize).min(n - 1);
    let hi_idx = ((n as f32 * high) as usize).min(n - 1);
    let black = *sorted.select_nth_unstable_by(lo_idx, |a, b| a.total_cmp(b)).1;
    let white = *sorted.select_nth_unstable_by(hi_idx, |a, b| a.total_cmp(b)).1;
    (black, white)
}

/// Map `[black, white]` linearly onto `[0, 1]`, clamping outside.
pub fn stretch(data: &Array2<f32>, black: f32, white: f32) -> Array2<f32> {
    let range = white - black;
    if range <= f32::EPSILON {
        return Array2::zeros(data.dim());
    }
    data.mapv(|v| ((v - black) / range).clamp(0.0, 1.0))
}

/// Percentile stretch with the usual 0.1% / 99.9% points.
pub fn auto_stretch(data: &Array2<f32>) -> Array2<f32> {
    let values: Vec<f32> = data.iter().copied().collect();
    let (black, white) = percentile_bounds(&values, 0.001, 0.999);
    stretch(data, black, white)
}

fn is_png(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("png" | "PNG")
    )
}

/// Save a grid as grayscale: 8-bit PNG for `.png`, 16-bit TIFF otherwise.
/// Values are stretched to the full range first.
pub fn save_mono(data: &Array2<f32>, path: &Path) -> Result<()> {
    let (h, w) = data.dim();
    let stretched = auto_stretch(data);

    if is_png(path) {
        let pixels: Vec<u8> = stretched.iter().map(|&v| (v * 255.0).round() as u8).collect();
        let img = ImageBuffer::<Luma<u8>, Vec<u8>>::from_raw(w as u32, h as u32, pixels)
            .context("pixel buffer does not match image size")?;
        img.save_with_format(path, ImageFormat::Png)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    } else {
        let pixels: Vec<u16> = stretched
            .iter()
            .map(|&v| (v * 65535.0).round() as u16)
            .collect();
        let img = ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(w as u32, h as u32, pixels)
            .context("pixel buffer does not match image size")?;
        img.save_with_format(path, ImageFormat::Tiff)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}

/// Save three channels as one RGB image. All channels share the stretch
/// computed over their union so colour balance survives.
pub fn save_rgb(field: &RgbField, path: &Path) -> Result<()> {
    let (h, w) = field.red.dim();
    let all: Vec<f32> = field
        .red
        .iter()
        .chain(field.green.iter())
        .chain(field.blue.iter())
        .copied()
        .collect();
    let (black, white) = percentile_bounds(&all, 0.001, 0.999);
    let channels = [
        stretch(&field.red, black, white),
        stretch(&field.green, black, white),
        stretch(&field.blue, black, white),
    ];

    let interleaved = |scale: f32| -> Vec<f32> {
        let mut out = Vec::with_capacity(h * w * 3);
        for row in 0..h {
            for col in 0..w {
                for ch in &channels {
                    out.push((ch[[row, col]] * scale).round());
                }
            }
        }
        out
    };

    if is_png(path) {
        let pixels: Vec<u8> = interleaved(255.0).into_iter().map(|v| v as u8).collect();
        let img = ImageBuffer::<Rgb<u8>, Vec<u8>>::from_raw(w as u32, h as u32, pixels)
            .context("pixel buffer does not match image size")?;
        img.save_with_format(path, ImageFormat::Png)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    } else {
        let pixels: Vec<u16> = interleaved(65535.0).into_iter().map(|v| v as u16).collect();
        let img = ImageBuffer::<Rgb<u16>, Vec<u16>>::from_raw(w as u32, h as u32, pixels)
            .context("pixel buffer does not match image size")?;
        img.save_with_format(path, ImageFormat::Tiff)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ramp(h: usize, w: usize) -> Array2<f32> {
        Array2::from_shape_fn((h, w), |(r, c)| (r * w + c) as f32)
    }

    #[test]
    fn test_stretch_maps_bounds_to_unit_range() {
        let data = ramp(4, 4);
        let out = stretch(&data, 0.0, 15.0);
        assert_eq!(out[[0, 0]], 0.0);
        assert_eq!(out[[3, 3]], 1.0);
    }

    #[test]
    fn test_flat_grid_stretches_to_black() {
        let data = Array2::<f32>::from_elem((3, 3), 7.0);
        assert!(auto_stretch(&data).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_percentile_bounds_of_ramp() {
        let values: Vec<f32> = (0..1000).map(|v| v as f32).collect();
        let (black, white) = percentile_bounds(&values, 0.25, 0.75);
        assert_eq!(black, 250.0);
        assert_eq!(white, 750.0);
    }

    #[test]
    fn test_save_mono_png_and_tiff() {
        let dir = TempDir::new().unwrap();
        let data = ramp(8, 12);

        let png = dir.path().join("out.png");
        save_mono(&data, &png).unwrap();
        let img = image::open(&png).unwrap();
        assert_eq!((img.width(), img.height()), (12, 8));

        let tiff = dir.path().join("out.tiff");
        save_mono(&data, &tiff).unwrap();
        let img = image::open(&tiff).unwrap().to_luma16();
        assert_eq!(img.dimensions(), (12, 8));
        assert_eq!(img.get_pixel(0, 0).0[0], 0);
        assert_eq!(img.get_pixel(11, 7).0[0], 65535);
    }

    #[test]
    fn test_save_rgb_png() {
        let dir = TempDir::new().unwrap();
        let field = RgbField {
            red: ramp(5, 6),
            green: ramp(5, 6),
            blue: ramp(5, 6),
        };
        let path = dir.path().join("rgb.png");
        save_rgb(&field, &path).unwrap();
        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (6, 5));
    }
}
