use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::edges::canny;
use imageproc::filter::laplacian_filter;

use super::decode::DecodedImage;

const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;

/// Fraction trimmed from every side before blob detection.
const ROI_MARGIN: f64 = 0.15;
const BLOB_THRESHOLD: u8 = 160;
const MIN_BLOB_AREA: f64 = 50.0;
const MAX_BLOB_AREA: f64 = 1500.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeatureSet {
    pub mean_intensity: f64,
    pub intensity_std_dev: f64,
    pub edge_density: f64,
    pub texture_variance: f64,
    pub nodular_blob_count: usize,
    pub max_blob_area: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BlobStats {
    pub count: usize,
    pub max_area: f64,
}

pub fn extract(image: &DecodedImage) -> FeatureSet {
    let gray = image.luminance();
    let (mean_intensity, intensity_std_dev) = intensity_moments(&gray);
    let blobs = detect_blobs(&gray);

    FeatureSet {
        mean_intensity,
        intensity_std_dev,
        edge_density: edge_density(&gray),
        texture_variance: texture_variance(&gray),
        nodular_blob_count: blobs.count,
        max_blob_area: blobs.max_area,
    }
}

/// Mean and population standard deviation of the luminance channel.
pub fn intensity_moments(gray: &GrayImage) -> (f64, f64) {
    let values: Vec<f64> = gray.pixels().map(|p| p.0[0] as f64).collect();
    let (mean, variance) = moments(&values);
    (mean, variance.sqrt())
}

pub fn edge_density(gray: &GrayImage) -> f64 {
    let edges = canny(gray, CANNY_LOW, CANNY_HIGH);
    let total = edges.width() as usize * edges.height() as usize;
    if total == 0 {
        return 0.0;
    }
    let flagged = edges.pixels().filter(|p| p.0[0] > 0).count();
    flagged as f64 / total as f64
}

/// Variance of the 4-neighbour Laplacian response.
pub fn texture_variance(gray: &GrayImage) -> f64 {
    let response = laplacian_filter(gray);
    let values: Vec<f64> = response.pixels().map(|p| p.0[0] as f64).collect();
    moments(&values).1
}

pub fn detect_blobs(gray: &GrayImage) -> BlobStats {
    let roi = binary_roi(gray);
    let contours = find_contours::<i32>(&roi);

    contours
        .iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .map(contour_area)
        .filter(|&area| area > MIN_BLOB_AREA && area < MAX_BLOB_AREA)
        .fold(BlobStats::default(), |stats, area| BlobStats {
            count: stats.count + 1,
            max_area: stats.max_area.max(area),
        })
}

/// Central crop with the border margin removed, thresholded so that only
/// pixels brighter than the cutoff are foreground.
fn binary_roi(gray: &GrayImage) -> GrayImage {
    let (w, h) = gray.dimensions();
    let mx = (w as f64 * ROI_MARGIN) as u32;
    let my = (h as f64 * ROI_MARGIN) as u32;
    let roi = image::imageops::crop_imm(gray, mx, my, w - 2 * mx, h - 2 * my).to_image();

    GrayImage::from_fn(roi.width(), roi.height(), |x, y| {
        if roi.get_pixel(x, y).0[0] > BLOB_THRESHOLD {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Shoelace area of the traced border polygon.
fn contour_area(contour: &Contour<i32>) -> f64 {
    let points = &contour.points;
    if points.len() < 3 {
        return 0.0;
    }
    let twice_area: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    twice_area.abs() as f64 / 2.0
}

fn moments(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, variance)
}
