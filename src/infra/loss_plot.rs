// ============================================================
// Layer 6 — Loss Curve Plot
// ============================================================
// Draws the training (blue) and validation (orange) loss curves
// into a PNG using the image crate.
//
//   ┌──────────────────────────────┐
//   │ ■ training   ■ validation    │   legend swatches, top right
//   │\                             │
//   │ \__                          │
//   │    \____________             │
//   └──────────────────────────────┘
//   x: epoch 1..=n   y: MSE, 0..max
//
// Plotting is best effort: the caller logs failures and keeps
// the trained model.

use anyhow::{ensure, Context, Result};
use image::{Rgb, RgbImage};
use std::path::Path;

const WIDTH:  u32 = 640;
const HEIGHT: u32 = 400;
const MARGIN: u32 = 40;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS:       Rgb<u8> = Rgb([0, 0, 0]);
pub const TRAIN_COLOUR: Rgb<u8> = Rgb([31, 119, 180]);
pub const VAL_COLOUR:   Rgb<u8> = Rgb([255, 127, 14]);

/// Render both loss series and write the PNG to `path`.
pub fn save_loss_plot(train: &[f64], val: &[f64], path: &Path) -> Result<()> {
    let img = render_loss_curves(train, val)?;
    img.save(path)
        .with_context(|| format!("Cannot write loss plot to '{}'", path.display()))?;
    tracing::info!("Loss curves written to '{}'", path.display());
    Ok(())
}

/// Draw both series onto a fresh canvas.
pub fn render_loss_curves(train: &[f64], val: &[f64]) -> Result<RgbImage> {
    let epochs = train.len().max(val.len());
    ensure!(epochs > 0, "no epochs to plot");

    let y_max = train
        .iter()
        .chain(val)
        .copied()
        .filter(|v| v.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    ensure!(y_max.is_finite(), "loss history has no finite values");
    let y_max = if y_max > 0.0 { y_max * 1.05 } else { 1.0 };

    let mut img = RgbImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);

    let left   = MARGIN as i64;
    let right  = (WIDTH - MARGIN) as i64;
    let top    = MARGIN as i64;
    let bottom = (HEIGHT - MARGIN) as i64;

    draw_line(&mut img, (left, bottom), (right, bottom), AXIS);
    draw_line(&mut img, (left, top),    (left, bottom),  AXIS);

    let to_px = |epoch: usize, loss: f64| -> (i64, i64) {
        let x = if epochs > 1 {
            left + ((right - left) as f64 * epoch as f64 / (epochs - 1) as f64).round() as i64
        } else {
            (left + right) / 2
        };
        let y = bottom - ((bottom - top) as f64 * (loss.max(0.0) / y_max)).round() as i64;
        (x, y)
    };

    for (series, colour) in [(train, TRAIN_COLOUR), (val, VAL_COLOUR)] {
        let points: Vec<(i64, i64)> = series
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .map(|(i, &v)| to_px(i, v))
            .collect();

        for pair in points.windows(2) {
            draw_line(&mut img, pair[0], pair[1], colour);
        }
        for &p in &points {
            fill_square(&mut img, p, 2, colour);
        }
    }

    // Legend swatches
    fill_square(&mut img, (right - 60, top - 20), 5, TRAIN_COLOUR);
    fill_square(&mut img, (right - 20, top - 20), 5, VAL_COLOUR);

    Ok(img)
}

fn put(img: &mut RgbImage, (x, y): (i64, i64), colour: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, colour);
    }
}

fn fill_square(img: &mut RgbImage, (cx, cy): (i64, i64), half: i64, colour: Rgb<u8>) {
    for y in cy - half..=cy + half {
        for x in cx - half..=cx + half {
            put(img, (x, y), colour);
        }
    }
}

/// Bresenham line between two pixel coordinates
fn draw_line(img: &mut RgbImage, from: (i64, i64), to: (i64, i64), colour: Rgb<u8>) {
    let (mut x, mut y) = from;
    let dx  = (to.0 - x).abs();
    let dy  = -(to.1 - y).abs();
    let sx  = if x < to.0 { 1 } else { -1 };
    let sy  = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        put(img, (x, y), colour);
        if x == to.0 && y == to.1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x   += sx;
        }
        if e2 <= dx {
            err += dx;
            y   += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(img: &RgbImage, colour: Rgb<u8>) -> usize {
        img.pixels().filter(|p| **p == colour).count()
    }

    #[test]
    fn test_both_series_are_drawn() {
        let img = render_loss_curves(&[0.5, 0.3, 0.2], &[0.6, 0.4, 0.35]).unwrap();
        assert_eq!(img.dimensions(), (WIDTH, HEIGHT));
        // Curves plus legend swatch (11×11)
        assert!(count(&img, TRAIN_COLOUR) > 121);
        assert!(count(&img, VAL_COLOUR)   > 121);
    }

    #[test]
    fn test_single_epoch_is_plotted() {
        assert!(render_loss_curves(&[0.1], &[0.2]).is_ok());
    }

    #[test]
    fn test_empty_history_is_an_error() {
        assert!(render_loss_curves(&[], &[]).is_err());
    }

    #[test]
    fn test_all_nan_history_is_an_error() {
        assert!(render_loss_curves(&[f64::NAN], &[f64::NAN]).is_err());
    }

    #[test]
    fn test_saves_png() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("loss.png");
        save_loss_plot(&[0.5, 0.25], &[0.6, 0.3], &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_line_endpoints_are_painted() {
        let mut img = RgbImage::from_pixel(10, 10, BACKGROUND);
        draw_line(&mut img, (1, 1), (8, 5), AXIS);
        assert_eq!(img.get_pixel(1, 1), &AXIS);
        assert_eq!(img.get_pixel(8, 5), &AXIS);
    }
}
