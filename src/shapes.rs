//! Scalar shape rasterization on premultiplied frames: filled discs, thick
//! horizontal lines, and circular alpha masks. Coverage is computed per
//! pixel with a one-pixel soft edge.

use image::RgbaImage;
use kurbo::Point;

use crate::frame::{Frame, Rgba8, premultiply};

/// Fill a disc centered at `center` with radius `radius`, in a straight
/// RGBA color.
pub fn fill_disc(frame: &mut Frame, center: Point, radius: f64, color: Rgba8) {
    if radius <= 0.0 {
        return;
    }
    let src = premultiply(color);

    let x0 = (center.x - radius - 1.0).floor() as i64;
    let x1 = (center.x + radius + 1.0).ceil() as i64;
    let y0 = (center.y - radius - 1.0).floor() as i64;
    let y1 = (center.y + radius + 1.0).ceil() as i64;

    for y in y0..=y1 {
        for x in x0..=x1 {
            let cov = disc_coverage(x, y, center, radius);
            if cov <= 0.0 {
                continue;
            }
            frame.blend(x, y, scale_premul(src, cov));
        }
    }
}

/// Draw a horizontal line segment of the given stroke width, centered on
/// `y`, spanning `[x0, x1)`.
pub fn fill_hline(frame: &mut Frame, x0: i64, x1: i64, y: i64, stroke: u32, color: Rgba8) {
    if x1 <= x0 || stroke == 0 {
        return;
    }
    let src = premultiply(color);
    let half = i64::from(stroke) / 2;
    let top = y - half;
    for row in top..top + i64::from(stroke) {
        for x in x0..x1 {
            frame.blend(x, row, src);
        }
    }
}

/// Multiply the alpha channel of a straight-RGBA image by the coverage of
/// its largest inscribed circle. Used to cut the avatar disc.
pub fn mask_circle(img: &mut RgbaImage) {
    let (w, h) = img.dimensions();
    let radius = f64::from(w.min(h)) / 2.0;
    let center = Point::new(f64::from(w) / 2.0, f64::from(h) / 2.0);

    for y in 0..h {
        for x in 0..w {
            let cov = disc_coverage(i64::from(x), i64::from(y), center, radius);
            let px = img.get_pixel_mut(x, y);
            px.0[3] = (f64::from(px.0[3]) * cov).round() as u8;
        }
    }
}

/// Coverage of the pixel whose center is (x+0.5, y+0.5) by the disc,
/// ramped linearly over one pixel at the rim.
fn disc_coverage(x: i64, y: i64, center: Point, radius: f64) -> f64 {
    let dx = (x as f64 + 0.5) - center.x;
    let dy = (y as f64 + 0.5) - center.y;
    let dist = (dx * dx + dy * dy).sqrt();
    (radius - dist + 0.5).clamp(0.0, 1.0)
}

fn scale_premul(px: Rgba8, cov: f64) -> Rgba8 {
    if cov >= 1.0 {
        return px;
    }
    let s = |c: u8| ((f64::from(c) * cov).round()) as u8;
    [s(px[0]), s(px[1]), s(px[2]), s(px[3])]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disc_covers_center_not_corners() {
        let mut f = Frame::new(21, 21);
        fill_disc(&mut f, Point::new(10.5, 10.5), 8.0, [255, 0, 0, 255]);
        assert_eq!(f.get(10, 10), [255, 0, 0, 255]);
        assert_eq!(f.get(0, 0), [0, 0, 0, 0]);
        assert_eq!(f.get(20, 20), [0, 0, 0, 0]);
    }

    #[test]
    fn hline_spans_half_open_range() {
        let mut f = Frame::new(10, 5);
        fill_hline(&mut f, 2, 8, 2, 1, [0, 255, 0, 255]);
        assert_eq!(f.get(1, 2), [0, 0, 0, 0]);
        assert_eq!(f.get(2, 2), [0, 255, 0, 255]);
        assert_eq!(f.get(7, 2), [0, 255, 0, 255]);
        assert_eq!(f.get(8, 2), [0, 0, 0, 0]);
    }

    #[test]
    fn hline_stroke_width_covers_rows() {
        let mut f = Frame::new(4, 9);
        fill_hline(&mut f, 0, 4, 4, 3, [255, 255, 255, 255]);
        assert_eq!(f.get(0, 2), [0, 0, 0, 0]);
        assert_eq!(f.get(0, 3)[3], 255);
        assert_eq!(f.get(0, 4)[3], 255);
        assert_eq!(f.get(0, 5)[3], 255);
        assert_eq!(f.get(0, 6), [0, 0, 0, 0]);
    }

    #[test]
    fn mask_circle_clears_corners_keeps_center() {
        let mut img = RgbaImage::from_pixel(20, 20, image::Rgba([50, 60, 70, 255]));
        mask_circle(&mut img);
        assert_eq!(img.get_pixel(10, 10).0[3], 255);
        assert_eq!(img.get_pixel(0, 0).0[3], 0);
        assert_eq!(img.get_pixel(19, 19).0[3], 0);
    }
}
