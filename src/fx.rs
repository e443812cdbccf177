//! CPU pixel operations on premultiplied RGBA8 frames: separable Gaussian
//! blur, source-over compositing, uniform tint, and the multiplicative
//! color-grade adjustments used by the background pass.

use crate::error::{ThumbError, ThumbResult};
use crate::frame::{Frame, Rgba8, premultiply};

/// Source-over for single premultiplied pixels.
pub fn over(dst: Rgba8, src: Rgba8, opacity: f32) -> Rgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), op);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// Gaussian-blur a frame with a Q16 fixed-point separable kernel,
/// clamping at the edges. Radius 0 returns a copy.
pub fn blur(frame: &Frame, radius: u32, sigma: f32) -> ThumbResult<Frame> {
    let (width, height) = (frame.width(), frame.height());
    if radius == 0 {
        return Ok(frame.clone());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; frame.data().len()];
    let mut out = Frame::new(width, height);

    horizontal_pass(frame.data(), &mut tmp, width, height, &kernel);
    vertical_pass(&tmp, out.data_mut(), width, height, &kernel);
    Ok(out)
}

/// Alpha-composite one uniform straight-RGBA color over the whole frame.
pub fn tint(frame: &mut Frame, color: Rgba8) {
    let src = premultiply(color);
    if src[3] == 0 {
        return;
    }
    for px in frame.data_mut().chunks_exact_mut(4) {
        let out = over([px[0], px[1], px[2], px[3]], src, 1.0);
        px.copy_from_slice(&out);
    }
}

/// Saturation adjustment: interpolate each pixel between its luma gray and
/// itself by `factor` (1.0 is identity, 0.0 is grayscale, >1.0 saturates).
pub fn adjust_saturation(frame: &mut Frame, factor: f32) {
    for px in frame.data_mut().chunks_exact_mut(4) {
        let gray = luma(px[0], px[1], px[2]);
        for c in px.iter_mut().take(3) {
            *c = lerp_u8(gray, *c, factor);
        }
    }
}

/// Brightness adjustment: scale channels toward black (`factor` 1.0 is
/// identity, 0.0 is black).
pub fn adjust_brightness(frame: &mut Frame, factor: f32) {
    for px in frame.data_mut().chunks_exact_mut(4) {
        for c in px.iter_mut().take(3) {
            *c = lerp_u8(0.0, *c, factor);
        }
    }
}

/// Contrast adjustment: interpolate each pixel away from the frame's mean
/// luma by `factor`.
pub fn adjust_contrast(frame: &mut Frame, factor: f32) {
    let px_count = frame.data().len() / 4;
    if px_count == 0 {
        return;
    }
    let mut sum = 0.0f64;
    for px in frame.data().chunks_exact(4) {
        sum += f64::from(luma(px[0], px[1], px[2]));
    }
    let mean = (sum / px_count as f64) as f32;

    for px in frame.data_mut().chunks_exact_mut(4) {
        for c in px.iter_mut().take(3) {
            *c = lerp_u8(mean, *c, factor);
        }
    }
}

fn luma(r: u8, g: u8, b: u8) -> f32 {
    0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b)
}

fn lerp_u8(from: f32, to: u8, factor: f32) -> u8 {
    let v = from + (f32::from(to) - from) * factor;
    v.round().clamp(0.0, 255.0) as u8
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> ThumbResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(ThumbError::render("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let mut weights_f = Vec::<f64>::with_capacity((2 * r + 1) as usize);
    let mut sum = 0.0f64;
    let sigma = sigma as f64;
    let denom = 2.0 * sigma * sigma;
    for i in -r..=r {
        let x = i as f64;
        let w = (-x * x / denom).exp();
        weights_f.push(w);
        sum += w;
    }
    if sum <= 0.0 {
        return Err(ThumbError::render("gaussian kernel sum is zero"));
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = ((wf / sum) * 65536.0).round() as i64;
        let q = q.clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    // Force the kernel to sum to exactly 1.0 in Q16 so flat regions stay flat.
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        let mid_val = i64::from(weights[mid]);
        weights[mid] = (mid_val + delta).clamp(0, 65536) as u32;
    }

    Ok(weights)
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let dx = ki as i32 - radius;
                let sx = (x + dx).clamp(0, w - 1);
                let idx = ((y * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += (kw as u64) * (src[idx + c] as u64);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let dy = ki as i32 - radius;
                let sy = (y + dy).clamp(0, h - 1);
                let idx = ((sy * w + x) as usize) * 4;
                for c in 0..4 {
                    acc[c] += (kw as u64) * (src[idx + c] as u64);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    let v = (acc + 32768) >> 16;
    (v.min(255)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn over_at_zero_opacity_keeps_the_destination() {
        let graded = premultiply([12, 80, 140, 255]);
        let accent = premultiply([0, 180, 255, 255]);
        assert_eq!(over(graded, accent, 0.0), graded);
    }

    #[test]
    fn over_with_opaque_accent_hides_the_background() {
        let accent = premultiply([0, 180, 255, 255]);
        assert_eq!(over(premultiply([37, 37, 37, 255]), accent, 1.0), accent);
    }

    #[test]
    fn over_halo_on_an_empty_layer_keeps_its_color() {
        let halo = premultiply([0, 160, 255, 180]);
        assert_eq!(over([0, 0, 0, 0], halo, 1.0), halo);
    }

    #[test]
    fn over_half_opacity_halves_coverage() {
        let out = over([0, 0, 0, 0], [255, 255, 255, 255], 0.5);
        assert_eq!(out[3], 128);
        assert_eq!(out[0], out[3]);
    }

    #[test]
    fn zero_radius_blur_is_a_copy() {
        let f = Frame::filled(3, 2, [10, 20, 30, 255]);
        assert_eq!(blur(&f, 0, 0.0).unwrap(), f);
    }

    #[test]
    fn blur_rejects_a_degenerate_sigma() {
        let f = Frame::filled(3, 2, [10, 20, 30, 255]);
        assert!(blur(&f, 2, 0.0).is_err());
        assert!(blur(&f, 2, f32::NAN).is_err());
    }

    #[test]
    fn blur_leaves_a_flat_wash_untouched() {
        // Edge clamping makes a heavy kernel on a small frame a no-op for
        // constant pixels.
        let f = Frame::filled(8, 6, [0, 120, 255, 255]);
        assert_eq!(blur(&f, 22, 11.0).unwrap(), f);
    }

    #[test]
    fn blur_feathers_a_hard_edge() {
        let mut f = Frame::new(8, 1);
        for x in 0..4 {
            f.blend(x, 0, [255, 255, 255, 255]);
        }

        let out = blur(&f, 2, 1.0).unwrap();

        assert_eq!(out.get(0, 0)[3], 255);
        assert_eq!(out.get(7, 0)[3], 0);
        let edge = out.get(4, 0)[3];
        assert!(edge > 0 && edge < 255, "edge alpha {edge} should be partial");
    }

    #[test]
    fn blur_spreads_a_glow_dot_without_losing_energy() {
        let mut f = Frame::new(9, 9);
        f.blend(4, 4, premultiply([0, 160, 255, 200]));

        let out = blur(&f, 3, 1.5).unwrap();

        let spread = out.data().chunks_exact(4).filter(|px| px[3] != 0).count();
        assert!(spread > 1);

        let total: u32 = out.data().chunks_exact(4).map(|px| u32::from(px[3])).sum();
        assert!((total as i32 - 200).abs() <= 10, "alpha energy {total}");
    }

    #[test]
    fn tint_pulls_toward_color() {
        let mut f = Frame::filled(1, 1, [0, 0, 0, 255]);
        tint(&mut f, [0, 120, 255, 35]);
        let px = f.get(0, 0);
        assert!(px[2] > px[1] && px[1] > px[0]);
        assert_eq!(px[3], 255);
    }

    #[test]
    fn saturation_0_is_grayscale() {
        let mut f = Frame::filled(1, 1, [200, 50, 10, 255]);
        adjust_saturation(&mut f, 0.0);
        let px = f.get(0, 0);
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
    }

    #[test]
    fn brightness_scales_channels() {
        let mut f = Frame::filled(1, 1, [100, 200, 50, 255]);
        adjust_brightness(&mut f, 0.5);
        let px = f.get(0, 0);
        assert_eq!(px[0], 50);
        assert_eq!(px[1], 100);
        assert_eq!(px[2], 25);
    }

    #[test]
    fn contrast_1_is_identity() {
        let mut f = Frame::filled(2, 2, [10, 200, 90, 255]);
        let before = f.clone();
        adjust_contrast(&mut f, 1.0);
        assert_eq!(f, before);
    }

    #[test]
    fn contrast_above_1_spreads_from_mean() {
        let mut f = Frame::new(2, 1);
        f.blend(0, 0, [50, 50, 50, 255]);
        f.blend(1, 0, [200, 200, 200, 255]);
        adjust_contrast(&mut f, 1.5);
        assert!(f.get(0, 0)[0] < 50);
        assert!(f.get(1, 0)[0] > 200);
    }
}
