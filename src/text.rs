//! Glyph rasterization onto premultiplied frames via `fontdue`.
//!
//! Layout is deliberately minimal: a left-to-right advance cursor with the
//! baseline derived from the font's ascent, anchored so that `origin` is the
//! top-left of the line box. That matches how the fixed coordinate plan in
//! [`crate::layout`] was authored.

use fontdue::Font;
use kurbo::Point;

use crate::error::{ThumbError, ThumbResult};
use crate::frame::{Frame, Rgba8, premultiply};
use crate::fx;

/// Parse a TTF/OTF font from raw bytes.
pub fn load_font(bytes: &[u8]) -> ThumbResult<Font> {
    Font::from_bytes(bytes, fontdue::FontSettings::default())
        .map_err(|e| ThumbError::render(format!("parse font: {e}")))
}

/// Draw one line of text with `origin` as the top-left of the line box.
pub fn draw_text(frame: &mut Frame, font: &Font, size_px: f32, origin: Point, text: &str, color: Rgba8) {
    let ascent = match font.horizontal_line_metrics(size_px) {
        Some(m) => m.ascent,
        None => size_px * 0.8,
    };
    let baseline = origin.y + f64::from(ascent);

    let src = premultiply(color);
    let mut cursor = origin.x;
    for ch in text.chars() {
        let (metrics, coverage) = font.rasterize(ch, size_px);
        let left = (cursor + f64::from(metrics.xmin)).round() as i64;
        let top = (baseline - f64::from(metrics.ymin) - metrics.height as f64).round() as i64;

        for row in 0..metrics.height {
            for col in 0..metrics.width {
                let cov = coverage[row * metrics.width + col];
                if cov == 0 {
                    continue;
                }
                frame.blend(left + col as i64, top + row as i64, scale_by_coverage(src, cov));
            }
        }
        cursor += f64::from(metrics.advance_width);
    }
}

/// Draw text twice: a blurred black shadow composited at a small offset
/// beneath a crisp fill on top.
pub fn draw_text_with_shadow(
    frame: &mut Frame,
    font: &Font,
    size_px: f32,
    origin: Point,
    text: &str,
    fill: Rgba8,
    shadow_offset: (i64, i64),
    shadow_blur_radius: u32,
) -> ThumbResult<()> {
    let mut shadow = Frame::new(frame.width(), frame.height());
    draw_text(&mut shadow, font, size_px, origin, text, [0, 0, 0, 255]);
    let shadow = fx::blur(&shadow, shadow_blur_radius, shadow_blur_radius as f32 / 2.0)?;
    frame.composite_over(&shadow, shadow_offset.0, shadow_offset.1);

    draw_text(frame, font, size_px, origin, text, fill);
    Ok(())
}

/// Render `glyphs` into a fresh transparent layer and blur it heavily.
/// Composited beneath crisp copies of the same glyphs this reads as a glow.
pub fn glow_layer(
    width: u32,
    height: u32,
    font: &Font,
    size_px: f32,
    glyphs: &[(char, Point)],
    fill: Rgba8,
    blur_radius: u32,
) -> ThumbResult<Frame> {
    let mut layer = Frame::new(width, height);
    let mut buf = [0u8; 4];
    for &(ch, pos) in glyphs {
        let s = ch.encode_utf8(&mut buf);
        draw_text(&mut layer, font, size_px, pos, s, fill);
    }
    fx::blur(&layer, blur_radius, blur_radius as f32 / 2.0)
}

fn scale_by_coverage(px: Rgba8, cov: u8) -> Rgba8 {
    if cov == 255 {
        return px;
    }
    let s = |c: u8| (((u16::from(c) * u16::from(cov)) + 127) / 255) as u8;
    [s(px[0]), s(px[1]), s(px[2]), s(px[3])]
}
