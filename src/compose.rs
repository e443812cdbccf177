//! The layer pipeline: turns one decoded source image plus metadata into
//! the finished 1280x720 canvas. Order matters for blending; each pass
//! mutates the shared background frame in sequence.

use std::path::Path;

use fontdue::Font;
use image::RgbaImage;
use image::imageops::FilterType;
use kurbo::Point;
use rand::Rng as _;

use crate::error::{ThumbError, ThumbResult};
use crate::frame::Frame;
use crate::fx;
use crate::layout;
use crate::metadata::{VideoMetadata, truncate_title};
use crate::shapes;
use crate::text;

/// File name of the title/glyph font inside the assets directory.
pub const TITLE_FONT_FILE: &str = "title.ttf";
/// File name of the label font inside the assets directory.
pub const LABEL_FONT_FILE: &str = "label.ttf";
/// File name of the decorative icon strip inside the assets directory.
pub const ICON_STRIP_FILE: &str = "play_icons.png";

/// The static assets one render needs: two fonts and the icon strip.
pub struct AssetSet {
    pub title_font: Font,
    pub label_font: Font,
    pub icon_strip: RgbaImage,
}

impl AssetSet {
    /// Load all assets from a directory; any missing or unparsable file is
    /// a render failure.
    pub fn load(dir: &Path) -> ThumbResult<Self> {
        let title_font = text::load_font(&read_asset(dir, TITLE_FONT_FILE)?)?;
        let label_font = text::load_font(&read_asset(dir, LABEL_FONT_FILE)?)?;

        let icon_path = dir.join(ICON_STRIP_FILE);
        let icon_strip = image::open(&icon_path)
            .map_err(|e| ThumbError::render(format!("load '{}': {e}", icon_path.display())))?
            .to_rgba8();

        Ok(Self {
            title_font,
            label_font,
            icon_strip,
        })
    }
}

fn read_asset(dir: &Path, name: &str) -> ThumbResult<Vec<u8>> {
    let path = dir.join(name);
    std::fs::read(&path)
        .map_err(|e| ThumbError::render(format!("read asset '{}': {e}", path.display())))
}

/// Cosmetic progress fill fraction. The renderer has no playback position,
/// so every non-live render draws a uniformly random split.
pub fn random_progress_fraction() -> f32 {
    rand::thread_rng().gen_range(layout::PROGRESS_FRACTION_MIN..=layout::PROGRESS_FRACTION_MAX)
}

/// Run the full pipeline. `progress_fraction` is only consulted for
/// non-live videos; pass [`random_progress_fraction`] for production
/// output.
pub fn compose(
    source: &RgbaImage,
    meta: &VideoMetadata,
    assets: &AssetSet,
    progress_fraction: f32,
) -> ThumbResult<RgbaImage> {
    let mut canvas = background_pass(source)?;
    glyph_pass(&mut canvas, &assets.title_font)?;
    avatar_pass(&mut canvas, source)?;
    text_pass(&mut canvas, meta, assets)?;
    progress_pass(&mut canvas, meta.is_live(), progress_fraction);
    label_pass(&mut canvas, &meta.duration, assets)?;
    icon_pass(&mut canvas, &assets.icon_strip);
    canvas.to_rgba_image()
}

/// Aspect-distorting resize to the canvas, heavy blur, color grade, and the
/// cool tint wash.
fn background_pass(source: &RgbaImage) -> ThumbResult<Frame> {
    let resized = image::imageops::resize(
        source,
        layout::CANVAS_WIDTH,
        layout::CANVAS_HEIGHT,
        FilterType::Triangle,
    );
    let frame = Frame::from_rgba_image(&resized);
    let mut background = fx::blur(
        &frame,
        layout::BACKGROUND_BLUR_RADIUS,
        layout::BACKGROUND_BLUR_RADIUS as f32 / 2.0,
    )?;

    fx::adjust_saturation(&mut background, layout::BACKGROUND_SATURATION);
    fx::adjust_brightness(&mut background, layout::BACKGROUND_BRIGHTNESS);
    fx::adjust_contrast(&mut background, layout::BACKGROUND_CONTRAST);
    fx::tint(&mut background, layout::BACKGROUND_TINT);
    Ok(background)
}

/// Crisp dim glyphs on the background, then a blurred bright copy
/// composited over them. The blurred copy haloes past the crisp strokes,
/// which is what reads as glow.
fn glyph_pass(canvas: &mut Frame, font: &Font) -> ThumbResult<()> {
    let glyphs: Vec<(char, Point)> = layout::GLYPHS
        .iter()
        .copied()
        .zip(layout::GLYPH_POSITIONS.iter().copied())
        .collect();

    let mut buf = [0u8; 4];
    for &(ch, pos) in &glyphs {
        let s = ch.encode_utf8(&mut buf);
        text::draw_text(
            canvas,
            font,
            layout::GLYPH_SIZE_PX,
            pos,
            s,
            layout::GLYPH_DIM_FILL,
        );
    }

    let glow = text::glow_layer(
        canvas.width(),
        canvas.height(),
        font,
        layout::GLYPH_SIZE_PX,
        &glyphs,
        layout::GLYPH_GLOW_FILL,
        layout::GLYPH_GLOW_BLUR_RADIUS,
    )?;
    canvas.composite_over(&glow, 0, 0);
    Ok(())
}

/// Circular crop of the unresized source with a solid border, pasted over
/// a blurred glow disc.
fn avatar_pass(canvas: &mut Frame, source: &RgbaImage) -> ThumbResult<()> {
    let avatar = build_avatar(source)?;

    let glow_size = layout::AVATAR_GLOW_SIZE;
    let mut glow = Frame::new(glow_size, glow_size);
    let center = f64::from(glow_size) / 2.0;
    shapes::fill_disc(
        &mut glow,
        Point::new(center, center),
        center,
        layout::AVATAR_GLOW_FILL,
    );
    let glow = fx::blur(
        &glow,
        layout::AVATAR_GLOW_BLUR_RADIUS,
        layout::AVATAR_GLOW_BLUR_RADIUS as f32 / 2.0,
    )?;

    let gx = (layout::AVATAR_POSITION.x + layout::AVATAR_GLOW_OFFSET) as i64;
    let gy = (layout::AVATAR_POSITION.y + layout::AVATAR_GLOW_OFFSET) as i64;
    canvas.composite_over(&glow, gx, gy);

    canvas.composite_over(
        &avatar,
        layout::AVATAR_POSITION.x as i64,
        layout::AVATAR_POSITION.y as i64,
    );
    Ok(())
}

/// Centered square crop at 1.5x the target diameter (padded with opaque
/// black where the source is smaller), resized to diameter minus border,
/// circle-masked, and set into a border-colored disc.
pub(crate) fn build_avatar(source: &RgbaImage) -> ThumbResult<Frame> {
    let diameter = layout::AVATAR_DIAMETER;
    let border = layout::AVATAR_BORDER;
    let crop_side = (f64::from(diameter) * layout::AVATAR_CROP_SCALE).round() as u32;

    let square = crop_centered_square(source, crop_side);
    let inner_side = diameter - 2 * border;
    let mut inner = image::imageops::resize(&square, inner_side, inner_side, FilterType::Triangle);
    shapes::mask_circle(&mut inner);

    let mut avatar = Frame::filled(diameter, diameter, layout::ACCENT);
    avatar.composite_over(&Frame::from_rgba_image(&inner), i64::from(border), i64::from(border));
    mask_circle_premul(&mut avatar);
    Ok(avatar)
}

/// Cut a `side` x `side` square from the center of `img`, padding with
/// opaque black where the crop box extends past the image.
fn crop_centered_square(img: &RgbaImage, side: u32) -> RgbaImage {
    let (w, h) = img.dimensions();
    let left = (i64::from(w) - i64::from(side)) / 2;
    let top = (i64::from(h) - i64::from(side)) / 2;

    let mut out = RgbaImage::from_pixel(side, side, image::Rgba([0, 0, 0, 255]));
    for y in 0..side {
        for x in 0..side {
            let sx = left + i64::from(x);
            let sy = top + i64::from(y);
            if sx >= 0 && sy >= 0 && sx < i64::from(w) && sy < i64::from(h) {
                out.put_pixel(x, y, *img.get_pixel(sx as u32, sy as u32));
            }
        }
    }
    out
}

/// Multiply every channel of a premultiplied frame by the coverage of its
/// largest inscribed circle.
fn mask_circle_premul(frame: &mut Frame) {
    let (w, h) = (frame.width(), frame.height());
    let radius = f64::from(w.min(h)) / 2.0;
    let center = Point::new(f64::from(w) / 2.0, f64::from(h) / 2.0);

    for y in 0..i64::from(h) {
        for x in 0..i64::from(w) {
            let dx = (x as f64 + 0.5) - center.x;
            let dy = (y as f64 + 0.5) - center.y;
            let cov = (radius - (dx * dx + dy * dy).sqrt() + 0.5).clamp(0.0, 1.0);
            if cov >= 1.0 {
                continue;
            }
            let px = frame.get(x, y);
            let scaled = [
                (f64::from(px[0]) * cov).round() as u8,
                (f64::from(px[1]) * cov).round() as u8,
                (f64::from(px[2]) * cov).round() as u8,
                (f64::from(px[3]) * cov).round() as u8,
            ];
            let i = (y as usize * w as usize + x as usize) * 4;
            frame.data_mut()[i..i + 4].copy_from_slice(&scaled);
        }
    }
}

/// Two truncated title lines plus the "channel  |  views" line, all with
/// a blurred drop shadow.
fn text_pass(canvas: &mut Frame, meta: &VideoMetadata, assets: &AssetSet) -> ThumbResult<()> {
    let [line1, line2] = truncate_title(&meta.title);

    text::draw_text_with_shadow(
        canvas,
        &assets.title_font,
        layout::TITLE_SIZE_PX,
        Point::new(layout::TEXT_X, layout::TITLE_LINE1_Y),
        &line1,
        layout::WHITE,
        layout::SHADOW_OFFSET,
        layout::SHADOW_BLUR_RADIUS,
    )?;
    text::draw_text_with_shadow(
        canvas,
        &assets.title_font,
        layout::TITLE_SIZE_PX,
        Point::new(layout::TEXT_X, layout::TITLE_LINE2_Y),
        &line2,
        layout::WHITE,
        layout::SHADOW_OFFSET,
        layout::SHADOW_BLUR_RADIUS,
    )?;

    let views: String = meta.views.chars().take(layout::VIEWS_MAX).collect();
    let info = format!("{}  |  {}", meta.channel, views);
    text::draw_text_with_shadow(
        canvas,
        &assets.label_font,
        layout::LABEL_SIZE_PX,
        Point::new(layout::TEXT_X, layout::INFO_LINE_Y),
        &info,
        layout::WHITE,
        layout::SHADOW_OFFSET,
        layout::SHADOW_BLUR_RADIUS,
    )?;
    Ok(())
}

/// The horizontal progress indicator. Live streams get a full red bar with
/// an end-cap dot; everything else splits at `fraction` into an accent
/// segment and a white remainder with the dot at the boundary.
pub(crate) fn progress_pass(canvas: &mut Frame, is_live: bool, fraction: f32) {
    let x0 = layout::TEXT_X as i64;
    let y = layout::PROGRESS_Y;
    let total = layout::PROGRESS_LENGTH;

    if is_live {
        shapes::fill_hline(
            canvas,
            x0,
            x0 + total,
            y,
            layout::PROGRESS_ACCENT_STROKE,
            layout::LIVE_RED,
        );
        shapes::fill_disc(
            canvas,
            Point::new((x0 + total) as f64, y as f64),
            layout::PROGRESS_DOT_RADIUS,
            layout::LIVE_RED,
        );
        return;
    }

    let fraction = fraction.clamp(0.0, 1.0);
    let accent_len = (total as f32 * fraction).round() as i64;

    shapes::fill_hline(
        canvas,
        x0,
        x0 + accent_len,
        y,
        layout::PROGRESS_ACCENT_STROKE,
        layout::ACCENT,
    );
    shapes::fill_hline(
        canvas,
        x0 + accent_len,
        x0 + total,
        y,
        layout::PROGRESS_REMAINDER_STROKE,
        layout::WHITE,
    );
    shapes::fill_disc(
        canvas,
        Point::new((x0 + accent_len) as f64, y as f64),
        layout::PROGRESS_DOT_RADIUS,
        layout::ACCENT,
    );
}

/// "00:00" at the indicator start and the resolved duration at its end.
fn label_pass(canvas: &mut Frame, duration: &str, assets: &AssetSet) -> ThumbResult<()> {
    text::draw_text_with_shadow(
        canvas,
        &assets.label_font,
        layout::LABEL_SIZE_PX,
        Point::new(layout::TEXT_X, layout::CLOCK_LABEL_Y),
        "00:00",
        layout::WHITE,
        layout::SHADOW_OFFSET,
        layout::SHADOW_BLUR_RADIUS,
    )?;
    text::draw_text_with_shadow(
        canvas,
        &assets.label_font,
        layout::LABEL_SIZE_PX,
        Point::new(layout::DURATION_LABEL_X, layout::CLOCK_LABEL_Y),
        duration,
        layout::WHITE,
        layout::SHADOW_OFFSET,
        layout::SHADOW_BLUR_RADIUS,
    )?;
    Ok(())
}

/// Paste the decorative icon strip, resized to its fixed footprint.
fn icon_pass(canvas: &mut Frame, icon_strip: &RgbaImage) {
    let rect = layout::ICON_STRIP;
    let resized = image::imageops::resize(
        icon_strip,
        rect.width() as u32,
        rect.height() as u32,
        FilterType::Triangle,
    );
    canvas.composite_over(&Frame::from_rgba_image(&resized), rect.x0 as i64, rect.y0 as i64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{
        ACCENT, LIVE_RED, PROGRESS_LENGTH, PROGRESS_Y, TEXT_X, WHITE,
    };

    fn canvas() -> Frame {
        Frame::filled(layout::CANVAS_WIDTH, layout::CANVAS_HEIGHT, [0, 0, 0, 255])
    }

    #[test]
    fn live_progress_is_all_red() {
        let mut f = canvas();
        progress_pass(&mut f, true, 0.5);

        let x0 = TEXT_X as i64;
        for x in [x0, x0 + PROGRESS_LENGTH / 2, x0 + PROGRESS_LENGTH - 1] {
            assert_eq!(f.get(x, PROGRESS_Y), [LIVE_RED[0], LIVE_RED[1], LIVE_RED[2], 255]);
        }
        // End-cap dot extends past the bar.
        assert_eq!(f.get(x0 + PROGRESS_LENGTH + 5, PROGRESS_Y)[0], 255);
    }

    #[test]
    fn timed_progress_splits_accent_and_white() {
        let mut f = canvas();
        progress_pass(&mut f, false, 0.5);

        let x0 = TEXT_X as i64;
        let boundary = x0 + PROGRESS_LENGTH / 2;
        assert_eq!(f.get(x0 + 10, PROGRESS_Y), [ACCENT[0], ACCENT[1], ACCENT[2], 255]);
        assert_eq!(f.get(x0 + PROGRESS_LENGTH - 10, PROGRESS_Y), WHITE);
        // Dot at the boundary is accent-colored.
        assert_eq!(f.get(boundary, PROGRESS_Y), [ACCENT[0], ACCENT[1], ACCENT[2], 255]);
    }

    #[test]
    fn random_fraction_stays_in_range() {
        for _ in 0..200 {
            let p = random_progress_fraction();
            assert!((layout::PROGRESS_FRACTION_MIN..=layout::PROGRESS_FRACTION_MAX).contains(&p));
        }
    }

    #[test]
    fn avatar_is_disc_with_border() {
        let source = RgbaImage::from_pixel(480, 360, image::Rgba([10, 200, 30, 255]));
        let avatar = build_avatar(&source).unwrap();
        let d = i64::from(layout::AVATAR_DIAMETER);

        // Corners are outside the outer circle.
        assert_eq!(avatar.get(0, 0), [0, 0, 0, 0]);
        assert_eq!(avatar.get(d - 1, d - 1), [0, 0, 0, 0]);

        // A point just inside the rim is border-colored.
        let rim = avatar.get(d / 2, 5);
        assert_eq!([rim[0], rim[1], rim[2]], [ACCENT[0], ACCENT[1], ACCENT[2]]);

        // The center shows the source image.
        let center = avatar.get(d / 2, d / 2);
        assert_eq!([center[0], center[1], center[2]], [10, 200, 30]);
    }

    #[test]
    fn centered_crop_pads_out_of_bounds_with_black() {
        let source = RgbaImage::from_pixel(100, 50, image::Rgba([255, 255, 255, 255]));
        let square = crop_centered_square(&source, 120);
        // Top rows fall outside the 50px-tall source.
        assert_eq!(square.get_pixel(60, 0).0, [0, 0, 0, 255]);
        // Center comes from the source.
        assert_eq!(square.get_pixel(60, 60).0, [255, 255, 255, 255]);
        assert_eq!(square.dimensions(), (120, 120));
    }

    #[test]
    fn background_pass_darkens_and_cools() {
        let source = RgbaImage::from_pixel(64, 36, image::Rgba([200, 200, 200, 255]));
        let bg = background_pass(&source).unwrap();
        assert_eq!(bg.width(), layout::CANVAS_WIDTH);
        assert_eq!(bg.height(), layout::CANVAS_HEIGHT);

        let px = bg.get(640, 360);
        // Brightness x0.60 darkens well below the input gray.
        assert!(px[0] < 200);
        // The blue tint leaves blue the strongest channel.
        assert!(px[2] >= px[1] && px[1] >= px[0]);
        assert_eq!(px[3], 255);
    }
}
