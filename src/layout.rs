//! The fixed 1280x720 coordinate plan for the aura thumbnail. Every
//! position, size, and color in the composition is a constant here; the
//! passes in [`crate::compose`] only read them.

use kurbo::{Point, Rect};

use crate::frame::Rgba8;

pub const CANVAS_WIDTH: u32 = 1280;
pub const CANVAS_HEIGHT: u32 = 720;

/// Accent color shared by the glyph glow, avatar border, and progress fill.
pub const ACCENT: Rgba8 = [0, 180, 255, 255];
pub const LIVE_RED: Rgba8 = [255, 0, 0, 255];
pub const WHITE: Rgba8 = [255, 255, 255, 255];

/// Cool-tone wash composited over the graded background.
pub const BACKGROUND_TINT: Rgba8 = [0, 120, 255, 35];
pub const BACKGROUND_BLUR_RADIUS: u32 = 22;
pub const BACKGROUND_SATURATION: f32 = 1.25;
pub const BACKGROUND_BRIGHTNESS: f32 = 0.60;
pub const BACKGROUND_CONTRAST: f32 = 1.15;

/// Oversized background glyphs, drawn dim and crisp with a blurred bright
/// copy composited beneath them.
pub const GLYPHS: [char; 4] = ['A', 'U', 'R', 'A'];
pub const GLYPH_POSITIONS: [Point; 4] = [
    Point::new(60.0, 120.0),
    Point::new(340.0, 120.0),
    Point::new(620.0, 120.0),
    Point::new(900.0, 120.0),
];
pub const GLYPH_SIZE_PX: f32 = 260.0;
pub const GLYPH_DIM_FILL: Rgba8 = [255, 255, 255, 55];
pub const GLYPH_GLOW_FILL: Rgba8 = [0, 180, 255, 200];
pub const GLYPH_GLOW_BLUR_RADIUS: u32 = 32;

/// Circular avatar cut from the unresized source image.
pub const AVATAR_DIAMETER: u32 = 400;
pub const AVATAR_BORDER: u32 = 20;
pub const AVATAR_CROP_SCALE: f64 = 1.5;
pub const AVATAR_POSITION: Point = Point::new(120.0, 160.0);
/// Glow disc behind the avatar: larger, offset so it halos evenly.
pub const AVATAR_GLOW_SIZE: u32 = 440;
pub const AVATAR_GLOW_OFFSET: f64 = -20.0;
pub const AVATAR_GLOW_FILL: Rgba8 = [0, 160, 255, 180];
pub const AVATAR_GLOW_BLUR_RADIUS: u32 = 40;

/// Left edge of the text column.
pub const TEXT_X: f64 = 565.0;
pub const TITLE_LINE1_Y: f64 = 180.0;
pub const TITLE_LINE2_Y: f64 = 230.0;
pub const INFO_LINE_Y: f64 = 320.0;
pub const TITLE_SIZE_PX: f32 = 45.0;
pub const LABEL_SIZE_PX: f32 = 30.0;
pub const SHADOW_OFFSET: (i64, i64) = (3, 3);
pub const SHADOW_BLUR_RADIUS: u32 = 5;

/// Max characters per title line; words are packed greedily below this.
pub const TITLE_LINE_MAX: usize = 30;
/// Max characters of the view-count string on the info line.
pub const VIEWS_MAX: usize = 23;

pub const PROGRESS_Y: i64 = 380;
pub const PROGRESS_LENGTH: i64 = 580;
pub const PROGRESS_ACCENT_STROKE: u32 = 9;
pub const PROGRESS_REMAINDER_STROKE: u32 = 8;
pub const PROGRESS_DOT_RADIUS: f64 = 10.0;
/// Cosmetic fill fraction range; the renderer has no playback position.
pub const PROGRESS_FRACTION_MIN: f32 = 0.15;
pub const PROGRESS_FRACTION_MAX: f32 = 0.85;

pub const CLOCK_LABEL_Y: f64 = 400.0;
pub const DURATION_LABEL_X: f64 = 1080.0;

/// Icon strip footprint (resized to fit).
pub const ICON_STRIP: Rect = Rect::new(565.0, 450.0, 1145.0, 512.0);

/// Duration sentinel for live streams.
pub const LIVE_SENTINEL: &str = "Live";
