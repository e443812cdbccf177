use image::RgbaImage;

use crate::error::{ThumbError, ThumbResult};
use crate::fx;

/// Straight (non-premultiplied) RGBA8 color.
pub type Rgba8 = [u8; 4];

/// A mutable raster canvas holding premultiplied RGBA8 pixels.
///
/// All compositing in this crate happens on premultiplied pixels; straight
/// RGBA crosses the boundary only at decode ([`Frame::from_rgba_image`]) and
/// encode ([`Frame::to_rgba_image`]).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    /// Fully transparent frame.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; (width as usize) * (height as usize) * 4],
        }
    }

    /// Frame filled with one straight RGBA color.
    pub fn filled(width: u32, height: u32, color: Rgba8) -> Self {
        let px = premultiply(color);
        let mut data = Vec::with_capacity((width as usize) * (height as usize) * 4);
        for _ in 0..(width as usize) * (height as usize) {
            data.extend_from_slice(&px);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn from_rgba_image(img: &RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        let mut data = img.as_raw().clone();
        premultiply_in_place(&mut data);
        Self {
            width,
            height,
            data,
        }
    }

    /// Unpremultiply back to a straight-alpha image for encoding.
    pub fn to_rgba_image(&self) -> ThumbResult<RgbaImage> {
        let mut data = self.data.clone();
        for px in data.chunks_exact_mut(4) {
            let a = px[3] as u16;
            if a == 0 || a == 255 {
                continue;
            }
            for c in px.iter_mut().take(3) {
                *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
            }
        }
        RgbaImage::from_raw(self.width, self.height, data)
            .ok_or_else(|| ThumbError::render("frame buffer does not match its dimensions"))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Premultiplied pixel at (x, y). Out-of-bounds reads are transparent.
    pub fn get(&self, x: i64, y: i64) -> Rgba8 {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return [0, 0, 0, 0];
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Source-over one premultiplied pixel onto (x, y). Out-of-bounds is a no-op.
    pub fn blend(&mut self, x: i64, y: i64, src_premul: Rgba8) {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let dst = [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ];
        let out = fx::over(dst, src_premul, 1.0);
        self.data[i..i + 4].copy_from_slice(&out);
    }

    /// Source-over `src` onto this frame with its top-left corner at (x, y).
    pub fn composite_over(&mut self, src: &Frame, x: i64, y: i64) {
        for sy in 0..i64::from(src.height) {
            for sx in 0..i64::from(src.width) {
                let px = src.get(sx, sy);
                if px[3] == 0 && px[0] == 0 && px[1] == 0 && px[2] == 0 {
                    continue;
                }
                self.blend(x + sx, y + sy, px);
            }
        }
    }
}

/// Straight RGBA color to premultiplied.
pub fn premultiply(color: Rgba8) -> Rgba8 {
    let a = u16::from(color[3]);
    let p = |c: u8| (((u16::from(c) * a) + 127) / 255) as u8;
    [p(color[0]), p(color[1]), p(color[2]), color[3]]
}

fn premultiply_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 255 {
            continue;
        }
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}
