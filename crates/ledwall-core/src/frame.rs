//! In-memory RGB pixel surfaces.
//!
//! [`Canvas`] is used for both the virtual canvas the scenes paint on and the
//! chained frame buffer sent to the panels.  Pixels are stored row-major,
//! one [`Rgb`] per pixel; all drawing operations clip to the surface.

use serde::{Deserialize, Serialize};

use crate::domain::geometry::Rect;

/// A 24-bit colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Byte order of each pixel in an encoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelOrder {
    #[default]
    Rgb,
    Bgr,
    Grb,
}

impl PixelOrder {
    fn bytes(self, pixel: Rgb) -> [u8; 3] {
        match self {
            PixelOrder::Rgb => [pixel.r, pixel.g, pixel.b],
            PixelOrder::Bgr => [pixel.b, pixel.g, pixel.r],
            PixelOrder::Grb => [pixel.g, pixel.r, pixel.b],
        }
    }
}

/// A fixed-size RGB surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
}

impl Canvas {
    /// Creates a black canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgb::BLACK; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The whole surface as a rectangle at the origin.
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    /// Row-major pixel data.
    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| y as usize * self.width as usize + x as usize)
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Rgb> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Sets one pixel; writes outside the surface are ignored.
    pub fn set(&mut self, x: u32, y: u32, colour: Rgb) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = colour;
        }
    }

    pub fn fill(&mut self, colour: Rgb) {
        self.pixels.fill(colour);
    }

    /// Intersection of `rect` with this surface, if non-empty.
    fn clip(&self, rect: Rect) -> Option<Rect> {
        let right = rect.right().min(self.width);
        let bottom = rect.bottom().min(self.height);
        (rect.x < right && rect.y < bottom)
            .then(|| Rect::new(rect.x, rect.y, right - rect.x, bottom - rect.y))
    }

    /// Fills `rect`, clipped to the surface.
    pub fn fill_rect(&mut self, rect: Rect, colour: Rgb) {
        let Some(rect) = self.clip(rect) else {
            return;
        };
        let stride = self.width as usize;
        for y in rect.y..rect.bottom() {
            let start = y as usize * stride + rect.x as usize;
            self.pixels[start..start + rect.width as usize].fill(colour);
        }
    }

    /// Copies `src_rect` of `src` so that its top-left pixel lands on
    /// `(dst_x, dst_y)` of this surface.  Both sides are clipped.
    pub fn blit(&mut self, src: &Canvas, src_rect: Rect, dst_x: u32, dst_y: u32) {
        let Some(src_rect) = src.clip(src_rect) else {
            return;
        };
        let Some(dst_rect) = self.clip(Rect::new(dst_x, dst_y, src_rect.width, src_rect.height))
        else {
            return;
        };

        let width = dst_rect.width as usize;
        let (src_stride, dst_stride) = (src.width as usize, self.width as usize);
        for row in 0..dst_rect.height as usize {
            let from = (src_rect.y as usize + row) * src_stride + src_rect.x as usize;
            let to = (dst_rect.y as usize + row) * dst_stride + dst_rect.x as usize;
            self.pixels[to..to + width].copy_from_slice(&src.pixels[from..from + width]);
        }
    }

    /// Nearest-neighbour upscale of `src` by an integer `factor` into this
    /// surface, starting at the origin.
    pub fn scale_from(&mut self, src: &Canvas, factor: u32) {
        let factor = factor.max(1);
        for y in 0..self.height.min(src.height.saturating_mul(factor)) {
            for x in 0..self.width.min(src.width.saturating_mul(factor)) {
                if let Some(colour) = src.get(x / factor, y / factor) {
                    self.set(x, y, colour);
                }
            }
        }
    }

    /// Appends the surface to `out` as packed 3-byte pixels in `order`.
    pub fn encode_into(&self, order: PixelOrder, out: &mut Vec<u8>) {
        out.reserve(self.pixels.len() * 3);
        for pixel in &self.pixels {
            out.extend_from_slice(&order.bytes(*pixel));
        }
    }
}
