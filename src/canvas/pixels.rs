//! Pixel storage: colors, integer points, and the row-major canvas buffer.
//!
//! Pixel writes are crate-private. Everything outside the crate mutates a
//! canvas through the rasterizer so the dirty region always covers what
//! actually changed.

#[cfg(test)]
#[path = "pixels_test.rs"]
mod tests;

use serde::{Deserialize, Serialize};

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    pub const RED: Self = Self::new(255, 0, 0, 255);
    pub const GREEN: Self = Self::new(0, 255, 0, 255);
    pub const BLUE: Self = Self::new(0, 0, 255, 255);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Pack as `0xRRGGBBAA`.
    #[must_use]
    pub const fn to_u32(self) -> u32 {
        u32::from_be_bytes([self.r, self.g, self.b, self.a])
    }

    /// Unpack from `0xRRGGBBAA`.
    #[must_use]
    pub const fn from_u32(packed: u32) -> Self {
        let [r, g, b, a] = packed.to_be_bytes();
        Self { r, g, b, a }
    }

    /// Parse `#RRGGBB` (opaque) or `#RRGGBBAA`.
    #[must_use]
    pub fn parse_hex(raw: &str) -> Option<Self> {
        let hex = raw.trim().strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| hex_byte(hex.get(i..i + 2)?);
        match hex.len() {
            6 => Some(Self::new(channel(0)?, channel(2)?, channel(4)?, 255)),
            8 => Some(Self::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }

    /// Canonical lowercase `#rrggbbaa`.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

fn hex_byte(pair: &str) -> Option<u8> {
    match u8::from_str_radix(pair, 16) {
        Ok(value) => Some(value),
        Err(_) => None,
    }
}

/// Integer canvas coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Fixed-size row-major grid of pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl Canvas {
    /// Allocate a canvas filled with `fill`.
    #[must_use]
    pub fn new(width: u32, height: u32, fill: Rgba) -> Self {
        let len = width as usize * height as usize;
        Self { width, height, pixels: vec![fill; len] }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Total pixel count.
    #[must_use]
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// All pixels, row-major.
    #[must_use]
    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    /// Read one pixel. `None` outside the canvas.
    #[must_use]
    pub fn get(&self, x: i32, y: i32) -> Option<Rgba> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// One row of pixels, `None` past the bottom edge.
    #[must_use]
    pub fn row(&self, y: u32) -> Option<&[Rgba]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.width as usize;
        self.pixels.get(start..start + self.width as usize)
    }

    /// Row-major index of `(x, y)` if it lies inside the canvas.
    #[must_use]
    pub fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x.unsigned_abs(), y.unsigned_abs());
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut [Rgba] {
        &mut self.pixels
    }

    /// Copy the half-open rectangle `[x0,x1) × [y0,y1)` from `other`, row by row.
    pub(crate) fn copy_rect_from(&mut self, other: &Canvas, x0: u32, y0: u32, x1: u32, y1: u32) {
        if self.width != other.width || self.height != other.height {
            return;
        }
        let x1 = x1.min(self.width);
        let y1 = y1.min(self.height);
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        let stride = self.width as usize;
        for y in y0..y1 {
            let start = y as usize * stride + x0 as usize;
            let end = y as usize * stride + x1 as usize;
            self.pixels[start..end].copy_from_slice(&other.pixels[start..end]);
        }
    }
}
