//! Spatially-varying scalar parameter fields.
//!
//! Evolution parameters (Brownian strength, fairing strength, attraction
//! strength, local scale, anisotropy) are not single numbers but fields
//! over the world rectangle. A field is a regular grid of reals sampled
//! with clamped bilinear interpolation; gradients come from central
//! differences and drive the anisotropy warp.

use anyhow::{ensure, Result};
use glam::Vec2;

/// A bilinearly-interpolated scalar field over a world rectangle.
#[derive(Debug, Clone)]
pub struct ParameterField {
    data: Vec<f32>,
    width: usize,
    height: usize,
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl ParameterField {
    /// Create a `width` x `height` field over `[min_x, max_x] x [min_y, max_y]`
    /// filled with `default_value`.
    pub fn new(
        width: usize,
        height: usize,
        min_x: f32,
        min_y: f32,
        max_x: f32,
        max_y: f32,
        default_value: f32,
    ) -> Self {
        Self {
            data: vec![default_value; width * height],
            width,
            height,
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn at(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    /// Sample the field at world coordinates with clamped bilinear
    /// interpolation.
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        let u = ((x - self.min_x) / (self.max_x - self.min_x)).clamp(0.0, 1.0);
        let v = ((y - self.min_y) / (self.max_y - self.min_y)).clamp(0.0, 1.0);

        let px = u * (self.width - 1) as f32;
        let py = v * (self.height - 1) as f32;

        let x0 = px.floor() as usize;
        let y0 = py.floor() as usize;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);

        let fx = px - x0 as f32;
        let fy = py - y0 as f32;

        let v00 = self.at(x0, y0);
        let v10 = self.at(x1, y0);
        let v01 = self.at(x0, y1);
        let v11 = self.at(x1, y1);

        let top = v00 * (1.0 - fx) + v10 * fx;
        let bottom = v01 * (1.0 - fx) + v11 * fx;
        top * (1.0 - fy) + bottom * fy
    }

    /// Sample at a 2D point.
    pub fn sample_at(&self, pos: Vec2) -> f32 {
        self.sample(pos.x, pos.y)
    }

    /// Central-difference gradient at world coordinates.
    ///
    /// The step is half the smaller cell extent in world units.
    pub fn gradient(&self, x: f32, y: f32) -> Vec2 {
        let cell_x = (self.max_x - self.min_x) / self.width as f32;
        let cell_y = (self.max_y - self.min_y) / self.height as f32;
        let epsilon = cell_x.min(cell_y) * 0.5;

        let dx = (self.sample(x + epsilon, y) - self.sample(x - epsilon, y)) / (2.0 * epsilon);
        let dy = (self.sample(x, y + epsilon) - self.sample(x, y - epsilon)) / (2.0 * epsilon);
        Vec2::new(dx, dy)
    }

    /// Gradient at a 2D point.
    pub fn gradient_at(&self, pos: Vec2) -> Vec2 {
        self.gradient(pos.x, pos.y)
    }

    /// Write `value` at normalized texture coordinates in `[0, 1]`.
    pub fn set_value(&mut self, u: f32, v: f32, value: f32) {
        let x = (u * (self.width - 1) as f32) as isize;
        let y = (v * (self.height - 1) as f32) as isize;
        if x >= 0 && (x as usize) < self.width && y >= 0 && (y as usize) < self.height {
            self.data[y as usize * self.width + x as usize] = value;
        }
    }

    /// Write `value` at world coordinates.
    pub fn set_value_world(&mut self, x: f32, y: f32, value: f32) {
        let u = (x - self.min_x) / (self.max_x - self.min_x);
        let v = (y - self.min_y) / (self.max_y - self.min_y);
        self.set_value(u, v, value);
    }

    /// Blend cells within `radius` world units of `(x, y)` toward `value`.
    ///
    /// The blend weight is `strength * (1 - d/r)^2`, so the brush is full
    /// strength at the center and fades quadratically to nothing at the rim.
    pub fn paint_brush(&mut self, x: f32, y: f32, radius: f32, value: f32, strength: f32) -> Result<()> {
        ensure!(radius > 0.0, "brush radius must be positive, got {}", radius);

        let u = (x - self.min_x) / (self.max_x - self.min_x);
        let v = (y - self.min_y) / (self.max_y - self.min_y);
        let center_x = (u * (self.width - 1) as f32) as i32;
        let center_y = (v * (self.height - 1) as f32) as i32;

        let radius_pixels = radius * self.width as f32 / (self.max_x - self.min_x);
        let reach = radius_pixels.ceil() as i32;

        for dy in -reach..=reach {
            for dx in -reach..=reach {
                let px = center_x + dx;
                let py = center_y + dy;
                if px < 0 || px >= self.width as i32 || py < 0 || py >= self.height as i32 {
                    continue;
                }

                let dist = ((dx * dx + dy * dy) as f32).sqrt();
                if dist > radius_pixels {
                    continue;
                }

                let falloff = 1.0 - dist / radius_pixels;
                let weight = strength * falloff * falloff;
                let cell = &mut self.data[py as usize * self.width + px as usize];
                *cell += (value - *cell) * weight;
            }
        }
        Ok(())
    }

    /// Evaluate `f(world_x, world_y)` at every grid node.
    pub fn fill_procedural<F: Fn(f32, f32) -> f32>(&mut self, f: F) {
        for y in 0..self.height {
            for x in 0..self.width {
                let world_x = self.min_x + (self.max_x - self.min_x) * x as f32 / (self.width - 1) as f32;
                let world_y = self.min_y + (self.max_y - self.min_y) * y as f32 / (self.height - 1) as f32;
                self.data[y * self.width + x] = f(world_x, world_y);
            }
        }
    }

    /// Extract one channel of an image into the field, mapped to `[0, 1]`.
    ///
    /// Channels 0-3 select R, G, B, A; anything else takes the RGB mean.
    /// Pixels outside the image keep their current value.
    pub fn load_from_image(&mut self, img: &image::RgbaImage, channel: usize) {
        for y in 0..self.height.min(img.height() as usize) {
            for x in 0..self.width.min(img.width() as usize) {
                let pixel = img.get_pixel(x as u32, y as u32);
                let value = match channel {
                    0 => pixel[0] as f32 / 255.0,
                    1 => pixel[1] as f32 / 255.0,
                    2 => pixel[2] as f32 / 255.0,
                    3 => pixel[3] as f32 / 255.0,
                    _ => (pixel[0] as f32 + pixel[1] as f32 + pixel[2] as f32) / (3.0 * 255.0),
                };
                self.data[y * self.width + x] = value;
            }
        }
    }

    /// Raw grid values, row-major.
    pub fn data(&self) -> &[f32] {
        &self.data
    }
}
