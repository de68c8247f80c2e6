//! Bitmap track used as the collision surface.

use rally_core::{Error, Pixel, Result, Rgb, TrackConfig, Vec2};
use serde::{Deserialize, Serialize};

const TRACK_SURFACE: Rgb = Rgb(255, 255, 255);

/// Immutable 2D color bitmap with a designated boundary color
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    width: i32,
    height: i32,
    boundary_color: Rgb,
    pixels: Vec<Rgb>,
}

impl Track {
    /// Build a track from row-major pixels
    pub fn from_pixels(
        width: i32,
        height: i32,
        boundary_color: Rgb,
        pixels: Vec<Rgb>,
    ) -> Result<Self> {
        if width <= 0 || height <= 0 {
            return Err(Error::InvalidTrack(format!(
                "dimensions must be positive, got {}x{}",
                width, height
            )));
        }
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(Error::InvalidTrack(format!(
                "expected {} pixels for {}x{}, got {}",
                expected,
                width,
                height,
                pixels.len()
            )));
        }

        Ok(Self {
            width,
            height,
            boundary_color,
            pixels,
        })
    }

    /// Build a track from a row-major boundary mask
    pub fn from_mask(width: i32, height: i32, boundary_color: Rgb, mask: &[bool]) -> Result<Self> {
        let surface = if boundary_color == TRACK_SURFACE {
            Rgb(0, 0, 0)
        } else {
            TRACK_SURFACE
        };
        let pixels = mask
            .iter()
            .map(|&wall| if wall { boundary_color } else { surface })
            .collect();
        Self::from_pixels(width, height, boundary_color, pixels)
    }

    /// Track with no boundary pixels at all
    pub fn open(config: &TrackConfig) -> Result<Self> {
        TrackBuilder::new(config).build()
    }

    pub fn dimensions(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn boundary_color(&self) -> Rgb {
        self.boundary_color
    }

    pub fn contains(&self, pixel: Pixel) -> bool {
        pixel.x >= 0 && pixel.x < self.width && pixel.y >= 0 && pixel.y < self.height
    }

    /// Color at a pixel, None outside the bitmap
    pub fn pixel(&self, pixel: Pixel) -> Option<Rgb> {
        if self.contains(pixel) {
            Some(self.pixels[self.pixel_to_index(pixel)])
        } else {
            None
        }
    }

    /// Whether the pixel is impassable. Out-of-bounds pixels are not.
    pub fn is_boundary(&self, pixel: Pixel) -> bool {
        self.pixel(pixel) == Some(self.boundary_color)
    }

    /// Boundary test for a continuous point, truncated to its pixel
    pub fn is_boundary_at(&self, point: Vec2) -> bool {
        self.is_boundary(point.to_pixel())
    }

    /// Number of boundary pixels on the whole track
    pub fn boundary_count(&self) -> usize {
        self.pixels
            .iter()
            .filter(|&&color| color == self.boundary_color)
            .count()
    }

    fn pixel_to_index(&self, pixel: Pixel) -> usize {
        (pixel.y * self.width + pixel.x) as usize
    }
}

/// Paints boundary shapes onto an otherwise open track
#[derive(Debug, Clone)]
pub struct TrackBuilder {
    width: i32,
    height: i32,
    boundary_color: Rgb,
    mask: Vec<bool>,
}

impl TrackBuilder {
    pub fn new(config: &TrackConfig) -> Self {
        let size = config.width.max(0) as usize * config.height.max(0) as usize;
        Self {
            width: config.width,
            height: config.height,
            boundary_color: config.boundary_color,
            mask: vec![false; size],
        }
    }

    /// Mark one pixel as boundary; out-of-bounds pixels are ignored
    pub fn wall(mut self, pixel: Pixel) -> Self {
        self.paint(pixel);
        self
    }

    /// Fill an axis-aligned rectangle (inclusive of `min`, exclusive of `max`)
    pub fn rect(mut self, min: Pixel, max: Pixel) -> Self {
        for y in min.y..max.y {
            for x in min.x..max.x {
                self.paint(Pixel::new(x, y));
            }
        }
        self
    }

    /// Frame of the given thickness around the bitmap edge
    pub fn border(self, thickness: i32) -> Self {
        let (w, h) = (self.width, self.height);
        self.rect(Pixel::new(0, 0), Pixel::new(w, thickness))
            .rect(Pixel::new(0, h - thickness), Pixel::new(w, h))
            .rect(Pixel::new(0, 0), Pixel::new(thickness, h))
            .rect(Pixel::new(w - thickness, 0), Pixel::new(w, h))
    }

    /// Elliptical ring: everything outside `outer` or inside `inner` is boundary.
    ///
    /// Radii are `(rx, ry)` around `center`.
    pub fn ring(mut self, center: Vec2, outer: (f64, f64), inner: (f64, f64)) -> Self {
        let inside = |p: Vec2, (rx, ry): (f64, f64)| {
            let nx = (p.x - center.x) / rx;
            let ny = (p.y - center.y) / ry;
            nx * nx + ny * ny <= 1.0
        };

        for y in 0..self.height {
            for x in 0..self.width {
                let p = Vec2::new(x as f64, y as f64);
                if !inside(p, outer) || inside(p, inner) {
                    self.paint(Pixel::new(x, y));
                }
            }
        }
        self
    }

    pub fn build(self) -> Result<Track> {
        Track::from_mask(self.width, self.height, self.boundary_color, &self.mask)
    }

    fn paint(&mut self, pixel: Pixel) {
        if pixel.x >= 0 && pixel.x < self.width && pixel.y >= 0 && pixel.y < self.height {
            let index = (pixel.y * self.width + pixel.x) as usize;
            self.mask[index] = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> TrackConfig {
        TrackConfig {
            width: 10,
            height: 8,
            ..Default::default()
        }
    }

    #[test]
    fn test_track_creation() {
        let track = Track::open(&small_config()).unwrap();
        assert_eq!(track.dimensions(), (10, 8));
        assert_eq!(track.boundary_count(), 0);
    }

    #[test]
    fn test_rejects_mismatched_pixels() {
        let result = Track::from_pixels(4, 4, Rgb(0, 0, 0), vec![Rgb(1, 1, 1); 15]);
        assert!(matches!(result, Err(Error::InvalidTrack(_))));

        let result = Track::from_pixels(0, 4, Rgb(0, 0, 0), Vec::new());
        assert!(matches!(result, Err(Error::InvalidTrack(_))));
    }

    #[test]
    fn test_out_of_bounds_is_not_boundary() {
        let track = TrackBuilder::new(&small_config()).border(1).build().unwrap();
        assert!(track.is_boundary(Pixel::new(0, 0)));
        assert!(!track.is_boundary(Pixel::new(-1, 0)));
        assert!(!track.is_boundary(Pixel::new(10, 3)));
        assert!(!track.contains(Pixel::new(3, 8)));
        assert_eq!(track.pixel(Pixel::new(3, 8)), None);
    }

    #[test]
    fn test_boundary_color_matching() {
        let wall = Rgb(100, 125, 49);
        let mut pixels = vec![Rgb(0, 0, 0); 4];
        pixels[3] = wall;
        pixels[1] = Rgb(100, 125, 50);
        let track = Track::from_pixels(2, 2, wall, pixels).unwrap();

        assert!(track.is_boundary(Pixel::new(1, 1)));
        // near-miss colors are passable
        assert!(!track.is_boundary(Pixel::new(1, 0)));
    }

    #[test]
    fn test_builder_shapes() {
        let track = TrackBuilder::new(&small_config())
            .wall(Pixel::new(5, 5))
            .wall(Pixel::new(50, 50))
            .rect(Pixel::new(0, 0), Pixel::new(2, 2))
            .build()
            .unwrap();
        assert_eq!(track.boundary_count(), 5);
        assert!(track.is_boundary_at(Vec2::new(5.9, 5.2)));
    }

    #[test]
    fn test_ring_leaves_a_corridor() {
        let config = TrackConfig {
            width: 100,
            height: 100,
            ..Default::default()
        };
        let track = TrackBuilder::new(&config)
            .ring(Vec2::new(50.0, 50.0), (45.0, 45.0), (20.0, 20.0))
            .build()
            .unwrap();

        assert!(track.is_boundary(Pixel::new(50, 50)));
        assert!(track.is_boundary(Pixel::new(0, 0)));
        assert!(!track.is_boundary(Pixel::new(50, 17)));
    }
}
