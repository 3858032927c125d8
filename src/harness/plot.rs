//! Scatter plots of benchmark timings, and a TGA encoder to save them.

use alloc::vec;
use alloc::vec::Vec;

use thiserror::Error;

use super::BenchSample;

/// A 24-bit color.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Self = Self::new(0xFF, 0xFF, 0xFF);
    pub const GRAY: Self = Self::new(0x80, 0x80, 0x80);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Receives a finished image.
///
/// Pixels are row-major, starting at the bottom-left corner.
pub trait ImageSink {
    type Error;

    /// Accepts a `width` x `height` image.
    ///
    /// # Errors
    ///
    /// Implementation defined; [`TgaEncoder`] rejects a pixel buffer of the wrong size.
    fn write_image(&mut self, width: u16, height: u16, pixels: &[Rgb]) -> Result<(), Self::Error>;
}

/// Errors from [`TgaEncoder`].
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum PlotError {
    #[error("image is {width}x{height} but {actual} pixels were supplied")]
    PixelCount { width: u16, height: u16, actual: usize },
}

/// Encodes images as uncompressed truecolor TGA (image type 2, 24 bpp, bottom-left origin).
#[derive(Clone, Debug, Default)]
pub struct TgaEncoder {
    bytes: Vec<u8>,
}

impl TgaEncoder {
    const HEADER_LEN: usize = 18;
    const TRUECOLOR: u8 = 2;
    const BITS_PER_PIXEL: u8 = 24;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The last encoded image. Empty until [`write_image`](ImageSink::write_image) succeeds.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl ImageSink for TgaEncoder {
    type Error = PlotError;

    fn write_image(&mut self, width: u16, height: u16, pixels: &[Rgb]) -> Result<(), PlotError> {
        if pixels.len() != usize::from(width) * usize::from(height) {
            return Err(PlotError::PixelCount { width, height, actual: pixels.len() });
        }

        self.bytes.clear();
        self.bytes.reserve(Self::HEADER_LEN + pixels.len() * 3);
        // No image id, no color map, origin (0, 0), descriptor 0 (bottom-left).
        self.bytes.extend_from_slice(&[0, 0, Self::TRUECOLOR, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        self.bytes.extend_from_slice(&width.to_le_bytes());
        self.bytes.extend_from_slice(&height.to_le_bytes());
        self.bytes.extend_from_slice(&[Self::BITS_PER_PIXEL, 0]);
        for pixel in pixels {
            self.bytes.extend_from_slice(&[pixel.b, pixel.g, pixel.r]);
        }
        Ok(())
    }
}

/// Which batch a marker stands for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Marker {
    /// Filled square.
    Insert,
    /// Plus sign.
    Lookup,
    /// Diagonal cross.
    Delete,
}

/// Benchmark timings drawn as points: table size on x, milliseconds on y.
///
/// Each tree gets its own color and each operation its own marker shape.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScatterPlot {
    width: u16,
    height: u16,
    pixels: Vec<Rgb>,
}

impl ScatterPlot {
    const MARGIN: usize = 8;

    /// Renders `samples` on a white `width` x `height` canvas with gray axes. Both axes
    /// start at zero and are scaled to the largest size and timing.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn render(samples: &[BenchSample], width: u16, height: u16) -> Self {
        let mut plot = Self {
            width,
            height,
            pixels: vec![Rgb::WHITE; usize::from(width) * usize::from(height)],
        };

        let (w, h) = (usize::from(width), usize::from(height));
        if w <= Self::MARGIN * 3 || h <= Self::MARGIN * 3 {
            return plot;
        }
        for x in Self::MARGIN..w - Self::MARGIN {
            plot.set(x, Self::MARGIN, Rgb::GRAY);
        }
        for y in Self::MARGIN..h - Self::MARGIN {
            plot.set(Self::MARGIN, y, Rgb::GRAY);
        }

        let max_size = samples.iter().map(|sample| sample.size).max().unwrap_or(0);
        let max_ms = samples
            .iter()
            .flat_map(|sample| [sample.insert_ms, sample.lookup_ms, sample.delete_ms])
            .fold(0.0_f64, f64::max);
        if max_size == 0 {
            return plot;
        }

        let span_x = (w - Self::MARGIN * 3) as f64;
        let span_y = (h - Self::MARGIN * 3) as f64;
        for sample in samples {
            let color = palette(sample.tree);
            let x = Self::MARGIN + scale(f64::from(sample.size) / f64::from(max_size), span_x);
            for (ms, marker) in [
                (sample.insert_ms, Marker::Insert),
                (sample.lookup_ms, Marker::Lookup),
                (sample.delete_ms, Marker::Delete),
            ] {
                let fraction = if max_ms > 0.0 { ms / max_ms } else { 0.0 };
                let y = Self::MARGIN + scale(fraction, span_y);
                plot.mark(x, y, marker, color);
            }
        }
        plot
    }

    #[must_use]
    pub fn width(&self) -> u16 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Row-major pixels, bottom row first.
    #[must_use]
    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    /// Color at `(x, y)`, with `y = 0` at the bottom.
    #[must_use]
    pub fn pixel(&self, x: u16, y: u16) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(usize::from(y) * usize::from(self.width) + usize::from(x)).copied()
    }

    /// Hands the image to `sink`.
    ///
    /// # Errors
    ///
    /// Whatever the sink reports.
    pub fn write_to<S: ImageSink + ?Sized>(&self, sink: &mut S) -> Result<(), S::Error> {
        sink.write_image(self.width, self.height, &self.pixels)
    }

    fn mark(&mut self, x: usize, y: usize, marker: Marker, color: Rgb) {
        for dx in -2_isize..=2 {
            for dy in -2_isize..=2 {
                let on = match marker {
                    Marker::Insert => dx.abs() <= 1 && dy.abs() <= 1,
                    Marker::Lookup => dx == 0 || dy == 0,
                    Marker::Delete => dx.abs() == dy.abs(),
                };
                if on && let (Some(px), Some(py)) = (x.checked_add_signed(dx), y.checked_add_signed(dy)) {
                    self.set(px, py, color);
                }
            }
        }
    }

    fn set(&mut self, x: usize, y: usize, color: Rgb) {
        if x < usize::from(self.width) && y < usize::from(self.height) {
            self.pixels[y * usize::from(self.width) + x] = color;
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale(fraction: f64, span: f64) -> usize {
    (fraction.clamp(0.0, 1.0) * span + 0.5) as usize
}

fn palette(tree: &str) -> Rgb {
    match tree {
        "llrb" => Rgb::new(0xD0, 0x20, 0x20),
        "basic-rb" => Rgb::new(0x20, 0x40, 0xD0),
        "two-three" => Rgb::new(0x20, 0xA0, 0x30),
        _ => Rgb::new(0x20, 0x20, 0x20),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample(tree: &'static str, size: u32, ms: f64) -> BenchSample {
        BenchSample { tree, size, insert_ms: ms, lookup_ms: ms / 2.0, delete_ms: ms / 4.0 }
    }

    #[test]
    fn tga_header_and_pixel_order() {
        let mut encoder = TgaEncoder::new();
        encoder.write_image(2, 1, &[Rgb::new(1, 2, 3), Rgb::new(4, 5, 6)]).unwrap();

        let bytes = encoder.bytes();
        assert_eq!(bytes.len(), 18 + 6);
        assert_eq!(bytes[2], 2);
        assert_eq!(&bytes[12..14], &[2, 0]);
        assert_eq!(&bytes[14..16], &[1, 0]);
        assert_eq!(bytes[16], 24);
        assert_eq!(bytes[17], 0);
        assert_eq!(&bytes[18..], &[3, 2, 1, 6, 5, 4]);
    }

    #[test]
    fn tga_rejects_wrong_pixel_count() {
        let mut encoder = TgaEncoder::new();
        assert_eq!(
            encoder.write_image(3, 3, &[Rgb::WHITE; 4]),
            Err(PlotError::PixelCount { width: 3, height: 3, actual: 4 })
        );
        assert!(encoder.bytes().is_empty());
    }

    #[test]
    fn empty_plot_is_white_with_axes() {
        let plot = ScatterPlot::render(&[], 64, 48);
        assert_eq!(plot.pixels().len(), 64 * 48);
        assert_eq!(plot.pixel(0, 0), Some(Rgb::WHITE));
        assert_eq!(plot.pixel(20, 8), Some(Rgb::GRAY));
        assert_eq!(plot.pixel(8, 20), Some(Rgb::GRAY));
        assert_eq!(plot.pixel(64, 0), None);
    }

    #[test]
    fn largest_sample_lands_top_right() {
        let plot = ScatterPlot::render(&[sample("llrb", 100, 10.0), sample("two-three", 50, 5.0)], 100, 100);
        // x = 8 + 76, y = 8 + 76 for the largest size and timing.
        assert_eq!(plot.pixel(84, 84), Some(palette("llrb")));
        assert_eq!(plot.pixel(46, 46), Some(palette("two-three")));
    }

    #[test]
    fn narrow_canvas_stays_blank() {
        let samples = [sample("llrb", 100, 10.0)];
        for (width, height) in [(20, 100), (100, 20), (24, 24), (0, 0)] {
            let plot = ScatterPlot::render(&samples, width, height);
            assert_eq!(plot.pixels().len(), usize::from(width) * usize::from(height));
            assert!(plot.pixels().iter().all(|&pixel| pixel == Rgb::WHITE));
        }

        let smallest = ScatterPlot::render(&samples, 25, 25);
        assert_eq!(smallest.pixel(9, 9), Some(palette("llrb")));
    }

    #[test]
    fn plot_round_trips_through_sink() {
        let plot = ScatterPlot::render(&[sample("basic-rb", 10, 1.0)], 32, 32);
        let mut encoder = TgaEncoder::new();
        plot.write_to(&mut encoder).unwrap();
        assert_eq!(encoder.into_bytes().len(), 18 + 32 * 32 * 3);
    }
}
