//! Turns RGBA pixel buffers into color samples for clustering

#[cfg(feature = "image")]
use image::{imageops::FilterType, DynamicImage};

/// Width images are resized to before sampling
pub const SAMPLE_WIDTH: u32 = 200;
/// Height images are resized to before sampling
pub const SAMPLE_HEIGHT: u32 = 200;

/// Number of bytes per RGBA pixel
const CHANNELS: usize = 4;

/// A real valued RGB color with channels nominally in `0.0..=255.0`
///
/// Channels may leave this range after dithering.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColorSample {
	/// Red channel
	pub r: f64,
	/// Green channel
	pub g: f64,
	/// Blue channel
	pub b: f64,
}

impl ColorSample {
	/// Create a new sample from its channels
	#[must_use]
	pub const fn new(r: f64, g: f64, b: f64) -> Self {
		Self { r, g, b }
	}

	/// Squared euclidean distance between two colors
	#[must_use]
	pub fn squared_distance(self, other: Self) -> f64 {
		let dr = self.r - other.r;
		let dg = self.g - other.g;
		let db = self.b - other.b;
		dr * dr + dg * dg + db * db
	}
}

impl From<[u8; 3]> for ColorSample {
	fn from([r, g, b]: [u8; 3]) -> Self {
		Self::new(f64::from(r), f64::from(g), f64::from(b))
	}
}

/// Convert interleaved RGBA bytes into color samples, discarding alpha.
///
/// The output keeps the row-major pixel order of the buffer.
/// A trailing partial pixel is ignored.
#[must_use]
pub fn sample(buffer: &[u8]) -> Vec<ColorSample> {
	buffer
		.chunks_exact(CHANNELS)
		.map(|pixel| ColorSample::from([pixel[0], pixel[1], pixel[2]]))
		.collect()
}

/// Resize `image` to exactly `width` x `height` and sample its pixels.
///
/// The aspect ratio is not preserved.
#[cfg(feature = "image")]
#[must_use]
pub fn sample_image(image: &DynamicImage, width: u32, height: u32) -> Vec<ColorSample> {
	let resized = if image.width() == width && image.height() == height {
		image.to_rgba8()
	} else {
		image.resize_exact(width, height, FilterType::Triangle).into_rgba8()
	};

	sample(resized.as_raw())
}
