//! Extract a representative color palette from an image using dithered k-means clustering.
//!
//! # Examples
//!
#![cfg_attr(
	feature = "image",
	doc = r##"## Read an image file and get its palette.

```no_run
# use swatchify::{Parameters, SAMPLE_HEIGHT, SAMPLE_WIDTH};
# fn main() -> Result<(), Box<dyn std::error::Error>> {
let image = image::open("some image")?;
let pixels = image.resize_exact(SAMPLE_WIDTH, SAMPLE_HEIGHT, image::imageops::FilterType::Triangle).into_rgba8();
let palette = swatchify::extract_palette(pixels.as_raw(), Parameters::from_raw("6", "5"), 0)?;
println!("{:?}", palette.hex);
# Ok(())
# }
```
"##
)]
//!
//! ## Provide your own random number generator and limits.
//!
//! ```
//! # use swatchify::{KmeansConfig, Parameters};
//! use rand::SeedableRng;
//!
//! let pixels = [255, 0, 0, 255, 0, 0, 255, 255];
//! let config = KmeansConfig { max_iter: 64, ..KmeansConfig::default() };
//! let mut rng = rand_xoshiro::Xoroshiro128PlusPlus::seed_from_u64(42);
//!
//! let palette = swatchify::extract_palette_with(&pixels, Parameters::from_raw(2, 0), &config, &mut rng).unwrap();
//! assert_eq!(palette.rgb.len(), 2);
//! ```
//!
//! # Arguments
//!
//! ## Palette Size
//!
//! The number of colors to find, clamped into `1..=16` with a default of 4.
//! The palette always holds exactly this many colors,
//! even if the image has fewer distinct colors, in which case some colors are repeated.
//!
//! ## Variance
//!
//! How strongly the pixels are dithered before clustering, clamped into `0..=10` with a default of 5.
//!
//! Without dithering, k-means tends to let large flat regions dominate the palette
//! and starves small but visually distinct regions of a color.
//! Noise softens the boundaries between nearly equal colors.
//! The noise magnitude grows with the variance and shrinks as the palette size grows.
//! A variance of `0` disables dithering entirely.
//!
//! Any dithering makes the result depend on the random seed.
//!
//! ## Seed
//!
//! This is the value used to seed the random number generator
//! which is used for dithering and for choosing the initial centroids.

#![deny(unsafe_code)]
#![warn(clippy::pedantic, clippy::cargo)]
#![warn(clippy::use_debug, clippy::dbg_macro, clippy::todo, clippy::unimplemented)]
#![warn(clippy::unwrap_used, clippy::unwrap_in_result)]
#![warn(clippy::unneeded_field_pattern, clippy::rest_pat_in_fully_bound_structs)]
#![warn(clippy::unnecessary_self_imports)]
#![warn(clippy::str_to_string, clippy::string_to_string, clippy::string_slice)]
#![warn(missing_docs, clippy::missing_docs_in_private_items, rustdoc::all)]
#![warn(clippy::float_cmp_const, clippy::lossy_float_literal)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::many_single_char_names)]

use palette::Srgb;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoroshiro128PlusPlus;
use std::{
	error::Error,
	fmt::{self, Display},
};

mod convert;
mod dither;
mod kmeans;
mod params;
mod sample;

pub use convert::{rgb_to_hex, rgb_to_hsl, round_centroid, to_hex, to_hsl, Hsl};
pub use dither::{dither, dither_magnitude};
pub use kmeans::{run as cluster, KmeansConfig, KmeansResult, DEFAULT_INIT_RETRIES, DEFAULT_MAX_ITER};
pub use params::{
	normalize, Parameters, RawValue, DEFAULT_PALETTE_SIZE, DEFAULT_VARIANCE, MAX_PALETTE_SIZE, MAX_VARIANCE,
	MIN_PALETTE_SIZE, MIN_VARIANCE,
};
#[cfg(feature = "image")]
pub use sample::sample_image;
pub use sample::{sample, ColorSample, SAMPLE_HEIGHT, SAMPLE_WIDTH};

/// Error cases for palette extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteError {
	/// The pixel buffer held no complete pixels
	EmptyInput,
	/// Fewer than `k` distinct colors could be found for the starting centroids
	/// while duplicate centroids were disallowed
	InsufficientDistinctColors {
		/// The number of distinct starting centroids that were found
		found: u8,
		/// The requested number of centroids
		k: u8,
	},
	/// The centroids were still changing after the maximum number of iterations
	ClusteringDidNotConverge {
		/// The number of iterations that were run
		iterations: u32,
	},
}

impl Display for PaletteError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			PaletteError::EmptyInput => write!(f, "The image has no pixels to sample"),
			PaletteError::InsufficientDistinctColors { found, k } => {
				write!(f, "Only found {found} distinct colors for a palette of {k} colors")
			},
			PaletteError::ClusteringDidNotConverge { iterations } => {
				write!(f, "k-means did not converge after {iterations} iterations")
			},
		}
	}
}

impl Error for PaletteError {}

/// A color palette and its representations, all in the same order
#[derive(Debug, Clone)]
pub struct Palette {
	/// The palette colors, rounded and clamped
	pub rgb: Vec<Srgb<u8>>,
	/// Uppercase hex codes of each color, e.g. `#0FFF00`
	pub hex: Vec<String>,
	/// Each color in HSL
	pub hsl: Vec<Hsl>,
	/// Number of pixels in each color's cluster
	pub counts: Vec<u32>,
	/// Number of k-means iterations needed to converge
	pub iterations: u32,
	/// Sum of the squared distances between each (dithered) pixel and its cluster's centroid
	///
	/// This measures how well the palette fits the pixels.
	/// It is unrelated to the variance parameter in [`Parameters`], which only sets the dither strength.
	pub variance: f64,
}

impl From<KmeansResult> for Palette {
	fn from(result: KmeansResult) -> Self {
		let rgb = result.centroids.into_iter().map(round_centroid).collect::<Vec<_>>();
		Self {
			hex: rgb_to_hex(&rgb),
			hsl: rgb_to_hsl(&rgb),
			rgb,
			counts: result.counts,
			iterations: result.iterations,
			variance: result.variance,
		}
	}
}

/// Extract a palette from interleaved RGBA pixel bytes.
///
/// The random number generator is seeded with `seed`.
/// See the crate documentation for information on each argument.
///
/// # Errors
/// See [`extract_palette_with`].
pub fn extract_palette(pixels: &[u8], params: Parameters, seed: u64) -> Result<Palette, PaletteError> {
	let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);
	extract_palette_with(pixels, params, &KmeansConfig::default(), &mut rng)
}

/// Extract a palette from interleaved RGBA pixel bytes using the given k-means limits and random number generator.
///
/// # Errors
/// Returns [`PaletteError::EmptyInput`] if `pixels` holds no complete pixel.
/// The other [`PaletteError`] variants are returned if k-means runs into one of the limits in `config`.
pub fn extract_palette_with(
	pixels: &[u8],
	params: Parameters,
	config: &KmeansConfig,
	rng: &mut impl Rng,
) -> Result<Palette, PaletteError> {
	from_samples(sample(pixels), params, config, rng)
}

/// Dither and cluster already sampled colors into a palette.
///
/// # Errors
/// See [`extract_palette_with`].
pub fn from_samples(
	mut samples: Vec<ColorSample>,
	params: Parameters,
	config: &KmeansConfig,
	rng: &mut impl Rng,
) -> Result<Palette, PaletteError> {
	if samples.is_empty() {
		return Err(PaletteError::EmptyInput);
	}

	let k = params.palette_size();
	dither(&mut samples, dither_magnitude(k, params.variance()), rng);
	kmeans::run(&samples, k, config, rng).map(Palette::from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
	use super::*;

	fn rgba(colors: &[[u8; 3]], pixels_per_color: usize) -> Vec<u8> {
		colors
			.iter()
			.flat_map(|&[r, g, b]| std::iter::repeat([r, g, b, u8::MAX]).take(pixels_per_color))
			.flatten()
			.collect()
	}

	fn gradient(width: u8, height: u8) -> Vec<u8> {
		let mut pixels = Vec::new();
		for y in 0..height {
			for x in 0..width {
				pixels.extend_from_slice(&[x.wrapping_mul(7), y.wrapping_mul(5), x ^ y, u8::MAX]);
			}
		}
		pixels
	}

	#[test]
	fn output_lengths_equal_palette_size() {
		let pixels = gradient(24, 24);
		for k in MIN_PALETTE_SIZE..=MAX_PALETTE_SIZE {
			for variance in MIN_VARIANCE..=MAX_VARIANCE {
				let palette = extract_palette(&pixels, Parameters::from_raw(k, variance), 0).unwrap();
				let k = usize::from(k);
				assert_eq!(palette.rgb.len(), k);
				assert_eq!(palette.hex.len(), k);
				assert_eq!(palette.hsl.len(), k);
				assert_eq!(palette.counts.len(), k);
			}
		}
	}

	#[test]
	fn representations_share_an_order() {
		let palette = extract_palette(&gradient(16, 16), Parameters::default(), 7).unwrap();
		for ((&rgb, hex), &hsl) in palette.rgb.iter().zip(&palette.hex).zip(&palette.hsl) {
			assert_eq!(*hex, to_hex(rgb));
			assert_eq!(hsl, to_hsl(rgb));
		}
	}

	#[test]
	fn no_dither_recovers_solid_regions() {
		let colors = [[200, 30, 30], [30, 200, 30], [30, 30, 200]];
		let pixels = rgba(&colors, 400);
		let config = KmeansConfig { init_retries: 1000, ..KmeansConfig::default() };

		for seed in 0..5 {
			let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);
			let palette = extract_palette_with(&pixels, Parameters::from_raw(3, 0), &config, &mut rng).unwrap();

			for [r, g, b] in colors {
				assert!(palette.rgb.iter().any(|c| {
					c.red.abs_diff(r) <= 1 && c.green.abs_diff(g) <= 1 && c.blue.abs_diff(b) <= 1
				}));
			}
		}
	}

	#[test]
	fn flat_two_color_image_fills_a_large_palette() {
		let pixels = [[255, 0, 0], [0, 0, 255]]
			.into_iter()
			.cycle()
			.take(40_000)
			.flat_map(|[r, g, b]| [r, g, b, u8::MAX])
			.collect::<Vec<_>>();

		for seed in 0..10 {
			let palette = extract_palette(&pixels, Parameters::from_raw(16, 0), seed).unwrap();
			assert_eq!(palette.rgb.len(), 16);
			assert!(palette.hex.iter().all(|hex| hex == "#FF0000" || hex == "#0000FF"));
			assert_eq!(palette.counts.iter().sum::<u32>(), 40_000);
		}
	}

	#[test]
	fn single_color_image() {
		let pixels = rgba(&[[15, 255, 0]], 100);
		let palette = extract_palette(&pixels, Parameters::from_raw(1, 0), 3).unwrap();

		assert_eq!(palette.rgb, vec![Srgb::new(15, 255, 0)]);
		assert_eq!(palette.hex, vec!["#0FFF00".to_owned()]);
		assert_eq!(palette.iterations, 1);
	}

	#[test]
	fn dithered_single_color_stays_in_range() {
		let pixels = rgba(&[[255, 255, 255]], 400);
		let palette = extract_palette(&pixels, Parameters::from_raw(1, 10), 1).unwrap();

		// the mean of the dithered pixels lands near white, possibly above 255 before clamping
		let white = palette.rgb[0];
		assert!(white.red > 200 && white.green > 200 && white.blue > 200);
	}

	#[test]
	fn same_seed_same_palette() {
		let pixels = gradient(20, 20);
		let params = Parameters::from_raw("5", "7");
		let x = extract_palette(&pixels, params, 99).unwrap();
		let y = extract_palette(&pixels, params, 99).unwrap();
		assert_eq!(x.rgb, y.rgb);
		assert_eq!(x.counts, y.counts);
	}

	#[test]
	fn empty_input_is_rejected() {
		assert_eq!(
			extract_palette(&[], Parameters::default(), 0).unwrap_err(),
			PaletteError::EmptyInput
		);
		assert_eq!(
			extract_palette(&[1, 2, 3], Parameters::default(), 0).unwrap_err(),
			PaletteError::EmptyInput
		);
	}

	#[test]
	fn invalid_parameters_use_defaults() {
		let pixels = gradient(8, 8);
		let palette = extract_palette(&pixels, Parameters::from_raw("many", RawValue::Absent), 0).unwrap();
		assert_eq!(palette.rgb.len(), usize::from(DEFAULT_PALETTE_SIZE));
	}
}
