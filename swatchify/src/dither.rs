//! Adds random noise to color samples before clustering

use crate::ColorSample;
use rand::{distributions::Uniform, prelude::Distribution, Rng};

/// The dither magnitude at a palette size of 1 or 2 and the maximum variance, times ten
const MAX_DITHER: f64 = 400.0;

/// Returns the full width of the noise interval for the given palette size and variance.
///
/// Fewer colors or a higher variance give stronger noise,
/// since each cluster has to absorb more of the image's variation.
#[must_use]
pub fn dither_magnitude(palette_size: u8, variance: u8) -> f64 {
	let max_dither = MAX_DITHER / (f64::from(palette_size) / 2.0).ceil();
	(max_dither / 10.0) * f64::from(variance)
}

/// Add uniform noise in `(-magnitude / 2, magnitude / 2)` to each channel of each sample.
///
/// No random numbers are drawn if `magnitude` is zero.
pub fn dither(samples: &mut [ColorSample], magnitude: f64, rng: &mut impl Rng) {
	if magnitude <= 0.0 {
		return;
	}

	let half = magnitude / 2.0;
	let noise = Uniform::new(-half, half);
	for sample in samples {
		sample.r += noise.sample(rng);
		sample.g += noise.sample(rng);
		sample.b += noise.sample(rng);
	}
}
