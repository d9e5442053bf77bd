//! Conversions from clustered centroids to the output color formats

use crate::ColorSample;
use palette::{encoding, FromColor, Srgb};
use std::fmt::{self, Display};

/// An HSL color with each component in `0.0..=1.0`
///
/// Hue is a fraction of a full turn rather than degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Hsl {
	/// Hue
	pub h: f64,
	/// Saturation
	pub s: f64,
	/// Lightness
	pub l: f64,
}

impl Hsl {
	/// The hue, saturation, and lightness as text with two decimal places
	#[must_use]
	pub fn to_fixed(self) -> [String; 3] {
		[format!("{:.2}", self.h), format!("{:.2}", self.s), format!("{:.2}", self.l)]
	}
}

impl Display for Hsl {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "hsl({:.2}, {:.2}, {:.2})", self.h, self.s, self.l)
	}
}

/// Round a centroid to the nearest integer channels, clamping each into `0..=255`.
///
/// Dithering can move centroids slightly outside the valid range.
#[must_use]
pub fn round_centroid(centroid: ColorSample) -> Srgb<u8> {
	/// Round and clamp a single channel
	fn channel(value: f64) -> u8 {
		// clamped into 0.0..=255.0 first
		#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
		{
			value.round().clamp(0.0, 255.0) as u8
		}
	}

	Srgb::new(channel(centroid.r), channel(centroid.g), channel(centroid.b))
}

/// Format a color as an uppercase hex code with a leading `#`
#[must_use]
pub fn to_hex(color: Srgb<u8>) -> String {
	format!("#{color:X}")
}

/// Convert a color to [`Hsl`]
///
/// Achromatic colors get a hue of `0.0`.
#[must_use]
pub fn to_hsl(color: Srgb<u8>) -> Hsl {
	let hsl: palette::Hsl<encoding::Srgb, f64> = palette::Hsl::from_color(color.into_format::<f64>());
	let s = hsl.saturation;
	let h = if s > 0.0 {
		hsl.hue.into_positive_degrees() / 360.0
	} else {
		0.0
	};

	Hsl { h, s, l: hsl.lightness }
}

/// Format each color as a hex code
#[must_use]
pub fn rgb_to_hex(colors: &[Srgb<u8>]) -> Vec<String> {
	colors.iter().copied().map(to_hex).collect()
}

/// Convert each color to [`Hsl`]
#[must_use]
pub fn rgb_to_hsl(colors: &[Srgb<u8>]) -> Vec<Hsl> {
	colors.iter().copied().map(to_hsl).collect()
}
