//! Specifies the CLI and handles arg parsing

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use swatchify::{DEFAULT_INIT_RETRIES, DEFAULT_MAX_ITER, SAMPLE_HEIGHT, SAMPLE_WIDTH};

/// Supported output formats for the final colors
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatOutput {
	/// sRGB hexcode
	Hex,
	/// sRGB (r,g,b) triple
	Rgb,
	/// HSL triple with each component in [0, 1]
	Hsl,
	/// Whitespace with true color background
	Swatch,
	/// JSON object with rgb, hex, and hsl lists
	Json,
}

/// Sort orders for the final colors
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SortOutput {
	/// Ascending hue
	H,
	/// Ascending saturation
	S,
	/// Ascending lightness
	L,
	/// Descending number of pixels
	N,
}

/// Ways to colorize the output text
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorizeOutput {
	/// Foreground
	Fg,
	/// Background
	Bg,
}

/// Generate a color palette for an image by performing dithered k-means clustering.
///
/// Each image is resized to a fixed sample resolution, its pixels are dithered with random noise,
/// and k-means clustering finds the dominant colors.
#[derive(Parser)]
#[command(version)]
pub struct Options {
	/// The paths to the input images
	#[arg(required = true)]
	pub images: Vec<PathBuf>,

	/// The number of colors to find
	///
	/// Values are clamped into [1, 16]. Anything that is not a number falls back to 4, and an empty value counts as 0.
	#[arg(short = 'k', long = "size", allow_hyphen_values = true)]
	pub palette_size: Option<String>,

	/// How strongly to dither the pixels before clustering
	///
	/// Values are clamped into [0, 10]. Anything that is not a number falls back to 5, and an empty value counts as 0.
	/// Higher values let less common colors stand out more but make the result less stable between runs.
	/// A value of 0 disables dithering.
	#[arg(short = 'd', long, allow_hyphen_values = true)]
	pub variance: Option<String>,

	/// The format to print the colors in
	#[arg(short, long, default_value = "hex")]
	pub output: FormatOutput,

	/// Color the foreground or background for each printed color
	#[arg(short, long)]
	pub colorize: Option<ColorizeOutput>,

	/// The order to print the colors in
	///
	/// If not provided, colors are printed in the order of their clusters.
	/// The h, s, and l options refer to HSL component values.
	#[arg(short, long)]
	pub sort: Option<SortOutput>,

	/// Reverse the printed order of the colors
	#[arg(short, long)]
	pub reverse: bool,

	/// The width images are resized to before sampling
	#[arg(long, default_value_t = SAMPLE_WIDTH, value_parser = clap::value_parser!(u32).range(1..))]
	pub width: u32,

	/// The height images are resized to before sampling
	#[arg(long, default_value_t = SAMPLE_HEIGHT, value_parser = clap::value_parser!(u32).range(1..))]
	pub height: u32,

	/// The maximum number of k-means iterations
	///
	/// k-means stops once no cluster changes. If this does not happen within the given number of iterations,
	/// an error is printed instead of a palette.
	#[arg(short = 'i', long, default_value_t = DEFAULT_MAX_ITER)]
	pub max_iter: u32,

	/// The number of extra random draws allowed to find a distinct starting color for each cluster
	#[arg(long, default_value_t = DEFAULT_INIT_RETRIES)]
	pub init_retries: u32,

	/// Fail instead of repeating colors if the image has fewer distinct colors than the palette size
	#[arg(long)]
	pub distinct: bool,

	/// The seed value used for the random number generator
	///
	/// If not provided, a random seed is used, so repeated runs may give different palettes.
	#[arg(long)]
	pub seed: Option<u64>,

	/// The number of threads to use for processing multiple images
	///
	/// A value of 0 indicates to automatically choose the number of threads.
	#[cfg(feature = "threads")]
	#[arg(short, long, default_value_t = 0)]
	pub threads: u8,

	/// Print additional information, such as the number of k-means iterations
	#[arg(long)]
	pub verbose: bool,
}
