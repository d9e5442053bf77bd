//! Generate a color palette from an image by performing dithered k-means clustering.

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    clippy::missing_docs_in_private_items,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::missing_panics_doc
)]

mod cli;

#[allow(clippy::wildcard_imports)]
use cli::*;

use std::{
    fmt::{self, Display},
    path::{Path, PathBuf},
    process::ExitCode,
    time::Instant,
};

use clap::Parser;
use colored::Colorize;
use image::{DynamicImage, GenericImageView};
use palette::Srgb;
use rand::SeedableRng;
use rand_xoshiro::Xoroshiro128PlusPlus;
use serde_json::{json, Value};
use swatchify::{Hsl, KmeansConfig, Palette, PaletteError, Parameters};

/// Record the running time of a function and print the elapsed time
macro_rules! time {
    ($name: literal, $verbose: expr, $func_call: expr) => {{
        let start = Instant::now();
        let result = $func_call;
        if $verbose {
            println!("{} took {}ms", $name, start.elapsed().as_millis());
        }
        result
    }};
}

/// Error cases for generating the palette of a single image
#[derive(Debug)]
enum AppError {
    /// Failed to read or decode the image file
    ImageLoad(PathBuf, image::ImageError),
    /// k-means could not produce a palette
    Palette(PathBuf, PaletteError),
}

impl Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::ImageLoad(path, e) => {
                write!(f, "Failed to load the image file {}: {e}", path.display())
            }
            AppError::Palette(path, e) => {
                write!(f, "Failed to generate a palette for {}: {e}", path.display())
            }
        }
    }
}

/// A palette color with all of its representations
#[derive(Debug, Clone, PartialEq)]
struct Swatch {
    /// sRGB color
    rgb: Srgb<u8>,
    /// Hex code
    hex: String,
    /// HSL color
    hsl: Hsl,
    /// Number of sampled pixels in this color's cluster
    count: u32,
}

fn main() -> ExitCode {
    let options = Options::parse();

    let results = run_generate_palettes(&options);

    let mut success = true;
    for (path, result) in options.images.iter().zip(results) {
        match result {
            Ok(palette) => {
                let colors = sorted_colors(palette, &options);
                print_palette(path, &colors, &options);
            }
            Err(e) => {
                eprintln!("{e}");
                success = false;
            }
        }
    }

    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Builds a thread pool and then runs `generate_palettes`
#[cfg(feature = "threads")]
fn run_generate_palettes(options: &Options) -> Vec<Result<Palette, AppError>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(usize::from(options.threads))
        .build()
        .expect("initialized thread pool");

    pool.install(|| generate_palettes(options))
}

/// Runs `generate_palettes` on a single thread
#[cfg(not(feature = "threads"))]
fn run_generate_palettes(options: &Options) -> Vec<Result<Palette, AppError>> {
    generate_palettes(options)
}

/// Generate a palette for each image, in parallel
#[cfg(feature = "threads")]
fn generate_palettes(options: &Options) -> Vec<Result<Palette, AppError>> {
    use rayon::prelude::*;

    let seed = options.seed.unwrap_or_else(rand::random);
    options
        .images
        .par_iter()
        .enumerate()
        .map(|(i, path)| generate_palette(path, options, seed ^ i as u64))
        .collect()
}

/// Generate a palette for each image
#[cfg(not(feature = "threads"))]
fn generate_palettes(options: &Options) -> Vec<Result<Palette, AppError>> {
    let seed = options.seed.unwrap_or_else(rand::random);
    options
        .images
        .iter()
        .enumerate()
        .map(|(i, path)| generate_palette(path, options, seed ^ i as u64))
        .collect()
}

/// Load an image and generate its palette using the given options
fn generate_palette(path: &Path, options: &Options, seed: u64) -> Result<Palette, AppError> {
    let image = time!("Image loading", options.verbose, load_image(path))?;
    palette_from_image(&image, options, seed).map_err(|e| AppError::Palette(path.to_owned(), e))
}

/// Load the image at the given path
fn load_image(path: &Path) -> Result<DynamicImage, AppError> {
    image::open(path).map_err(|e| AppError::ImageLoad(path.to_owned(), e))
}

/// Sample, dither, and cluster an image
fn palette_from_image(
    image: &DynamicImage,
    options: &Options,
    seed: u64,
) -> Result<Palette, PaletteError> {
    let Options {
        width,
        height,
        max_iter,
        init_retries,
        distinct,
        verbose,
        ..
    } = *options;

    let params = Parameters::from_raw(options.palette_size.as_ref(), options.variance.as_ref());
    let config = KmeansConfig {
        max_iter,
        init_retries,
        allow_duplicate_centroids: !distinct,
    };

    if verbose {
        let (image_width, image_height) = image.dimensions();
        println!("Resizing {image_width}x{image_height} image to {width}x{height} for sampling");
        println!(
            "Using a palette size of {} and a variance of {} (dither magnitude {:.2}) with seed {seed}",
            params.palette_size(),
            params.variance(),
            swatchify::dither_magnitude(params.palette_size(), params.variance()),
        );
    }

    let samples = time!(
        "Sampling",
        verbose,
        swatchify::sample_image(image, width, height)
    );

    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);
    let palette = time!(
        "k-means",
        verbose,
        swatchify::from_samples(samples, params, &config, &mut rng)
    )?;

    if verbose {
        println!(
            "k-means converged after {} iterations with a variance of {:.2}",
            palette.iterations, palette.variance
        );
    }

    Ok(palette)
}

/// Pair up each palette color with its representations, sorting by the given metric.
fn sorted_colors(palette: Palette, options: &Options) -> Vec<Swatch> {
    let Palette {
        rgb,
        hex,
        hsl,
        counts,
        ..
    } = palette;

    let mut colors = rgb
        .into_iter()
        .zip(hex)
        .zip(hsl)
        .zip(counts)
        .map(|(((rgb, hex), hsl), count)| Swatch {
            rgb,
            hex,
            hsl,
            count,
        })
        .collect::<Vec<_>>();

    match options.sort {
        Some(SortOutput::H) => colors.sort_by(|x, y| f64::total_cmp(&x.hsl.h, &y.hsl.h)),
        Some(SortOutput::S) => colors.sort_by(|x, y| f64::total_cmp(&x.hsl.s, &y.hsl.s)),
        Some(SortOutput::L) => colors.sort_by(|x, y| f64::total_cmp(&x.hsl.l, &y.hsl.l)),
        Some(SortOutput::N) => colors.sort_by_key(|color| std::cmp::Reverse(color.count)),
        None => (),
    }

    if options.reverse {
        colors.reverse();
    }

    colors
}

/// Build the JSON object for a palette, with each HSL component as text with two decimal places
fn palette_json(colors: &[Swatch]) -> Value {
    let rgb = colors
        .iter()
        .map(|color| json!({ "r": color.rgb.red, "g": color.rgb.green, "b": color.rgb.blue }))
        .collect::<Vec<_>>();

    let hex = colors
        .iter()
        .map(|color| color.hex.clone())
        .collect::<Vec<_>>();

    let hsl = colors
        .iter()
        .map(|color| {
            let [h, s, l] = color.hsl.to_fixed();
            json!({ "h": h, "s": s, "l": l })
        })
        .collect::<Vec<_>>();

    json!({ "rgb": rgb, "hex": hex, "hsl": hsl })
}

/// Print the given colors based off the provided options
fn print_palette(path: &Path, colors: &[Swatch], options: &Options) {
    let multiple = options.images.len() > 1;
    if multiple && options.output != FormatOutput::Json {
        println!("{}:", path.display());
    }

    match options.output {
        FormatOutput::Hex => color_format_print(colors, options, " ", |color| color.hex.clone()),

        FormatOutput::Rgb => color_format_print(colors, options, " ", |color| {
            format!("({},{},{})", color.rgb.red, color.rgb.green, color.rgb.blue)
        }),

        FormatOutput::Hsl => color_format_print(colors, options, " ", |color| {
            let [h, s, l] = color.hsl.to_fixed();
            format!("({h},{s},{l})")
        }),

        FormatOutput::Swatch => print_colors(colors, "", |color| {
            let Srgb { red, green, blue, .. } = color.rgb;
            "   ".on_truecolor(red, green, blue).to_string()
        }),

        FormatOutput::Json => {
            let mut value = palette_json(colors);
            if multiple {
                value["image"] = json!(path.display().to_string());
            }
            println!("{value}");
        }
    }
}

/// Print a line of colors using the given format
fn print_colors(colors: &[Swatch], delimiter: &str, format: impl Fn(&Swatch) -> String) {
    println!(
        "{}",
        colors
            .iter()
            .map(format)
            .collect::<Vec<_>>()
            .join(delimiter)
    );
}

/// Format, colorize, and then print the text for all colors
fn color_format_print(
    colors: &[Swatch],
    options: &Options,
    delimiter: &str,
    format: impl Fn(&Swatch) -> String,
) {
    match options.colorize {
        Some(ColorizeOutput::Fg) => print_colors(colors, delimiter, |color| {
            let Srgb { red, green, blue, .. } = color.rgb;
            format(color).truecolor(red, green, blue).to_string()
        }),

        Some(ColorizeOutput::Bg) => print_colors(colors, delimiter, |color| {
            let Srgb { red, green, blue, .. } = color.rgb;
            format(color).on_truecolor(red, green, blue).to_string()
        }),

        None => print_colors(colors, delimiter, format),
    }
}
