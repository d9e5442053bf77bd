//! Provides the implementation for k-means

use crate::{ColorSample, PaletteError};
use rand::Rng;

/// The default maximum number of iterations
pub const DEFAULT_MAX_ITER: u32 = 1000;

/// The default number of extra draws made to find a distinct starting centroid
pub const DEFAULT_INIT_RETRIES: u32 = 64;

/// Limits and options for a k-means run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KmeansConfig {
	/// The maximum number of iterations before giving up on convergence
	pub max_iter: u32,
	/// The number of extra random draws allowed when the drawn starting centroid
	/// is equal to an already chosen one
	pub init_retries: u32,
	/// Whether to accept a duplicate starting centroid once `init_retries` is exhausted
	///
	/// If `false`, running out of retries gives [`PaletteError::InsufficientDistinctColors`].
	pub allow_duplicate_centroids: bool,
}

impl Default for KmeansConfig {
	fn default() -> Self {
		Self {
			max_iter: DEFAULT_MAX_ITER,
			init_retries: DEFAULT_INIT_RETRIES,
			allow_duplicate_centroids: true,
		}
	}
}

/// Data for each center/centroid
struct CenterData {
	/// The centroid point
	centroid: Vec<ColorSample>,
	/// Vector sum for all data points in this center
	sum: Vec<ColorSample>,
	/// Number of points in this center
	count: Vec<u32>,
}

impl CenterData {
	/// Create a [`CenterData`] for the given starting centroids
	fn new(centroid: Vec<ColorSample>) -> Self {
		let k = centroid.len();
		Self {
			centroid,
			sum: vec![ColorSample::default(); k],
			count: vec![0; k],
		}
	}
}

/// Result from running k-means
#[derive(Debug, Clone)]
pub struct KmeansResult {
	/// Final centroid colors, one per palette slot
	pub centroids: Vec<ColorSample>,
	/// The index of the centroid each sample was assigned to
	pub assignment: Vec<u8>,
	/// Number of samples in each centroid
	pub counts: Vec<u32>,
	/// Number of elapsed iterations
	pub iterations: u32,
	/// Sum of the squared distances between each sample and its centroid
	///
	/// Not to be confused with the variance parameter that scales the dither magnitude.
	pub variance: f64,
}

impl KmeansResult {
	/// Create an empty result, representing that k-means was run with `k` = 0
	const fn empty() -> Self {
		Self {
			centroids: Vec::new(),
			assignment: Vec::new(),
			counts: Vec::new(),
			iterations: 0,
			variance: 0.0,
		}
	}

	/// Group `samples` by their final centroid.
	///
	/// `samples` should be the same slice given to k-means.
	#[must_use]
	pub fn clusters(&self, samples: &[ColorSample]) -> Vec<Vec<ColorSample>> {
		let mut clusters = self
			.counts
			.iter()
			.map(|&n| Vec::with_capacity(n as usize))
			.collect::<Vec<_>>();

		for (&sample, &center) in samples.iter().zip(&self.assignment) {
			clusters[usize::from(center)].push(sample);
		}

		clusters
	}
}

/// Choose `k` starting centroids by drawing random samples,
/// retrying draws that equal an already chosen centroid
fn init_centroids(
	rng: &mut impl Rng,
	samples: &[ColorSample],
	k: u8,
	config: &KmeansConfig,
) -> Result<Vec<ColorSample>, PaletteError> {
	let mut centroids = Vec::with_capacity(usize::from(k));
	while centroids.len() < usize::from(k) {
		let mut candidate = samples[rng.gen_range(0..samples.len())];
		let mut retries = 0;
		while centroids.contains(&candidate) {
			if retries == config.init_retries {
				if config.allow_duplicate_centroids {
					break;
				}

				// centroids.len() < k
				#[allow(clippy::cast_possible_truncation)]
				return Err(PaletteError::InsufficientDistinctColors {
					found: centroids.len() as u8,
					k,
				});
			}

			candidate = samples[rng.gen_range(0..samples.len())];
			retries += 1;
		}

		centroids.push(candidate);
	}

	Ok(centroids)
}

/// Returns the index of the closest centroid, preferring the lowest index on ties
// i < centroids.len() <= u8::MAX
#[allow(clippy::cast_possible_truncation)]
fn nearest_centroid(sample: ColorSample, centroids: &[ColorSample]) -> u8 {
	let mut min_dist = f64::INFINITY;
	let mut min_center = 0;
	for (i, &centroid) in centroids.iter().enumerate() {
		let dist = sample.squared_distance(centroid);
		if dist < min_dist {
			min_dist = dist;
			min_center = i as u8;
		}
	}
	min_center
}

/// For each data point, update its assigned center
fn update_assignments(samples: &[ColorSample], centroids: &[ColorSample], assignment: &mut [u8]) {
	for (&sample, center) in samples.iter().zip(assignment) {
		*center = nearest_centroid(sample, centroids);
	}
}

/// Recompute each centroid as the mean of its assigned samples.
///
/// Centers without any samples are moved to a random sample.
/// Returns whether every centroid kept exactly the same value.
/// A reseeded center that lands on the color of an occupied center counts as unchanged,
/// since it stays empty for as long as that color does.
fn update_centroids(
	rng: &mut impl Rng,
	samples: &[ColorSample],
	centers: &mut CenterData,
	assignment: &[u8],
) -> bool {
	// Sums are rebuilt in sample order every iteration,
	// so an unchanged assignment always reproduces the same means.
	centers.sum.fill(ColorSample::default());
	centers.count.fill(0);

	for (&sample, &center) in samples.iter().zip(assignment) {
		let i = usize::from(center);
		let sum = &mut centers.sum[i];
		sum.r += sample.r;
		sum.g += sample.g;
		sum.b += sample.b;
		centers.count[i] += 1;
	}

	let mut unchanged = true;
	let mut moved_empty = Vec::new();
	for (i, ((centroid, &n), sum)) in centers
		.centroid
		.iter_mut()
		.zip(&centers.count)
		.zip(&centers.sum)
		.enumerate()
	{
		if n == 0 {
			let new_centroid = samples[rng.gen_range(0..samples.len())];
			if new_centroid != *centroid {
				moved_empty.push(i);
			}
			*centroid = new_centroid;
		} else {
			let n = f64::from(n);
			let new_centroid = ColorSample::new(sum.r / n, sum.g / n, sum.b / n);
			unchanged &= new_centroid == *centroid;
			*centroid = new_centroid;
		}
	}

	unchanged
		&& moved_empty.into_iter().all(|i| {
			let moved = centers.centroid[i];
			centers
				.centroid
				.iter()
				.zip(&centers.count)
				.any(|(&other, &n)| n > 0 && other == moved)
		})
}

/// Run k-means until no centroid changes.
///
/// Returns [`PaletteError::EmptyInput`] if there are no samples and
/// [`PaletteError::ClusteringDidNotConverge`] if `config.max_iter` iterations pass without convergence.
/// If `k` is `0`, the result has no centroids.
pub fn run(
	samples: &[ColorSample],
	k: u8,
	config: &KmeansConfig,
	rng: &mut impl Rng,
) -> Result<KmeansResult, PaletteError> {
	if samples.is_empty() {
		return Err(PaletteError::EmptyInput);
	}
	if k == 0 {
		return Ok(KmeansResult::empty());
	}

	let mut centers = CenterData::new(init_centroids(rng, samples, k, config)?);
	let mut assignment = vec![0; samples.len()];

	let mut iterations = 0;
	loop {
		if iterations == config.max_iter {
			return Err(PaletteError::ClusteringDidNotConverge { iterations });
		}

		update_assignments(samples, &centers.centroid, &mut assignment);
		let converged = update_centroids(rng, samples, &mut centers, &assignment);
		iterations += 1;

		if converged {
			break;
		}
	}

	let variance = samples
		.iter()
		.zip(&assignment)
		.map(|(&sample, &center)| sample.squared_distance(centers.centroid[usize::from(center)]))
		.sum::<f64>();

	Ok(KmeansResult {
		centroids: centers.centroid,
		assignment,
		counts: centers.count,
		iterations,
		variance,
	})
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand_xoshiro::Xoroshiro128PlusPlus;

	fn rng(seed: u64) -> Xoroshiro128PlusPlus {
		Xoroshiro128PlusPlus::seed_from_u64(seed)
	}

	fn solid_regions(colors: &[ColorSample], size: usize) -> Vec<ColorSample> {
		colors.iter().flat_map(|&color| std::iter::repeat(color).take(size)).collect()
	}

	fn test_colors() -> Vec<ColorSample> {
		vec![
			ColorSample::new(230.0, 25.0, 40.0),
			ColorSample::new(20.0, 140.0, 60.0),
			ColorSample::new(30.0, 50.0, 200.0),
			ColorSample::new(250.0, 220.0, 90.0),
		]
	}

	#[test]
	fn single_color_converges_in_one_iteration() {
		let color = ColorSample::new(12.0, 34.0, 56.0);
		let samples = vec![color; 100];

		let result = run(&samples, 1, &KmeansConfig::default(), &mut rng(0)).unwrap();

		assert_eq!(result.iterations, 1);
		assert_eq!(result.centroids, vec![color]);
		assert_eq!(result.counts, vec![100]);
		#[allow(clippy::float_cmp)]
		{
			assert_eq!(result.variance, 0.0);
		}
	}

	#[test]
	fn distinct_regions_are_recovered() {
		let colors = test_colors();
		let samples = solid_regions(&colors, 50);
		let config = KmeansConfig { init_retries: 1000, ..KmeansConfig::default() };

		for seed in 0..8 {
			let result = run(&samples, 4, &config, &mut rng(seed)).unwrap();

			assert_eq!(result.centroids.len(), 4);
			for color in &colors {
				assert!(result.centroids.contains(color));
			}
			assert!(result.counts.iter().all(|&n| n == 50));
		}
	}

	#[test]
	fn k_greater_than_distinct_colors_gives_k_centroids() {
		let colors = &test_colors()[..2];
		let samples = solid_regions(colors, 20);

		for seed in 0..8 {
			let result = run(&samples, 5, &KmeansConfig::default(), &mut rng(seed)).unwrap();
			assert_eq!(result.centroids.len(), 5);
			assert!(result.centroids.iter().all(|c| colors.contains(c)));
			assert_eq!(result.counts.iter().sum::<u32>(), 40);
		}
	}

	#[test]
	fn duplicates_can_be_disallowed() {
		let colors = &test_colors()[..2];
		let samples = solid_regions(colors, 20);
		let config = KmeansConfig {
			allow_duplicate_centroids: false,
			..KmeansConfig::default()
		};

		let result = run(&samples, 3, &config, &mut rng(0));
		assert!(matches!(
			result,
			Err(PaletteError::InsufficientDistinctColors { found: 2, k: 3 })
		));
	}

	#[test]
	fn zero_retries_still_chooses_k_centroids() {
		let samples = vec![ColorSample::new(1.0, 1.0, 1.0); 10];
		let config = KmeansConfig { init_retries: 0, ..KmeansConfig::default() };

		let centroids = init_centroids(&mut rng(0), &samples, 3, &config).unwrap();
		assert_eq!(centroids.len(), 3);
	}

	#[test]
	fn empty_input_is_rejected() {
		let result = run(&[], 4, &KmeansConfig::default(), &mut rng(0));
		assert!(matches!(result, Err(PaletteError::EmptyInput)));
	}

	#[test]
	fn zero_k_gives_no_centroids() {
		let samples = test_colors();
		let result = run(&samples, 0, &KmeansConfig::default(), &mut rng(0)).unwrap();
		assert!(result.centroids.is_empty());
		assert_eq!(result.iterations, 0);
	}

	#[test]
	fn ties_go_to_the_first_centroid() {
		let centroids = [
			ColorSample::new(0.0, 0.0, 0.0),
			ColorSample::new(10.0, 0.0, 0.0),
			ColorSample::new(10.0, 0.0, 0.0),
		];

		assert_eq!(nearest_centroid(ColorSample::new(5.0, 0.0, 0.0), &centroids), 0);
		assert_eq!(nearest_centroid(ColorSample::new(9.0, 0.0, 0.0), &centroids), 1);
	}

	#[test]
	fn empty_center_is_reseeded_to_a_sample() {
		let color = ColorSample::new(7.0, 7.0, 7.0);
		let samples = vec![color; 8];
		let mut centers = CenterData::new(vec![color, ColorSample::new(255.0, 255.0, 255.0)]);
		let assignment = vec![0; samples.len()];

		let unchanged = update_centroids(&mut rng(0), &samples, &mut centers, &assignment);

		// the empty center now shares the occupied center's color
		assert!(unchanged);
		assert_eq!(centers.centroid, vec![color, color]);
		assert_eq!(centers.count, vec![8, 0]);
	}

	#[test]
	fn reseeding_to_a_new_color_is_a_change() {
		let samples = vec![ColorSample::new(0.0, 0.0, 0.0), ColorSample::new(100.0, 0.0, 0.0)];
		let far = ColorSample::new(255.0, 255.0, 255.0);
		let mut centers = CenterData::new(vec![ColorSample::new(50.0, 0.0, 0.0), far]);

		let unchanged = update_centroids(&mut rng(0), &samples, &mut centers, &[0, 0]);

		// the empty center moved to one of the samples, neither of which is the occupied mean
		assert!(!unchanged);
		assert!(samples.contains(&centers.centroid[1]));
	}

	#[test]
	fn few_colors_with_large_k_converge() {
		let colors = &test_colors()[..2];
		let samples = colors
			.iter()
			.copied()
			.cycle()
			.take(40_000)
			.collect::<Vec<_>>();

		for seed in 0..10 {
			let result = run(&samples, 16, &KmeansConfig::default(), &mut rng(seed)).unwrap();
			assert_eq!(result.centroids.len(), 16);
			assert!(result.centroids.iter().all(|c| colors.contains(c)));
			assert!(result.iterations <= 3);
		}
	}

	#[test]
	fn update_centroids_takes_the_mean() {
		let samples = vec![
			ColorSample::new(0.0, 10.0, 20.0),
			ColorSample::new(2.0, 20.0, 40.0),
			ColorSample::new(100.0, 100.0, 100.0),
		];
		let mut centers = CenterData::new(vec![samples[0], samples[2]]);

		let unchanged = update_centroids(&mut rng(0), &samples, &mut centers, &[0, 0, 1]);

		assert!(!unchanged);
		assert_eq!(centers.centroid, vec![ColorSample::new(1.0, 15.0, 30.0), samples[2]]);
		assert_eq!(centers.count, vec![2, 1]);
	}

	fn spread_samples() -> Vec<ColorSample> {
		// no sample lies on the mean of any group of samples
		[0.0, 3.0, 10.0, 13.0]
			.into_iter()
			.map(|r| ColorSample::new(r, 0.0, 0.0))
			.collect()
	}

	#[test]
	fn max_iter_reached() {
		let samples = spread_samples();

		let config = KmeansConfig { max_iter: 1, ..KmeansConfig::default() };
		let result = run(&samples, 2, &config, &mut rng(0));
		assert!(matches!(result, Err(PaletteError::ClusteringDidNotConverge { iterations: 1 })));

		let converged = run(&samples, 2, &KmeansConfig { max_iter: 16, ..config }, &mut rng(0)).unwrap();
		assert!(converged.iterations > 1 && converged.iterations < 16);
	}

	#[test]
	fn representative_inputs_converge() {
		let mut samples = Vec::new();
		for r in (0..=255).step_by(32) {
			for g in (0..=255).step_by(32) {
				for b in (0..=255).step_by(64) {
					samples.push(ColorSample::new(f64::from(r), f64::from(g), f64::from(b)));
				}
			}
		}

		let config = KmeansConfig { max_iter: 300, ..KmeansConfig::default() };
		for k in [1, 2, 4, 8, 16] {
			for seed in 0..3 {
				let mut samples = samples.clone();
				let magnitude = crate::dither::dither_magnitude(k, 5);
				crate::dither::dither(&mut samples, magnitude, &mut rng(seed));

				let result = run(&samples, k, &config, &mut rng(seed)).unwrap();
				assert_eq!(result.centroids.len(), usize::from(k));
				assert!(result.iterations < config.max_iter);
			}
		}
	}

	#[test]
	fn clusters_match_counts() {
		let samples = solid_regions(&test_colors(), 10);
		let result = run(&samples, 3, &KmeansConfig::default(), &mut rng(1)).unwrap();
		let clusters = result.clusters(&samples);

		assert_eq!(clusters.len(), 3);
		for ((cluster, &count), &centroid) in clusters.iter().zip(&result.counts).zip(&result.centroids) {
			assert_eq!(cluster.len(), count as usize);
			for &sample in cluster {
				assert!(result.centroids.iter().all(|&other| {
					sample.squared_distance(centroid) <= sample.squared_distance(other)
				}));
			}
		}
	}
}
