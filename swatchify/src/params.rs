//! Normalizes user supplied palette size and variance values

/// The smallest allowed palette size
pub const MIN_PALETTE_SIZE: u8 = 1;
/// The largest allowed palette size
pub const MAX_PALETTE_SIZE: u8 = 16;
/// The palette size used when none or an invalid one is given
pub const DEFAULT_PALETTE_SIZE: u8 = 4;

/// The smallest allowed variance
pub const MIN_VARIANCE: u8 = 0;
/// The largest allowed variance
pub const MAX_VARIANCE: u8 = 10;
/// The variance used when none or an invalid one is given
pub const DEFAULT_VARIANCE: u8 = 5;

/// An unvalidated numeric parameter as received from a caller
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawValue<'a> {
	/// No value was provided
	Absent,
	/// Text that may or may not hold a number
	Text(&'a str),
	/// An already numeric value
	Number(f64),
}

impl RawValue<'_> {
	/// Interpret the value as a number, giving `None` if it is absent or not a number.
	///
	/// Text is read like a numeric form field: surrounding whitespace is ignored,
	/// blank text is `0`, and `0x`, `0o`, and `0b` prefixes give unsigned integers in that base.
	#[must_use]
	pub fn to_number(self) -> Option<f64> {
		let number = match self {
			RawValue::Absent => return None,
			RawValue::Text(text) => parse_number(text)?,
			RawValue::Number(number) => number,
		};

		if number.is_nan() {
			None
		} else {
			Some(number)
		}
	}
}

/// Parse trimmed text as a decimal float or a prefixed unsigned integer
fn parse_number(text: &str) -> Option<f64> {
	let text = text.trim();
	if text.is_empty() {
		return Some(0.0);
	}

	let radix_digits = |prefix_lower: &str, prefix_upper: &str| {
		text.strip_prefix(prefix_lower).or_else(|| text.strip_prefix(prefix_upper))
	};

	let (digits, radix) = if let Some(digits) = radix_digits("0x", "0X") {
		(digits, 16)
	} else if let Some(digits) = radix_digits("0o", "0O") {
		(digits, 8)
	} else if let Some(digits) = radix_digits("0b", "0B") {
		(digits, 2)
	} else {
		return text.parse().ok();
	};

	if digits.is_empty() {
		return None;
	}

	digits
		.chars()
		.try_fold(0.0, |number: f64, c| {
			c.to_digit(radix).map(|digit| number * f64::from(radix) + f64::from(digit))
		})
}

impl<'a> From<&'a str> for RawValue<'a> {
	fn from(text: &'a str) -> Self {
		RawValue::Text(text)
	}
}

impl<'a> From<&'a String> for RawValue<'a> {
	fn from(text: &'a String) -> Self {
		RawValue::Text(text)
	}
}

impl From<f64> for RawValue<'_> {
	fn from(number: f64) -> Self {
		RawValue::Number(number)
	}
}

impl From<f32> for RawValue<'_> {
	fn from(number: f32) -> Self {
		RawValue::Number(f64::from(number))
	}
}

/// Implements `From<$int>` for `RawValue`
macro_rules! from_int {
	($($int: ty),*) => {
		$(
			impl From<$int> for RawValue<'_> {
				fn from(number: $int) -> Self {
					RawValue::Number(f64::from(number))
				}
			}
		)*
	};
}

from_int!(u8, u16, u32, i8, i16, i32);

impl<'a, T: Into<RawValue<'a>>> From<Option<T>> for RawValue<'a> {
	fn from(value: Option<T>) -> Self {
		value.map_or(RawValue::Absent, Into::into)
	}
}

/// Clamp `raw` into `min..=max`, falling back to `default` if it is absent or not a number.
///
/// The lower bound is applied before the upper bound.
/// Fractional values are truncated toward zero after clamping.
#[must_use]
pub fn normalize<'a>(raw: impl Into<RawValue<'a>>, min: u8, max: u8, default: u8) -> u8 {
	match raw.into().to_number() {
		None => default,
		Some(number) => {
			let clamped = number.max(f64::from(min)).min(f64::from(max));
			// clamped is within min..=max, so it fits in a u8
			#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
			{
				clamped.trunc() as u8
			}
		},
	}
}

/// Validated palette size and variance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parameters {
	/// The number of colors in the palette, in `1..=16`
	palette_size: u8,
	/// The dither strength, in `0..=10`
	variance: u8,
}

impl Default for Parameters {
	fn default() -> Self {
		Self {
			palette_size: DEFAULT_PALETTE_SIZE,
			variance: DEFAULT_VARIANCE,
		}
	}
}

impl Parameters {
	/// Normalize a raw palette size and variance.
	///
	/// Invalid or missing values never fail, they fall back to their defaults.
	#[must_use]
	pub fn from_raw<'a, 'b>(palette_size: impl Into<RawValue<'a>>, variance: impl Into<RawValue<'b>>) -> Self {
		Self {
			palette_size: normalize(palette_size, MIN_PALETTE_SIZE, MAX_PALETTE_SIZE, DEFAULT_PALETTE_SIZE),
			variance: normalize(variance, MIN_VARIANCE, MAX_VARIANCE, DEFAULT_VARIANCE),
		}
	}

	/// The palette size (k)
	#[must_use]
	pub const fn palette_size(self) -> u8 {
		self.palette_size
	}

	/// The variance used to scale the dither magnitude
	#[must_use]
	pub const fn variance(self) -> u8 {
		self.variance
	}
}
