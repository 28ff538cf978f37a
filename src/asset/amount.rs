use std::fmt;
use std::str::FromStr;

use crate::asset::Asset;
use crate::error::Error;

/// Serialized size of an amount: 8-byte amount, 1-byte precision, 7-byte symbol.
pub const AMOUNT_WIRE_LEN: usize = 16;
/// Width of the null-padded symbol field.
pub const SYMBOL_WIDTH: usize = 7;

const SCALED_LEN: usize = 8;
const PRECISION_OFFSET: usize = SCALED_LEN;
const SYMBOL_OFFSET: usize = PRECISION_OFFSET + 1;
const _: () = assert!(SYMBOL_OFFSET + SYMBOL_WIDTH == AMOUNT_WIRE_LEN);

/// How strictly the magnitude's fractional digits are validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrecisionCheck {
    /// A `.` followed by `precision` digits anywhere in the magnitude. Trailing
    /// characters are tolerated; this is what nodes and existing callers accept.
    #[default]
    Permissive,
    /// The whole magnitude must be `[+-]?<digits>.<exactly precision digits>`.
    Strict,
}

/// A quantity of a registered asset, e.g. `"1.000 STEEM"`.
///
/// The magnitude text is kept verbatim so [`AssetAmount::to_text`] reproduces
/// the caller's input rather than a re-derived decimal.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetAmount {
    magnitude: String,
    asset: Asset,
    scaled: i64,
}

impl AssetAmount {
    /// Parses `"<magnitude> <symbol>"` with [`PrecisionCheck::Permissive`].
    pub fn parse(text: &str) -> Result<Self, Error> {
        Self::parse_with(text, PrecisionCheck::Permissive)
    }

    pub fn parse_with(text: &str, check: PrecisionCheck) -> Result<Self, Error> {
        let mut tokens = text.split_ascii_whitespace();
        let magnitude = tokens.next().unwrap_or_default();
        let symbol = tokens.next().unwrap_or_default();

        let asset = Asset::from_symbol(symbol).ok_or_else(|| Error::InvalidAsset {
            symbol: symbol.to_string(),
        })?;
        let precision = asset.precision();

        let valid = match check {
            PrecisionCheck::Permissive => has_fraction_digits(magnitude, precision),
            PrecisionCheck::Strict => is_exact_decimal(magnitude, precision),
        };
        if !valid {
            return Err(Error::InvalidPrecision {
                amount: magnitude.to_string(),
                precision,
            });
        }

        let scaled = scale(magnitude, precision).ok_or_else(|| Error::AmountOutOfRange {
            amount: magnitude.to_string(),
            precision,
        })?;

        Ok(Self {
            magnitude: magnitude.to_string(),
            asset,
            scaled,
        })
    }

    pub fn asset(&self) -> Asset {
        self.asset
    }

    pub fn symbol(&self) -> &'static str {
        self.asset.symbol()
    }

    pub fn precision(&self) -> u8 {
        self.asset.precision()
    }

    /// Magnitude text exactly as supplied at construction.
    pub fn magnitude(&self) -> &str {
        &self.magnitude
    }

    /// Magnitude multiplied by `10^precision`, rounded half away from zero.
    pub fn scaled(&self) -> i64 {
        self.scaled
    }

    /// Wire layout consumed by the node's transaction deserializer:
    /// `i64` LE scaled amount, `i8` precision, symbol null-padded to 7 bytes.
    pub fn to_bytes(&self) -> [u8; AMOUNT_WIRE_LEN] {
        let mut out = [0_u8; AMOUNT_WIRE_LEN];
        out[..SCALED_LEN].copy_from_slice(&self.scaled.to_le_bytes());
        out[PRECISION_OFFSET] = (self.precision() as i8).to_le_bytes()[0];
        let symbol = self.symbol().as_bytes();
        out[SYMBOL_OFFSET..SYMBOL_OFFSET + symbol.len()].copy_from_slice(symbol);
        out
    }

    /// Appends the wire layout to a transaction buffer.
    pub fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.to_bytes());
    }

    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AssetAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.magnitude, self.symbol())
    }
}

impl FromStr for AssetAmount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AssetAmount {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AssetAmount> for String {
    fn from(amount: AssetAmount) -> Self {
        amount.to_text()
    }
}

/// Unanchored search for `.` followed by `precision` ASCII digits.
fn has_fraction_digits(magnitude: &str, precision: u8) -> bool {
    let bytes = magnitude.as_bytes();
    let width = usize::from(precision);
    bytes.iter().enumerate().any(|(i, b)| {
        *b == b'.'
            && bytes
                .get(i + 1..i + 1 + width)
                .is_some_and(|digits| digits.iter().all(u8::is_ascii_digit))
    })
}

fn is_exact_decimal(magnitude: &str, precision: u8) -> bool {
    let unsigned = magnitude
        .strip_prefix(|c: char| c == '+' || c == '-')
        .unwrap_or(magnitude);
    let Some((whole, fraction)) = unsigned.split_once('.') else {
        return false;
    };
    !whole.is_empty()
        && whole.bytes().all(|b| b.is_ascii_digit())
        && fraction.len() == usize::from(precision)
        && fraction.bytes().all(|b| b.is_ascii_digit())
}

fn scale(magnitude: &str, precision: u8) -> Option<i64> {
    let scaled = (leading_float(magnitude) * 10_f64.powi(i32::from(precision))).round();
    // i64::MAX is not representable as f64; the cast rounds it up to 2^63.
    if scaled.is_finite() && scaled >= i64::MIN as f64 && scaled < i64::MAX as f64 {
        Some(scaled as i64)
    } else {
        None
    }
}

/// Converts the longest numeric prefix of `text`, or `0.0` when there is none.
fn leading_float(text: &str) -> f64 {
    let bytes = text.as_bytes();
    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let digits_start = end;

    end = skip_digits(bytes, end);
    if bytes.get(end) == Some(&b'.') {
        let fraction_end = skip_digits(bytes, end + 1);
        if fraction_end > end + 1 {
            end = fraction_end;
        }
    }
    if end == digits_start {
        return 0.0;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exponent = end + 1;
        if matches!(bytes.get(exponent), Some(b'+' | b'-')) {
            exponent += 1;
        }
        let exponent_end = skip_digits(bytes, exponent);
        if exponent_end > exponent {
            end = exponent_end;
        }
    }

    text.get(..end)
        .and_then(|prefix| prefix.parse().ok())
        .unwrap_or(0.0)
}

fn skip_digits(bytes: &[u8], from: usize) -> usize {
    from + bytes
        .get(from..)
        .map_or(0, |rest| rest.iter().take_while(|b| b.is_ascii_digit()).count())
}
