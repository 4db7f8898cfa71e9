use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All fixed-point arithmetic and parsing errors.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum FixedPointError {
    #[error("{name} must not be negative: {input}")]
    NegativeValue { name: &'static str, input: String },

    #[error("{name} is not a valid decimal number: {input}")]
    Parse { name: &'static str, input: String },

    #[error("fixed-point subtraction underflowed below zero")]
    Underflow,

    #[error("fixed-point arithmetic overflowed the integer domain")]
    Overflow,

    #[error("fixed-point division by zero")]
    DivideByZero,
}

/// `10^scale` in the `u64` domain.
///
/// Fails with [`FixedPointError::Overflow`] for scales outside `u64` range (> 19).
pub fn pow10(scale: u32) -> Result<u64, FixedPointError> {
    10u64
        .checked_pow(scale)
        .ok_or(FixedPointError::Overflow)
}

/// Parse a decimal string into a scaled integer.
///
/// The fractional part is right-padded with zeros up to `scale` digits, or truncated beyond it.
/// eg/ to_fixed_int("100.12", 5) -> 10_012_000
pub fn to_fixed_int(input: &str, scale: u32, name: &'static str) -> Result<u64, FixedPointError> {
    let input = input.trim();

    if input.starts_with('-') {
        return Err(FixedPointError::NegativeValue {
            name,
            input: input.to_string(),
        });
    }

    let parse_error = || FixedPointError::Parse {
        name,
        input: input.to_string(),
    };

    let (integer, fraction) = match input.split_once('.') {
        Some((integer, fraction)) => (integer, fraction),
        None => (input, ""),
    };

    if integer.is_empty() && fraction.is_empty() {
        return Err(parse_error());
    }

    let scale = scale as usize;
    let mut digits = String::with_capacity(integer.len() + scale);
    digits.push_str(integer);
    if fraction.len() >= scale {
        digits.push_str(&fraction[..scale]);
    } else {
        digits.push_str(fraction);
        digits.extend(std::iter::repeat_n('0', scale - fraction.len()));
    }

    // An omitted integer or fractional part ("5." / ".5") still leaves digits to parse at
    // scale > 0, but ".": guard the all-empty concatenation at scale == 0
    if digits.is_empty() {
        return Err(parse_error());
    }

    digits.parse::<u64>().map_err(|_| parse_error())
}

/// Format a scaled integer as its canonical decimal string.
///
/// Insignificant trailing zeros are trimmed from the fraction; the dot is omitted when no
/// fraction remains. eg/ from_fixed_int(10_012_000, 5) -> "100.12"
pub fn from_fixed_int(value: u64, scale: u32) -> String {
    let scale = scale as usize;
    let mut digits = value.to_string();

    if digits.len() < scale + 1 {
        digits.insert_str(0, &"0".repeat(scale + 1 - digits.len()));
    }

    let split = digits.len() - scale;
    let fraction = digits[split..].trim_end_matches('0');

    if fraction.is_empty() {
        digits.truncate(split);
        digits
    } else {
        format!("{}.{}", &digits[..split], fraction)
    }
}

/// Compute `(a * b) / denom` with integer truncation, widening to `u128` internally.
///
/// Used for notional conversions and participation factors.
pub fn mul_div(a: u64, b: u64, denom: u64) -> Result<u64, FixedPointError> {
    if denom == 0 {
        return Err(FixedPointError::DivideByZero);
    }

    let result = (a as u128) * (b as u128) / (denom as u128);
    u64::try_from(result).map_err(|_| FixedPointError::Overflow)
}

/// Serde representation of fixed-point integers: the decimal string of the raw scaled integer.
///
/// A bare JSON number is also accepted on deserialisation.
mod fixed_serde {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum StringOrInt {
            String(String),
            Int(u64),
        }

        match StringOrInt::deserialize(deserializer)? {
            StringOrInt::String(value) => value.parse::<u64>().map_err(D::Error::custom),
            StringOrInt::Int(value) => Ok(value),
        }
    }
}

/// Exact scaled-integer price.
///
/// The associated `price_scale` lives in the per-symbol
/// [`ScaleSpec`](crate::scale::ScaleSpec) - a `Price` is only meaningful alongside it.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Deserialize, Serialize,
)]
pub struct Price(#[serde(with = "fixed_serde")] u64);

impl Price {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    /// Parse a decimal price string at the provided scale.
    pub fn parse(input: &str, scale: u32) -> Result<Self, FixedPointError> {
        to_fixed_int(input, scale, "price").map(Self)
    }

    /// Canonical decimal string at the provided scale.
    pub fn format(self, scale: u32) -> String {
        from_fixed_int(self.0, scale)
    }

    /// Quote-currency notional of `qty` base units at this price:
    /// `(price * qty) / 10^qty_scale`.
    pub fn notional(self, qty: Qty, qty_scale: u32) -> Result<Amount, FixedPointError> {
        mul_div(self.0, qty.raw(), pow10(qty_scale)?).map(Amount::from_raw)
    }
}

/// Exact scaled-integer quantity.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Deserialize, Serialize,
)]
pub struct Qty(#[serde(with = "fixed_serde")] u64);

impl Qty {
    pub const ZERO: Self = Self(0);

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    /// Parse a decimal quantity string at the provided scale.
    pub fn parse(input: &str, scale: u32) -> Result<Self, FixedPointError> {
        to_fixed_int(input, scale, "qty").map(Self)
    }

    /// Canonical decimal string at the provided scale.
    pub fn format(self, scale: u32) -> String {
        from_fixed_int(self.0, scale)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Result<Self, FixedPointError> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(FixedPointError::Overflow)
    }

    pub fn checked_sub(self, other: Self) -> Result<Self, FixedPointError> {
        self.0
            .checked_sub(other.0)
            .map(Self)
            .ok_or(FixedPointError::Underflow)
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

/// Exact scaled-integer balance or fee amount, denominated in one [`Asset`](crate::asset::Asset).
///
/// Base-currency amounts share the quantity scale; quote-currency amounts share the price scale.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Deserialize, Serialize,
)]
pub struct Amount(#[serde(with = "fixed_serde")] u64);

impl Amount {
    pub const ZERO: Self = Self(0);

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    /// Canonical decimal string at the provided scale.
    pub fn format(self, scale: u32) -> String {
        from_fixed_int(self.0, scale)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Result<Self, FixedPointError> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(FixedPointError::Overflow)
    }

    pub fn checked_sub(self, other: Self) -> Result<Self, FixedPointError> {
        self.0
            .checked_sub(other.0)
            .map(Self)
            .ok_or(FixedPointError::Underflow)
    }

    /// Fee at `bps` basis points of this amount, truncating: `(amount * bps) / 10_000`.
    pub fn fee_bps(self, bps: u32) -> Result<Self, FixedPointError> {
        mul_div(self.0, bps as u64, 10_000).map(Self)
    }
}

impl From<Qty> for Amount {
    fn from(qty: Qty) -> Self {
        Self(qty.raw())
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for Qty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
