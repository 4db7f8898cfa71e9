use serde::{Deserialize, Deserializer, Serialize};
use smol_str::{SmolStr, StrExt};
use std::fmt::{Display, Formatter};

/// TradeForge new type representing a market symbol `String` identifier.
///
/// eg/ "btcusdt", "ethusdt", etc
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
pub struct Symbol(SmolStr);

impl Symbol {
    /// Construct a new [`Symbol`], canonicalised to lowercase.
    pub fn new<S>(input: S) -> Self
    where
        S: Into<SmolStr>,
    {
        Self(input.into().to_lowercase_smolstr())
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Symbol::new)
    }
}

impl<S> From<S> for Symbol
where
    S: Into<SmolStr>,
{
    fn from(input: S) -> Self {
        Symbol::new(input)
    }
}

/// TradeForge new type representing a currency `String` identifier.
///
/// eg/ "btc", "usdt", etc
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
pub struct Asset(SmolStr);

impl Asset {
    /// Construct a new [`Asset`], canonicalised to lowercase.
    pub fn new<S>(input: S) -> Self
    where
        S: Into<SmolStr>,
    {
        Self(input.into().to_lowercase_smolstr())
    }
}

impl Display for Asset {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Asset {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Asset {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Asset::new)
    }
}

impl<S> From<S> for Asset
where
    S: Into<SmolStr>,
{
    fn from(input: S) -> Self {
        Asset::new(input)
    }
}

/// A tradeable market: the [`Symbol`] plus its underlying base and quote [`Asset`]s.
///
/// eg/ Market { symbol: "btcusdt", base: "btc", quote: "usdt" }
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub struct Market {
    pub symbol: Symbol,
    pub base: Asset,
    pub quote: Asset,
}

impl Market {
    /// Construct a new [`Market`] from the provided symbol, base and quote identifiers.
    pub fn new<S, A>(symbol: S, base: A, quote: A) -> Self
    where
        S: Into<Symbol>,
        A: Into<Asset>,
    {
        Self {
            symbol: symbol.into(),
            base: base.into(),
            quote: quote.into(),
        }
    }
}

impl Display for Market {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.base, self.quote)
    }
}
