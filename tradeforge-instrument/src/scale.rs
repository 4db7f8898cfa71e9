use crate::asset::Symbol;
use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of decimal digits encoded in the integer form of a price and quantity.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub struct ScaleSpec {
    pub price_scale: u32,
    pub qty_scale: u32,
}

impl ScaleSpec {
    pub fn new(price_scale: u32, qty_scale: u32) -> Self {
        Self {
            price_scale,
            qty_scale,
        }
    }
}

impl Default for ScaleSpec {
    fn default() -> Self {
        Self {
            price_scale: 5,
            qty_scale: 5,
        }
    }
}

/// Scale resolution error.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ScaleError {
    #[error("no scale configured for symbol: {symbol}")]
    Missing { symbol: Symbol },
}

/// Registry resolving a [`ScaleSpec`] per [`Symbol`].
///
/// Unknown symbols fall back to the configured default (`ScaleSpec { 5, 5 }` unless overridden);
/// a registry constructed with [`SymbolScaleMap::strict`] fails with [`ScaleError::Missing`]
/// instead.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct SymbolScaleMap {
    scales: FnvHashMap<Symbol, ScaleSpec>,
    default: Option<ScaleSpec>,
}

impl SymbolScaleMap {
    /// Construct a registry with the standard `(5, 5)` fallback.
    pub fn new() -> Self {
        Self {
            scales: FnvHashMap::default(),
            default: Some(ScaleSpec::default()),
        }
    }

    /// Construct a registry with no fallback - unknown symbols are an error.
    pub fn strict() -> Self {
        Self {
            scales: FnvHashMap::default(),
            default: None,
        }
    }

    /// Register the [`ScaleSpec`] for a [`Symbol`].
    pub fn insert<S>(mut self, symbol: S, spec: ScaleSpec) -> Self
    where
        S: Into<Symbol>,
    {
        self.scales.insert(symbol.into(), spec);
        self
    }

    /// Resolve the [`ScaleSpec`] for the provided [`Symbol`].
    pub fn resolve(&self, symbol: &Symbol) -> Result<ScaleSpec, ScaleError> {
        self.scales
            .get(symbol)
            .copied()
            .or(self.default)
            .ok_or_else(|| ScaleError::Missing {
                symbol: symbol.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve() {
        struct TestCase {
            map: SymbolScaleMap,
            symbol: Symbol,
            expected: Result<ScaleSpec, ScaleError>,
        }

        let tests = vec![
            TestCase {
                // TC0: registered symbol resolves its entry
                map: SymbolScaleMap::new().insert("btcusdt", ScaleSpec::new(2, 8)),
                symbol: Symbol::new("btcusdt"),
                expected: Ok(ScaleSpec::new(2, 8)),
            },
            TestCase {
                // TC1: unknown symbol falls back to the (5, 5) default
                map: SymbolScaleMap::new(),
                symbol: Symbol::new("ethusdt"),
                expected: Ok(ScaleSpec::new(5, 5)),
            },
            TestCase {
                // TC2: strict registry fails on unknown symbol
                map: SymbolScaleMap::strict(),
                symbol: Symbol::new("ethusdt"),
                expected: Err(ScaleError::Missing {
                    symbol: Symbol::new("ethusdt"),
                }),
            },
            TestCase {
                // TC3: lookup is case-insensitive via Symbol canonicalisation
                map: SymbolScaleMap::strict().insert("BTCUSDT", ScaleSpec::new(1, 1)),
                symbol: Symbol::new("btcusdt"),
                expected: Ok(ScaleSpec::new(1, 1)),
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = test.map.resolve(&test.symbol);
            assert_eq!(actual, test.expected, "TC{index} failed");
        }
    }
}
