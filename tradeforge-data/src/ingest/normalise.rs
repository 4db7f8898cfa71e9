use crate::{
    DataError,
    books::{DepthDiff, Level},
    trade::Trade,
};
use serde_json::Value;
use smol_str::SmolStr;
use tradeforge_instrument::{
    Side,
    asset::Symbol,
    fixed::{Price, Qty, to_fixed_int},
    scale::ScaleSpec,
};

/// Field alias lists used to locate values inside heterogeneous raw records.
///
/// The defaults cover the common CSV exports and Binance-style stream captures; any alias list
/// may be overridden per reader.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FieldMapping {
    pub time: Vec<SmolStr>,
    pub price: Vec<SmolStr>,
    pub qty: Vec<SmolStr>,
    pub side: Vec<SmolStr>,
    pub buyer_is_maker: Vec<SmolStr>,
    pub trade_id: Vec<SmolStr>,
    pub depth_time: Vec<SmolStr>,
    pub bids: Vec<SmolStr>,
    pub asks: Vec<SmolStr>,
    pub depth_seq: Vec<SmolStr>,
}

fn aliases(names: &[&str]) -> Vec<SmolStr> {
    names.iter().copied().map(SmolStr::new).collect()
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            time: aliases(&["time", "timestamp", "T", "ts"]),
            price: aliases(&["price", "p", "P"]),
            qty: aliases(&["qty", "q", "Q", "quantity"]),
            side: aliases(&["side", "S"]),
            buyer_is_maker: aliases(&["isBuyerMaker", "m"]),
            trade_id: aliases(&["id", "tradeId", "t"]),
            depth_time: aliases(&["E", "ts", "time", "timestamp"]),
            bids: aliases(&["b", "bids"]),
            asks: aliases(&["a", "asks"]),
            depth_seq: aliases(&["u", "seq", "lastUpdateId"]),
        }
    }
}

/// Normalise a raw trade record into canonical fixed-point form.
pub fn normalise_trade(
    record: &Value,
    mapping: &FieldMapping,
    symbol: &Symbol,
    scales: ScaleSpec,
    file: &str,
    line: u64,
) -> Result<Trade, DataError> {
    let malformed = |reason: String| DataError::parse(file, line, reason);

    let ts = field(record, &mapping.time)
        .and_then(as_ts)
        .ok_or_else(|| malformed("missing or invalid trade timestamp".to_string()))?;

    let price = field(record, &mapping.price)
        .ok_or_else(|| malformed("missing trade price".to_string()))
        .and_then(|value| as_fixed(value, scales.price_scale, "price").map_err(malformed))
        .map(Price::from_raw)?;

    let qty = field(record, &mapping.qty)
        .ok_or_else(|| malformed("missing trade qty".to_string()))
        .and_then(|value| as_fixed(value, scales.qty_scale, "qty").map_err(malformed))
        .map(Qty::from_raw)?;

    let side = resolve_side(record, mapping).map_err(malformed)?;

    let id = field(record, &mapping.trade_id).and_then(|value| match value {
        Value::String(id) => Some(SmolStr::new(id)),
        Value::Number(id) => Some(SmolStr::new(id.to_string())),
        _ => None,
    });

    Ok(Trade {
        ts,
        symbol: symbol.clone(),
        price,
        qty,
        side,
        id,
        aggressor: side,
    })
}

/// Normalise a raw depth record into canonical fixed-point form.
///
/// Bid and ask levels accept `[price, qty]` tuples or `{price, qty}` objects; a `qty == 0`
/// level communicates a deletion and is preserved as-is for the book to process.
pub fn normalise_depth(
    record: &Value,
    mapping: &FieldMapping,
    symbol: &Symbol,
    scales: ScaleSpec,
    file: &str,
    line: u64,
) -> Result<DepthDiff, DataError> {
    let malformed = |reason: String| DataError::parse(file, line, reason);

    let ts = field(record, &mapping.depth_time)
        .and_then(as_ts)
        .ok_or_else(|| malformed("missing or invalid depth timestamp".to_string()))?;

    let bids = match field(record, &mapping.bids) {
        Some(value) => as_levels(value, scales, "bids").map_err(malformed)?,
        None => vec![],
    };
    let asks = match field(record, &mapping.asks) {
        Some(value) => as_levels(value, scales, "asks").map_err(malformed)?,
        None => vec![],
    };

    let seq = field(record, &mapping.depth_seq).and_then(as_ts);

    Ok(DepthDiff {
        ts,
        symbol: symbol.clone(),
        bids,
        asks,
        seq,
    })
}

/// Locate the first non-null aliased field inside a record object.
fn field<'a>(record: &'a Value, aliases: &[SmolStr]) -> Option<&'a Value> {
    let object = record.as_object()?;
    aliases
        .iter()
        .find_map(|alias| object.get(alias.as_str()))
        .filter(|value| !value.is_null())
}

/// Parse an integer millisecond timestamp from a JSON number or numeric string.
fn as_ts(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|float| float.fract() == 0.0).map(|float| float as u64)),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    }
}

/// Parse a fixed-point value at `scale` from a JSON decimal string or number.
fn as_fixed(value: &Value, scale: u32, name: &'static str) -> Result<u64, String> {
    let text = match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        other => return Err(format!("{name} is not a decimal value: {other}")),
    };

    to_fixed_int(&text, scale, name).map_err(|error| error.to_string())
}

/// Resolve the aggressor side from an explicit side field, falling back to a buyer-is-maker
/// flag (true -> SELL, false -> BUY).
fn resolve_side(record: &Value, mapping: &FieldMapping) -> Result<Option<Side>, String> {
    if let Some(value) = field(record, &mapping.side) {
        return match value {
            Value::String(text) => match text.to_ascii_lowercase().as_str() {
                "buy" | "b" => Ok(Some(Side::Buy)),
                "sell" | "s" => Ok(Some(Side::Sell)),
                other => Err(format!("unrecognised side: {other}")),
            },
            // a side alias carrying a bool is a buyer-is-maker flag
            Value::Bool(buyer_is_maker) => Ok(Some(maker_side(*buyer_is_maker))),
            other => Err(format!("unrecognised side: {other}")),
        };
    }

    Ok(field(record, &mapping.buyer_is_maker)
        .and_then(Value::as_bool)
        .map(maker_side))
}

fn maker_side(buyer_is_maker: bool) -> Side {
    if buyer_is_maker { Side::Sell } else { Side::Buy }
}

/// Parse one side's levels: an array of `[price, qty]` tuples or `{price, qty}` objects.
fn as_levels(value: &Value, scales: ScaleSpec, name: &'static str) -> Result<Vec<Level>, String> {
    let Value::Array(entries) = value else {
        return Err(format!("{name} is not an array"));
    };

    entries
        .iter()
        .map(|entry| match entry {
            Value::Array(tuple) if tuple.len() >= 2 => {
                let price = as_fixed(&tuple[0], scales.price_scale, "price")?;
                let qty = as_fixed(&tuple[1], scales.qty_scale, "qty")?;
                Ok(Level::new(Price::from_raw(price), Qty::from_raw(qty)))
            }
            Value::Object(fields) => {
                let price = fields
                    .get("price")
                    .or_else(|| fields.get("p"))
                    .ok_or_else(|| format!("{name} level missing price"))?;
                let qty = fields
                    .get("qty")
                    .or_else(|| fields.get("q"))
                    .ok_or_else(|| format!("{name} level missing qty"))?;
                Ok(Level::new(
                    Price::from_raw(as_fixed(price, scales.price_scale, "price")?),
                    Qty::from_raw(as_fixed(qty, scales.qty_scale, "qty")?),
                ))
            }
            other => Err(format!("{name} level is neither tuple nor object: {other}")),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn symbol() -> Symbol {
        Symbol::new("btcusdt")
    }

    fn scales() -> ScaleSpec {
        ScaleSpec::new(5, 5)
    }

    #[test]
    fn test_normalise_trade() {
        struct TestCase {
            record: Value,
            expected_side: Option<Side>,
            expected_price: &'static str,
            expected_qty: &'static str,
        }

        let tests = vec![
            TestCase {
                // TC0: CSV-shaped record (all strings)
                record: json!({"ts": "1000", "price": "100.12", "qty": "2", "side": "BUY"}),
                expected_side: Some(Side::Buy),
                expected_price: "100.12",
                expected_qty: "2",
            },
            TestCase {
                // TC1: Binance aggTrade-shaped record, buyer-is-maker => SELL aggressor
                record: json!({"T": 1000, "p": "100.12", "q": "0.5", "m": true, "t": 77}),
                expected_side: Some(Side::Sell),
                expected_price: "100.12",
                expected_qty: "0.5",
            },
            TestCase {
                // TC2: buyer-is-maker false => BUY aggressor
                record: json!({"time": 1000, "price": 99.5, "qty": 1, "isBuyerMaker": false}),
                expected_side: Some(Side::Buy),
                expected_price: "99.5",
                expected_qty: "1",
            },
            TestCase {
                // TC3: no side information at all
                record: json!({"ts": 1000, "price": "1", "qty": "1"}),
                expected_side: None,
                expected_price: "1",
                expected_qty: "1",
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let trade = normalise_trade(
                &test.record,
                &FieldMapping::default(),
                &symbol(),
                scales(),
                "trades.csv",
                1,
            )
            .unwrap();

            assert_eq!(trade.ts, 1000, "TC{index} failed");
            assert_eq!(trade.side, test.expected_side, "TC{index} failed");
            assert_eq!(trade.aggressor, test.expected_side, "TC{index} failed");
            assert_eq!(trade.price, Price::parse(test.expected_price, 5).unwrap(), "TC{index} failed");
            assert_eq!(trade.qty, Qty::parse(test.expected_qty, 5).unwrap(), "TC{index} failed");
        }
    }

    #[test]
    fn test_normalise_trade_errors() {
        struct TestCase {
            record: Value,
        }

        let tests = vec![
            TestCase {
                // TC0: missing timestamp
                record: json!({"price": "1", "qty": "1"}),
            },
            TestCase {
                // TC1: missing price
                record: json!({"ts": 1, "qty": "1"}),
            },
            TestCase {
                // TC2: negative price
                record: json!({"ts": 1, "price": "-5", "qty": "1"}),
            },
            TestCase {
                // TC3: unrecognised side token
                record: json!({"ts": 1, "price": "1", "qty": "1", "side": "hold"}),
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let result = normalise_trade(
                &test.record,
                &FieldMapping::default(),
                &symbol(),
                scales(),
                "trades.csv",
                3,
            );
            assert!(
                matches!(result, Err(DataError::Parse { line: 3, .. })),
                "TC{index} failed: {result:?}"
            );
        }
    }

    #[test]
    fn test_normalise_depth() {
        // Binance-style diff with tuple levels
        let record = json!({
            "E": 2000,
            "b": [["100", "1"], ["99.5", "0"]],
            "a": [["101", "1.5"]],
            "u": 42,
        });

        let diff = normalise_depth(
            &record,
            &FieldMapping::default(),
            &symbol(),
            scales(),
            "depth.jsonl",
            1,
        )
        .unwrap();

        assert_eq!(diff.ts, 2000);
        assert_eq!(diff.seq, Some(42));
        assert_eq!(diff.bids.len(), 2);
        // zero-qty deletion level preserved for the book to process
        assert!(diff.bids[1].qty.is_zero());
        assert_eq!(diff.asks[0].price, Price::parse("101", 5).unwrap());
    }

    #[test]
    fn test_normalise_depth_object_levels() {
        let record = json!({
            "ts": 2000,
            "bids": [{"price": "100", "qty": "1"}],
            "asks": [{"p": "101", "q": "2"}],
        });

        let diff = normalise_depth(
            &record,
            &FieldMapping::default(),
            &symbol(),
            scales(),
            "depth.json",
            1,
        )
        .unwrap();

        assert_eq!(diff.bids[0].qty, Qty::parse("1", 5).unwrap());
        assert_eq!(diff.asks[0].price, Price::parse("101", 5).unwrap());
        assert_eq!(diff.seq, None);
    }
}
