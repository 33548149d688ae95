//! Default-to-zero coercion.
//!
//! Everflow metrics are sparse: fields go missing, arrive as strings, or come
//! back as `null`. Metrics never fail to parse; anything unusable becomes zero.

use serde_json::{Map, Value};

/// 非負整數；浮點數無條件捨去，負數與非數值皆為 0
pub fn to_count(value: Option<&Value>) -> u64 {
    let Some(value) = value else {
        return 0;
    };

    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                u
            } else if let Some(f) = n.as_f64() {
                float_to_count(f)
            } else {
                0
            }
        }
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(float_to_count))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

fn float_to_count(f: f64) -> u64 {
    if f.is_finite() && f > 0.0 {
        f.trunc() as u64
    } else {
        0
    }
}

pub fn to_amount(value: Option<&Value>) -> f64 {
    let amount = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };

    if amount.is_finite() {
        amount
    } else {
        0.0
    }
}

/// 識別碼：字串原樣，數字轉字串；null 或缺少時回傳 None 讓呼叫端往下一個候選值找
pub fn to_identifier(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn count_field(map: &Map<String, Value>, key: &str) -> u64 {
    to_count(map.get(key))
}

pub fn amount_field(map: &Map<String, Value>, key: &str) -> f64 {
    to_amount(map.get(key))
}
