//! Lenient decoding of argument values
//!
//! Clients send the same data in several shapes: plain JSON numbers, numbers
//! with units ("600 W"), delimited strings ("45.2, 45.8"), CSV pasted as a
//! string, or `[min, max]` pairs. Everything here reduces those shapes to the
//! canonical types the analyzers take.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::InputError;
use crate::analysis::spc::{ControlLimits, SpecLimits};
use crate::analysis::window::{ProcessWindow, WindowBounds};

fn invalid(field: &str, reason: impl Into<String>) -> InputError {
    InputError::InvalidArguments {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Leading number of a string such as "600 W", "22mJ/cm²" or "96.5%"
pub fn leading_number(text: &str) -> Option<f64> {
    let token = text.split_whitespace().next()?.trim_end_matches('%');
    if let Ok(v) = token.parse::<f64>() {
        return v.is_finite().then_some(v);
    }
    let end = token
        .char_indices()
        .take_while(|(_, c)| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
        .last()
        .map(|(i, c)| i + c.len_utf8())?;
    // "60e" has no exponent digits; back off until something parses
    (1..=end)
        .rev()
        .find_map(|n| token[..n].parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

pub fn number(value: &Value, field: &str) -> Result<f64, InputError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .filter(|v| v.is_finite())
            .ok_or_else(|| invalid(field, "number is out of range")),
        Value::String(s) => leading_number(s)
            .ok_or_else(|| invalid(field, format!("expected a number, got '{}'", s))),
        other => Err(invalid(
            field,
            format!("expected a number, got {}", describe(other)),
        )),
    }
}

/// Like [`number`], but null counts as absent
pub fn optional_number(value: Option<&Value>, field: &str) -> Result<Option<f64>, InputError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => number(v, field).map(Some),
    }
}

fn split_items(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// A flat numeric series: a JSON array or a delimited string
pub fn series(value: &Value, field: &str) -> Result<Vec<f64>, InputError> {
    match value {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| number(v, &format!("{}[{}]", field, i)))
            .collect(),
        Value::String(s) => split_items(s)
            .enumerate()
            .map(|(i, item)| {
                leading_number(item).ok_or_else(|| {
                    invalid(
                        &format!("{}[{}]", field, i),
                        format!("expected a number, got '{}'", item),
                    )
                })
            })
            .collect(),
        Value::Number(_) => Ok(vec![number(value, field)?]),
        other => Err(invalid(
            field,
            format!("expected an array of numbers, got {}", describe(other)),
        )),
    }
}

/// Chronological values from `[{timestamp, value}]`, bare numbers, or CSV text
///
/// Entries whose `value` is null or missing are skipped.
pub fn time_series(value: &Value, field: &str) -> Result<Vec<f64>, InputError> {
    match value {
        Value::Array(items) => {
            let mut values = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let label = format!("{}[{}]", field, i);
                match item {
                    Value::Object(obj) => {
                        if let Some(v) = optional_number(get_ci(obj, "value"), &label)? {
                            values.push(v);
                        }
                    }
                    Value::Null => {}
                    other => values.push(number(other, &label)?),
                }
            }
            Ok(values)
        }
        Value::String(s) if s.trim().contains('\n') => csv_values(s, field),
        other => series(other, field),
    }
}

/// Value column of CSV text: the `value` column if the header names one,
/// otherwise the last column. A non-numeric first row is taken as a header.
fn csv_values(text: &str, field: &str) -> Result<Vec<f64>, InputError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.trim().as_bytes());

    let mut column: Option<usize> = None;
    let mut values = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| invalid(field, format!("unreadable CSV: {}", e)))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let idx = column.unwrap_or(record.len().saturating_sub(1));
        let cell = record.get(idx).unwrap_or("");
        match leading_number(cell) {
            Some(v) => values.push(v),
            None if row == 0 => {
                column = record
                    .iter()
                    .position(|h| h.eq_ignore_ascii_case("value"))
                    .or(Some(record.len().saturating_sub(1)));
            }
            None => {
                return Err(invalid(
                    &format!("{}[line {}]", field, row + 1),
                    format!("expected a number, got '{}'", cell),
                ))
            }
        }
    }
    Ok(values)
}

/// Case-insensitive key lookup, null treated as absent
pub fn get_ci<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key)
        .or_else(|| {
            obj.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v)
        })
        .filter(|v| !v.is_null())
}

fn pairs<'a>(text: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> {
    text.split(|c: char| c == ',' || c == ';' || c == '\n')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|item| match item.split_once(|c: char| c == '=' || c == ':') {
            Some((k, v)) => (k.trim(), v.trim()),
            None => (item, ""),
        })
}

/// `{name: number}` or `"name=1, other=2"`; null entries are dropped
pub fn number_map(value: &Value, field: &str) -> Result<BTreeMap<String, f64>, InputError> {
    match value {
        Value::Object(obj) => {
            let mut out = BTreeMap::new();
            for (k, v) in obj {
                if let Some(n) = optional_number(Some(v), &format!("{}.{}", field, k))? {
                    out.insert(k.clone(), n);
                }
            }
            Ok(out)
        }
        Value::String(s) => pairs(s)
            .map(|(k, v)| {
                leading_number(v)
                    .map(|n| (k.to_string(), n))
                    .ok_or_else(|| {
                        invalid(
                            &format!("{}.{}", field, k),
                            format!("expected a number, got '{}'", v),
                        )
                    })
            })
            .collect(),
        other => Err(invalid(
            field,
            format!("expected an object of numbers, got {}", describe(other)),
        )),
    }
}

/// Integer ratings keyed by parameter; the 1..=10 range is checked by the scorer
pub fn rating_map(value: &Value, field: &str) -> Result<BTreeMap<String, i64>, InputError> {
    number_map(value, field)?
        .into_iter()
        .map(|(k, v)| {
            if v.fract() != 0.0 || v.abs() > i64::MAX as f64 {
                Err(invalid(
                    &format!("{}.{}", field, k),
                    format!("rating must be a whole number, got {}", v),
                ))
            } else {
                Ok((k, v as i64))
            }
        })
        .collect()
}

/// `{name: "label"}` or `"name=HIGH, other=LOW"`
pub fn label_map(value: &Value, field: &str) -> Result<BTreeMap<String, String>, InputError> {
    match value {
        Value::Object(obj) => obj
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| {
                text(v, &format!("{}.{}", field, k)).map(|s| (k.clone(), s))
            })
            .collect(),
        Value::String(s) => Ok(pairs(s)
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()),
        other => Err(invalid(
            field,
            format!("expected an object of labels, got {}", describe(other)),
        )),
    }
}

/// Scalar rendered as text; numbers and booleans are accepted
pub fn text(value: &Value, field: &str) -> Result<String, InputError> {
    match value {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(invalid(
            field,
            format!("expected text, got {}", describe(other)),
        )),
    }
}

/// A JSON array of strings or a comma/newline separated string
pub fn string_list(value: &Value, field: &str) -> Result<Vec<String>, InputError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| text(v, &format!("{}[{}]", field, i)))
            .filter(|s| s.as_ref().map_or(true, |s| !s.is_empty()))
            .collect(),
        Value::String(s) => Ok(s
            .split(|c: char| c == ',' || c == '\n')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()),
        other => Err(invalid(
            field,
            format!("expected a list of strings, got {}", describe(other)),
        )),
    }
}

/// One window entry: `{min, max, unit}` or `[min, max]`
pub fn bounds(value: &Value, field: &str) -> Result<WindowBounds, InputError> {
    match value {
        Value::Object(obj) => Ok(WindowBounds {
            min: optional_number(get_ci(obj, "min"), &format!("{}.min", field))?,
            max: optional_number(get_ci(obj, "max"), &format!("{}.max", field))?,
            unit: get_ci(obj, "unit")
                .map(|u| text(u, &format!("{}.unit", field)))
                .transpose()?
                .filter(|u| !u.is_empty()),
        }),
        Value::Array(items) if items.len() == 2 => Ok(WindowBounds {
            min: optional_number(items.first(), &format!("{}[0]", field))?,
            max: optional_number(items.get(1), &format!("{}[1]", field))?,
            unit: None,
        }),
        other => Err(invalid(
            field,
            format!("expected {{min, max}} or [min, max], got {}", describe(other)),
        )),
    }
}

pub fn window(value: &Value, field: &str) -> Result<ProcessWindow, InputError> {
    match value {
        Value::Object(obj) => obj
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| bounds(v, &format!("{}.{}", field, k)).map(|b| (k.clone(), b)))
            .collect(),
        other => Err(invalid(
            field,
            format!("expected an object of windows, got {}", describe(other)),
        )),
    }
}

pub fn object<'a>(value: &'a Value, field: &str) -> Result<&'a Map<String, Value>, InputError> {
    value.as_object().ok_or_else(|| {
        invalid(
            field,
            format!("expected an object, got {}", describe(value)),
        )
    })
}

pub fn array<'a>(value: &'a Value, field: &str) -> Result<&'a [Value], InputError> {
    value.as_array().map(Vec::as_slice).ok_or_else(|| {
        invalid(
            field,
            format!("expected an array, got {}", describe(value)),
        )
    })
}

pub fn spec_limits(value: &Value, field: &str) -> Result<SpecLimits, InputError> {
    let obj = object(value, field)?;
    Ok(SpecLimits {
        usl: optional_number(get_ci(obj, "usl"), &format!("{}.usl", field))?,
        lsl: optional_number(get_ci(obj, "lsl"), &format!("{}.lsl", field))?,
        target: optional_number(get_ci(obj, "target"), &format!("{}.target", field))?,
    })
}

/// UCL and LCL are required; CL defaults to their midpoint
pub fn control_limits(value: &Value, field: &str) -> Result<ControlLimits, InputError> {
    let obj = object(value, field)?;
    let ucl = optional_number(get_ci(obj, "ucl"), &format!("{}.ucl", field))?;
    let lcl = optional_number(get_ci(obj, "lcl"), &format!("{}.lcl", field))?;
    let (ucl, lcl) = match (ucl, lcl) {
        (Some(u), Some(l)) => (u, l),
        _ => return Err(invalid(field, "both ucl and lcl are required")),
    };
    if ucl < lcl {
        return Err(invalid(
            field,
            format!("ucl ({}) is below lcl ({})", ucl, lcl),
        ));
    }
    let cl = optional_number(get_ci(obj, "cl"), &format!("{}.cl", field))?
        .unwrap_or((ucl + lcl) / 2.0);
    Ok(ControlLimits { ucl, cl, lcl })
}

/// Boolean flags also accept "true"/"false" strings and 0/1
pub fn flag(value: &Value, field: &str) -> Result<bool, InputError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => Ok(n.as_f64().is_some_and(|v| v != 0.0)),
        Value::String(s) => crate::core::config::parse_bool(s)
            .ok_or_else(|| invalid(field, format!("expected true or false, got '{}'", s))),
        other => Err(invalid(
            field,
            format!("expected true or false, got {}", describe(other)),
        )),
    }
}

/// Non-negative whole number
pub fn count(value: &Value, field: &str) -> Result<usize, InputError> {
    let v = number(value, field)?;
    if v < 0.0 || v.fract() != 0.0 || v > u32::MAX as f64 {
        return Err(invalid(
            field,
            format!("expected a non-negative whole number, got {}", v),
        ));
    }
    Ok(v as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("600 W"), Some(600.0));
        assert_eq!(leading_number("22mJ/cm²"), Some(22.0));
        assert_eq!(leading_number("96.5%"), Some(96.5));
        assert_eq!(leading_number("-0.02 µm"), Some(-0.02));
        assert_eq!(leading_number("2e13 cm^-2"), Some(2e13));
        assert_eq!(leading_number("60e"), Some(60.0));
        assert_eq!(leading_number("NaN"), None);
        assert_eq!(leading_number("TEOS"), None);
    }

    #[test]
    fn test_series_shapes() {
        assert_eq!(
            series(&json!([45.2, "45.8", 44.9]), "data_points").unwrap(),
            vec![45.2, 45.8, 44.9]
        );
        assert_eq!(
            series(&json!("45.2, 45.8;44.9 46.1"), "data_points").unwrap(),
            vec![45.2, 45.8, 44.9, 46.1]
        );
        let err = series(&json!([1.0, "abc"]), "data_points").unwrap_err();
        match err {
            InputError::InvalidArguments { field, .. } => assert_eq!(field, "data_points[1]"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(series(&json!({"a": 1}), "data_points").is_err());
    }

    #[test]
    fn test_time_series_objects_skip_null_values() {
        let data = json!([
            {"timestamp": "2024-03-01T08:00", "value": 120.1},
            {"timestamp": "2024-03-01T09:00", "value": null},
            {"timestamp": "2024-03-01T10:00", "value": "120.5"},
            121.2
        ]);
        assert_eq!(time_series(&data, "t").unwrap(), vec![120.1, 120.5, 121.2]);
    }

    #[test]
    fn test_time_series_csv() {
        let text = "timestamp,value,operator\n08:00,120.1,kim\n09:00,120.3,lee\n";
        assert_eq!(time_series(&json!(text), "t").unwrap(), vec![120.1, 120.3]);

        let headerless = "08:00,120.1\n09:00,120.3\n10:00,120.5";
        assert_eq!(
            time_series(&json!(headerless), "t").unwrap(),
            vec![120.1, 120.3, 120.5]
        );

        let bad = "08:00,120.1\n09:00,n/a";
        assert!(time_series(&json!(bad), "t").is_err());
    }

    #[test]
    fn test_number_map_shapes() {
        let m = number_map(&json!({"rf_power": "600 W", "pressure": 10, "gas": null}), "r").unwrap();
        assert_eq!(m.len(), 2);
        assert_eq!(m["rf_power"], 600.0);

        let m = number_map(&json!("rf_power=620, pressure: 11.5"), "r").unwrap();
        assert_eq!(m["pressure"], 11.5);
        assert!(number_map(&json!("rf_power=high"), "r").is_err());
    }

    #[test]
    fn test_rating_map_requires_whole_numbers() {
        let m = rating_map(&json!({"rf_power": 8}), "severity").unwrap();
        assert_eq!(m["rf_power"], 8);
        assert!(rating_map(&json!({"rf_power": 7.5}), "severity").is_err());
    }

    #[test]
    fn test_window_shapes() {
        let w = window(
            &json!({"pressure": {"min": 8, "max": 12, "unit": "mTorr"}, "rf_power": [550, 650]}),
            "process_window",
        )
        .unwrap();
        assert_eq!(w["pressure"], WindowBounds::new(8.0, 12.0).with_unit("mTorr"));
        assert_eq!(w["rf_power"], WindowBounds::new(550.0, 650.0));
        assert!(window(&json!({"pressure": "8-12"}), "process_window").is_err());
    }

    #[test]
    fn test_spec_and_control_limits() {
        let s = spec_limits(&json!({"USL": 50, "lsl": "40"}), "spec_limits").unwrap();
        assert_eq!((s.usl, s.lsl, s.target), (Some(50.0), Some(40.0), None));

        let c = control_limits(&json!({"ucl": 47, "lcl": 44}), "control_limits").unwrap();
        assert_eq!(c.cl, 45.5);
        assert!(control_limits(&json!({"ucl": 47}), "control_limits").is_err());
        assert!(control_limits(&json!({"ucl": 40, "lcl": 44}), "control_limits").is_err());
    }

    #[test]
    fn test_string_list_and_flags() {
        assert_eq!(
            string_list(&json!("rf_power, pressure"), "critical_params").unwrap(),
            vec!["rf_power".to_string(), "pressure".to_string()]
        );
        assert_eq!(string_list(&json!(["a", "", null]), "x").unwrap(), vec!["a".to_string()]);
        assert!(flag(&json!("false"), "detect_shift").is_ok_and(|b| !b));
        assert_eq!(count(&json!(3), "forecast_points").unwrap(), 3);
        assert!(count(&json!(-1), "forecast_points").is_err());
    }
}
