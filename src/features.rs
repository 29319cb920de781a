use crate::error::ApiError;
use ndarray::Array2;
use serde_json::Value;

/// Number of measurements in every feature vector.
pub const FEATURE_COUNT: usize = 4;

const FEATURES_KEY: &str = "features";

/// Parses a raw request body and validates it into an N x `expected` matrix.
pub fn validate_request(body: &[u8], expected: usize) -> Result<Array2<f64>, ApiError> {
    let payload: Value = serde_json::from_slice(body).map_err(|_| ApiError::InvalidJson)?;
    validate_payload(&payload, expected)
}

/// Extracts `features` from an already parsed payload.
/// A flat vector is promoted to a single row.
pub fn validate_payload(payload: &Value, expected: usize) -> Result<Array2<f64>, ApiError> {
    let features = payload
        .as_object()
        .and_then(|obj| obj.get(FEATURES_KEY))
        .ok_or(ApiError::MissingFeatures)?;

    let matrix = coerce_matrix(features)?;
    if matrix.ncols() != expected {
        return Err(ApiError::FeatureCount {
            expected,
            got: matrix.ncols(),
        });
    }

    Ok(matrix)
}

fn coerce_matrix(features: &Value) -> Result<Array2<f64>, ApiError> {
    let items = match features {
        Value::Array(items) => items,
        scalar => return Ok(Array2::from_elem((1, 1), coerce_scalar(scalar)?)),
    };

    if items.iter().all(|v| !v.is_array()) {
        let row = coerce_row(items)?;
        let width = row.len();
        return Array2::from_shape_vec((1, width), row)
            .map_err(|e| ApiError::Malformed(e.to_string()));
    }

    if !items.iter().all(Value::is_array) {
        return Err(ApiError::Malformed(
            "features must not mix numbers and rows".to_string(),
        ));
    }

    let mut width = None;
    let mut flat = Vec::new();
    for item in items {
        let row = coerce_row(item.as_array().map(Vec::as_slice).unwrap_or_default())?;
        match width {
            None => width = Some(row.len()),
            Some(w) if w != row.len() => {
                return Err(ApiError::Malformed(
                    "features rows must all have the same length".to_string(),
                ))
            }
            Some(_) => {}
        }
        flat.extend(row);
    }

    let shape = (items.len(), width.unwrap_or(0));
    Array2::from_shape_vec(shape, flat).map_err(|e| ApiError::Malformed(e.to_string()))
}

fn coerce_row(items: &[Value]) -> Result<Vec<f64>, ApiError> {
    items.iter().map(coerce_scalar).collect()
}

fn coerce_scalar(value: &Value) -> Result<f64, ApiError> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Array(_) => {
            return Err(ApiError::Malformed(
                "features must be a vector or a matrix of numbers".to_string(),
            ))
        }
        _ => None,
    };

    match number {
        Some(x) if x.is_finite() => Ok(x),
        _ => Err(ApiError::Malformed(format!(
            "could not convert {value} to a number"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use serde_json::json;

    #[test]
    fn flat_vector_is_promoted_to_one_row() {
        let flat = validate_payload(&json!({"features": [5.1, 3.5, 1.4, 0.2]}), 4).unwrap();
        let nested = validate_payload(&json!({"features": [[5.1, 3.5, 1.4, 0.2]]}), 4).unwrap();
        assert_eq!(flat, array![[5.1, 3.5, 1.4, 0.2]]);
        assert_eq!(flat, nested);
    }

    #[test]
    fn matrix_keeps_row_order() {
        let matrix = validate_payload(
            &json!({"features": [[5.1, 3.5, 1.4, 0.2], [6.7, 3.0, 5.2, 2.3]]}),
            4,
        )
        .unwrap();
        assert_eq!(matrix.dim(), (2, 4));
        assert_eq!(matrix[[1, 0]], 6.7);
    }

    #[test]
    fn numeric_strings_and_bools_are_coerced() {
        let matrix = validate_payload(&json!({"features": ["5.1", 3, true, false]}), 4).unwrap();
        assert_eq!(matrix, array![[5.1, 3.0, 1.0, 0.0]]);
    }

    #[test]
    fn invalid_json_is_rejected_before_key_lookup() {
        let err = validate_request(b"{\"features\": [1, 2", 4).unwrap_err();
        assert!(matches!(err, ApiError::InvalidJson));
        assert_eq!(err.to_string(), "Invalid JSON");
    }

    #[test]
    fn missing_key_mentions_features() {
        let err = validate_request(br#"{"values": [1, 2, 3, 4]}"#, 4).unwrap_err();
        assert!(matches!(err, ApiError::MissingFeatures));
        assert!(err.to_string().contains("features"));

        let err = validate_request(b"[1, 2, 3, 4]", 4).unwrap_err();
        assert!(matches!(err, ApiError::MissingFeatures));
    }

    #[test]
    fn wrong_column_count_reports_both_counts() {
        for (features, got) in [(json!([1, 2, 3]), 3), (json!([[1, 2, 3, 4, 5]]), 5)] {
            let err = validate_payload(&json!({ "features": features }), 4).unwrap_err();
            assert_eq!(err.to_string(), format!("Expected 4 features, got {got}"));
        }
    }

    #[test]
    fn empty_and_scalar_inputs_fail_on_column_count() {
        let err = validate_payload(&json!({"features": []}), 4).unwrap_err();
        assert!(matches!(err, ApiError::FeatureCount { got: 0, .. }));

        let err = validate_payload(&json!({"features": 7.0}), 4).unwrap_err();
        assert!(matches!(err, ApiError::FeatureCount { got: 1, .. }));
    }

    #[test]
    fn non_numeric_entries_are_malformed() {
        for features in [
            json!([5.1, "abc", 1.4, 0.2]),
            json!([5.1, null, 1.4, 0.2]),
            json!([5.1, {"x": 1}, 1.4, 0.2]),
            json!(["NaN", 3.5, 1.4, 0.2]),
        ] {
            let err = validate_payload(&json!({ "features": features }), 4).unwrap_err();
            assert!(matches!(err, ApiError::Malformed(_)), "{err:?}");
        }
    }

    #[test]
    fn ragged_and_deep_inputs_are_malformed() {
        for features in [
            json!([[1, 2, 3, 4], [1, 2, 3]]),
            json!([1, [2, 3, 4, 5]]),
            json!([[[1, 2, 3, 4]]]),
        ] {
            let err = validate_payload(&json!({ "features": features }), 4).unwrap_err();
            assert!(matches!(err, ApiError::Malformed(_)), "{err:?}");
        }
    }
}
