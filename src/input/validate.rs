//! Schema validation of tool arguments

use jsonschema::error::ValidationErrorKind;
use jsonschema::{validator_for, ValidationError as JsonSchemaError, Validator as JsonValidator};
use serde_json::{Map, Value};

use super::InputError;

/// Compiled input schema for one tool
pub struct ArgumentValidator {
    compiled: JsonValidator,
}

impl std::fmt::Debug for ArgumentValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArgumentValidator").finish_non_exhaustive()
    }
}

impl ArgumentValidator {
    pub fn new(schema: &Value) -> Result<Self, InputError> {
        let compiled = validator_for(schema).map_err(|e| InputError::Schema(e.to_string()))?;
        Ok(Self { compiled })
    }

    /// Check arguments before any analysis runs
    ///
    /// Every missing required field is reported together. Top-level nulls
    /// count as missing. Other violations report the first offending field.
    pub fn check(&self, args: &Map<String, Value>) -> Result<(), InputError> {
        let instance = Value::Object(
            args.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        );

        let mut missing = Vec::new();
        let mut first_other: Option<InputError> = None;
        for error in self.compiled.iter_errors(&instance) {
            match &error.kind {
                ValidationErrorKind::Required { property } if error.instance_path.as_str().is_empty() => {
                    let name = property
                        .as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| property.to_string());
                    missing.push(name);
                }
                _ => {
                    if first_other.is_none() {
                        first_other = Some(violation(&error));
                    }
                }
            }
        }

        if !missing.is_empty() {
            return Err(InputError::MissingFields(missing));
        }
        match first_other {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn violation(error: &JsonSchemaError) -> InputError {
    let path = error.instance_path.as_str().trim_start_matches('/').replace('/', ".");
    let field = if path.is_empty() {
        "arguments".to_string()
    } else {
        path
    };
    let reason = match &error.kind {
        ValidationErrorKind::Required { property } => {
            format!("missing required field {}", property)
        }
        ValidationErrorKind::Type { kind } => format!("wrong type, expected {:?}", kind),
        ValidationErrorKind::Enum { options } => format!("must be one of {}", options),
        ValidationErrorKind::Minimum { limit } => format!("must be at least {}", limit),
        ValidationErrorKind::Maximum { limit } => format!("must be at most {}", limit),
        _ => error.to_string(),
    };
    InputError::InvalidArguments { field, reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validator() -> ArgumentValidator {
        ArgumentValidator::new(&json!({
            "type": "object",
            "properties": {
                "data_points": {"type": ["array", "string"]},
                "spec_limits": {"type": "object"},
                "severity": {"type": "string", "enum": ["critical", "major", "minor"]}
            },
            "required": ["data_points", "spec_limits"]
        }))
        .unwrap()
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_reports_every_missing_field() {
        let err = validator().check(&Map::new()).unwrap_err();
        assert_eq!(
            err,
            InputError::MissingFields(vec!["data_points".to_string(), "spec_limits".to_string()])
        );
    }

    #[test]
    fn test_null_counts_as_missing() {
        let err = validator()
            .check(&args(json!({"data_points": [1.0], "spec_limits": null})))
            .unwrap_err();
        assert_eq!(err, InputError::MissingFields(vec!["spec_limits".to_string()]));
    }

    #[test]
    fn test_type_violation_names_field() {
        let err = validator()
            .check(&args(json!({"data_points": [1.0], "spec_limits": 5})))
            .unwrap_err();
        match err {
            InputError::InvalidArguments { field, .. } => assert_eq!(field, "spec_limits"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_enum_violation() {
        let err = validator()
            .check(&args(json!({"data_points": "1,2", "spec_limits": {}, "severity": "urgent"})))
            .unwrap_err();
        assert!(matches!(err, InputError::InvalidArguments { ref field, .. } if field == "severity"));
    }

    #[test]
    fn test_valid_arguments_pass() {
        assert!(validator()
            .check(&args(json!({"data_points": "45.2, 45.8", "spec_limits": {"usl": 50}})))
            .is_ok());
    }
}
