//! Configuration validation for pluggable implementations.
//!
//! Wallet providers and leads sources receive their settings as raw TOML
//! tables. Each implementation declares a [`Schema`] describing the fields it
//! needs; the schema is checked before the implementation is constructed so
//! misconfiguration is reported with the offending field name.

use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
	#[error("Missing required field: {0}")]
	MissingField(String),
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
}

/// Expected type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	String,
	/// Integer with optional inclusive bounds.
	Integer { min: Option<i64>, max: Option<i64> },
	Boolean,
	Array(Box<FieldType>),
	Table(Schema),
}

/// Extra check run after the type check passes.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	pub validator: Option<FieldValidator>,
}

impl std::fmt::Debug for Field {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Field")
			.field("name", &self.name)
			.field("field_type", &self.field_type)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl Field {
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	/// Attaches a custom validator that runs after the type check.
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}

	fn check(&self, value: &toml::Value) -> Result<(), ValidationError> {
		validate_field_type(&self.name, value, &self.field_type)?;
		if let Some(validator) = &self.validator {
			validator(value).map_err(|message| ValidationError::InvalidValue {
				field: self.name.clone(),
				message,
			})?;
		}
		Ok(())
	}
}

/// Required and optional fields of a TOML table.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates a TOML value against this schema.
	///
	/// Required fields must be present; optional fields are only checked when
	/// present. Nested tables are validated recursively and their errors are
	/// reported with a dotted field path.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::TypeMismatch {
				field: "root".to_string(),
				expected: "table".to_string(),
				actual: config.type_str().to_string(),
			})?;

		for field in &self.required {
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;
			field.check(value)?;
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				field.check(value)?;
			}
		}

		Ok(())
	}
}

fn type_mismatch(field_name: &str, expected: &str, value: &toml::Value) -> ValidationError {
	ValidationError::TypeMismatch {
		field: field_name.to_string(),
		expected: expected.to_string(),
		actual: value.type_str().to_string(),
	}
}

fn validate_field_type(
	field_name: &str,
	value: &toml::Value,
	expected_type: &FieldType,
) -> Result<(), ValidationError> {
	match expected_type {
		FieldType::String => {
			if !value.is_str() {
				return Err(type_mismatch(field_name, "string", value));
			}
		},
		FieldType::Integer { min, max } => {
			let int_val = value
				.as_integer()
				.ok_or_else(|| type_mismatch(field_name, "integer", value))?;

			if let Some(min_val) = min {
				if int_val < *min_val {
					return Err(ValidationError::InvalidValue {
						field: field_name.to_string(),
						message: format!("Value {} is less than minimum {}", int_val, min_val),
					});
				}
			}
			if let Some(max_val) = max {
				if int_val > *max_val {
					return Err(ValidationError::InvalidValue {
						field: field_name.to_string(),
						message: format!("Value {} is greater than maximum {}", int_val, max_val),
					});
				}
			}
		},
		FieldType::Boolean => {
			if !value.is_bool() {
				return Err(type_mismatch(field_name, "boolean", value));
			}
		},
		FieldType::Array(inner_type) => {
			let array = value
				.as_array()
				.ok_or_else(|| type_mismatch(field_name, "array", value))?;
			for (i, item) in array.iter().enumerate() {
				validate_field_type(&format!("{}[{}]", field_name, i), item, inner_type)?;
			}
		},
		FieldType::Table(schema) => {
			schema.validate(value).map_err(|e| match e {
				ValidationError::MissingField(f) => {
					ValidationError::MissingField(format!("{}.{}", field_name, f))
				},
				ValidationError::InvalidValue { field, message } => ValidationError::InvalidValue {
					field: format!("{}.{}", field_name, field),
					message,
				},
				ValidationError::TypeMismatch {
					field,
					expected,
					actual,
				} => ValidationError::TypeMismatch {
					field: format!("{}.{}", field_name, field),
					expected,
					actual,
				},
			})?;
		},
	}

	Ok(())
}

/// A configuration schema that can validate TOML values.
pub trait ConfigSchema: Send + Sync {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	fn wallet_schema() -> Schema {
		Schema::new(
			vec![Field::new("private_key", FieldType::String)],
			vec![
				Field::new(
					"poll_interval_seconds",
					FieldType::Integer {
						min: Some(1),
						max: Some(60),
					},
				),
				Field::new(
					"rpc_urls",
					FieldType::Table(Schema::new(vec![], vec![])),
				),
			],
		)
	}

	#[test]
	fn test_missing_required_field() {
		let config: toml::Value = toml::from_str("poll_interval_seconds = 5").unwrap();
		let err = wallet_schema().validate(&config).unwrap_err();
		assert!(matches!(err, ValidationError::MissingField(ref f) if f == "private_key"));
	}

	#[test]
	fn test_integer_bounds() {
		let config: toml::Value =
			toml::from_str("private_key = \"0x01\"\npoll_interval_seconds = 0").unwrap();
		let err = wallet_schema().validate(&config).unwrap_err();
		assert!(err.to_string().contains("less than minimum 1"));
	}

	#[test]
	fn test_custom_validator_and_nested_path() {
		let schema = Schema::new(
			vec![Field::new(
				"bridge",
				FieldType::Table(Schema::new(
					vec![Field::new("url", FieldType::String).with_validator(|v| {
						match v.as_str() {
							Some(url) if url.starts_with("http") => Ok(()),
							_ => Err("url must be http(s)".to_string()),
						}
					})],
					vec![],
				)),
			)],
			vec![],
		);

		let config: toml::Value = toml::from_str("[bridge]\nurl = \"ws://wallet\"").unwrap();
		let err = schema.validate(&config).unwrap_err();
		match err {
			ValidationError::InvalidValue { field, message } => {
				assert_eq!(field, "bridge.url");
				assert_eq!(message, "url must be http(s)");
			},
			other => panic!("unexpected error: {other}"),
		}
	}

	#[test]
	fn test_type_mismatch() {
		let config: toml::Value = toml::from_str("private_key = 42").unwrap();
		let err = wallet_schema().validate(&config).unwrap_err();
		assert!(matches!(err, ValidationError::TypeMismatch { ref expected, .. } if expected == "string"));
	}
}
