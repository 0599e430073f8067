//! JSON-schema fragments used as key or value patterns.
//!
//! The candidate is always a single header/cookie/parameter string, so it is
//! coerced into JSON before validation: first as a JSON string, then as the
//! scalar it parses to (number, boolean, null) if any.

use serde_json::Value;

/// A parsed and compiled JSON-schema document.
pub struct CompiledSchema {
    validator: jsonschema::Validator,
    nullable: bool,
}

impl CompiledSchema {
    /// Parse and compile a schema document.
    ///
    /// Returns the parse or compile error as text; callers report it and
    /// treat the clause as never matching.
    pub fn compile(schema: &str) -> Result<Self, String> {
        let document: Value = serde_json::from_str(schema).map_err(|e| e.to_string())?;
        if !document.is_object() && !document.is_boolean() {
            return Err("schema must be a JSON object or boolean".to_string());
        }
        let nullable = document
            .get("nullable")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let validator = jsonschema::options()
            .should_validate_formats(true)
            .build(&document)
            .map_err(|e| e.to_string())?;
        Ok(Self {
            validator,
            nullable,
        })
    }

    /// Validate a raw string against the schema.
    pub fn accepts(&self, actual: &str) -> bool {
        if actual.is_empty() && self.nullable {
            return true;
        }
        if self.validator.is_valid(&Value::String(actual.to_string())) {
            return true;
        }
        match serde_json::from_str::<Value>(actual) {
            Ok(scalar @ (Value::Number(_) | Value::Bool(_) | Value::Null)) => {
                self.validator.is_valid(&scalar)
            }
            _ => false,
        }
    }
}

impl std::fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("nullable", &self.nullable)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_schema_coerces_numeric_strings() {
        let schema = CompiledSchema::compile(r#"{ "type": "number" }"#).unwrap();
        assert!(schema.accepts("1"));
        assert!(schema.accepts("2.5"));
        assert!(!schema.accepts("a"));
    }

    #[test]
    fn test_integer_schema() {
        let schema = CompiledSchema::compile(r#"{ "type": "integer" }"#).unwrap();
        assert!(schema.accepts("1"));
        assert!(!schema.accepts("1.5"));
        assert!(!schema.accepts("a"));
    }

    #[test]
    fn test_nullable_accepts_empty() {
        let schema =
            CompiledSchema::compile(r#"{ "type": "integer", "nullable": true }"#).unwrap();
        assert!(schema.accepts("1"));
        assert!(schema.accepts(""));
        assert!(!schema.accepts("a"));
    }

    #[test]
    fn test_string_length_schema() {
        let schema =
            CompiledSchema::compile(r#"{ "type": "string", "minLength": 2, "maxLength": 3 }"#)
                .unwrap();
        assert!(schema.accepts("abc"));
        assert!(schema.accepts("ab"));
        assert!(!schema.accepts("a"));
        assert!(!schema.accepts("abcd"));
    }

    #[test]
    fn test_multiple_of_schema() {
        let schema =
            CompiledSchema::compile(r#"{ "type": "number", "multipleOf": 10 }"#).unwrap();
        assert!(schema.accepts("10"));
        assert!(schema.accepts("20"));
        assert!(!schema.accepts("23"));
    }

    #[test]
    fn test_pattern_schema() {
        let schema = CompiledSchema::compile(
            r#"{ "type": "string", "pattern": "^(\\([0-9]{3}\\))?[0-9]{3}-[0-9]{4}$" }"#,
        )
        .unwrap();
        assert!(schema.accepts("555-1212"));
        assert!(schema.accepts("(888)555-1212"));
        assert!(!schema.accepts("(800)FLOWERS"));
    }

    #[test]
    fn test_invalid_schema_documents() {
        assert!(CompiledSchema::compile("{ not json").is_err());
        assert!(CompiledSchema::compile("\"just a string\"").is_err());
        assert!(CompiledSchema::compile(r#"{ "type": 12 }"#).is_err());
    }
}
