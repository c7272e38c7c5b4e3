//! Error kinds raised by the sizing engine.

use thiserror::Error;

/// A policy, sizing or run parameter violates its stated constraint.
///
/// Raised at construction time, before any sample is processed.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("configuration error: {field}: {message}")]
pub struct ConfigurationError {
    /// Name (or dotted path) of the offending field, e.g. `"import_limit_kw"`.
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigurationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Prefixes the field with a section name: `import_limit_kw` → `policy.import_limit_kw`.
    pub fn within(self, section: &str) -> Self {
        Self {
            field: format!("{section}.{}", self.field),
            message: self.message,
        }
    }
}

/// The input series does not satisfy what the selected run needs.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("validation error: {field}: {message}")]
pub struct ValidationError {
    /// Input column the problem was found in, e.g. `"price"`.
    pub field: String,
    /// Human-readable description, including the offending row when known.
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Any failure of a sizing run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl Error {
    /// Name of the offending field regardless of the error kind.
    pub fn field(&self) -> &str {
        match self {
            Self::Configuration(e) => &e.field,
            Self::Validation(e) => &e.field,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_field() {
        let e = ConfigurationError::new("import_limit_kw", "must be > 0");
        assert_eq!(
            e.to_string(),
            "configuration error: import_limit_kw: must be > 0"
        );
    }

    #[test]
    fn within_prefixes_section() {
        let e = ConfigurationError::new("high_price", "must be > low_price").within("policy");
        assert_eq!(e.field, "policy.high_price");
    }

    #[test]
    fn unified_error_keeps_field() {
        let e: Error = ValidationError::new("price", "missing at sample 3").into();
        assert_eq!(e.field(), "price");
        assert!(matches!(e, Error::Validation(_)));
    }
}
