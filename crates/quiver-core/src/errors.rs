use thiserror::Error;

/// Result type alias using ModelError
pub type Result<T> = std::result::Result<T, ModelError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// A stable classification of every error raised by Quiver. Each kind maps
/// to a stable error code usable by tests, logs and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Structural/Validation
    InvalidInput,
    NotFound,
    AlreadyExists,
    ConstraintViolation,
    InvalidSpecification,

    // Migrations
    MigrationFailed,
    /// Pending migrations reference each other circularly or name unknown versions
    DependencyCycle,
    ChecksumMismatch,

    // Scraping
    /// The LLM returned something that could not be turned into arrow data
    ExtractionFailed,
    Configuration,

    // Integration/IO
    Io,
    Serialization,
    Persistence,
    ExternalService,
    Timeout,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::AlreadyExists => "ERR_ALREADY_EXISTS",
            ExErrorKind::ConstraintViolation => "ERR_CONSTRAINT_VIOLATION",
            ExErrorKind::InvalidSpecification => "ERR_INVALID_SPECIFICATION",
            ExErrorKind::MigrationFailed => "ERR_MIGRATION_FAILED",
            ExErrorKind::DependencyCycle => "ERR_DEPENDENCY_CYCLE",
            ExErrorKind::ChecksumMismatch => "ERR_CHECKSUM_MISMATCH",
            ExErrorKind::ExtractionFailed => "ERR_EXTRACTION_FAILED",
            ExErrorKind::Configuration => "ERR_CONFIGURATION",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::ExternalService => "ERR_EXTERNAL_SERVICE",
            ExErrorKind::Timeout => "ERR_TIMEOUT",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries classification fields for programmatic handling and context
/// (operation, entity) for debugging.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context (arrow id, migration version, manufacturer, url)
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the entity ID context, if any
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(source) = &self.source {
            write!(f, " <- {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|s| s as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Validation errors raised by the domain model and calculators
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Manufacturer name missing or blank
    #[error("Manufacturer name cannot be empty")]
    EmptyManufacturer,

    /// Model name missing or blank
    #[error("Model name cannot be empty")]
    EmptyModelName,

    /// Arrow carries no spine specifications
    #[error("Arrow {model_name} has no spine specifications")]
    NoSpineSpecifications { model_name: String },

    /// Same spine listed twice for one arrow
    #[error("Arrow {model_name} lists spine {spine} more than once")]
    DuplicateSpine { model_name: String, spine: u32 },

    #[error("Spine {spine} is outside 1..=2000")]
    SpineOutOfRange { spine: u32 },

    #[error("Outer diameter {value} must be in (0, 1.0]")]
    InvalidOuterDiameter { value: f64 },

    #[error("Inner diameter {inner} must be positive and smaller than outer diameter {outer}")]
    InvalidInnerDiameter { inner: f64, outer: f64 },

    #[error("GPI weight {value} must be in (0, 50]")]
    InvalidGpi { value: f64 },

    /// Calculator input that cannot produce a meaningful result
    #[error("Invalid calculator input: {reason}")]
    InvalidCalculatorInput { reason: String },

    /// Unknown enumerated value (bow type, cam type, rest type ...)
    #[error("Unknown {field} value: {value}")]
    UnknownVariant { field: String, value: String },
}

impl From<ModelError> for ExError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::EmptyManufacturer => ExError::new(ExErrorKind::InvalidSpecification)
                .with_op("validate_arrow")
                .with_message("Manufacturer name cannot be empty"),

            ModelError::EmptyModelName => ExError::new(ExErrorKind::InvalidSpecification)
                .with_op("validate_arrow")
                .with_message("Model name cannot be empty"),

            ModelError::NoSpineSpecifications { model_name } => {
                ExError::new(ExErrorKind::InvalidSpecification)
                    .with_op("validate_arrow")
                    .with_entity_id(model_name)
                    .with_message("Arrow has no spine specifications")
            }

            ModelError::DuplicateSpine { model_name, spine } => {
                ExError::new(ExErrorKind::InvalidSpecification)
                    .with_op("validate_arrow")
                    .with_entity_id(model_name)
                    .with_message(format!("Duplicate spine {}", spine))
            }

            e @ (ModelError::SpineOutOfRange { .. }
            | ModelError::InvalidOuterDiameter { .. }
            | ModelError::InvalidInnerDiameter { .. }
            | ModelError::InvalidGpi { .. }) => ExError::new(ExErrorKind::InvalidSpecification)
                .with_op("validate_spine_specification")
                .with_message(e.to_string()),

            ModelError::InvalidCalculatorInput { reason } => {
                ExError::new(ExErrorKind::InvalidInput)
                    .with_op("calculate")
                    .with_message(reason)
            }

            ModelError::UnknownVariant { field, value } => ExError::new(ExErrorKind::InvalidInput)
                .with_op("parse")
                .with_entity_id(value)
                .with_message(format!("Unknown {}", field)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_prefixed_and_unique() {
        let kinds = [
            ExErrorKind::InvalidInput,
            ExErrorKind::NotFound,
            ExErrorKind::AlreadyExists,
            ExErrorKind::ConstraintViolation,
            ExErrorKind::InvalidSpecification,
            ExErrorKind::MigrationFailed,
            ExErrorKind::DependencyCycle,
            ExErrorKind::ChecksumMismatch,
            ExErrorKind::ExtractionFailed,
            ExErrorKind::Configuration,
            ExErrorKind::Io,
            ExErrorKind::Serialization,
            ExErrorKind::Persistence,
            ExErrorKind::ExternalService,
            ExErrorKind::Timeout,
            ExErrorKind::Internal,
        ];
        let mut codes: Vec<&str> = kinds.iter().map(|k| k.code()).collect();
        assert!(codes.iter().all(|c| c.starts_with("ERR_")));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());
    }

    #[test]
    fn test_display_includes_context() {
        let err = ExError::new(ExErrorKind::NotFound)
            .with_op("get_arrow")
            .with_entity_id("42")
            .with_message("Arrow not found");
        let s = err.to_string();
        assert_eq!(
            s,
            "[ERR_NOT_FOUND] in operation 'get_arrow': Arrow not found (entity_id: 42)"
        );
    }

    #[test]
    fn test_source_chain() {
        let inner = ExError::new(ExErrorKind::Persistence).with_message("disk full");
        let outer = ExError::new(ExErrorKind::MigrationFailed).with_source(inner);
        assert_eq!(
            outer.source_error().map(|e| e.kind()),
            Some(ExErrorKind::Persistence)
        );
        assert!(std::error::Error::source(&outer).is_some());
    }
}
