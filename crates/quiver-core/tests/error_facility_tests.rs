use quiver_core::errors::{ExError, ExErrorKind, ModelError};

#[test]
fn test_empty_manufacturer_is_invalid_specification() {
    let ex_err: ExError = ModelError::EmptyManufacturer.into();

    assert_eq!(ex_err.kind(), ExErrorKind::InvalidSpecification);
    assert_eq!(ex_err.code(), "ERR_INVALID_SPECIFICATION");
    assert_eq!(ex_err.op(), Some("validate_arrow"));
}

#[test]
fn test_duplicate_spine_carries_model_name() {
    let err = ModelError::DuplicateSpine {
        model_name: "Hunter XT".to_string(),
        spine: 340,
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.entity_id(), Some("Hunter XT"));
    assert!(ex_err.message().contains("340"));
}

#[test]
fn test_calculator_input_is_invalid_input() {
    let err = ModelError::InvalidCalculatorInput {
        reason: "draw weight must be positive".to_string(),
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::InvalidInput);
    assert_eq!(ex_err.code(), "ERR_INVALID_INPUT");
}

#[test]
fn test_error_kind_code_mapping() {
    let kinds = vec![
        (ExErrorKind::NotFound, "ERR_NOT_FOUND"),
        (ExErrorKind::AlreadyExists, "ERR_ALREADY_EXISTS"),
        (ExErrorKind::MigrationFailed, "ERR_MIGRATION_FAILED"),
        (ExErrorKind::DependencyCycle, "ERR_DEPENDENCY_CYCLE"),
        (ExErrorKind::ChecksumMismatch, "ERR_CHECKSUM_MISMATCH"),
        (ExErrorKind::ExtractionFailed, "ERR_EXTRACTION_FAILED"),
        (ExErrorKind::Persistence, "ERR_PERSISTENCE"),
    ];

    for (kind, expected_code) in kinds {
        assert_eq!(kind.code(), expected_code);
    }
}

#[test]
fn test_display_chains_source() {
    let root = ExError::new(ExErrorKind::Io).with_message("disk full");
    let err = ExError::new(ExErrorKind::Persistence)
        .with_op("import_file")
        .with_entity_id("easton.json")
        .with_source(root);

    let rendered = err.to_string();

    assert!(rendered.starts_with("[ERR_PERSISTENCE]"));
    assert!(rendered.contains("import_file"));
    assert!(rendered.contains("easton.json"));
    assert!(rendered.contains("disk full"));
    assert!(std::error::Error::source(&err).is_some());
}
