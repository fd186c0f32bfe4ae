//! Course validation

pub mod course_validator;

pub use course_validator::{validate, validate_document, ValidationErrors, ValidationResult, Violation};
