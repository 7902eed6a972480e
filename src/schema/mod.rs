//! Request body schemas and the validator that enforces them

pub mod definitions;
mod validator;

pub use validator::{
    DiscriminatedSchema, Keyword, SchemaValidationResult, Violation, validate,
};
