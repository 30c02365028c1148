//! Conditional field validation.
//!
//! The central piece is [`dependency::DependencyValidator`]: it compares one
//! or more guard fields against expected values and applies a named rule
//! (`required`, `must_be_null`, `optional`, `immutable` or a custom one) to
//! the field being validated. [`delegate::ConditionalDelegate`] runs another
//! validator only when the input is not null.
//!
//! Persistence is abstracted behind [`store::ValueStore`]; this crate never
//! talks to a database itself.

pub mod delegate;
pub mod dependency;
pub mod error;
pub mod pattern;
pub mod registry;
pub mod store;
pub mod types;
pub mod validator;

pub use delegate::ConditionalDelegate;
pub use dependency::{Collaborators, DependencyValidator};
pub use error::CoreError;
pub use registry::{FactoryRegistry, ValidatorRegistry};
pub use types::Record;
pub use validator::{ValidationResult, Validator};
