//! WS-I Basic Profile 1.1 checks over a finished description.

mod checker;
pub mod rules;

pub use checker::{check, check_claims};
pub use rules::{RuleCode, Violation};
