//! Utility modules for the Numerator SDK.

pub mod case;
pub mod flag;
pub mod timeout;

pub use case::{camel_to_snake, snake_case_keys};
pub use flag::{flag_equals_value, flag_is_off, flag_is_on};
pub use timeout::with_timeout;
