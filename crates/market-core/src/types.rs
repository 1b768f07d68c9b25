//! Numeric and time primitives.
//!
//! Every money-like quantity is an exact base-10 decimal. `Price` and `Amount`
//! are distinct non-negative newtypes so the compiler rejects mixing them.

pub mod amount;
pub mod decimal;
pub mod price;
pub mod time;

pub use amount::*;
pub use decimal::*;
pub use price::*;
pub use time::*;
