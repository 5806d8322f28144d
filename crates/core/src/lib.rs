pub mod money;
pub mod unit;

pub use money::Money;
pub use unit::{Unit, UnitParseError};
