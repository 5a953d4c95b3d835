//! Command implementations

pub mod address;
pub mod burner;
pub mod generate;
pub mod list;
pub mod sweep;
pub mod swap;
