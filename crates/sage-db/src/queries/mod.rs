//! Database query functions, one module per table.

pub mod feedback;
pub mod plans;
