//! Input and output formats of the command-line driver.

pub mod csv;
pub mod seed;
