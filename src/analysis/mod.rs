pub mod annotate;
pub mod error;
pub mod rolling;
pub mod threshold_table;
