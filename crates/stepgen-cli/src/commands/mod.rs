pub mod generate;
pub mod scan;
