pub mod fields;
pub mod rollup;
pub mod status;
