pub mod config;
pub mod form;
pub mod source;
pub mod utils;

pub use conform_spec as spec;
