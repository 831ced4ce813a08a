pub mod common;
pub mod explain;
pub mod print;
pub mod validate;
