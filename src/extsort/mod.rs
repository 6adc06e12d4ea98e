pub mod core;
pub mod merge;


pub use self::core::*;
