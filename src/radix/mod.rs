pub mod core;
pub mod histogram;
pub mod permute;
pub mod section;


pub use self::core::{parallel_radix_sort, sort};
pub use self::section::Section;
