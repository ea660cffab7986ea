pub mod common;
pub mod pagination;
pub mod participation;

pub use common::*;
pub use pagination::*;
pub use participation::*;
