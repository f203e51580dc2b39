pub mod collection;
pub mod recognition;
pub mod shared;
