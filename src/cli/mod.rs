pub mod recipe;
pub mod serve;
