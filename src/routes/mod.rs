pub mod health;
pub mod merge;
