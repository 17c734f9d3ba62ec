pub mod activity;
pub mod heart_rate;
