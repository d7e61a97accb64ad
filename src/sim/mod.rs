pub mod channel;
pub mod config;
pub mod stress;
pub mod top;
