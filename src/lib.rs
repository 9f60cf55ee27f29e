pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructures;
pub mod telemetry;

#[cfg(test)]
mod test_utils;
