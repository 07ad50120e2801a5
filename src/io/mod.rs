pub mod artifacts;
pub mod run_log;
