pub mod commit;
pub mod config;
pub mod deploy;
pub mod diff;
pub mod hash;
pub mod report;
