pub mod analysis; // Keyword analysis of clinician notes
pub mod authorization; // PMB lookup & compliance service
pub mod config;
pub mod db;
pub mod models;
pub mod reference; // Reference table loading & memoization
pub mod report; // Claim document rendering
