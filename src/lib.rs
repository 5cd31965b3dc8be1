// ABOUTME: Library root for lanattach - attaches servers to LANs with floating IPs.
// ABOUTME: The CLI binary is in main.rs.

pub mod attach;
pub mod config;
pub mod error;
pub mod output;
pub mod provider;
pub mod types;
