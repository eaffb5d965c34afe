//! Session module: the boundary with the simulator site.
//!
//! This module handles:
//! - Route resolution
//! - Authenticated page fetches
//! - Anti-forgery token scraping
//! - Mock session for testing

pub mod client;
pub mod mock;
pub mod routes;
pub mod token;

pub use client::{Session, SimulatorSession};
pub use mock::{MockPage, MockSession};
pub use routes::{Route, Routes};
pub use token::extract_form_token;
