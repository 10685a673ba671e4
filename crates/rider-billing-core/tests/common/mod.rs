//! Shared test utilities

pub mod mock_repos;

#[allow(unused_imports)]
pub use mock_repos::{MockBillingStore, MockProvider};
