//! Common test utilities for rider-auth-core integration tests

pub mod mock_repos;

#[allow(unused_imports)]
pub use mock_repos::{
    MockGrantRepository, MockPlanRepository, MockRiderRepository, MockSubscriptionRepository,
    MockUserRepository,
};
