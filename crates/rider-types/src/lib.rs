//! Rider Types - Shared domain types
//!
//! This crate contains domain types used across the rider services:
//! - User lifecycle status and email normalization
//! - Sharing permissions and the actions they unlock
//! - Subscription plans, subscription and transaction states

pub mod error;
pub mod permission;
pub mod plan;
pub mod subscription;
pub mod user;

pub use error::*;
pub use permission::*;
pub use plan::*;
pub use subscription::*;
pub use user::*;
