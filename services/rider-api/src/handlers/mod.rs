//! REST API handlers

pub mod activity;
pub mod auth;
pub mod comments;
mod grants;
pub mod health;
pub mod projects;
pub mod riders;
pub mod shared;
pub mod subscriptions;
pub mod sync;
pub mod webhook;

pub use activity::*;
pub use auth::*;
pub use comments::*;
pub use health::*;
pub use projects::*;
pub use riders::*;
pub use subscriptions::*;
pub use webhook::*;
