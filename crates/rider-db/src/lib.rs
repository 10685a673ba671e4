//! Rider DB - Database abstractions
//!
//! SQLx-based database layer for the rider services. The reference schema
//! lives in `schema.sql` next to this crate's manifest.
//!
//! # Example
//!
//! ```rust,ignore
//! use rider_db::{create_pool, Repositories};
//!
//! let pool = create_pool("postgres://localhost/riders").await?;
//! let repos = Repositories::new(pool);
//!
//! let user = repos.users.find_by_email("user@example.com").await?;
//! ```

pub mod error;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
pub use models::*;
pub use pg::Repositories;
pub use pool::{create_pool, create_pool_with_options, DbPool, PoolOptions};
pub use repo::*;
