//! PostgreSQL repository implementations

mod activity;
mod comment;
mod favorite;
mod grant;
mod plan;
mod project;
mod rider;
mod subscription;
mod transaction;
mod user;

pub use activity::PgActivityRepository;
pub use comment::PgCommentRepository;
pub use favorite::PgFavoriteRepository;
pub use grant::PgGrantRepository;
pub use plan::PgPlanRepository;
pub use project::PgProjectRepository;
pub use rider::PgRiderRepository;
pub use subscription::PgSubscriptionRepository;
pub use transaction::PgTransactionRepository;
pub use user::PgUserRepository;

use crate::DbPool;

/// All repositories bundled together
#[derive(Clone)]
pub struct Repositories {
    pub users: PgUserRepository,
    pub plans: PgPlanRepository,
    pub subscriptions: PgSubscriptionRepository,
    pub transactions: PgTransactionRepository,
    pub grants: PgGrantRepository,
    pub projects: PgProjectRepository,
    pub riders: PgRiderRepository,
    pub comments: PgCommentRepository,
    pub activities: PgActivityRepository,
    pub favorites: PgFavoriteRepository,
}

impl Repositories {
    /// Create all repositories from a database pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            users: PgUserRepository::new(pool.clone()),
            plans: PgPlanRepository::new(pool.clone()),
            subscriptions: PgSubscriptionRepository::new(pool.clone()),
            transactions: PgTransactionRepository::new(pool.clone()),
            grants: PgGrantRepository::new(pool.clone()),
            projects: PgProjectRepository::new(pool.clone()),
            riders: PgRiderRepository::new(pool.clone()),
            comments: PgCommentRepository::new(pool.clone()),
            activities: PgActivityRepository::new(pool.clone()),
            favorites: PgFavoriteRepository::new(pool),
        }
    }
}
