//! Seed the built-in plans and a default admin account.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use rider_auth_core::password::hash_password;
use rider_db::{CreateUser, PlanRepository, Repositories, UpsertPlan, UserRepository};
use rider_types::{normalize_email, PlanName, UserStatus};

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn plan_input(plan: PlanName) -> anyhow::Result<UpsertPlan> {
    let prefix = format!("STRIPE_{}", plan.as_str().to_uppercase());
    let price_cents = match env_opt(&format!("{prefix}_PRICE_CENTS")) {
        Some(raw) => raw.parse()?,
        None => 0,
    };

    Ok(UpsertPlan {
        name: plan.as_str().to_string(),
        abilities: plan.abilities().iter().map(|a| a.to_string()).collect(),
        max_riders_allowed: plan.default_max_riders(),
        stripe_price_id: match plan {
            PlanName::Free => None,
            _ => env_opt(&format!("{prefix}_PRICE_ID")),
        },
        price_cents,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("seed=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
    let pool = rider_db::create_pool(&database_url).await?;
    let repos = Repositories::new(pool);

    for plan in PlanName::ALL {
        let row = repos.plans.upsert(plan_input(plan)?).await?;
        tracing::info!(
            plan = %row.name,
            max_riders = row.max_riders_allowed,
            purchasable = row.stripe_price_id.is_some(),
            "Plan seeded"
        );
    }

    let admin_email = normalize_email(
        &env_opt("ADMIN_EMAIL").unwrap_or_else(|| "admin@cfs.local".to_string()),
    );
    let admin_password = match env_opt("ADMIN_PASSWORD") {
        Some(password) => password,
        None => {
            tracing::warn!("ADMIN_PASSWORD not set; using the default password");
            "admin123".to_string()
        }
    };

    if repos.users.find_by_email(&admin_email).await?.is_some() {
        tracing::info!(email = %admin_email, "Admin user already exists");
        return Ok(());
    }

    let pro = repos.plans.find_by_name(PlanName::Pro.as_str()).await?;
    let admin = repos
        .users
        .create(CreateUser {
            id: Uuid::new_v4(),
            name: "Admin".to_string(),
            email: admin_email,
            password_hash: hash_password(&admin_password)?,
            contact_phone: None,
            status: UserStatus::Active.as_str().to_string(),
            default_plan_id: pro.map(|p| p.id),
        })
        .await?;

    tracing::info!(user_id = %admin.id, email = %admin.email, "Admin user created on the pro plan");
    Ok(())
}
