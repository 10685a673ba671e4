//! Mock repositories for testing

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use rider_db::{
    CheckoutActivation, CheckoutOutcome, CreateRider, CreateUser, CurrentSubscriptionRow,
    DbError, DbResult, GrantRepository, GrantRow, InvoiceEvent, NewActivity, PlanRepository,
    PlanRow, RiderRepository, RiderRow, SubscriptionRepository, SubscriptionTransition,
    UpdateRider, UpsertPlan, UserRepository, UserRow,
};
use rider_types::{GrantScope, Permission};

/// In-memory user repository for testing
#[derive(Default, Clone)]
pub struct MockUserRepository {
    users: Arc<DashMap<Uuid, UserRow>>,
    by_email: Arc<DashMap<String, Uuid>>,
    /// user id -> plan id of the subscription created at registration
    pub subscriptions: Arc<DashMap<Uuid, Uuid>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a test user directly
    pub fn insert_user(&self, user: UserRow) {
        self.by_email.insert(user.email.clone(), user.id);
        self.users.insert(user.id, user);
    }

    /// Create a test user row with the given email and status
    #[allow(dead_code)]
    pub fn test_user(email: &str, status: &str) -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            name: "Test User".to_string(),
            email: email.to_string(),
            password_hash: String::new(),
            contact_phone: None,
            status: status.to_string(),
            token_hash: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[allow(dead_code)]
    pub fn set_status(&self, id: Uuid, status: &str) {
        if let Some(mut user) = self.users.get_mut(&id) {
            user.status = status.to_string();
        }
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>> {
        Ok(self.users.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>> {
        Ok(self
            .by_email
            .get(email)
            .and_then(|id| self.users.get(id.value()).map(|r| r.value().clone())))
    }

    async fn create(&self, user: CreateUser) -> DbResult<UserRow> {
        if self.by_email.contains_key(&user.email) {
            return Err(DbError::Conflict);
        }
        let row = UserRow {
            id: user.id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            contact_phone: user.contact_phone,
            status: user.status,
            token_hash: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        if let Some(plan_id) = user.default_plan_id {
            self.subscriptions.insert(row.id, plan_id);
        }
        self.insert_user(row.clone());
        Ok(row)
    }

    async fn set_token_hash(&self, id: Uuid, token_hash: Option<&str>) -> DbResult<()> {
        if let Some(mut user) = self.users.get_mut(&id) {
            user.token_hash = token_hash.map(str::to_string);
            user.updated_at = Utc::now();
        }
        Ok(())
    }
}

/// In-memory plan repository for testing
#[derive(Default, Clone)]
pub struct MockPlanRepository {
    plans: Arc<DashMap<String, PlanRow>>,
}

impl MockPlanRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository holding a single plan
    #[allow(dead_code)]
    pub fn with_plan(name: &str, max_riders: i32) -> Self {
        let repo = Self::new();
        repo.plans.insert(
            name.to_string(),
            PlanRow {
                id: Uuid::new_v4(),
                name: name.to_string(),
                abilities: vec![],
                max_riders_allowed: max_riders,
                stripe_price_id: None,
                price_cents: 0,
                created_at: Utc::now(),
            },
        );
        repo
    }
}

#[async_trait]
impl PlanRepository for MockPlanRepository {
    async fn list(&self) -> DbResult<Vec<PlanRow>> {
        Ok(self.plans.iter().map(|r| r.value().clone()).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<PlanRow>> {
        Ok(self
            .plans
            .iter()
            .find(|r| r.value().id == id)
            .map(|r| r.value().clone()))
    }

    async fn find_by_name(&self, name: &str) -> DbResult<Option<PlanRow>> {
        Ok(self.plans.get(name).map(|r| r.value().clone()))
    }

    async fn upsert(&self, _: UpsertPlan) -> DbResult<PlanRow> {
        Err(DbError::NotFound)
    }
}

/// In-memory grant repository for testing
#[derive(Default, Clone)]
pub struct MockGrantRepository {
    grants: Arc<DashMap<Uuid, (GrantScope, GrantRow)>>,
    /// Number of lookups served, to check short-circuiting
    pub lookups: Arc<std::sync::atomic::AtomicUsize>,
}

impl MockGrantRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn matching(&self, scope: GrantScope, resource_id: Uuid) -> Vec<GrantRow> {
        self.grants
            .iter()
            .filter(|r| r.value().0 == scope && r.value().1.resource_id == resource_id)
            .map(|r| r.value().1.clone())
            .collect()
    }
}

#[async_trait]
impl GrantRepository for MockGrantRepository {
    async fn list(&self, scope: GrantScope, resource_id: Uuid) -> DbResult<Vec<GrantRow>> {
        Ok(self.matching(scope, resource_id))
    }

    async fn list_for_resources(
        &self,
        scope: GrantScope,
        resource_ids: &[Uuid],
    ) -> DbResult<Vec<GrantRow>> {
        Ok(resource_ids
            .iter()
            .flat_map(|id| self.matching(scope, *id))
            .collect())
    }

    async fn find_for_email(
        &self,
        scope: GrantScope,
        resource_id: Uuid,
        email: &str,
    ) -> DbResult<Vec<GrantRow>> {
        self.lookups
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(self
            .matching(scope, resource_id)
            .into_iter()
            .filter(|g| g.email == email)
            .collect())
    }

    async fn create(
        &self,
        scope: GrantScope,
        resource_id: Uuid,
        email: &str,
        permission: Permission,
    ) -> DbResult<GrantRow> {
        if self
            .matching(scope, resource_id)
            .iter()
            .any(|g| g.email == email)
        {
            return Err(DbError::Conflict);
        }
        let row = GrantRow {
            id: Uuid::new_v4(),
            resource_id,
            email: email.to_string(),
            permission: permission.as_str().to_string(),
            created_at: Utc::now(),
        };
        self.grants.insert(row.id, (scope, row.clone()));
        Ok(row)
    }

    async fn update_permission(
        &self,
        scope: GrantScope,
        resource_id: Uuid,
        grant_id: Uuid,
        permission: Permission,
    ) -> DbResult<Option<GrantRow>> {
        let Some(mut entry) = self.grants.get_mut(&grant_id) else {
            return Ok(None);
        };
        if entry.0 != scope || entry.1.resource_id != resource_id {
            return Ok(None);
        }
        entry.1.permission = permission.as_str().to_string();
        Ok(Some(entry.1.clone()))
    }

    async fn delete(&self, scope: GrantScope, resource_id: Uuid, grant_id: Uuid) -> DbResult<bool> {
        Ok(self
            .grants
            .remove_if(&grant_id, |_, (s, g)| *s == scope && g.resource_id == resource_id)
            .is_some())
    }
}

/// In-memory subscription repository holding one current subscription per user
#[derive(Default, Clone)]
pub struct MockSubscriptionRepository {
    current: Arc<DashMap<Uuid, CurrentSubscriptionRow>>,
}

impl MockSubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give the user an active subscription to a plan
    #[allow(dead_code)]
    pub fn subscribe(&self, user_id: Uuid, plan_name: &str, max_riders: i32) {
        self.current.insert(
            user_id,
            CurrentSubscriptionRow {
                id: Uuid::new_v4(),
                user_id,
                subscription_type_id: Uuid::new_v4(),
                status: "active".to_string(),
                stripe_subscription_id: None,
                stripe_customer_id: None,
                subscription_date: Utc::now(),
                plan_name: plan_name.to_string(),
                abilities: vec![],
                max_riders_allowed: max_riders,
            },
        );
    }
}

#[async_trait]
impl SubscriptionRepository for MockSubscriptionRepository {
    async fn find_current_for_user(
        &self,
        user_id: Uuid,
    ) -> DbResult<Option<CurrentSubscriptionRow>> {
        Ok(self.current.get(&user_id).map(|r| r.value().clone()))
    }

    async fn activate_from_checkout(&self, _: CheckoutActivation) -> DbResult<CheckoutOutcome> {
        Err(DbError::NotFound)
    }

    async fn apply_invoice_event(&self, _: InvoiceEvent) -> DbResult<Option<SubscriptionTransition>> {
        Err(DbError::NotFound)
    }
}

#[derive(Default)]
struct RiderLedger {
    riders: Vec<RiderRow>,
    activities: Vec<(Uuid, NewActivity)>,
}

/// In-memory rider repository
///
/// `create_within_quota` holds one async lock across the count and the
/// insert and yields in between, the way the store locks the owner row.
#[derive(Default, Clone)]
pub struct MockRiderRepository {
    ledger: Arc<tokio::sync::Mutex<RiderLedger>>,
}

impl MockRiderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)]
    pub async fn count_for(&self, owner_id: Uuid) -> usize {
        self.ledger
            .lock()
            .await
            .riders
            .iter()
            .filter(|r| r.owner_id == owner_id)
            .count()
    }

    #[allow(dead_code)]
    pub async fn activity_titles(&self, user_id: Uuid) -> Vec<String> {
        self.ledger
            .lock()
            .await
            .activities
            .iter()
            .filter(|(id, _)| *id == user_id)
            .map(|(_, a)| a.title.clone())
            .collect()
    }
}

#[async_trait]
impl RiderRepository for MockRiderRepository {
    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        project_id: Option<Uuid>,
    ) -> DbResult<Vec<RiderRow>> {
        Ok(self
            .ledger
            .lock()
            .await
            .riders
            .iter()
            .rev()
            .filter(|r| r.owner_id == owner_id)
            .filter(|r| project_id.is_none() || r.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<RiderRow>> {
        Ok(self
            .ledger
            .lock()
            .await
            .riders
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn create_within_quota(
        &self,
        rider: CreateRider,
        allow: &(dyn Fn(i64) -> bool + Send + Sync),
    ) -> DbResult<Option<RiderRow>> {
        let mut ledger = self.ledger.lock().await;
        let count = ledger
            .riders
            .iter()
            .filter(|r| r.owner_id == rider.owner_id)
            .count();

        tokio::task::yield_now().await;

        if !allow(count as i64) {
            return Ok(None);
        }

        let row = RiderRow {
            id: rider.id,
            owner_id: rider.owner_id,
            project_id: rider.project_id,
            name: rider.name,
            description: rider.description,
            data: rider.data,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        ledger.riders.push(row.clone());
        ledger.activities.push((rider.owner_id, rider.activity));
        Ok(Some(row))
    }

    async fn update(
        &self,
        id: Uuid,
        changes: UpdateRider,
        activity: NewActivity,
    ) -> DbResult<Option<RiderRow>> {
        let mut ledger = self.ledger.lock().await;
        let Some(row) = ledger.riders.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            row.name = name;
        }
        row.updated_at = Utc::now();
        let row = row.clone();
        ledger.activities.push((changes.actor_id, activity));
        Ok(Some(row))
    }

    async fn delete(&self, id: Uuid, actor_id: Uuid, activity: NewActivity) -> DbResult<bool> {
        let mut ledger = self.ledger.lock().await;
        let before = ledger.riders.len();
        ledger.riders.retain(|r| r.id != id);
        let removed = ledger.riders.len() != before;
        if removed {
            ledger.activities.push((actor_id, activity));
        }
        Ok(removed)
    }
}
