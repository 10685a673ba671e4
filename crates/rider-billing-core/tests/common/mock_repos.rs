//! In-memory billing store and payment provider for testing

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use rider_billing_core::{BillingError, CheckoutRequest, CheckoutSession, PaymentProvider};
use rider_db::{
    CheckoutActivation, CheckoutOutcome, CurrentSubscriptionRow, DbError, DbResult,
    InvoiceEvent, NewActivity, PlanRepository, PlanRow, SubscriptionRepository, SubscriptionRow,
    SubscriptionTransition, TransactionRepository, TransactionRow, UpsertPlan,
};
use rider_types::{SubscriptionStatus, TransactionStatus};

/// Ledgers kept in insertion order; later rows are "more recent"
#[derive(Default)]
pub struct Ledger {
    pub subscriptions: Vec<SubscriptionRow>,
    pub transactions: Vec<TransactionRow>,
    pub activities: Vec<(Uuid, NewActivity)>,
}

/// In-memory subscription, transaction and plan store
#[derive(Default, Clone)]
pub struct MockBillingStore {
    users: Arc<DashMap<Uuid, String>>,
    plans: Arc<DashMap<Uuid, PlanRow>>,
    ledger: Arc<Mutex<Ledger>>,
    fail_writes: Arc<std::sync::atomic::AtomicBool>,
}

impl MockBillingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, email: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.users.insert(id, email.to_string());
        id
    }

    pub fn add_plan(&self, name: &str, max_riders: i32, price_id: Option<&str>) -> Uuid {
        let id = Uuid::new_v4();
        self.plans.insert(
            id,
            PlanRow {
                id,
                name: name.to_string(),
                abilities: vec![],
                max_riders_allowed: max_riders,
                stripe_price_id: price_id.map(str::to_string),
                price_cents: 0,
                created_at: Utc::now(),
            },
        );
        id
    }

    /// Insert a subscription row directly
    pub fn add_subscription(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
        status: SubscriptionStatus,
        stripe_id: Option<&str>,
    ) -> Uuid {
        let mut ledger = self.ledger();
        let row = new_subscription(
            &ledger,
            user_id,
            plan_id,
            status,
            stripe_id.map(str::to_string),
            None,
        );
        let id = row.id;
        ledger.subscriptions.push(row);
        id
    }

    /// Make every subsequent write fail with a database error
    #[allow(dead_code)]
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn subscription(&self, id: Uuid) -> Option<SubscriptionRow> {
        self.ledger().subscriptions.iter().find(|s| s.id == id).cloned()
    }

    pub fn subscriptions_for(&self, user_id: Uuid) -> Vec<SubscriptionRow> {
        self.ledger()
            .subscriptions
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn transactions(&self) -> Vec<TransactionRow> {
        self.ledger().transactions.clone()
    }

    pub fn activity_titles(&self, user_id: Uuid) -> Vec<String> {
        self.ledger()
            .activities
            .iter()
            .filter(|(u, _)| *u == user_id)
            .map(|(_, a)| a.title.clone())
            .collect()
    }

    fn check_writable(&self) -> DbResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DbError::InvalidData("store unavailable".to_string()));
        }
        Ok(())
    }
}

fn new_subscription(
    ledger: &Ledger,
    user_id: Uuid,
    plan_id: Uuid,
    status: SubscriptionStatus,
    stripe_subscription_id: Option<String>,
    stripe_customer_id: Option<String>,
) -> SubscriptionRow {
    // Strictly increasing dates keep "most recent" unambiguous
    let date = ledger
        .subscriptions
        .last()
        .map(|s| s.subscription_date + Duration::milliseconds(1))
        .map_or_else(Utc::now, |next| next.max(Utc::now()));
    SubscriptionRow {
        id: Uuid::new_v4(),
        user_id,
        subscription_type_id: plan_id,
        status: status.as_str().to_string(),
        stripe_subscription_id,
        stripe_customer_id,
        subscription_date: date,
        created_at: date,
        updated_at: date,
    }
}

fn new_transaction(
    subscription: &SubscriptionRow,
    status: TransactionStatus,
    amount_cents: i64,
    code: &str,
    invoice_url: Option<String>,
) -> TransactionRow {
    TransactionRow {
        id: Uuid::new_v4(),
        subscription_id: subscription.id,
        user_id: subscription.user_id,
        amount_cents,
        status: status.as_str().to_string(),
        transaction_code: code.to_string(),
        invoice_url,
        transaction_date: Utc::now(),
    }
}

#[async_trait]
impl SubscriptionRepository for MockBillingStore {
    async fn find_current_for_user(
        &self,
        user_id: Uuid,
    ) -> DbResult<Option<CurrentSubscriptionRow>> {
        let ledger = self.ledger();
        let Some(sub) = ledger
            .subscriptions
            .iter()
            .rev()
            .find(|s| s.user_id == user_id && s.status == SubscriptionStatus::Active.as_str())
        else {
            return Ok(None);
        };
        let Some(plan) = self.plans.get(&sub.subscription_type_id) else {
            return Ok(None);
        };
        Ok(Some(CurrentSubscriptionRow {
            id: sub.id,
            user_id: sub.user_id,
            subscription_type_id: sub.subscription_type_id,
            status: sub.status.clone(),
            stripe_subscription_id: sub.stripe_subscription_id.clone(),
            stripe_customer_id: sub.stripe_customer_id.clone(),
            subscription_date: sub.subscription_date,
            plan_name: plan.name.clone(),
            abilities: plan.abilities.clone(),
            max_riders_allowed: plan.max_riders_allowed,
        }))
    }

    async fn activate_from_checkout(
        &self,
        activation: CheckoutActivation,
    ) -> DbResult<CheckoutOutcome> {
        self.check_writable()?;
        let mut ledger = self.ledger();

        if !self.users.contains_key(&activation.user_id) {
            return Ok(CheckoutOutcome::UnknownUser);
        }
        if !self.plans.contains_key(&activation.plan_id) {
            return Ok(CheckoutOutcome::UnknownPlan);
        }

        let mut superseded = 0;
        for sub in ledger.subscriptions.iter_mut() {
            if sub.user_id == activation.user_id && sub.status == SubscriptionStatus::Active.as_str()
            {
                sub.status = SubscriptionStatus::Expired.as_str().to_string();
                superseded += 1;
            }
        }

        let subscription = new_subscription(
            &ledger,
            activation.user_id,
            activation.plan_id,
            SubscriptionStatus::Active,
            activation.stripe_subscription_id,
            activation.stripe_customer_id,
        );
        ledger.subscriptions.push(subscription.clone());

        let mut settled = false;
        for tx in ledger.transactions.iter_mut() {
            if tx.transaction_code == activation.session_id
                && tx.status == TransactionStatus::Pending.as_str()
            {
                tx.status = TransactionStatus::Paid.as_str().to_string();
                tx.amount_cents = activation.amount_cents;
                tx.invoice_url = activation.invoice_url.clone();
                settled = true;
            }
        }
        if !settled {
            let tx = new_transaction(
                &subscription,
                TransactionStatus::Paid,
                activation.amount_cents,
                &activation.session_id,
                activation.invoice_url,
            );
            ledger.transactions.push(tx);
        }

        ledger.activities.push((activation.user_id, activation.activity));

        Ok(CheckoutOutcome::Activated {
            subscription,
            superseded,
            settled_pending: settled,
        })
    }

    async fn apply_invoice_event(
        &self,
        event: InvoiceEvent,
    ) -> DbResult<Option<SubscriptionTransition>> {
        self.check_writable()?;
        let mut ledger = self.ledger();

        let Some(index) = ledger
            .subscriptions
            .iter()
            .rposition(|s| s.stripe_subscription_id.as_deref() == Some(&event.stripe_subscription_id))
        else {
            return Ok(None);
        };

        let from = ledger.subscriptions[index].status()?;
        let to = from.apply(event.event);

        let tx = new_transaction(
            &ledger.subscriptions[index],
            event.transaction_status,
            event.amount_cents,
            &event.transaction_code,
            event.invoice_url,
        );
        let transaction_id = tx.id;
        ledger.transactions.push(tx);

        let sub = &mut ledger.subscriptions[index];
        sub.status = to.as_str().to_string();
        let (subscription_id, user_id) = (sub.id, sub.user_id);

        if let Some(activity) = event.activity {
            ledger.activities.push((user_id, activity));
        }

        Ok(Some(SubscriptionTransition {
            subscription_id,
            user_id,
            transaction_id,
            from,
            to,
        }))
    }
}

#[async_trait]
impl TransactionRepository for MockBillingStore {
    async fn create_pending(
        &self,
        subscription_id: Uuid,
        transaction_code: &str,
    ) -> DbResult<TransactionRow> {
        self.check_writable()?;
        let mut ledger = self.ledger();
        let sub = ledger
            .subscriptions
            .iter()
            .find(|s| s.id == subscription_id)
            .cloned()
            .ok_or(DbError::NotFound)?;
        let tx = new_transaction(&sub, TransactionStatus::Pending, 0, transaction_code, None);
        ledger.transactions.push(tx.clone());
        Ok(tx)
    }

    async fn list_for_user(&self, user_id: Uuid) -> DbResult<Vec<TransactionRow>> {
        Ok(self
            .ledger()
            .transactions
            .iter()
            .rev()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<TransactionRow>> {
        Ok(self.ledger().transactions.iter().find(|t| t.id == id).cloned())
    }
}

#[async_trait]
impl PlanRepository for MockBillingStore {
    async fn list(&self) -> DbResult<Vec<PlanRow>> {
        Ok(self.plans.iter().map(|r| r.value().clone()).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<PlanRow>> {
        Ok(self.plans.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_name(&self, name: &str) -> DbResult<Option<PlanRow>> {
        Ok(self
            .plans
            .iter()
            .find(|r| r.value().name == name)
            .map(|r| r.value().clone()))
    }

    async fn upsert(&self, _: UpsertPlan) -> DbResult<PlanRow> {
        Err(DbError::NotFound)
    }
}

/// Payment provider that records requests and hands out sequential sessions
#[derive(Default, Clone)]
pub struct MockProvider {
    calls: Arc<AtomicUsize>,
    pub requests: Arc<Mutex<Vec<(String, String, Uuid, Uuid)>>>,
    failing: bool,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)]
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentProvider for MockProvider {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest<'_>,
    ) -> Result<CheckoutSession, BillingError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing {
            return Err(BillingError::ProviderError("card network down".to_string()));
        }
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).push((
            request.customer_email.to_string(),
            request.price_id.to_string(),
            request.user_id,
            request.plan_id,
        ));
        Ok(CheckoutSession {
            session_id: format!("cs_test_{n}"),
            url: format!("https://checkout.stripe.com/c/pay/cs_test_{n}"),
        })
    }
}
