//! Checkout session creation

mod common;

use std::sync::Arc;

use common::{MockBillingStore, MockProvider};
use rider_billing_core::{BillingConfig, BillingError, BillingService};
use rider_types::SubscriptionStatus;
use uuid::Uuid;

fn service(
    store: Arc<MockBillingStore>,
    provider: MockProvider,
) -> BillingService<MockBillingStore, MockBillingStore, MockBillingStore> {
    BillingService::new(
        store.clone(),
        store.clone(),
        store,
        Arc::new(provider),
        BillingConfig::new("sk_test", "whsec_test"),
    )
}

#[tokio::test]
async fn test_checkout_passes_plan_and_user() {
    let store = Arc::new(MockBillingStore::new());
    let user_id = store.add_user("jane@example.com");
    let plan_id = store.add_plan("basic", 10, Some("price_basic"));
    let provider = MockProvider::new();
    let billing = service(store.clone(), provider.clone());

    let session = billing
        .create_checkout(user_id, "jane@example.com", plan_id)
        .await
        .unwrap();
    assert_eq!(session.session_id, "cs_test_1");

    let requests = provider.requests.lock().unwrap().clone();
    assert_eq!(
        requests,
        vec![(
            "jane@example.com".to_string(),
            "price_basic".to_string(),
            user_id,
            plan_id
        )]
    );
}

#[tokio::test]
async fn test_checkout_without_subscription_has_no_pending() {
    let store = Arc::new(MockBillingStore::new());
    let user_id = store.add_user("jane@example.com");
    let plan_id = store.add_plan("basic", 10, Some("price_basic"));
    let billing = service(store.clone(), MockProvider::new());

    billing
        .create_checkout(user_id, "jane@example.com", plan_id)
        .await
        .unwrap();
    assert!(store.transactions().is_empty());
}

#[tokio::test]
async fn test_checkout_unknown_plan() {
    let store = Arc::new(MockBillingStore::new());
    let user_id = store.add_user("jane@example.com");
    let provider = MockProvider::new();
    let billing = service(store, provider.clone());

    let err = billing
        .create_checkout(user_id, "jane@example.com", Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, BillingError::PlanNotFound));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_checkout_free_plan_not_purchasable() {
    let store = Arc::new(MockBillingStore::new());
    let user_id = store.add_user("jane@example.com");
    let free_id = store.add_plan("free", 1, None);
    let provider = MockProvider::new();
    let billing = service(store, provider.clone());

    let err = billing
        .create_checkout(user_id, "jane@example.com", free_id)
        .await
        .unwrap_err();
    assert!(matches!(err, BillingError::PlanNotPurchasable));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_provider_failure_records_nothing() {
    let store = Arc::new(MockBillingStore::new());
    let user_id = store.add_user("jane@example.com");
    let free_id = store.add_plan("free", 1, None);
    let plan_id = store.add_plan("pro", 50, Some("price_pro"));
    store.add_subscription(user_id, free_id, SubscriptionStatus::Active, None);
    let billing = service(store.clone(), MockProvider::failing());

    let err = billing
        .create_checkout(user_id, "jane@example.com", plan_id)
        .await
        .unwrap_err();
    assert!(matches!(err, BillingError::ProviderError(_)));
    assert!(store.transactions().is_empty());
}
