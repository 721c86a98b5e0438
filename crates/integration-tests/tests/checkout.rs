//! Cart and checkout behaviour.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use rust_decimal::Decimal;

use bookstore_core::{Isbn, Role};
use bookstore_integration_tests::TestContext;
use bookstore_storefront::db::{CartRepository, FaultPoint};
use bookstore_storefront::models::CurrentUser;
use bookstore_storefront::services::cart::CartError;
use bookstore_storefront::services::checkout::CheckoutError;
use bookstore_storefront::services::notifier::{FailingNotifier, RecordingNotifier};
use bookstore_storefront::services::orders::OrderError;

const BOOK_A: &str = "9780000000001";
const BOOK_B: &str = "9780000000002";

/// A customer with two copies of A (10.00) and one of B (5.25) in the cart.
async fn filled_cart(ctx: &TestContext) -> CurrentUser {
    let seller = ctx.user("seller@example.com", Role::Seller).await;
    let store = ctx.store(&seller, "Shelf").await;
    ctx.book(store, BOOK_A, "Alpha", "10.00").await;
    ctx.book(store, BOOK_B, "Beta", "5.25").await;

    let customer = ctx.user("buyer@example.com", Role::Customer).await;
    let cart = ctx.state.cart();
    for isbn in [BOOK_A, BOOK_A, BOOK_B] {
        cart.add_to_cart(customer.id, &Isbn::parse(isbn).unwrap())
            .await
            .unwrap();
    }
    customer
}

#[tokio::test]
async fn adding_the_same_book_twice_bumps_quantity() {
    let ctx = TestContext::new();
    let customer = filled_cart(&ctx).await;

    let summary = ctx.state.cart().view_cart(customer.id).await.unwrap();

    assert_eq!(summary.lines.len(), 2);
    let alpha = summary.lines.iter().find(|l| l.title == "Alpha").unwrap();
    assert_eq!(alpha.quantity, 2);
    assert_eq!(alpha.line_total, "20.00".parse::<Decimal>().unwrap());
    assert_eq!(summary.subtotal, "25.25".parse::<Decimal>().unwrap());
}

#[tokio::test]
async fn adding_an_unknown_book_is_not_found() {
    let ctx = TestContext::new();
    let customer = ctx.user("buyer@example.com", Role::Customer).await;

    let result = ctx
        .state
        .cart()
        .add_to_cart(customer.id, &Isbn::parse(BOOK_A).unwrap())
        .await;

    assert!(matches!(result, Err(CartError::NotFound)));
}

#[tokio::test]
async fn checkout_places_order_and_empties_cart() {
    let ctx = TestContext::new();
    let customer = filled_cart(&ctx).await;

    let receipt = ctx.state.checkout().checkout(&customer).await.unwrap();

    assert_eq!(receipt.order.total, "25.25".parse::<Decimal>().unwrap());
    assert_eq!(receipt.order.user_id, customer.id);
    assert_eq!(receipt.details.len(), 2);
    let quantities: Vec<_> = receipt.details.iter().map(|d| (d.isbn.as_str(), d.quantity)).collect();
    assert!(quantities.contains(&(BOOK_A, 2)));
    assert!(quantities.contains(&(BOOK_B, 1)));
    assert!(receipt.confirmation_sent);

    assert!(ctx.storage.cart_lines(customer.id).await.unwrap().is_empty());

    let sent = ctx.notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, customer.email);
    assert_eq!(sent[0].1.order.id, receipt.order.id);

    let history = ctx.state.orders().list_orders(customer.id).await.unwrap();
    assert_eq!(history.len(), 1);
    let stored = ctx
        .state
        .orders()
        .order_details(customer.id, receipt.order.id)
        .await
        .unwrap();
    assert_eq!(stored.details.len(), 2);
}

#[tokio::test]
async fn checkout_of_empty_cart_writes_nothing() {
    let ctx = TestContext::new();
    let customer = ctx.user("buyer@example.com", Role::Customer).await;

    let result = ctx.state.checkout().checkout(&customer).await;

    assert!(matches!(result, Err(CheckoutError::EmptyCart)));
    assert_eq!(ctx.storage.order_count().await, 0);
    assert_eq!(ctx.storage.order_detail_count().await, 0);
    assert!(ctx.notifier.sent().await.is_empty());
}

#[tokio::test]
async fn failure_on_second_detail_leaves_no_trace() {
    let ctx = TestContext::new();
    let customer = filled_cart(&ctx).await;
    let before = ctx.storage.cart_lines(customer.id).await.unwrap();
    ctx.storage
        .inject_fault(FaultPoint::InsertOrderDetail { nth: 2 })
        .await;

    let result = ctx.state.checkout().checkout(&customer).await;

    assert!(matches!(result, Err(CheckoutError::TransactionFailed(_))));
    assert_eq!(ctx.storage.order_count().await, 0);
    assert_eq!(ctx.storage.order_detail_count().await, 0);
    assert_eq!(ctx.storage.cart_lines(customer.id).await.unwrap(), before);
    assert!(ctx.notifier.sent().await.is_empty());

    // The fault was one-shot: a retry goes through.
    let receipt = ctx.state.checkout().checkout(&customer).await.unwrap();
    assert_eq!(receipt.details.len(), 2);
}

#[tokio::test]
async fn failure_clearing_cart_rolls_back_order() {
    let ctx = TestContext::new();
    let customer = filled_cart(&ctx).await;
    ctx.storage.inject_fault(FaultPoint::ClearCart).await;

    let result = ctx.state.checkout().checkout(&customer).await;

    assert!(matches!(result, Err(CheckoutError::TransactionFailed(_))));
    assert_eq!(ctx.storage.order_count().await, 0);
    assert_eq!(ctx.storage.cart_lines(customer.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn notification_failure_keeps_the_order() {
    let ctx = TestContext::with_notifier(RecordingNotifier::new(), Arc::new(FailingNotifier));
    let customer = filled_cart(&ctx).await;

    let receipt = ctx.state.checkout().checkout(&customer).await.unwrap();

    assert!(!receipt.confirmation_sent);
    assert_eq!(ctx.storage.order_count().await, 1);
    assert!(ctx.storage.cart_lines(customer.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_checkouts_of_one_cart_place_one_order() {
    let ctx = TestContext::new();
    let customer = filled_cart(&ctx).await;
    let first = ctx.state.checkout();
    let second = ctx.state.checkout();

    let (a, b) = tokio::join!(first.checkout(&customer), second.checkout(&customer));

    let placed = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(placed, 1);
    assert!(
        matches!(a, Err(CheckoutError::EmptyCart)) || matches!(b, Err(CheckoutError::EmptyCart))
    );
    assert_eq!(ctx.storage.order_count().await, 1);
    assert_eq!(ctx.storage.order_detail_count().await, 2);
}

#[tokio::test]
async fn other_customers_orders_are_not_found() {
    let ctx = TestContext::new();
    let customer = filled_cart(&ctx).await;
    let receipt = ctx.state.checkout().checkout(&customer).await.unwrap();
    let stranger = ctx.user("stranger@example.com", Role::Customer).await;

    let result = ctx
        .state
        .orders()
        .order_details(stranger.id, receipt.order.id)
        .await;

    assert!(matches!(result, Err(OrderError::NotFound)));
    assert!(ctx.state.orders().list_orders(stranger.id).await.unwrap().is_empty());
}
