//! Reconciliation state-machine properties.

use groenmarkt_api::models::{OrderStatus, PaymentStatus, TransactionStatus};
use groenmarkt_api::services::reconciliation::{Transition, plan_transition};
use groenmarkt_integration_tests::order_in_state;

/// Apply a transition plan to a state pair, mimicking what the service
/// writes.
fn apply(
    state: (OrderStatus, PaymentStatus),
    provider: TransactionStatus,
    confirmation_sent: &mut bool,
) -> (OrderStatus, PaymentStatus) {
    match plan_transition(state.0, state.1, provider, *confirmation_sent) {
        Transition::Apply {
            status,
            payment_status,
            send_confirmation,
        } => {
            if send_confirmation {
                *confirmation_sent = true;
            }
            (status, payment_status)
        }
        Transition::Noop => state,
    }
}

#[test]
fn checkout_then_paid_then_replay() {
    // Checkout leaves (confirmed, pending); only reconciliation may
    // mark the order paid.
    let order = order_in_state(OrderStatus::Confirmed, PaymentStatus::Pending);
    let mut sent = order.confirmation_sent_at.is_some();
    let mut state = (order.status, order.payment_status);

    state = apply(state, TransactionStatus::Paid, &mut sent);
    assert_eq!(state, (OrderStatus::Processing, PaymentStatus::Paid));
    assert!(sent, "first success sends the confirmation");

    // Redelivery: same notification, no state change, no second mail.
    let before = sent;
    state = apply(state, TransactionStatus::Paid, &mut sent);
    assert_eq!(state, (OrderStatus::Processing, PaymentStatus::Paid));
    assert_eq!(sent, before);
}

#[test]
fn failed_payment_cancels_and_is_replay_safe() {
    let mut sent = false;
    let mut state = (OrderStatus::Confirmed, PaymentStatus::Pending);

    state = apply(state, TransactionStatus::Expired, &mut sent);
    assert_eq!(state, (OrderStatus::Cancelled, PaymentStatus::Failed));
    assert!(!sent);

    state = apply(state, TransactionStatus::Failed, &mut sent);
    assert_eq!(state, (OrderStatus::Cancelled, PaymentStatus::Failed));
}

#[test]
fn late_failure_never_unwinds_a_paid_order() {
    let mut sent = true;
    let state = apply(
        (OrderStatus::Processing, PaymentStatus::Paid),
        TransactionStatus::Cancelled,
        &mut sent,
    );
    assert_eq!(state, (OrderStatus::Processing, PaymentStatus::Paid));
}

#[test]
fn cancellation_window_is_pending_and_confirmed_only() {
    for (status, allowed) in [
        (OrderStatus::Pending, true),
        (OrderStatus::Confirmed, true),
        (OrderStatus::Processing, false),
        (OrderStatus::Shipped, false),
        (OrderStatus::Delivered, false),
        (OrderStatus::Cancelled, false),
    ] {
        assert_eq!(status.can_be_cancelled(), allowed, "status {status:?}");
    }
}

#[test]
fn every_notification_sequence_ends_in_a_valid_state() {
    // Drive the machine through all 3-notification sequences from the
    // post-checkout state; the pair must always land in one of the
    // states the data model allows.
    let all = [
        TransactionStatus::Open,
        TransactionStatus::Pending,
        TransactionStatus::Paid,
        TransactionStatus::Failed,
        TransactionStatus::Expired,
        TransactionStatus::Cancelled,
    ];

    for a in all {
        for b in all {
            for c in all {
                let mut sent = false;
                let mut state = (OrderStatus::Confirmed, PaymentStatus::Pending);
                for provider in [a, b, c] {
                    state = apply(state, provider, &mut sent);
                }
                let valid = matches!(
                    state,
                    (OrderStatus::Confirmed, PaymentStatus::Pending)
                        | (OrderStatus::Processing, PaymentStatus::Paid)
                        | (OrderStatus::Cancelled, PaymentStatus::Failed)
                );
                assert!(valid, "sequence {a:?},{b:?},{c:?} reached {state:?}");
            }
        }
    }
}
