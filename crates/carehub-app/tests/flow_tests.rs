//! Client flows over the in-memory backend and store

use carehub_app::{AppContext, AppError, SubmitOutcome};
use carehub_backend::{BackendError, CancellationToken, Medicine, ENGINE_FUNCTION};
use carehub_core::assessment::{QuestionnaireAction, QuestionnaireStep};
use carehub_core::booking::{BookingDraft, BookingState, GENERIC_FAILURE_MESSAGE, SIGN_IN_REQUIRED_MESSAGE};
use carehub_core::cart::{CartAction, CartLineItem, ItemKind};
use carehub_core::config::AppConfig;
use carehub_core::error::{CoreError, TransitionError};
use carehub_core::location::LocationAction;
use carehub_core::pricing::BookingType;
use carehub_core::risk::{Package, PackageTier, TestItem};
use carehub_core::route::Route;
use carehub_core::types::BookingId;
use carehub_store::MemoryStore;
use carehub_test_utils::{complete_answers, sample_result, seeded_backend, Failure, FakeBackend};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

async fn open(backend: &Arc<FakeBackend>, storage: &Arc<MemoryStore>) -> AppContext {
    AppContext::open(AppConfig::new(), backend.clone(), storage.clone())
        .await
        .unwrap()
}

fn consultation() -> BookingDraft {
    BookingDraft::new(BookingType::DoctorConsultation, "d-1", 500.0)
        .with_slot(NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(), "10:30 AM")
}

#[tokio::test]
async fn empty_cart_shows_empty_summary_and_refuses_checkout() {
    let backend = Arc::new(seeded_backend().signed_in("p-1"));
    let ctx = open(&backend, &Arc::new(MemoryStore::new())).await;
    let checkout = ctx.checkout();

    let summary = checkout.summary();
    assert!(summary.lines.is_empty());
    assert_eq!(summary.subtotal, 0.0);

    let err = checkout.place_order(&CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, AppError::EmptyCart));
    assert!(backend.inserts("orders").is_empty());
}

#[tokio::test]
async fn order_is_placed_then_cart_cleared() {
    let backend = Arc::new(seeded_backend().signed_in("p-1"));
    let ctx = open(&backend, &Arc::new(MemoryStore::new())).await;
    ctx.location()
        .dispatch(LocationAction::SetCity("Pune".into()))
        .await
        .unwrap();
    ctx.cart()
        .dispatch(CartAction::Add(CartLineItem::new(ItemKind::Medicine, "m-2", "Vitamin D3 60K", 120.0, 140.0)))
        .await
        .unwrap();

    let route = ctx.checkout().place_order(&CancellationToken::new()).await.unwrap();

    assert_eq!(
        route,
        Route::OrderConfirmation {
            order_id: "orders-1".to_string()
        }
    );
    let orders = backend.inserts("orders");
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["profile_id"], "p-1");
    assert_eq!(orders[0]["city"], "Pune");
    assert!(ctx.checkout().summary().is_empty());
}

#[tokio::test]
async fn signed_out_order_keeps_cart() {
    let backend = Arc::new(seeded_backend());
    let ctx = open(&backend, &Arc::new(MemoryStore::new())).await;
    ctx.cart()
        .dispatch(CartAction::Add(CartLineItem::new(ItemKind::Medicine, "m-1", "Paracetamol 500", 30.0, 35.0)))
        .await
        .unwrap();

    let err = ctx.checkout().place_order(&CancellationToken::new()).await.unwrap_err();

    assert!(matches!(err, AppError::SignInRequired));
    assert_eq!(ctx.checkout().summary().item_count, 1);
}

#[tokio::test]
async fn short_term_shows_full_list_without_querying() {
    let backend = Arc::new(seeded_backend());
    let ctx = open(&backend, &Arc::new(MemoryStore::new())).await;
    let search = ctx.search();
    let token = CancellationToken::new();

    let loaded: Vec<Medicine> = search.list(&token).await.unwrap();
    assert_eq!(loaded.len(), 3);
    assert_eq!(backend.select_count("medicines"), 1);

    let shown = search.filter(&loaded, " a ", &token).await.unwrap();
    assert_eq!(shown.len(), 3);
    assert_eq!(backend.select_count("medicines"), 1);
    assert!(search.everywhere("v", &token).await.is_none());
    assert_eq!(backend.select_count("doctors"), 0);
}

#[tokio::test]
async fn two_character_term_reaches_the_backend() {
    let backend = Arc::new(seeded_backend());
    let ctx = open(&backend, &Arc::new(MemoryStore::new())).await;
    let token = CancellationToken::new();

    let shown: Vec<Medicine> = ctx.search().filter(&[], "vi", &token).await.unwrap();

    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].id, "m-2");
    assert_eq!(backend.select_count("medicines"), 1);
}

#[tokio::test]
async fn global_search_keeps_sections_that_succeeded() {
    let backend = Arc::new(seeded_backend().failing("doctors", Failure::Http("connection reset".into())));
    let ctx = open(&backend, &Arc::new(MemoryStore::new())).await;

    let results = ctx
        .search()
        .everywhere("vitamin", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(results.medicines.as_ref().unwrap().len(), 1);
    assert_eq!(results.lab_tests.as_ref().unwrap().len(), 1);
    assert!(results.doctors.is_err());
    assert_eq!(results.failed_sections(), vec!["doctors"]);
}

#[tokio::test]
async fn draft_survives_reopen() {
    let backend = Arc::new(seeded_backend());
    let storage = Arc::new(MemoryStore::new());
    let flow = open(&backend, &storage).await.assessment();
    for action in complete_answers() {
        flow.answer(action).await.unwrap();
    }
    let before = flow.answer(QuestionnaireAction::NextStep).await.unwrap();

    let reopened = open(&backend, &storage).await.assessment().draft();

    assert_eq!(reopened, before);
    assert_eq!(reopened.bmi, Some(24.7));
    assert_eq!(reopened.step, QuestionnaireStep::Lifestyle);
}

#[tokio::test]
async fn engine_failure_keeps_step_and_shows_generic_message() {
    let backend = Arc::new(
        FakeBackend::new().with_function(ENGINE_FUNCTION, Err(Failure::Status(500, Some("boom".into())))),
    );
    let ctx = open(&backend, &Arc::new(MemoryStore::new())).await;
    let flow = ctx.assessment();
    for action in complete_answers() {
        flow.answer(action).await.unwrap();
    }
    flow.answer(QuestionnaireAction::GoToStep(QuestionnaireStep::Symptoms))
        .await
        .unwrap();

    let outcome = flow.submit(&CancellationToken::new()).await.unwrap();

    assert_eq!(
        outcome,
        SubmitOutcome::Failed {
            message: GENERIC_FAILURE_MESSAGE.to_string(),
            step: QuestionnaireStep::Symptoms,
        }
    );
    assert!(flow.last_result().await.unwrap().is_none());
}

#[tokio::test]
async fn scored_package_books_into_cart_at_discounted_prices() {
    let backend = Arc::new(seeded_backend());
    let ctx = open(&backend, &Arc::new(MemoryStore::new())).await;
    let flow = ctx.assessment();
    for action in complete_answers() {
        flow.answer(action).await.unwrap();
    }

    let outcome = flow.submit(&CancellationToken::new()).await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Scored { route: Route::AssessmentResult, .. }));

    let route = flow.book_package(PackageTier::Basic).await.unwrap();
    assert_eq!(route, Route::Cart);

    let summary = ctx.checkout().summary();
    let prices: Vec<f64> = summary.lines.iter().map(|l| l.price).collect();
    assert_eq!(prices, vec![200.0, 600.0]);
    assert_eq!(summary.subtotal, 800.0);
    assert_eq!(summary.mrp_total, 1000.0);
}

#[tokio::test]
async fn rejected_package_line_keeps_earlier_lines() {
    let mut result = sample_result();
    result.packages[0] = Package {
        tier: PackageTier::Basic,
        name: "Broken Basic".to_string(),
        tests: vec![
            TestItem::new("lipid-profile", "Lipid Profile", 250.0),
            TestItem::new("refund", "Refund", -100.0),
            TestItem::new("hba1c", "HbA1c", 750.0),
        ],
        price: 1000.0,
        discount: 200.0,
        final_price: 800.0,
    };
    let backend = Arc::new(
        FakeBackend::new().with_function(ENGINE_FUNCTION, Ok(serde_json::to_value(&result).unwrap())),
    );
    let ctx = open(&backend, &Arc::new(MemoryStore::new())).await;
    let flow = ctx.assessment();
    flow.answer(QuestionnaireAction::SetAge("35".into())).await.unwrap();
    flow.submit(&CancellationToken::new()).await.unwrap();

    let err = flow.book_package(PackageTier::Basic).await.unwrap_err();

    assert!(matches!(err, AppError::Core(CoreError::Cart(_))));
    let ids: Vec<String> = ctx.checkout().summary().lines.iter().map(|l| l.id.clone()).collect();
    assert_eq!(ids, vec!["lipid-profile".to_string()]);
}

#[tokio::test]
async fn every_custom_tier_is_bookable() {
    let mut reply = serde_json::to_value(sample_result()).unwrap();
    for (package, label) in reply["packages"].as_array_mut().unwrap().iter_mut().zip(["Silver", "Gold", "Platinum"]) {
        package["tier"] = label.into();
    }
    let backend = Arc::new(FakeBackend::new().with_function(ENGINE_FUNCTION, Ok(reply)));
    let ctx = open(&backend, &Arc::new(MemoryStore::new())).await;
    let flow = ctx.assessment();
    flow.answer(QuestionnaireAction::SetAge("35".into())).await.unwrap();
    flow.submit(&CancellationToken::new()).await.unwrap();

    let route = flow.book_package(PackageTier::from_label("Gold")).await.unwrap();
    assert_eq!(route, Route::Cart);
    let ids: Vec<String> = ctx.checkout().summary().lines.iter().map(|l| l.id.clone()).collect();
    assert_eq!(ids, vec!["lipid-profile".to_string(), "hba1c".to_string(), "ecg".to_string()]);

    flow.book_package(PackageTier::from_label("Platinum")).await.unwrap();
    assert!(ctx.checkout().summary().lines.iter().any(|l| l.id == "tmt"));

    let err = flow.book_package(PackageTier::from_label("Bronze")).await.unwrap_err();
    assert!(matches!(err, AppError::PackageNotFound { tier } if tier.label() == "Bronze"));
}

#[tokio::test]
async fn booking_a_missing_tier_is_refused() {
    let backend = Arc::new(seeded_backend());
    let ctx = open(&backend, &Arc::new(MemoryStore::new())).await;

    let err = ctx.assessment().book_package(PackageTier::Basic).await.unwrap_err();

    assert!(matches!(err, AppError::NoAssessmentResult));
}

#[tokio::test]
async fn signed_out_booking_is_blocked_before_insert() {
    let backend = Arc::new(seeded_backend());
    let ctx = open(&backend, &Arc::new(MemoryStore::new())).await;
    let booking = ctx.booking();

    let err = booking.confirm(&consultation(), &CancellationToken::new()).await.unwrap_err();

    assert!(matches!(err, AppError::SignInRequired));
    assert_eq!(err.user_message(), SIGN_IN_REQUIRED_MESSAGE);
    assert!(backend.inserts("bookings").is_empty());
    assert_eq!(booking.state(), BookingState::Idle);
}

#[tokio::test]
async fn incomplete_draft_is_refused_locally() {
    let backend = Arc::new(seeded_backend().signed_in("p-1"));
    let ctx = open(&backend, &Arc::new(MemoryStore::new())).await;
    let draft = BookingDraft::new(BookingType::LabTest, "l-1", 900.0);

    let err = ctx.booking().confirm(&draft, &CancellationToken::new()).await.unwrap_err();

    assert_eq!(err.user_message(), "Please choose a date and time.");
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn confirmed_booking_routes_to_confirmation() {
    let backend = Arc::new(seeded_backend().signed_in("p-1"));
    let ctx = open(&backend, &Arc::new(MemoryStore::new())).await;
    let booking = ctx.booking();

    let route = booking.confirm(&consultation(), &CancellationToken::new()).await.unwrap();

    let booking_id = BookingId::new("bookings-1");
    assert_eq!(route, Route::BookingConfirmation { booking_id: booking_id.clone() });
    assert_eq!(booking.state(), BookingState::Succeeded { booking_id });

    let rows = backend.inserts("bookings");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["total_amount"], 518.0);
    assert_eq!(rows[0]["booking_date"], "2026-11-02");

    let again = booking.confirm(&consultation(), &CancellationToken::new()).await;
    assert!(matches!(again, Err(AppError::Core(CoreError::Transition(_)))));
}

#[tokio::test]
async fn resubmitting_a_stored_booking_returns_the_same_row() {
    let backend = Arc::new(seeded_backend().signed_in("p-1"));
    let ctx = open(&backend, &Arc::new(MemoryStore::new())).await;
    let token = CancellationToken::new();

    let first = ctx.booking().confirm(&consultation(), &token).await.unwrap();
    let second = ctx.booking().confirm(&consultation(), &token).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(backend.rows("bookings").len(), 1);
}

#[tokio::test]
async fn concurrent_duplicate_submit_is_rejected() {
    let backend = Arc::new(
        seeded_backend()
            .signed_in("p-1")
            .delayed("bookings", Duration::from_millis(50)),
    );
    let ctx = open(&backend, &Arc::new(MemoryStore::new())).await;
    let (a, b) = (ctx.booking(), ctx.booking());
    let draft = consultation();
    let token = CancellationToken::new();

    let (first, second) = tokio::join!(a.confirm(&draft, &token), b.confirm(&draft, &token));

    assert!(first.is_ok());
    assert!(matches!(
        second,
        Err(AppError::Core(CoreError::Transition(TransitionError::AlreadySubmitting)))
    ));
    assert_eq!(backend.inserts("bookings").len(), 1);
    assert_eq!(b.state(), BookingState::Idle);
}

#[tokio::test]
async fn backend_message_is_shown_verbatim() {
    let backend = Arc::new(
        seeded_backend()
            .signed_in("p-1")
            .failing("bookings", Failure::Status(409, Some("Slot no longer available".into()))),
    );
    let ctx = open(&backend, &Arc::new(MemoryStore::new())).await;
    let booking = ctx.booking();

    let err = booking.confirm(&consultation(), &CancellationToken::new()).await.unwrap_err();

    assert!(matches!(err, AppError::Backend(BackendError::Status { status: 409, .. })));
    assert_eq!(
        booking.state(),
        BookingState::Failed {
            message: "Slot no longer available".to_string()
        }
    );
    assert!(!booking.is_busy());
    booking.dismiss_failure().unwrap();
    assert_eq!(booking.state(), BookingState::Idle);
}

#[tokio::test]
async fn cancelled_booking_releases_the_key() {
    let backend = Arc::new(
        seeded_backend()
            .signed_in("p-1")
            .delayed("bookings", Duration::from_secs(5)),
    );
    let ctx = open(&backend, &Arc::new(MemoryStore::new())).await;
    let booking = ctx.booking();
    let token = CancellationToken::new();
    let canceller = token.clone();

    let request = consultation();
    let (result, ()) = tokio::join!(booking.confirm(&request, &token), async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    assert!(matches!(result, Err(AppError::Backend(BackendError::Cancelled))));
    assert!(matches!(booking.state(), BookingState::Failed { .. }));
    assert!(backend.rows("bookings").is_empty());
}

#[tokio::test]
async fn restart_discards_draft_and_result() {
    let backend = Arc::new(seeded_backend());
    let storage = Arc::new(MemoryStore::new());
    let flow = open(&backend, &storage).await.assessment();
    for action in complete_answers() {
        flow.answer(action).await.unwrap();
    }
    flow.submit(&CancellationToken::new()).await.unwrap();

    flow.restart().await.unwrap();

    assert!(flow.draft().is_blank());
    assert!(flow.last_result().await.unwrap().is_none());
    assert!(open(&backend, &storage).await.assessment().draft().is_blank());
}
