//! End-to-end tests: a sync service over a scripted transport.

use std::future::Future;
use std::pin::pin;
use std::sync::Arc;
use std::task::{Context, Poll, Wake, Waker};
use std::time::Duration;

use serde_json::{json, Value};

use tillsync::{
    Amount, AuthStatus, ChangeEvent, CoreError, DeviceCredentials, HistoryQuery, Order,
    ProtocolError, QueueConfig, QueueError, RegisterEvent, ServiceError, SyncService,
};
use tillsync_protocol::{SavedState, ScriptedTransport, TransportError};
use tillsync_testkit::fixtures::{
    error, ok, ok_with_token, sample_business, sample_business_json, sample_order, TestFixture,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn service(fixture: &TestFixture, saved: SavedState) -> SyncService<ScriptedTransport> {
    SyncService::from_client(fixture.client(saved), QueueConfig::default())
}

/// The `data` array of the `n`th request.
fn posted_events(fixture: &TestFixture, n: usize) -> Vec<Value> {
    let requests = fixture.transport.requests();
    requests[n].body.as_ref().unwrap()["data"]
        .as_array()
        .unwrap()
        .clone()
}

/// Let the drain task make its first attempt without reaching a retry.
async fn settle() {
    tokio::time::sleep(Duration::from_secs(1)).await;
}

// ─────────────────────────────────────────────────────────────────────────────
// Change delivery
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_commit_uploads_only_the_changed_fields() -> anyhow::Result<()> {
    init_tracing();
    let (fixture, saved) = TestFixture::signed_in("T1");
    fixture.transport.respond(ok(None));
    let service = service(&fixture, saved);
    let mut order = sample_order(&sample_business());

    order.record_changes();
    order.set_note("table 4");
    let delivery = service.commit(&mut order).expect("note changed");
    delivery.await?;

    assert!(!order.is_recording());
    let requests = fixture.transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/changes");
    assert_eq!(requests[0].body.as_ref().unwrap()["token"], "T1");

    let events = posted_events(&fixture, 0);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["orderId"], json!(order.id()));
    assert_eq!(
        events[0]["changes"],
        json!({"id": order.id(), "note": "table 4"})
    );
    assert!(service.pending_changes().is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_commit_without_changes_sends_nothing() {
    let (fixture, saved) = TestFixture::signed_in("T1");
    let service = service(&fixture, saved);
    let mut order = Order::new();

    order.record_changes();
    order.set_note("draft");
    order.set_note("");

    assert!(service.commit(&mut order).is_none());
    service.flush().await.unwrap();
    assert_eq!(fixture.transport.request_count(), 0);
}

struct NoopWake;

impl Wake for NoopWake {
    fn wake(self: Arc<Self>) {}
}

#[test]
fn test_commit_outside_runtime_is_kept() {
    let (fixture, saved) = TestFixture::signed_in("T1");
    fixture.transport.respond(ok(None));
    let service = service(&fixture, saved);
    let mut order = Order::new();

    order.record_changes();
    order.set_note("table 9");
    let delivery = service.commit(&mut order).expect("note changed");
    assert_eq!(service.pending_changes().len(), 1);

    let waker = Waker::from(Arc::new(NoopWake));
    let flush = pin!(service.flush());
    match flush.poll(&mut Context::from_waker(&waker)) {
        Poll::Ready(Err(err)) => {
            assert!(matches!(err, ServiceError::Queue(QueueError::NoRuntime)));
            assert_eq!(err.to_body().code, "NO_RUNTIME");
        }
        other => panic!("expected a queue error, got {other:?}"),
    }
    assert_eq!(service.pending_changes().len(), 1);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();
    rt.block_on(async {
        assert!(matches!(delivery.await, Err(QueueError::NoRuntime)));
        service.flush().await.unwrap();
    });

    assert_eq!(fixture.transport.request_count(), 1);
    assert!(service.pending_changes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_failed_uploads_are_retried_with_the_same_events() -> anyhow::Result<()> {
    init_tracing();
    let (fixture, saved) = TestFixture::signed_in("T1");
    fixture
        .transport
        .fail(TransportError::Network("offline".into()))
        .fail(TransportError::Status(503))
        .respond(ok(None));
    let service = service(&fixture, saved);
    let mut order = Order::new();

    order.record_changes();
    order.add_credit(tillsync::Credit::new(Amount(250), "voucher"));
    let delivery = service.commit(&mut order).expect("credit added");

    let started = tokio::time::Instant::now();
    delivery.await?;

    assert!(started.elapsed() >= Duration::from_secs(240));
    assert_eq!(fixture.transport.request_count(), 3);
    let first = posted_events(&fixture, 0);
    assert_eq!(posted_events(&fixture, 1), first);
    assert_eq!(posted_events(&fixture, 2), first);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_changes_committed_while_offline_go_out_together() -> anyhow::Result<()> {
    let (fixture, saved) = TestFixture::signed_in("T1");
    fixture
        .transport
        .fail(TransportError::Network("offline".into()))
        .respond(ok(None));
    let service = service(&fixture, saved);

    let mut first = Order::new();
    first.record_changes();
    first.set_note("one");
    let first_delivery = service.commit(&mut first).expect("changed");
    settle().await;

    let mut second = Order::new();
    second.record_changes();
    second.set_note("two");
    let second_delivery = service.commit(&mut second).expect("changed");
    assert_eq!(service.pending_changes().len(), 2);

    first_delivery.await?;
    second_delivery.await?;

    assert_eq!(fixture.transport.request_count(), 2);
    let batch = posted_events(&fixture, 1);
    let ids: Vec<_> = batch.iter().map(|e| e["orderId"].clone()).collect();
    assert_eq!(ids, vec![json!(first.id()), json!(second.id())]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_rejected_credentials_hold_uploads_until_sign_in() -> anyhow::Result<()> {
    let (fixture, saved) = TestFixture::signed_in("T1");
    fixture
        .transport
        .respond(error("AUTH_FAILED", "token expired"));
    let service = service(&fixture, saved);
    let mut order = Order::new();

    order.record_changes();
    order.set_note("x");
    let delivery = service.commit(&mut order).expect("changed");
    settle().await;

    assert_eq!(fixture.auth.status(), AuthStatus::Unauthenticated);
    assert_eq!(service.client().token(), None);
    assert_eq!(fixture.hook.last().map(|s| s.token), Some(None));
    assert_eq!(service.pending_changes().len(), 1);

    fixture
        .transport
        .respond(ok_with_token("T2"))
        .respond(ok(None));
    service
        .sign_in(&DeviceCredentials {
            device_id: "till-1".into(),
            secret: "s3cret".into(),
        })
        .await?;
    delivery.await?;

    let requests = fixture.transport.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[2].path, "/changes");
    assert_eq!(requests[2].body.as_ref().unwrap()["token"], "T2");
    assert_eq!(fixture.auth.status(), AuthStatus::Authenticated);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_pending_changes_survive_a_restart() -> anyhow::Result<()> {
    let (offline, saved) = TestFixture::signed_in("T1");
    let before = service(&offline, saved.clone());
    let mut order = Order::new();
    order.record_changes();
    order.set_note("kept");
    let _lost = before.commit(&mut order).expect("changed");
    settle().await;

    let pending = before.pending_changes();
    assert_eq!(pending.len(), 1);
    let persisted = serde_json::to_string(&pending)?;
    drop(before);

    let (online, _) = TestFixture::signed_in("T1");
    online.transport.respond(ok(None));
    let after = service(&online, saved);
    let restored: Vec<ChangeEvent> = serde_json::from_str(&persisted)?;
    after.restore_changes(restored).await?;

    let events = posted_events(&online, 0);
    assert_eq!(events[0]["eventId"], json!(pending[0].event_id));
    assert_eq!(events[0]["changes"]["note"], "kept");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_see_committed_events() {
    let (fixture, saved) = TestFixture::signed_in("T1");
    fixture.transport.respond(ok(None));
    let service = service(&fixture, saved);
    let mut events = service.subscribe_changes();
    let mut order = Order::new();

    order.record_changes();
    order.customer_mut().set("name", "Ada");
    let delivery = service.commit(&mut order).expect("changed");

    let event = events.recv().await.unwrap();
    assert_eq!(event.order_id, order.id());
    assert!(event.changes.customer.is_some());
    assert!(event.changes.note.is_none());
    delivery.await.unwrap();
}

// ─────────────────────────────────────────────────────────────────────────────
// Queries
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_sign_in_authenticates_and_updates_the_live_business() -> anyhow::Result<()> {
    init_tracing();
    let fixture = TestFixture::new();
    fixture.transport.respond(json!({
        "status": "ok",
        "token": "T1",
        "dataVersion": "V1",
        "business": sample_business_json(),
    }));
    let service = service(&fixture, SavedState::default());
    let business = service.business();
    let mut revisions = business.subscribe();

    service
        .sign_in(&DeviceCredentials {
            device_id: "till-1".into(),
            secret: "s3cret".into(),
        })
        .await?;

    let request = &fixture.transport.requests()[0];
    assert_eq!(request.path, "/device/sign-in");
    assert_eq!(
        request.body,
        Some(json!({"data": {"deviceId": "till-1", "secret": "s3cret"}}))
    );

    assert!(business.same_as(&service.business()));
    assert_eq!(business.read().name, "Harbour Café");
    assert!(revisions.has_changed()?);
    assert_eq!(fixture.auth.status(), AuthStatus::Authenticated);
    assert_eq!(
        fixture.hook.last(),
        Some(SavedState {
            token: Some("T1".into()),
            data_version: Some("V1".into()),
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_queries_need_a_token() {
    let fixture = TestFixture::new();
    let service = service(&fixture, SavedState::default());

    let err = service.refresh_business().await.unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Protocol(ProtocolError::NotAuthenticated)
    ));
    assert_eq!(err.to_body().code, "NOT_AUTHENTICATED");
    assert_eq!(fixture.transport.request_count(), 0);
}

#[tokio::test]
async fn test_server_errors_surface_their_code() {
    let (fixture, saved) = TestFixture::signed_in("T1");
    fixture
        .transport
        .respond(error("BUSINESS_SUSPENDED", "account on hold"));
    let service = service(&fixture, saved);

    let err = service.refresh_business().await.unwrap_err();
    let body = err.to_body();

    assert_eq!(body.code, "BUSINESS_SUSPENDED");
    assert_eq!(body.message, "account on hold");
    assert_eq!(fixture.auth.status(), AuthStatus::Authenticated);
}

#[tokio::test]
async fn test_malformed_business_is_ignored() -> anyhow::Result<()> {
    let (fixture, saved) = TestFixture::signed_in("T1");
    fixture.transport.respond(json!({
        "status": "ok",
        "business": sample_business_json(),
    }));
    fixture.transport.respond(json!({
        "status": "ok",
        "business": {"name": 42},
    }));
    let service = service(&fixture, saved);

    service.refresh_business().await?;
    let revision = service.business().revision();
    let business = service.refresh_business().await?;

    assert_eq!(business.name, "Harbour Café");
    assert_eq!(service.business().revision(), revision);
    assert!(service.client().last_business().is_none());
    Ok(())
}

#[tokio::test]
async fn test_add_product_prices_from_the_catalog() -> anyhow::Result<()> {
    let (fixture, saved) = TestFixture::signed_in("T1");
    fixture.transport.respond(json!({
        "status": "ok",
        "business": sample_business_json(),
    }));
    let service = service(&fixture, saved);
    service.refresh_business().await?;
    let mut order = Order::new();

    let item = service.add_product(&mut order, &"coffee-large".into(), 2)?;

    assert_eq!(item.product_name, "Coffee");
    assert_eq!(item.variant_name.as_deref(), Some("Large"));
    assert_eq!(order.items().len(), 1);
    assert_eq!(order.subtotal(), Amount(800));
    assert_eq!(order.tax_total(), Amount(80));
    assert_eq!(order.total(), Amount(880));
    Ok(())
}

#[tokio::test]
async fn test_add_product_rejects_unknown_products() {
    let (fixture, saved) = TestFixture::signed_in("T1");
    let service = service(&fixture, saved);
    service.business().merge(sample_business());
    let mut order = Order::new();

    let err = service.add_product(&mut order, &"tea".into(), 1).unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Core(CoreError::UnknownProduct(ref id)) if id.as_str() == "tea"
    ));
    assert_eq!(err.to_body().code, "INVALID_INPUT");
    assert!(order.items().is_empty());
}

#[tokio::test]
async fn test_register_events_need_an_initialized_register() -> anyhow::Result<()> {
    let (fixture, saved) = TestFixture::signed_in("T1");
    fixture
        .transport
        .respond(json!({"status": "ok", "deviceRegister": null}));
    let service = service(&fixture, saved);

    let register = service.refresh_register().await?;
    assert!(!register.is_initialized());

    let err = service
        .push_register_event(&RegisterEvent::Open {
            opening_float: Amount(5_000),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::RegisterNotInitialized));
    assert_eq!(err.to_body().code, "REGISTER_NOT_INITIALIZED");
    assert_eq!(fixture.transport.request_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_register_events_carry_the_register_id() -> anyhow::Result<()> {
    let (fixture, saved) = TestFixture::signed_in("T1");
    fixture
        .transport
        .respond(json!({
            "status": "ok",
            "deviceRegister": {"id": "reg-1", "name": "Front"},
        }))
        .respond(ok(None));
    let service = service(&fixture, saved);
    let live = service.register();

    service.refresh_register().await?;
    service
        .push_register_event(&RegisterEvent::Open {
            opening_float: Amount(5_000),
        })
        .await?;

    assert_eq!(live.read().name, "Front");
    let request = &fixture.transport.requests()[1];
    assert_eq!(request.path, "/register/events");
    assert_eq!(
        request.body.as_ref().unwrap()["data"],
        json!({"registerId": "reg-1", "event": {"type": "open", "openingFloat": 5000}})
    );
    Ok(())
}

#[tokio::test]
async fn test_order_history_is_parsed_into_orders() -> anyhow::Result<()> {
    let (fixture, saved) = TestFixture::signed_in("T1");
    let order_id = "00112233445566778899aabbccddeeff";
    let line_id = "ffeeddccbbaa99887766554433221100";
    fixture.transport.respond(ok(Some(json!([{
        "id": order_id,
        "createdAt": 1_700_000_000_000i64,
        "note": "table 2",
        "items": [{
            "id": line_id,
            "quantity": 2,
            "product": {
                "name": "Coffee",
                "price": 300,
                "productId": "coffee",
                "taxes": [{"taxId": "vat", "amount": 60}],
            },
        }],
        "customer": {"name": "Ada"},
    }]))));
    let service = service(&fixture, saved);

    let orders = service
        .order_history(&HistoryQuery {
            since: Some(1_000),
            limit: Some(10),
        })
        .await?;

    let request = &fixture.transport.requests()[0];
    assert_eq!(request.path, "/orders/history");
    assert_eq!(
        request.body.as_ref().unwrap()["data"],
        json!({"since": 1000, "limit": 10})
    );

    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(order.id().to_hex(), order_id);
    assert_eq!(order.note(), "table 2");
    assert_eq!(order.items().len(), 1);
    let item = &order.items()[0];
    assert_eq!(item.uid.to_hex(), line_id);
    assert_eq!(item.effective_name(), "Coffee");
    assert_eq!(item.subtotal(), Amount(600));
    assert_eq!(order.tax_total(), Amount(60));
    assert!(order.credits().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_sign_out_forgets_the_token() {
    let (fixture, saved) = TestFixture::signed_in("T1");
    let service = service(&fixture, saved);

    service.sign_out().await;

    assert_eq!(service.client().token(), None);
    assert_eq!(fixture.auth.status(), AuthStatus::Unauthenticated);
    assert_eq!(fixture.hook.last().map(|s| s.token), Some(None));
}

#[tokio::test]
async fn test_transactions_are_pushed_with_their_order() -> anyhow::Result<()> {
    let (fixture, saved) = TestFixture::signed_in("T1");
    fixture.transport.respond(ok(None));
    let service = service(&fixture, saved);
    let order = Order::new();
    let payment = tillsync::Transaction::new("cash".into(), Amount(1_200));

    service.push_transaction(order.id(), &payment).await?;

    let request = &fixture.transport.requests()[0];
    assert_eq!(request.path, "/transactions");
    let data = &request.body.as_ref().unwrap()["data"];
    assert_eq!(data["orderId"], json!(order.id()));
    assert_eq!(data["transaction"]["transactionModeId"], "cash");
    assert_eq!(data["transaction"]["amount"], 1200);
    assert_eq!(data["transaction"]["id"], json!(payment.uid));
    Ok(())
}
