//! Test fixtures and helpers.
//!
//! A sample business to build orders against, canned server responses, and a
//! fixture bundling a scripted transport with the state a client would keep.

use serde_json::{json, Value};

use tillsync_core::{
    Amount, Business, Catalog, Credit, FieldDef, FieldKind, Item, Order, Product, Room,
    RoomSelection, Tax, Transaction, TransactionMode,
};
use tillsync_protocol::{
    AuthStatus, Authentication, ClientConfig, MemorySaveHook, SavedState, ScriptedTransport,
    SyncClient,
};

/// A small café that also rents rooms.
///
/// Products: `coffee` (with variants `coffee-small` and `coffee-large`) and
/// `cake`. One 10% tax, cash and card modes, two rooms, and a required
/// `name` customer field.
pub fn sample_business() -> Business {
    Business {
        id: "biz-1".into(),
        name: "Harbour Café".into(),
        currency: "EUR".into(),
        products: Catalog::from(vec![
            product("coffee", "Coffee", 300, None),
            product("coffee-small", "Small", 250, Some("coffee")),
            product("coffee-large", "Large", 400, Some("coffee")),
            product("cake", "Cake", 450, None),
        ]),
        taxes: vec![Tax {
            id: "vat".into(),
            name: "VAT".into(),
            rate_bps: 1000,
        }],
        transaction_modes: vec![
            TransactionMode {
                id: "cash".into(),
                name: "Cash".into(),
                is_cash: true,
            },
            TransactionMode {
                id: "card".into(),
                name: "Card".into(),
                is_cash: false,
            },
        ],
        rooms: vec![
            Room {
                id: "room-1".into(),
                name: "Loft".into(),
            },
            Room {
                id: "room-2".into(),
                name: "Garden".into(),
            },
        ],
        customer_fields: vec![FieldDef {
            id: "name".into(),
            label: "Name".into(),
            required: true,
            kind: FieldKind::Text,
        }],
        room_selection_fields: vec![FieldDef {
            id: "guests".into(),
            label: "Guests".into(),
            required: false,
            kind: FieldKind::Number,
        }],
    }
}

fn product(id: &str, name: &str, price: i64, parent: Option<&str>) -> Product {
    Product {
        id: id.into(),
        name: name.into(),
        price: Amount(price),
        parent_id: parent.map(Into::into),
        tax_ids: vec!["vat".into()],
    }
}

/// The sample business as the server would send it.
pub fn sample_business_json() -> Value {
    // Serializing a plain struct of strings and numbers cannot fail.
    serde_json::to_value(sample_business()).unwrap_or(Value::Null)
}

/// An order with one of everything.
pub fn sample_order(business: &Business) -> Order {
    let mut order = Order::new();
    order.set_note("window table");
    for (product, qty) in [("coffee-large", 2), ("cake", 1)] {
        if let Ok(item) = Item::from_catalog(business, &product.into(), qty) {
            order.add_item(item);
        }
    }
    order.add_credit(Credit::new(Amount(100), "loyalty"));
    order.add_transaction(Transaction::new("card".into(), Amount(500)));
    order.add_room_selection(RoomSelection::new("room-1".into(), 0, 3_600_000));
    order.customer_mut().set("name", "Ada");
    order
}

// ─────────────────────────────────────────────────────────────────────────────
// Canned responses
// ─────────────────────────────────────────────────────────────────────────────

/// `{status: "ok"}` with optional data.
pub fn ok(data: Option<Value>) -> Value {
    match data {
        Some(data) => json!({"status": "ok", "data": data}),
        None => json!({"status": "ok"}),
    }
}

/// `{status: "ok", token}`.
pub fn ok_with_token(token: &str) -> Value {
    json!({"status": "ok", "token": token})
}

/// `{status: "error", error: {code, message}}`.
pub fn error(code: &str, message: &str) -> Value {
    json!({"status": "error", "error": {"code": code, "message": message}})
}

/// A scripted transport plus the pieces a client needs, shared with the test.
pub struct TestFixture {
    pub transport: ScriptedTransport,
    pub hook: MemorySaveHook,
    pub auth: Authentication,
}

impl TestFixture {
    /// A fixture with no token.
    pub fn new() -> Self {
        Self {
            transport: ScriptedTransport::new(),
            hook: MemorySaveHook::new(),
            auth: Authentication::new(),
        }
    }

    /// A fixture whose client starts with `token` and is authenticated.
    pub fn signed_in(token: &str) -> (Self, SavedState) {
        let fixture = Self::new();
        fixture.auth.set(AuthStatus::Authenticated);
        let saved = SavedState {
            token: Some(token.to_string()),
            data_version: None,
        };
        (fixture, saved)
    }

    /// A client wired to this fixture's transport, hook and authentication.
    pub fn client(&self, saved: SavedState) -> SyncClient<ScriptedTransport> {
        SyncClient::new(self.transport.clone(), ClientConfig::default())
            .with_saved_state(saved)
            .with_authentication(self.auth.clone())
            .with_save_hook(self.hook.clone())
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tillsync_protocol::ProtocolError;

    #[test]
    fn test_sample_business_round_trips() {
        let parsed: Business = serde_json::from_value(sample_business_json()).unwrap();
        assert_eq!(parsed, sample_business());
        assert_eq!(
            parsed.products.display_name(parsed.product(&"coffee-large".into()).unwrap()),
            "Coffee (Large)"
        );
    }

    #[test]
    fn test_sample_order_totals() {
        let order = sample_order(&sample_business());
        assert_eq!(order.items().len(), 2);
        // 2 x 400 + 450 = 1250, tax 125, credit 100
        assert_eq!(order.subtotal(), Amount(1250));
        assert_eq!(order.tax_total(), Amount(125));
        assert_eq!(order.total(), Amount(1275));
        assert_eq!(order.balance(), Amount(775));
    }

    #[tokio::test]
    async fn test_fixture_client() {
        let (fixture, saved) = TestFixture::signed_in("T0");
        fixture.transport.respond(error("AUTH_FAILED", "expired"));
        let client = fixture.client(saved);

        let err = client.request("/x", None, true).await.unwrap_err();

        assert!(matches!(err, ProtocolError::Response { .. }));
        assert_eq!(fixture.auth.status(), AuthStatus::Unauthenticated);
        assert_eq!(fixture.hook.saved().len(), 1);
    }
}
