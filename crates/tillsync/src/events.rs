//! Events sent to the server.

use serde::{Deserialize, Serialize};

use tillsync_core::{now_millis, Amount, ChangeSet, EventId, OrderId};
use tillsync_protocol::WireChanges;

/// A committed change set, packaged for upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub event_id: EventId,
    pub order_id: OrderId,
    /// When the change was committed (Unix ms).
    pub created_at: i64,
    pub changes: WireChanges,
}

impl ChangeEvent {
    pub fn new(changes: &ChangeSet) -> Self {
        Self {
            event_id: EventId::random(),
            order_id: changes.order_id(),
            created_at: now_millis(),
            changes: WireChanges::from(changes),
        }
    }
}

/// Something that happened at the register, outside any order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RegisterEvent {
    /// Open a cash session with the counted float.
    #[serde(rename_all = "camelCase")]
    Open { opening_float: Amount },
    /// Close the session with the counted cash.
    #[serde(rename_all = "camelCase")]
    Close { counted_cash: Amount },
    /// Cash put into the drawer outside a sale.
    CashIn { amount: Amount, reason: String },
    /// Cash taken out of the drawer outside a sale.
    CashOut { amount: Amount, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tillsync_core::Order;

    #[test]
    fn test_change_event_shape() {
        let mut order = Order::new();
        order.record_changes();
        order.set_note("B");
        let changes = order.changes().unwrap();

        let event = ChangeEvent::new(&changes);
        let wire = serde_json::to_value(&event).unwrap();

        assert_eq!(wire["orderId"], order.id().to_hex());
        assert_eq!(wire["changes"], json!({"id": order.id().to_hex(), "note": "B"}));
        assert!(wire["eventId"].is_string());
        assert!(wire["createdAt"].is_i64());
    }

    #[test]
    fn test_register_event_shape() {
        let open = serde_json::to_value(RegisterEvent::Open {
            opening_float: Amount(5000),
        })
        .unwrap();
        assert_eq!(open, json!({"type": "open", "openingFloat": 5000}));

        let out = serde_json::to_value(RegisterEvent::CashOut {
            amount: Amount(200),
            reason: "change run".into(),
        })
        .unwrap();
        assert_eq!(out, json!({"type": "cashOut", "amount": 200, "reason": "change run"}));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;
        use tillsync_testkit::generators::{apply_edit, order, OrderEdit};

        proptest! {
            #[test]
            fn test_event_carries_exactly_the_changed_fields(
                mut order in order(),
                edits in prop::collection::vec(any::<OrderEdit>(), 1..8),
            ) {
                order.record_changes();
                for edit in edits {
                    apply_edit(&mut order, edit);
                }
                let Some(changes) = order.changes() else {
                    return Ok(());
                };

                let wire = serde_json::to_value(ChangeEvent::new(&changes)).unwrap();
                let mut sent: Vec<String> = wire["changes"]
                    .as_object()
                    .unwrap()
                    .keys()
                    .filter(|k| *k != "id")
                    .cloned()
                    .collect();
                sent.sort();
                let mut expected: Vec<String> = changes
                    .changed_fields()
                    .into_iter()
                    .map(|f| f.wire_name().to_string())
                    .collect();
                expected.sort();

                prop_assert_eq!(sent, expected);
            }
        }
    }
}
