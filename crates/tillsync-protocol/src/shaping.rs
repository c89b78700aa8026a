//! Wire shapes for orders and change sets.
//!
//! Outbound, lines reference server entities by id: an item carries a
//! product summary `{name, price, productId, taxes}` under its effective
//! (variant-aware) name, a transaction carries `transactionModeId`, a room
//! selection carries `roomId`. A change set carries the order id plus only
//! the fields that changed.
//!
//! Inbound, the same shapes parse back into [`Order`] values for order
//! history.

use serde::{Deserialize, Serialize};

use tillsync_core::{
    Amount, AppliedTax, ChangeSet, Credit, Customer, FieldValues, Item, LineId, Order, OrderId,
    OrderParts, ProductId, RoomId, RoomSelection, TaxId, Transaction, TransactionModeId,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTax {
    pub tax_id: TaxId,
    pub amount: Amount,
}

/// Product summary embedded in an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireProduct {
    pub name: String,
    pub price: Amount,
    pub product_id: ProductId,
    #[serde(default)]
    pub taxes: Vec<WireTax>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireItem {
    pub id: LineId,
    pub quantity: u32,
    pub product: WireProduct,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCredit {
    pub id: LineId,
    pub amount: Amount,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTransaction {
    pub id: LineId,
    pub transaction_mode_id: TransactionModeId,
    pub amount: Amount,
    #[serde(default)]
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRoomSelection {
    pub id: LineId,
    pub room_id: RoomId,
    pub start: i64,
    pub end: i64,
    #[serde(default)]
    pub fields: FieldValues,
}

/// A whole order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireOrder {
    pub id: OrderId,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub items: Vec<WireItem>,
    #[serde(default)]
    pub credits: Vec<WireCredit>,
    #[serde(default)]
    pub transactions: Vec<WireTransaction>,
    #[serde(default)]
    pub room_selections: Vec<WireRoomSelection>,
    #[serde(default)]
    pub customer: Customer,
}

/// The changed fields of an order, keyed by its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireChanges {
    pub id: OrderId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<WireItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits: Option<Vec<WireCredit>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transactions: Option<Vec<WireTransaction>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_selections: Option<Vec<WireRoomSelection>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<Customer>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Outbound
// ─────────────────────────────────────────────────────────────────────────────

impl From<&Item> for WireItem {
    fn from(item: &Item) -> Self {
        Self {
            id: item.uid,
            quantity: item.quantity,
            product: WireProduct {
                name: item.effective_name(),
                price: item.price,
                product_id: item.product_id.clone(),
                taxes: item
                    .taxes
                    .iter()
                    .map(|t| WireTax {
                        tax_id: t.tax_id.clone(),
                        amount: t.amount,
                    })
                    .collect(),
            },
        }
    }
}

impl From<&Credit> for WireCredit {
    fn from(credit: &Credit) -> Self {
        Self {
            id: credit.uid,
            amount: credit.amount,
            reason: credit.reason.clone(),
        }
    }
}

impl From<&Transaction> for WireTransaction {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: tx.uid,
            transaction_mode_id: tx.mode_id.clone(),
            amount: tx.amount,
            created_at: tx.created_at,
        }
    }
}

impl From<&RoomSelection> for WireRoomSelection {
    fn from(selection: &RoomSelection) -> Self {
        Self {
            id: selection.uid,
            room_id: selection.room_id.clone(),
            start: selection.start,
            end: selection.end,
            fields: selection.fields.clone(),
        }
    }
}

fn shape_all<'a, L: 'a, W>(lines: impl IntoIterator<Item = &'a L>) -> Vec<W>
where
    W: From<&'a L>,
{
    lines.into_iter().map(W::from).collect()
}

impl From<&Order> for WireOrder {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id(),
            created_at: order.created_at(),
            note: order.note().to_string(),
            items: shape_all(order.items().iter().map(|i| &**i)),
            credits: shape_all(order.credits().iter().map(|c| &**c)),
            transactions: shape_all(order.transactions().iter().map(|t| &**t)),
            room_selections: shape_all(order.room_selections()),
            customer: order.customer().clone(),
        }
    }
}

impl From<&ChangeSet> for WireChanges {
    fn from(changes: &ChangeSet) -> Self {
        Self {
            id: changes.order_id(),
            note: changes.note().map(str::to_string),
            items: changes.items().map(|l| shape_all(l.iter().map(|i| &**i))),
            credits: changes.credits().map(|l| shape_all(l.iter().map(|c| &**c))),
            transactions: changes
                .transactions()
                .map(|l| shape_all(l.iter().map(|t| &**t))),
            room_selections: changes.room_selections().map(|l| shape_all(l)),
            customer: changes.customer().cloned(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Inbound
// ─────────────────────────────────────────────────────────────────────────────

impl From<WireItem> for Item {
    fn from(wire: WireItem) -> Self {
        // The wire name is already the display name; variant structure is
        // not recoverable from it.
        Self {
            uid: wire.id,
            product_id: wire.product.product_id,
            product_name: wire.product.name,
            variant_name: None,
            price: wire.product.price,
            quantity: wire.quantity,
            taxes: wire
                .product
                .taxes
                .into_iter()
                .map(|t| AppliedTax {
                    tax_id: t.tax_id,
                    amount: t.amount,
                })
                .collect(),
        }
    }
}

impl From<WireCredit> for Credit {
    fn from(wire: WireCredit) -> Self {
        Self {
            uid: wire.id,
            amount: wire.amount,
            reason: wire.reason,
        }
    }
}

impl From<WireTransaction> for Transaction {
    fn from(wire: WireTransaction) -> Self {
        Self {
            uid: wire.id,
            mode_id: wire.transaction_mode_id,
            amount: wire.amount,
            created_at: wire.created_at,
        }
    }
}

impl From<WireRoomSelection> for RoomSelection {
    fn from(wire: WireRoomSelection) -> Self {
        Self {
            uid: wire.id,
            room_id: wire.room_id,
            start: wire.start,
            end: wire.end,
            fields: wire.fields,
        }
    }
}

impl From<WireOrder> for Order {
    fn from(wire: WireOrder) -> Self {
        Order::from_parts(
            wire.id,
            OrderParts {
                note: wire.note,
                created_at: wire.created_at,
                items: wire.items.into_iter().map(Item::from).collect(),
                credits: wire.credits.into_iter().map(Credit::from).collect(),
                transactions: wire.transactions.into_iter().map(Transaction::from).collect(),
                room_selections: wire.room_selections.into_iter().map(RoomSelection::from).collect(),
                customer: wire.customer,
            },
        )
    }
}
