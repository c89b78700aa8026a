//! Proptest generators for property-based testing.

use std::sync::Arc;

use proptest::prelude::*;

use tillsync_core::{
    Amount, Credit, Customer, FieldId, FieldValue, Item, LineId, Order, OrderId, OrderParts,
    ProductId, RoomId, RoomSelection, Transaction, TransactionModeId,
};

/// Generate an amount in minor units.
pub fn amount() -> impl Strategy<Value = Amount> {
    (-10_000i64..=100_000).prop_map(Amount)
}

/// Generate a short note.
pub fn note() -> impl Strategy<Value = String> {
    "[a-z ]{0,12}".prop_map(String::from)
}

/// Generate an item that does not come from any catalog.
pub fn item() -> impl Strategy<Value = Item> {
    ("[a-z]{1,8}", 0i64..=10_000, 1u32..=5).prop_map(|(name, price, quantity)| Item {
        uid: LineId::random(),
        product_id: ProductId::new(name.clone()),
        product_name: name,
        variant_name: None,
        price: Amount(price),
        quantity,
        taxes: vec![],
    })
}

pub fn credit() -> impl Strategy<Value = Credit> {
    (amount(), "[a-z]{0,8}").prop_map(|(amount, reason)| Credit::new(amount, reason))
}

pub fn transaction() -> impl Strategy<Value = Transaction> {
    (prop_oneof![Just("cash"), Just("card")], amount())
        .prop_map(|(mode, amount)| Transaction::new(TransactionModeId::new(mode), amount))
}

pub fn room_selection() -> impl Strategy<Value = RoomSelection> {
    ("room-[0-9]", 0i64..1_000, 1i64..1_000).prop_map(|(room, start, len)| {
        RoomSelection::new(RoomId::new(room), start, start + len)
    })
}

pub fn field_value() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        Just(FieldValue::Null),
        any::<bool>().prop_map(FieldValue::Bool),
        (0i64..100).prop_map(FieldValue::int),
        "[a-z]{0,6}".prop_map(FieldValue::text),
    ]
}

pub fn customer() -> impl Strategy<Value = Customer> {
    prop::collection::btree_map("[a-c]".prop_map(FieldId::new), field_value(), 0..3)
        .prop_map(Customer::from_values)
}

/// Generate a complete order, not recording.
pub fn order() -> impl Strategy<Value = Order> {
    (
        note(),
        prop::collection::vec(item(), 0..4),
        prop::collection::vec(credit(), 0..3),
        prop::collection::vec(transaction(), 0..3),
        prop::collection::vec(room_selection(), 0..3),
        customer(),
    )
        .prop_map(|(note, items, credits, transactions, room_selections, customer)| {
            Order::from_parts(
                OrderId::random(),
                OrderParts {
                    note,
                    created_at: 0,
                    items,
                    credits,
                    transactions,
                    room_selections,
                    customer,
                },
            )
        })
}

/// One edit a user could make to an order.
#[derive(Debug, Clone)]
pub enum OrderEdit {
    SetNote(String),
    AddItem(Item),
    AddCredit(Credit),
    AddTransaction(Transaction),
    AddRoomSelection(RoomSelection),
    /// Remove the line at `index % len`, if any.
    RemoveItem(usize),
    RemoveCredit(usize),
    RemoveTransaction(usize),
    RemoveRoomSelection(usize),
    /// Move the end of the room selection at `index % len`, if any.
    ExtendRoomSelection(usize, i64),
    SetCustomerField(String, FieldValue),
    ReplaceCustomer(Customer),
}

impl Arbitrary for OrderEdit {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        prop_oneof![
            note().prop_map(OrderEdit::SetNote),
            item().prop_map(OrderEdit::AddItem),
            credit().prop_map(OrderEdit::AddCredit),
            transaction().prop_map(OrderEdit::AddTransaction),
            room_selection().prop_map(OrderEdit::AddRoomSelection),
            any::<usize>().prop_map(OrderEdit::RemoveItem),
            any::<usize>().prop_map(OrderEdit::RemoveCredit),
            any::<usize>().prop_map(OrderEdit::RemoveTransaction),
            any::<usize>().prop_map(OrderEdit::RemoveRoomSelection),
            (any::<usize>(), 1i64..100).prop_map(|(i, by)| OrderEdit::ExtendRoomSelection(i, by)),
            ("[a-c]", field_value()).prop_map(|(k, v)| OrderEdit::SetCustomerField(k, v)),
            customer().prop_map(OrderEdit::ReplaceCustomer),
        ]
        .boxed()
    }
}

impl OrderEdit {
    /// Whether this edit only appends lines.
    pub fn is_append(&self) -> bool {
        matches!(
            self,
            OrderEdit::AddItem(_)
                | OrderEdit::AddCredit(_)
                | OrderEdit::AddTransaction(_)
                | OrderEdit::AddRoomSelection(_)
        )
    }
}

/// Apply an edit. Edits that target a line of an empty list do nothing.
pub fn apply_edit(order: &mut Order, edit: OrderEdit) {
    fn pick<T>(lines: &[T], index: usize) -> Option<&T> {
        if lines.is_empty() {
            None
        } else {
            lines.get(index % lines.len())
        }
    }

    match edit {
        OrderEdit::SetNote(note) => order.set_note(note),
        OrderEdit::AddItem(item) => {
            order.add_item(item);
        }
        OrderEdit::AddCredit(credit) => {
            order.add_credit(credit);
        }
        OrderEdit::AddTransaction(tx) => {
            order.add_transaction(tx);
        }
        OrderEdit::AddRoomSelection(selection) => order.add_room_selection(selection),
        OrderEdit::RemoveItem(i) => {
            if let Some(uid) = pick(order.items(), i).map(|l| l.uid) {
                let _ = order.remove_item(&uid);
            }
        }
        OrderEdit::RemoveCredit(i) => {
            if let Some(uid) = pick(order.credits(), i).map(|l| l.uid) {
                let _ = order.remove_credit(&uid);
            }
        }
        OrderEdit::RemoveTransaction(i) => {
            if let Some(uid) = pick(order.transactions(), i).map(|l| l.uid) {
                let _ = order.remove_transaction(&uid);
            }
        }
        OrderEdit::RemoveRoomSelection(i) => {
            if let Some(uid) = pick(order.room_selections(), i).map(|s| s.uid) {
                let _ = order.remove_room_selection(&uid);
            }
        }
        OrderEdit::ExtendRoomSelection(i, by) => {
            if let Some(uid) = pick(order.room_selections(), i).map(|s| s.uid) {
                if let Some(selection) = order.room_selection_mut(&uid) {
                    selection.end += by;
                }
            }
        }
        OrderEdit::SetCustomerField(key, value) => {
            order.customer_mut().set(key.as_str(), value);
        }
        OrderEdit::ReplaceCustomer(customer) => order.set_customer(customer),
    }
}

/// Everything observable about an order's editable state, with append-only
/// lines compared by identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderState {
    pub note: String,
    pub items: Vec<usize>,
    pub credits: Vec<usize>,
    pub transactions: Vec<usize>,
    pub room_selections: Vec<RoomSelection>,
    pub customer: Customer,
}

impl OrderState {
    pub fn capture(order: &Order) -> Self {
        fn ptrs<T>(lines: &[Arc<T>]) -> Vec<usize> {
            lines.iter().map(|l| Arc::as_ptr(l) as usize).collect()
        }
        Self {
            note: order.note().to_string(),
            items: ptrs(order.items()),
            credits: ptrs(order.credits()),
            transactions: ptrs(order.transactions()),
            room_selections: order.room_selections().to_vec(),
            customer: order.customer().clone(),
        }
    }
}
