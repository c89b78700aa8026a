//! Change tracking for orders.
//!
//! An order records changes between [`Order::record_changes`] and
//! [`Order::commit_changes`] (or [`Order::revert_changes`]). Nothing is
//! intercepted while recording; the diff is computed lazily from a snapshot
//! taken when recording started.
//!
//! ## Diff policy
//!
//! | field | compared by | payload |
//! |---|---|---|
//! | note | string inequality | new note |
//! | items, credits, transactions | line identity (`Arc` allocation) | lines added since recording |
//! | customer | value equality | current customer |
//! | room selections | length + per-index value equality | every current selection |
//!
//! Items, credits and transactions are append-only, so identity is enough to
//! tell which lines are new and removals are never reported. The customer and
//! room selections are edited in place and need value comparison.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::customer::Customer;
use crate::order::{Credit, Item, Order, RoomSelection, Transaction};
use crate::types::OrderId;

/// Point-in-time copy of the parts of an order that can change.
#[derive(Debug, Clone)]
pub(crate) struct ChangeSnapshot {
    note: String,
    items: Vec<Arc<Item>>,
    credits: Vec<Arc<Credit>>,
    transactions: Vec<Arc<Transaction>>,
    room_selections: Vec<RoomSelection>,
    customer: Customer,
}

impl ChangeSnapshot {
    fn capture(order: &Order) -> Self {
        Self {
            note: order.note.clone(),
            // Shallow: the Arcs are the identities we diff against.
            items: order.items.clone(),
            credits: order.credits.clone(),
            transactions: order.transactions.clone(),
            // Deep: these are edited in place.
            room_selections: order.room_selections.clone(),
            customer: order.customer.clone(),
        }
    }
}

/// A logical field of an order that a change set can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChangeField {
    Note,
    Items,
    Credits,
    Transactions,
    RoomSelections,
    Customer,
}

impl ChangeField {
    /// Every field, in wire order.
    pub const ALL: [ChangeField; 6] = [
        ChangeField::Note,
        ChangeField::Items,
        ChangeField::Credits,
        ChangeField::Transactions,
        ChangeField::RoomSelections,
        ChangeField::Customer,
    ];

    /// The name of this field in serialized orders.
    pub const fn wire_name(self) -> &'static str {
        match self {
            ChangeField::Note => "note",
            ChangeField::Items => "items",
            ChangeField::Credits => "credits",
            ChangeField::Transactions => "transactions",
            ChangeField::RoomSelections => "roomSelections",
            ChangeField::Customer => "customer",
        }
    }

    /// Look up a field by its serialized name.
    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.wire_name() == name)
    }
}

impl fmt::Display for ChangeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// What changed in an order during one recording transaction.
///
/// Only the changed fields are populated. A change set is never empty: the
/// engine returns `None` instead.
#[derive(Debug, Clone)]
pub struct ChangeSet {
    order_id: OrderId,
    note: Option<String>,
    items: Option<Vec<Arc<Item>>>,
    credits: Option<Vec<Arc<Credit>>>,
    transactions: Option<Vec<Arc<Transaction>>>,
    room_selections: Option<Vec<RoomSelection>>,
    customer: Option<Customer>,
}

impl ChangeSet {
    /// The order this change set belongs to.
    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    /// New note, if it changed.
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// Items added while recording.
    pub fn items(&self) -> Option<&[Arc<Item>]> {
        self.items.as_deref()
    }

    /// Credits added while recording.
    pub fn credits(&self) -> Option<&[Arc<Credit>]> {
        self.credits.as_deref()
    }

    /// Transactions added while recording.
    pub fn transactions(&self) -> Option<&[Arc<Transaction>]> {
        self.transactions.as_deref()
    }

    /// Every current room selection, if any of them changed.
    pub fn room_selections(&self) -> Option<&[RoomSelection]> {
        self.room_selections.as_deref()
    }

    /// The current customer, if it changed.
    pub fn customer(&self) -> Option<&Customer> {
        self.customer.as_ref()
    }

    /// Whether a field changed.
    pub fn changed(&self, field: ChangeField) -> bool {
        match field {
            ChangeField::Note => self.note.is_some(),
            ChangeField::Items => self.items.is_some(),
            ChangeField::Credits => self.credits.is_some(),
            ChangeField::Transactions => self.transactions.is_some(),
            ChangeField::RoomSelections => self.room_selections.is_some(),
            ChangeField::Customer => self.customer.is_some(),
        }
    }

    /// Whether a field changed, by serialized name. Unknown names never
    /// change.
    pub fn is_changed(&self, name: &str) -> bool {
        ChangeField::from_wire_name(name).is_some_and(|f| self.changed(f))
    }

    /// The fields that changed, in wire order.
    pub fn changed_fields(&self) -> Vec<ChangeField> {
        ChangeField::ALL
            .into_iter()
            .filter(|f| self.changed(*f))
            .collect()
    }
}

/// Where committed change sets go.
///
/// Implementations typically wrap the change set in an event and hand it to
/// a delivery queue.
pub trait ChangeSink {
    fn propagate(&self, order: &Order, changes: ChangeSet);
}

impl<F> ChangeSink for F
where
    F: Fn(&Order, ChangeSet),
{
    fn propagate(&self, order: &Order, changes: ChangeSet) {
        self(order, changes)
    }
}

impl Order {
    /// Start recording changes.
    ///
    /// Does nothing if already recording; the original snapshot is kept.
    pub fn record_changes(&mut self) {
        if self.recording.is_some() {
            return;
        }
        self.recording = Some(ChangeSnapshot::capture(self));
    }

    /// Whether a recording transaction is open.
    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// Compute what changed since recording started.
    ///
    /// Returns `None` when not recording or when nothing changed.
    pub fn changes(&self) -> Option<ChangeSet> {
        let snapshot = self.recording.as_ref()?;

        let changes = ChangeSet {
            order_id: self.id(),
            note: (self.note != snapshot.note).then(|| self.note.clone()),
            items: appended(&self.items, &snapshot.items),
            credits: appended(&self.credits, &snapshot.credits),
            transactions: appended(&self.transactions, &snapshot.transactions),
            room_selections: (self.room_selections != snapshot.room_selections)
                .then(|| self.room_selections.clone()),
            customer: (self.customer != snapshot.customer).then(|| self.customer.clone()),
        };

        if ChangeField::ALL.iter().any(|f| changes.changed(*f)) {
            Some(changes)
        } else {
            None
        }
    }

    /// Stop recording and hand any changes to `sink`.
    ///
    /// Returns whether anything was propagated.
    pub fn commit_changes(&mut self, sink: &dyn ChangeSink) -> bool {
        let changes = self.changes();
        self.recording = None;

        match changes {
            Some(changes) => {
                tracing::debug!(
                    order = %self.id(),
                    fields = ?changes.changed_fields(),
                    "committing order changes"
                );
                sink.propagate(self, changes);
                true
            }
            None => false,
        }
    }

    /// Stop recording and restore the order to its recorded state.
    pub fn revert_changes(&mut self) {
        let Some(snapshot) = self.recording.take() else {
            return;
        };

        let ChangeSnapshot {
            note,
            items,
            credits,
            transactions,
            room_selections,
            customer,
        } = snapshot;

        self.note = note;
        self.items = items;
        self.credits = credits;
        self.transactions = transactions;
        self.room_selections = room_selections;
        self.customer = customer;
    }
}

/// Lines in `current` that are not in `recorded`, by identity.
fn appended<T>(current: &[Arc<T>], recorded: &[Arc<T>]) -> Option<Vec<Arc<T>>> {
    let known: HashSet<*const T> = recorded.iter().map(Arc::as_ptr).collect();
    let added: Vec<Arc<T>> = current
        .iter()
        .filter(|line| !known.contains(&Arc::as_ptr(line)))
        .cloned()
        .collect();

    if added.is_empty() {
        None
    } else {
        Some(added)
    }
}
