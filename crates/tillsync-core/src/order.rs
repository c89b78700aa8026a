//! Orders and their lines.
//!
//! Items, credits and transactions are append-only: once added a line is
//! never edited, only removed wholesale. They are held behind [`Arc`] so a
//! line's allocation is its identity, which is what the change-set engine
//! diffs on. Room selections and the customer are edited in place.

use std::sync::Arc;

use crate::business::Business;
use crate::changes::ChangeSnapshot;
use crate::customer::Customer;
use crate::error::{CoreError, Result};
use crate::field::FieldValues;
use crate::types::{now_millis, Amount, LineId, OrderId, ProductId, RoomId, TaxId, TransactionModeId};

/// Tax charged on one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedTax {
    pub tax_id: TaxId,
    pub amount: Amount,
}

/// A product line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub uid: LineId,
    pub product_id: ProductId,
    /// Name of the product, or of its parent when the product is a variant.
    pub product_name: String,
    /// Variant name, when the product is a variant.
    pub variant_name: Option<String>,
    /// Unit price.
    pub price: Amount,
    pub quantity: u32,
    pub taxes: Vec<AppliedTax>,
}

impl Item {
    /// Build an item for a catalog product, applying the product's taxes.
    pub fn from_catalog(business: &Business, product_id: &ProductId, quantity: u32) -> Result<Self> {
        let product = business
            .product(product_id)
            .ok_or_else(|| CoreError::UnknownProduct(product_id.clone()))?;

        let (product_name, variant_name) = match business.products.parent_of(product) {
            Some(parent) => (parent.name.clone(), Some(product.name.clone())),
            None => (product.name.clone(), None),
        };

        let base = product.price.times(quantity);
        let taxes = product
            .tax_ids
            .iter()
            .filter_map(|id| business.tax(id))
            .map(|tax| AppliedTax {
                tax_id: tax.id.clone(),
                amount: tax.apply(base),
            })
            .collect();

        Ok(Self {
            uid: LineId::random(),
            product_id: product_id.clone(),
            product_name,
            variant_name,
            price: product.price,
            quantity,
            taxes,
        })
    }

    /// Name shown on screen and receipts.
    pub fn effective_name(&self) -> String {
        match &self.variant_name {
            Some(variant) => format!("{} ({})", self.product_name, variant),
            None => self.product_name.clone(),
        }
    }

    /// Price times quantity.
    pub fn subtotal(&self) -> Amount {
        self.price.times(self.quantity)
    }

    /// Sum of applied taxes.
    pub fn tax_total(&self) -> Amount {
        self.taxes.iter().map(|t| t.amount).sum()
    }
}

/// A credit granted against the order (discount, refund, voucher).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credit {
    pub uid: LineId,
    pub amount: Amount,
    pub reason: String,
}

impl Credit {
    pub fn new(amount: Amount, reason: impl Into<String>) -> Self {
        Self {
            uid: LineId::random(),
            amount,
            reason: reason.into(),
        }
    }
}

/// A payment taken against the order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub uid: LineId,
    pub mode_id: TransactionModeId,
    pub amount: Amount,
    /// When the payment was taken (Unix ms).
    pub created_at: i64,
}

impl Transaction {
    pub fn new(mode_id: TransactionModeId, amount: Amount) -> Self {
        Self {
            uid: LineId::random(),
            mode_id,
            amount,
            created_at: now_millis(),
        }
    }
}

/// A room booked as part of the order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSelection {
    pub uid: LineId,
    pub room_id: RoomId,
    /// Start of the stay (Unix ms).
    pub start: i64,
    /// End of the stay (Unix ms).
    pub end: i64,
    pub fields: FieldValues,
}

impl RoomSelection {
    pub fn new(room_id: RoomId, start: i64, end: i64) -> Self {
        Self {
            uid: LineId::random(),
            room_id,
            start,
            end,
            fields: FieldValues::new(),
        }
    }
}

/// Everything needed to rebuild an order that came from elsewhere.
#[derive(Debug, Clone, Default)]
pub struct OrderParts {
    pub note: String,
    pub created_at: i64,
    pub items: Vec<Item>,
    pub credits: Vec<Credit>,
    pub transactions: Vec<Transaction>,
    pub room_selections: Vec<RoomSelection>,
    pub customer: Customer,
}

/// A customer transaction in progress or completed.
#[derive(Debug, Clone)]
pub struct Order {
    id: OrderId,
    created_at: i64,
    pub(crate) note: String,
    pub(crate) items: Vec<Arc<Item>>,
    pub(crate) credits: Vec<Arc<Credit>>,
    pub(crate) transactions: Vec<Arc<Transaction>>,
    pub(crate) room_selections: Vec<RoomSelection>,
    pub(crate) customer: Customer,
    pub(crate) recording: Option<ChangeSnapshot>,
}

impl Order {
    /// Open a new, empty order.
    pub fn new() -> Self {
        Self::from_parts(
            OrderId::random(),
            OrderParts {
                created_at: now_millis(),
                ..Default::default()
            },
        )
    }

    /// Rebuild an order with a known id.
    pub fn from_parts(id: OrderId, parts: OrderParts) -> Self {
        Self {
            id,
            created_at: parts.created_at,
            note: parts.note,
            items: parts.items.into_iter().map(Arc::new).collect(),
            credits: parts.credits.into_iter().map(Arc::new).collect(),
            transactions: parts.transactions.into_iter().map(Arc::new).collect(),
            room_selections: parts.room_selections,
            customer: parts.customer,
            recording: None,
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Note and customer
    // ─────────────────────────────────────────────────────────────────────────

    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn set_note(&mut self, note: impl Into<String>) {
        self.note = note.into();
    }

    pub fn customer(&self) -> &Customer {
        &self.customer
    }

    pub fn customer_mut(&mut self) -> &mut Customer {
        &mut self.customer
    }

    pub fn set_customer(&mut self, customer: Customer) {
        self.customer = customer;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Append-only lines
    // ─────────────────────────────────────────────────────────────────────────

    pub fn items(&self) -> &[Arc<Item>] {
        &self.items
    }

    /// Append an item, returning the shared handle stored in the order.
    pub fn add_item(&mut self, item: Item) -> Arc<Item> {
        let item = Arc::new(item);
        self.items.push(Arc::clone(&item));
        item
    }

    pub fn remove_item(&mut self, uid: &LineId) -> Result<Arc<Item>> {
        remove_line(&mut self.items, uid, |i| &i.uid)
    }

    pub fn credits(&self) -> &[Arc<Credit>] {
        &self.credits
    }

    pub fn add_credit(&mut self, credit: Credit) -> Arc<Credit> {
        let credit = Arc::new(credit);
        self.credits.push(Arc::clone(&credit));
        credit
    }

    pub fn remove_credit(&mut self, uid: &LineId) -> Result<Arc<Credit>> {
        remove_line(&mut self.credits, uid, |c| &c.uid)
    }

    pub fn transactions(&self) -> &[Arc<Transaction>] {
        &self.transactions
    }

    pub fn add_transaction(&mut self, transaction: Transaction) -> Arc<Transaction> {
        let transaction = Arc::new(transaction);
        self.transactions.push(Arc::clone(&transaction));
        transaction
    }

    pub fn remove_transaction(&mut self, uid: &LineId) -> Result<Arc<Transaction>> {
        remove_line(&mut self.transactions, uid, |t| &t.uid)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Room selections
    // ─────────────────────────────────────────────────────────────────────────

    pub fn room_selections(&self) -> &[RoomSelection] {
        &self.room_selections
    }

    pub fn add_room_selection(&mut self, selection: RoomSelection) {
        self.room_selections.push(selection);
    }

    pub fn room_selection_mut(&mut self, uid: &LineId) -> Option<&mut RoomSelection> {
        self.room_selections.iter_mut().find(|s| &s.uid == uid)
    }

    pub fn remove_room_selection(&mut self, uid: &LineId) -> Result<RoomSelection> {
        let pos = self
            .room_selections
            .iter()
            .position(|s| &s.uid == uid)
            .ok_or(CoreError::UnknownLine(*uid))?;
        Ok(self.room_selections.remove(pos))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Totals
    // ─────────────────────────────────────────────────────────────────────────

    /// Sum of item subtotals.
    pub fn subtotal(&self) -> Amount {
        self.items.iter().map(|i| i.subtotal()).sum()
    }

    /// Sum of item taxes.
    pub fn tax_total(&self) -> Amount {
        self.items.iter().map(|i| i.tax_total()).sum()
    }

    /// Sum of credits.
    pub fn credit_total(&self) -> Amount {
        self.credits.iter().map(|c| c.amount).sum()
    }

    /// Amount owed: subtotal plus tax minus credits.
    pub fn total(&self) -> Amount {
        self.subtotal() + self.tax_total() - self.credit_total()
    }

    /// Sum of payments taken.
    pub fn paid(&self) -> Amount {
        self.transactions.iter().map(|t| t.amount).sum()
    }

    /// Amount still to be paid. Negative when change is due.
    pub fn balance(&self) -> Amount {
        self.total() - self.paid()
    }
}

impl Default for Order {
    fn default() -> Self {
        Self::new()
    }
}

fn remove_line<T>(lines: &mut Vec<Arc<T>>, uid: &LineId, key: impl Fn(&T) -> &LineId) -> Result<Arc<T>> {
    let pos = lines
        .iter()
        .position(|line| key(&**line) == uid)
        .ok_or(CoreError::UnknownLine(*uid))?;
    Ok(lines.remove(pos))
}
