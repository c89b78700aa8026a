//! The business: catalog and configuration shared by every register.

use serde::{Deserialize, Serialize};

use crate::field::FieldDef;
use crate::live::Merge;
use crate::product::{Catalog, Product, Tax};
use crate::types::{BusinessId, ProductId, RoomId, TaxId, TransactionModeId};

/// A way of taking payment (cash, card, voucher, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMode {
    pub id: TransactionModeId,
    pub name: String,
    /// Whether this mode moves cash in the drawer.
    #[serde(default)]
    pub is_cash: bool,
}

/// A bookable room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub name: String,
}

/// The business snapshot served by the remote authority.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    pub id: BusinessId,
    pub name: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub products: Catalog,
    #[serde(default)]
    pub taxes: Vec<Tax>,
    #[serde(default)]
    pub transaction_modes: Vec<TransactionMode>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub customer_fields: Vec<FieldDef>,
    #[serde(default)]
    pub room_selection_fields: Vec<FieldDef>,
}

impl Business {
    /// Look up a product.
    pub fn product(&self, id: &ProductId) -> Option<&Product> {
        self.products.get(id)
    }

    /// Look up a tax.
    pub fn tax(&self, id: &TaxId) -> Option<&Tax> {
        self.taxes.iter().find(|t| &t.id == id)
    }

    /// Look up a transaction mode.
    pub fn transaction_mode(&self, id: &TransactionModeId) -> Option<&TransactionMode> {
        self.transaction_modes.iter().find(|m| &m.id == id)
    }

    /// Look up a room.
    pub fn room(&self, id: &RoomId) -> Option<&Room> {
        self.rooms.iter().find(|r| &r.id == id)
    }

    /// Whether this business has been loaded from the server.
    pub fn is_loaded(&self) -> bool {
        !self.id.as_str().is_empty()
    }
}

impl Merge for Business {
    fn merge_from(&mut self, incoming: Self) {
        let Business {
            id,
            name,
            currency,
            products,
            taxes,
            transaction_modes,
            rooms,
            customer_fields,
            room_selection_fields,
        } = incoming;

        self.id = id;
        self.name = name;
        self.currency = currency;
        self.products = products;
        self.taxes = taxes;
        self.transaction_modes = transaction_modes;
        self.rooms = rooms;
        self.customer_fields = customer_fields;
        self.room_selection_fields = room_selection_fields;
    }
}
