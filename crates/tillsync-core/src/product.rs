//! Products and the catalog arena.
//!
//! Products form a tree (a product may be a variant of a parent product).
//! The tree is stored flat, keyed by [`ProductId`], and parent links are ids
//! resolved on demand, so the catalog serializes as a plain list with no
//! recursion.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::types::{Amount, ProductId, TaxId};

/// A sellable product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Amount,
    /// Set when this product is a variant of another.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ProductId>,
    /// Taxes applied to this product.
    #[serde(default)]
    pub tax_ids: Vec<TaxId>,
}

impl Product {
    /// Whether this product is a variant.
    pub fn is_variant(&self) -> bool {
        self.parent_id.is_some()
    }
}

/// A tax rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tax {
    pub id: TaxId,
    pub name: String,
    /// Rate in basis points (1/100 of a percent).
    pub rate_bps: u32,
}

impl Tax {
    /// Tax due on a base amount, rounded half away from zero.
    pub fn apply(&self, base: Amount) -> Amount {
        let scaled = i128::from(base.minor()) * i128::from(self.rate_bps);
        let half = if scaled >= 0 { 5_000 } else { -5_000 };
        let value = (scaled + half) / 10_000;
        Amount(value.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64)
    }
}

/// Flat product arena.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Product>", into = "Vec<Product>")]
pub struct Catalog {
    products: BTreeMap<ProductId, Product>,
}

impl Catalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a product.
    pub fn insert(&mut self, product: Product) -> Option<Product> {
        self.products.insert(product.id.clone(), product)
    }

    /// Look up a product.
    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.products.get(id)
    }

    /// Number of products.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Iterate over all products in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    /// The parent of a variant, if it exists in the catalog.
    pub fn parent_of(&self, product: &Product) -> Option<&Product> {
        product.parent_id.as_ref().and_then(|id| self.products.get(id))
    }

    /// Variants whose parent is `id`.
    pub fn variants_of<'a>(&'a self, id: &'a ProductId) -> impl Iterator<Item = &'a Product> + 'a {
        self.products
            .values()
            .filter(move |p| p.parent_id.as_ref() == Some(id))
    }

    /// Walk up parent links to the top-level product.
    ///
    /// Stops at a missing parent or a cycle, returning the last product
    /// reached.
    pub fn root_of<'a>(&'a self, product: &'a Product) -> &'a Product {
        let mut seen = HashSet::new();
        let mut current = product;
        seen.insert(&current.id);
        while let Some(parent) = self.parent_of(current) {
            if !seen.insert(&parent.id) {
                break;
            }
            current = parent;
        }
        current
    }

    /// Display name of a product.
    ///
    /// Variants are shown as `Parent (Variant)`; everything else by its own
    /// name.
    pub fn display_name(&self, product: &Product) -> String {
        match self.parent_of(product) {
            Some(parent) => format!("{} ({})", parent.name, product.name),
            None => product.name.clone(),
        }
    }
}

impl From<Vec<Product>> for Catalog {
    fn from(products: Vec<Product>) -> Self {
        let mut catalog = Catalog::new();
        for product in products {
            catalog.insert(product);
        }
        catalog
    }
}

impl From<Catalog> for Vec<Product> {
    fn from(catalog: Catalog) -> Self {
        catalog.products.into_values().collect()
    }
}
