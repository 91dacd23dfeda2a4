//! Cart line items and the cart reducer
//!
//! Line items are keyed by `(kind, id)`. Adding an item that is already in the
//! cart merges into the existing line: quantities add up and price/mrp are
//! refreshed from the incoming item.

use crate::error::CartError;
use crate::risk::Package;
use crate::store::Reducer;
use crate::types::round_rupees;
use serde::{Deserialize, Serialize};

/// What a line item is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Medicine,
    Lab,
    LabTest,
    Scan,
    Wellness,
}

/// One priced, quantified cart entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub name: String,
    /// Selling price per unit
    pub price: f64,
    /// List price per unit
    pub mrp: f64,
    pub qty: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<f64>,
    #[serde(default)]
    pub is_prescription_required: bool,
}

impl CartLineItem {
    /// Single-quantity item without discount metadata
    #[must_use]
    pub fn new(kind: ItemKind, id: impl Into<String>, name: impl Into<String>, price: f64, mrp: f64) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            price,
            mrp,
            qty: 1,
            discount: None,
            is_prescription_required: false,
        }
    }

    /// Mark as needing a prescription at checkout
    #[inline]
    #[must_use]
    pub fn prescription_required(mut self) -> Self {
        self.is_prescription_required = true;
        self
    }

    /// With quantity
    #[inline]
    #[must_use]
    pub fn with_qty(mut self, qty: u32) -> Self {
        self.qty = qty;
        self
    }

    /// `price * qty`
    #[inline]
    #[must_use]
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.qty)
    }

    /// `mrp * qty`
    #[inline]
    #[must_use]
    pub fn line_mrp(&self) -> f64 {
        self.mrp * f64::from(self.qty)
    }

    fn validate(&self) -> Result<(), CartError> {
        if self.id.trim().is_empty() {
            return Err(CartError::invalid(&self.id, "missing id"));
        }
        if self.qty == 0 {
            return Err(CartError::invalid(&self.id, "quantity must be positive"));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(CartError::invalid(&self.id, "price must be a non-negative amount"));
        }
        if !self.mrp.is_finite() || self.mrp < 0.0 {
            return Err(CartError::invalid(&self.id, "mrp must be a non-negative amount"));
        }
        Ok(())
    }
}

/// Cart contents in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartState {
    pub items: Vec<CartLineItem>,
}

impl CartState {
    /// Line for `(kind, id)`
    #[must_use]
    pub fn line(&self, kind: ItemKind, id: &str) -> Option<&CartLineItem> {
        self.items.iter().find(|i| i.kind == kind && i.id == id)
    }

    /// Totals for display and checkout
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        let subtotal: f64 = self.items.iter().map(CartLineItem::line_total).sum();
        let mrp_total: f64 = self.items.iter().map(CartLineItem::line_mrp).sum();
        CartSummary {
            lines: self.items.clone(),
            item_count: self.items.iter().map(|i| i.qty).sum(),
            subtotal,
            mrp_total,
            savings: (mrp_total - subtotal).max(0.0),
            requires_prescription: self.items.iter().any(|i| i.is_prescription_required),
        }
    }

    fn position(&self, kind: ItemKind, id: &str) -> Option<usize> {
        self.items.iter().position(|i| i.kind == kind && i.id == id)
    }
}

/// Totals over the cart
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CartSummary {
    pub lines: Vec<CartLineItem>,
    pub item_count: u32,
    pub subtotal: f64,
    pub mrp_total: f64,
    pub savings: f64,
    pub requires_prescription: bool,
}

impl CartSummary {
    /// Whether there is nothing to check out
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Cart mutations
#[derive(Debug, Clone, PartialEq)]
pub enum CartAction {
    /// Keyed upsert by `(kind, id)`
    Add(CartLineItem),
    Remove { kind: ItemKind, id: String },
    /// Zero removes the line
    SetQuantity { kind: ItemKind, id: String, qty: u32 },
    Clear,
}

/// Reducer for [`CartState`]
#[derive(Debug)]
pub struct CartReducer;

impl Reducer for CartReducer {
    type State = CartState;
    type Action = CartAction;
    type Error = CartError;

    fn reduce(cart: &mut CartState, action: CartAction) -> Result<(), CartError> {
        match action {
            CartAction::Add(item) => {
                item.validate()?;
                match cart.position(item.kind, &item.id) {
                    Some(idx) => {
                        let line = &mut cart.items[idx];
                        line.qty = line.qty.saturating_add(item.qty);
                        line.price = item.price;
                        line.mrp = item.mrp;
                        line.discount = item.discount;
                        line.is_prescription_required |= item.is_prescription_required;
                    }
                    None => cart.items.push(item),
                }
            }
            CartAction::Remove { kind, id } => {
                let idx = cart
                    .position(kind, &id)
                    .ok_or(CartError::NotInCart { kind, id })?;
                cart.items.remove(idx);
            }
            CartAction::SetQuantity { kind, id, qty } => {
                let idx = cart
                    .position(kind, &id)
                    .ok_or(CartError::NotInCart { kind, id })?;
                if qty == 0 {
                    cart.items.remove(idx);
                } else {
                    cart.items[idx].qty = qty;
                }
            }
            CartAction::Clear => cart.items.clear(),
        }
        Ok(())
    }
}

/// Turn a package into one lab-test line per constituent test
///
/// Each line is priced `round(test.price * ratio)` with the undiscounted test
/// price as mrp.
#[must_use]
pub fn expand_package(package: &Package) -> Vec<CartLineItem> {
    if !package.is_consistent() {
        tracing::warn!(
            package = %package.name,
            price = package.price,
            discount = package.discount,
            final_price = package.final_price,
            "package final price does not equal price minus discount"
        );
    }

    let ratio = package.ratio();
    package
        .tests
        .iter()
        .map(|test| {
            let price = round_rupees(test.price * ratio);
            let id = if test.id.is_empty() {
                test.name.clone()
            } else {
                test.id.clone()
            };
            CartLineItem {
                id,
                kind: ItemKind::LabTest,
                name: test.name.clone(),
                price,
                mrp: test.price,
                qty: 1,
                discount: Some(test.price - price),
                is_prescription_required: false,
            }
        })
        .collect()
}
