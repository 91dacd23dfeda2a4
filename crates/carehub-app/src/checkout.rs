//! Cart review and order placement

use crate::error::{AppError, AppResult};
use carehub_backend::{insert_order, Backend, CancellationToken, NewOrder};
use carehub_core::cart::{CartAction, CartReducer, CartSummary, ItemKind};
use carehub_core::location::LocationReducer;
use carehub_core::route::Route;
use carehub_store::PersistedStore;
use std::sync::Arc;

/// Checkout over the shared cart
#[derive(Debug, Clone)]
pub struct CheckoutFlow {
    cart: Arc<PersistedStore<CartReducer>>,
    location: Arc<PersistedStore<LocationReducer>>,
    backend: Arc<dyn Backend>,
}

impl CheckoutFlow {
    #[must_use]
    pub fn new(
        cart: Arc<PersistedStore<CartReducer>>,
        location: Arc<PersistedStore<LocationReducer>>,
        backend: Arc<dyn Backend>,
    ) -> Self {
        Self { cart, location, backend }
    }

    /// Lines and totals; an empty cart gives an empty summary
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        self.cart.state().summary()
    }

    /// Change the quantity of a line (zero removes it)
    ///
    /// # Errors
    /// `NotInCart` for an unknown line, storage failures.
    pub async fn set_quantity(&self, kind: ItemKind, id: &str, qty: u32) -> AppResult<CartSummary> {
        let snapshot = self
            .cart
            .dispatch(CartAction::SetQuantity {
                kind,
                id: id.to_string(),
                qty,
            })
            .await?;
        Ok(snapshot.state.summary())
    }

    /// Remove a line
    ///
    /// # Errors
    /// `NotInCart` for an unknown line, storage failures.
    pub async fn remove(&self, kind: ItemKind, id: &str) -> AppResult<CartSummary> {
        let snapshot = self
            .cart
            .dispatch(CartAction::Remove {
                kind,
                id: id.to_string(),
            })
            .await?;
        Ok(snapshot.state.summary())
    }

    /// Place an order for the whole cart and empty it
    ///
    /// # Errors
    /// `EmptyCart`, `SignInRequired`, backend and storage failures. The cart
    /// is only cleared after the order row exists.
    pub async fn place_order(&self, token: &CancellationToken) -> AppResult<Route> {
        let summary = self.summary();
        if summary.is_empty() {
            return Err(AppError::EmptyCart);
        }

        let user = token
            .run(self.backend.current_user())
            .await?
            .ok_or(AppError::SignInRequired)?;
        if summary.requires_prescription {
            tracing::info!("order contains prescription-only items");
        }

        let order = NewOrder::from_summary(user.id, &summary, &self.location.state());
        let order_id = token.run(insert_order(self.backend.as_ref(), &order)).await?;
        self.cart.dispatch(CartAction::Clear).await?;

        Ok(Route::OrderConfirmation { order_id })
    }
}
