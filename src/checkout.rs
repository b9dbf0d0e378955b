//! Order pricing & inventory engine.
//!
//! Checkout validates the request, reserves stock item by item through the
//! store's conditional-decrement primitive, snapshots per-item pricing, and
//! persists the order with derived totals. If any reservation (or the final
//! persist) fails, compensating increments undo every reservation already
//! made, so a failed checkout leaves stock exactly where it started.

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::domain::{Order, OrderItem, PaymentMethod, ShippingAddress};
use crate::error::{Error, Result};
use crate::store::Store;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
    pub shipping_address: Option<ShippingAddress>,
    pub payment_method: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product: Uuid,
    pub quantity: u32,
}

pub async fn place_order(store: &dyn Store, user: Uuid, request: PlaceOrder) -> Result<Order> {
    if request.items.is_empty() {
        return Err(Error::invalid("Order must have at least one item"));
    }
    let address = request
        .shipping_address
        .ok_or_else(|| Error::invalid("Order must have a shipping address"))?;
    address
        .validate()
        .map_err(|e| Error::invalid(validation_message(&e)))?;
    let payment_method: PaymentMethod = request
        .payment_method
        .as_deref()
        .ok_or_else(|| Error::invalid("Order must have a payment method"))?
        .parse()?;
    if request.items.iter().any(|i| i.quantity < 1) {
        return Err(Error::invalid("Quantity must be at least 1"));
    }

    let mut reserved: Vec<(Uuid, u32)> = Vec::new();
    let mut line_items: Vec<OrderItem> = Vec::new();
    for item in &request.items {
        // Reservation returns the post-decrement row; the snapshot is taken
        // from it, so no product edit can slip between check and snapshot.
        match store.reserve_stock(item.product, item.quantity).await {
            Ok(product) => {
                line_items.push(OrderItem {
                    product: product.id,
                    quantity: item.quantity,
                    price: product.price,
                    shipping_cost: product.shipping_cost,
                    tax_percentage: product.tax_percentage,
                });
                reserved.push((product.id, item.quantity));
            }
            Err(err) => {
                roll_back(store, &reserved).await;
                return Err(err);
            }
        }
    }

    let order = Order::create(user, line_items, address, payment_method);
    match store.insert_order(order).await {
        Ok(order) => {
            tracing::info!(order_id = %order.id, total = %order.total_price, "order created");
            Ok(order)
        }
        Err(err) => {
            roll_back(store, &reserved).await;
            Err(err)
        }
    }
}

async fn roll_back(store: &dyn Store, reserved: &[(Uuid, u32)]) {
    for (product, quantity) in reserved {
        if let Err(err) = store.release_stock(*product, *quantity).await {
            tracing::warn!(product = %product, quantity, error = %err, "failed to release reserved stock");
        }
    }
}

/// First declared message out of a validator error set.
pub(crate) fn validation_message(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .filter_map(|e| e.message.as_ref())
        .map(ToString::to_string)
        .next()
        .unwrap_or_else(|| "Invalid input".to_string())
}
