//! Order entity and its derived-total invariant.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

use crate::error::Error;

/// One line of an order: a snapshot of the product's price, shipping cost and
/// tax rate at the moment the order was created. Later product edits never
/// affect existing orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product: Uuid,
    pub quantity: u32,
    pub price: Decimal,
    pub shipping_cost: Decimal,
    pub tax_percentage: Decimal,
}

impl OrderItem {
    fn line_price(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    #[validate(length(min = 1, message = "Order must have a shipping address"))]
    pub address: String,
    #[validate(length(min = 1, message = "Order must have a city"))]
    pub city: String,
    #[validate(length(min = 1, message = "Order must have a postal code"))]
    pub postal_code: String,
    #[validate(length(min = 1, message = "Order must have a country"))]
    pub country: String,
    #[validate(length(min = 1, message = "Order must have a phone number"))]
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    #[sqlx(rename = "user_id")]
    pub user: Uuid,
    #[sqlx(json)]
    pub items: Vec<OrderItem>,
    #[sqlx(json)]
    pub shipping_address: ShippingAddress,
    #[sqlx(try_from = "String")]
    pub payment_method: PaymentMethod,
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
    pub items_price: Decimal,
    pub tax_price: Decimal,
    pub shipping_price: Decimal,
    pub total_price: Decimal,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn create(
        user: Uuid,
        items: Vec<OrderItem>,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
    ) -> Self {
        let now = Utc::now();
        let mut order = Self {
            id: Uuid::new_v4(),
            user,
            items,
            shipping_address,
            payment_method,
            status: OrderStatus::Pending,
            items_price: Decimal::ZERO,
            tax_price: Decimal::ZERO,
            shipping_price: Decimal::ZERO,
            total_price: Decimal::ZERO,
            is_paid: false,
            paid_at: None,
            is_delivered: false,
            delivered_at: None,
            created_at: now,
            updated_at: now,
        };
        order.recalculate();
        order
    }

    /// Rederives the aggregate prices from the line items. Called on every
    /// persist so `total_price == items_price + tax_price + shipping_price`
    /// holds at all times.
    pub fn recalculate(&mut self) {
        self.items_price = self.items.iter().map(OrderItem::line_price).sum();
        self.tax_price = self
            .items
            .iter()
            .map(|i| i.line_price() * i.tax_percentage / Decimal::from(100))
            .sum();
        self.shipping_price = self
            .items
            .iter()
            .map(|i| i.shipping_cost * Decimal::from(i.quantity))
            .sum();
        self.total_price = self.items_price + self.tax_price + self.shipping_price;
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Processing" => Ok(Self::Processing),
            "Shipped" => Ok(Self::Shipped),
            "Delivered" => Ok(Self::Delivered),
            "Cancelled" => Ok(Self::Cancelled),
            _ => Err(Error::invalid(
                "Status is either: Pending, Processing, Shipped, Delivered, Cancelled",
            )),
        }
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    Paypal,
    CashOnDelivery,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreditCard => "credit_card",
            Self::Paypal => "paypal",
            Self::CashOnDelivery => "cash_on_delivery",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit_card" => Ok(Self::CreditCard),
            "paypal" => Ok(Self::Paypal),
            "cash_on_delivery" => Ok(Self::CashOnDelivery),
            _ => Err(Error::invalid(
                "Payment method is either: credit_card, paypal, cash_on_delivery",
            )),
        }
    }
}

impl TryFrom<String> for PaymentMethod {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub fn test_address() -> ShippingAddress {
        ShippingAddress {
            address: "1 Main St".into(),
            city: "Lagos".into(),
            postal_code: "100001".into(),
            country: "NG".into(),
            phone: "+2340000000".into(),
        }
    }

    #[test]
    fn test_totals_follow_line_items() {
        let mut order = Order::create(
            Uuid::new_v4(),
            vec![OrderItem {
                product: Uuid::new_v4(),
                quantity: 2,
                price: Decimal::from(10),
                shipping_cost: Decimal::from(2),
                tax_percentage: Decimal::from(10),
            }],
            test_address(),
            PaymentMethod::Paypal,
        );
        assert_eq!(order.items_price, Decimal::from(20));
        assert_eq!(order.tax_price, Decimal::from(2));
        assert_eq!(order.shipping_price, Decimal::from(4));
        assert_eq!(order.total_price, Decimal::from(26));

        // Recalculating after a mutation keeps the invariant.
        order.items[0].quantity = 3;
        order.recalculate();
        assert_eq!(
            order.total_price,
            order.items_price + order.tax_price + order.shipping_price
        );
        assert_eq!(order.items_price, Decimal::from(30));
    }

    #[test]
    fn test_multi_item_totals() {
        let order = Order::create(
            Uuid::new_v4(),
            vec![
                OrderItem {
                    product: Uuid::new_v4(),
                    quantity: 1,
                    price: Decimal::new(1999, 2),
                    shipping_cost: Decimal::ZERO,
                    tax_percentage: Decimal::ZERO,
                },
                OrderItem {
                    product: Uuid::new_v4(),
                    quantity: 3,
                    price: Decimal::from(5),
                    shipping_cost: Decimal::new(50, 2),
                    tax_percentage: Decimal::from(5),
                },
            ],
            test_address(),
            PaymentMethod::CreditCard,
        );
        assert_eq!(order.items_price, Decimal::new(3499, 2));
        assert_eq!(order.shipping_price, Decimal::new(150, 2));
        assert_eq!(order.tax_price, Decimal::new(75, 2));
        assert_eq!(order.total_price, Decimal::new(3724, 2));
    }

    #[test]
    fn test_status_round_trip() {
        let s: OrderStatus = "Shipped".parse().unwrap();
        assert_eq!(s, OrderStatus::Shipped);
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!(
            "cash_on_delivery".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::CashOnDelivery
        );
        assert!("bitcoin".parse::<PaymentMethod>().is_err());
    }
}
