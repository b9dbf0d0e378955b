//! Domain entities.

pub mod order;
pub mod product;
pub mod review;
pub mod view;

pub use order::{Order, OrderItem, OrderStatus, PaymentMethod, ShippingAddress};
pub use product::{Category, Product};
pub use review::Review;
pub use view::ViewedProduct;
