//! Database-backed domain models.
//!
//! Plain structs with `sqlx::FromRow` derives; all validation lives in
//! explicit functions and services, not in the models themselves.

pub mod address;
pub mod cart;
pub mod order;
pub mod post;
pub mod product;
pub mod user;

pub use address::{Address, AddressType};
pub use cart::{Cart, CartItem, CartItemWithProduct};
pub use order::{
    Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus, PaymentTransaction,
    TransactionStatus,
};
pub use post::{Comment, Post};
pub use product::{Product, ProductCategory};
pub use user::User;
