//! Database Models

// Serde helpers
pub mod serde_helpers;

// Auth
pub mod user;

// Domain
pub mod notification;
pub mod order;
pub mod restaurant;

// Re-exports
pub use notification::NotificationDoc;
pub use order::{DeliveryAddress, Order, OrderCreate, OrderItem};
pub use restaurant::{Restaurant, RestaurantCreate};
pub use user::{User, UserCreate, UserResponse};
