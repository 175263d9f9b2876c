//! Domain types backing the persisted collections.

pub mod cart;
pub mod category;
pub mod notification;
pub mod order;
pub mod product;
pub mod user;
pub mod wishlist;

pub use cart::{CartItem, CartTotals, CartView};
pub use category::Category;
pub use notification::Notification;
pub use order::{CancelledOrder, DeliveryAddress, Order, OrderItem, OrderItemSnapshot};
pub use product::{Product, Variant};
pub use user::User;
pub use wishlist::WishlistItem;
