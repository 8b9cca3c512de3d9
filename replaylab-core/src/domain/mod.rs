//! Domain types for ReplayLab

pub mod order;
pub mod position;
pub mod position_book;
pub mod tick;

pub use order::{Order, OrderId, OrderKind, OrderSide, OrderStatus, MAX_ORDER_QUANTITY};
pub use position::{Position, PositionError};
pub use position_book::PositionBook;
pub use tick::TickRecord;
