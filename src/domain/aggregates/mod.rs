//! Aggregates module
pub mod catalog;
pub mod cart;
pub mod order;
pub mod ticket;

pub use catalog::{CatalogEntry, CatalogError, CatalogInsert, CatalogItem, CatalogPatch, CatalogRow, CategoryRef, CategoryRow, ColumnValue, DisplayProduct, NewCatalogItem};
pub use cart::{Cart, CartItem, VariantChoices};
pub use order::{CheckoutRequest, CheckoutResponse, NewOrderItem, OrderError, OrderItemRecord, OrderRow, OrderSummary};
pub use ticket::{NewTicket, NewTicketRequest, TicketAck, TicketRow, TicketStatus, TicketStatusUpdate};
