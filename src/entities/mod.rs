pub mod customer;
pub mod inventory_transaction;
pub mod order;
pub mod order_item;
pub mod order_sequence;
pub mod product;
