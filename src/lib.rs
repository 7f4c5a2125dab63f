pub mod bidding;
pub mod database;
pub mod error;
pub mod handlers;
pub mod order;
pub mod scheduler;
pub mod store;
