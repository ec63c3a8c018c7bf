pub mod auction;
pub mod bidding;
pub mod clock;
pub mod collaborators;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod message_broker;
pub mod messaging;
pub mod notify;
pub mod query;
pub mod scheduler;
pub mod store;
pub mod users;
