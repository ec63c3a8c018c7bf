pub mod commands;
pub mod model;
pub mod validator;

pub use commands::{BidService, PlaceBidCommand};
pub use model::{AcceptedBid, Bid, BidRejection};
