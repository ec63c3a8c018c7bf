pub mod commands;
pub mod lifecycle;
pub mod model;
pub mod outcome;
pub mod view;

pub use commands::{AuctionDetails, AuctionMedia, AuctionService};
pub use lifecycle::Phase;
pub use model::{Auction, AuctionDraft, Condition, Delivery, Location};
pub use outcome::Outcome;
pub use view::AuctionView;
