pub mod filters;
pub mod handlers;

pub use filters::{AuctionFilter, RemainingBucket, SellerVerification};
pub use handlers::{BidHistoryEntry, CatalogQueries};
