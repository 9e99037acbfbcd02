pub mod error;
pub mod identity;
pub mod types;

pub use identity::{IdentityError, decode, encode};
pub use types::{ContentType, Listing, MetaLink, MetaRecord, StreamCandidate, StreamTarget};
