pub mod balance;
pub mod codec;
pub mod encoding;
pub mod error;
pub mod offer;
pub mod references;
pub mod select;
pub mod types;
pub mod validate;

#[cfg(test)]
mod test_util;

pub use error::CoreError;
pub use offer::{offer_take, take_offer, TakeResult};
pub use references::AddressReferences;
pub use types::{OfferParams, WalletBalanceView};
