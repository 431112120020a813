//! Production implementations of the bridge trait abstractions.
//!
//! This module provides the "real" implementations of the traits defined in
//! [`crate::traits`] that talk to the hosted ROZO APIs, a Horizon server,
//! a local keypair and the system clock.
//!
//! Users building applications will typically use these providers, while
//! test code will use the fakes in [`crate::testing`].

mod horizon;
mod keypair;
mod rozo;
mod tokio_clock;

pub use self::horizon::HorizonClient;
pub use self::keypair::{KeypairSigner, KEYPAIR_WALLET_ID};
pub use self::rozo::{receipt_url, RozoApiClient, FEE_API, PAYMENT_API, RECEIPT_URL, REQUEST_TIMEOUT};
pub use self::tokio_clock::TokioClock;
