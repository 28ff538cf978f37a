#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::dbg_macro,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::panic,
    )
)]

pub mod asset;
pub mod broadcast;
pub mod error;

#[cfg(feature = "wasm")]
pub mod wasm;

#[cfg(test)]
pub(crate) mod test_support;

pub use asset::Asset;
pub use asset::amount::{AMOUNT_WIRE_LEN, AssetAmount, PrecisionCheck, SYMBOL_WIDTH};
pub use broadcast::policy::{
    PHRASE_OVERRIDES, PHRASE_TABLE_VERSION, PhraseOverride, PhraseVerdict, RetryPolicy,
};
pub use broadcast::sink::{DiagnosticSink, TracingSink};
pub use broadcast::{ErrorClassification, RecoveryAction};
pub use error::Error;
