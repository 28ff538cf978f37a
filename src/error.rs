#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("asset {symbol:?} unknown")]
    InvalidAsset { symbol: String },

    #[error("amount {amount} needs to be with {precision} exponent")]
    InvalidPrecision { amount: String, precision: u8 },

    #[error("amount {amount} does not fit a 64-bit integer at precision {precision}")]
    AmountOutOfRange { amount: String, precision: u8 },

    #[error("malformed broadcast error response: {reason}")]
    MalformedResponse { reason: String },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
