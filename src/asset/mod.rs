pub mod amount;

/// Assets known to the wire format, keyed by their on-chain symbol.
///
/// The symbol doubles as the padded 7-byte tail of a serialized amount, so every
/// variant's string form must stay within [`amount::SYMBOL_WIDTH`] bytes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
    strum_macros::EnumIter,
    strum_macros::VariantNames,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Asset {
    Steem,
    Vests,
    Sbd,
    Golos,
    Gests,
    Gbg,
    Core,
    Cests,
    Test,
}

impl Asset {
    /// Looks up a symbol in the registry. Matching is case-sensitive.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        symbol.parse().ok()
    }

    /// Number of fractional decimal digits of the asset's smallest unit.
    pub fn precision(self) -> u8 {
        match self {
            Self::Steem | Self::Sbd | Self::Golos | Self::Gbg | Self::Core | Self::Test => 3,
            Self::Vests | Self::Gests | Self::Cests => 6,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Steem => "STEEM",
            Self::Vests => "VESTS",
            Self::Sbd => "SBD",
            Self::Golos => "GOLOS",
            Self::Gests => "GESTS",
            Self::Gbg => "GBG",
            Self::Core => "CORE",
            Self::Cests => "CESTS",
            Self::Test => "TEST",
        }
    }
}
