use serde::{Deserialize, Serialize};

/// Asset class of the requested symbols, used by providers to pick an endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    #[default]
    UsEquity,
    Crypto,
}
