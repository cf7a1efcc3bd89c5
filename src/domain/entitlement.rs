use crate::domain::ledger::ItemKind;
use serde::Serialize;
use std::fmt;

/// One discrete step of a purchase.
///
/// A successful call walks `Purchasing -> Activating -> Committed -> Settled`.
/// A failing call ends in `Failed` and never reaches `Committed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchasePhase {
    Purchasing,
    Activating,
    Committed,
    Settled,
    Failed,
}

impl PurchasePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Settled | Self::Failed)
    }
}

impl fmt::Display for PurchasePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Purchasing => "purchasing",
            Self::Activating => "activating",
            Self::Committed => "committed",
            Self::Settled => "settled",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Loading flags mirrored to the view while a purchase runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseFlags {
    pub is_purchasing: bool,
    pub is_activating: bool,
}

/// Outcome of a settled purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReceipt {
    pub kind: ItemKind,
    pub id: String,
    /// Catalog name, or the raw id when the catalog has no entry.
    pub display_name: String,
    pub already_owned: bool,
}
