use crate::domain::ledger::OwnedItems;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one authenticated session. Ledgers are never shared across keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionKey {
    pub tenant_id: String,
    pub user_id: String,
}

impl SessionKey {
    pub fn new(tenant_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            user_id: user_id.into(),
        }
    }

    /// Key used by the persistent backends.
    ///
    /// The tenant is length-prefixed, so ids containing `/` can't make two
    /// sessions collide.
    pub fn encoded(&self) -> String {
        format!("{}:{}/{}", self.tenant_id.len(), self.tenant_id, self.user_id)
    }

    pub fn storage_key(&self) -> Vec<u8> {
        self.encoded().into_bytes()
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tenant_id, self.user_id)
    }
}

/// What gets persisted between sign-ins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    #[serde(flatten)]
    pub key: SessionKey,
    #[serde(default)]
    pub owned: OwnedItems,
}

impl SessionSnapshot {
    pub fn new(key: SessionKey) -> Self {
        Self {
            key,
            owned: OwnedItems::default(),
        }
    }
}
