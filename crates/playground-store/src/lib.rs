//! Session storage for the playground.
//!
//! Only a handful of values outlive a draft: the tester profile, the chosen bank
//! and the last reference/description used for support tickets. Provides a
//! `MemoryStore` for tests and ephemeral sessions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use playground_types::Result;

pub mod memory;

/// Keys persisted across page loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SessionKey {
    TesterId,
    BankId,
    MemberType,
    WebAppEnabled,
    TppCallback,
    RefId,
    Description,
}

impl SessionKey {
    pub const ALL: [SessionKey; 7] = [
        Self::TesterId,
        Self::BankId,
        Self::MemberType,
        Self::WebAppEnabled,
        Self::TppCallback,
        Self::RefId,
        Self::Description,
    ];

    /// Storage key name, as used by the browser tool.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TesterId => "testerId",
            Self::BankId => "bankId",
            Self::MemberType => "memberType",
            Self::WebAppEnabled => "webAppEnabled",
            Self::TppCallback => "tppCallback",
            Self::RefId => "refId",
            Self::Description => "description",
        }
    }
}

/// All persisted values at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub tester_id: Option<String>,
    pub bank_id: Option<String>,
    pub member_type: Option<String>,
    pub web_app_enabled: Option<String>,
    pub tpp_callback: Option<String>,
    pub ref_id: Option<String>,
    pub description: Option<String>,
}

/// The session storage trait.
///
/// Values are plain strings, mirroring browser storage.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: SessionKey) -> Result<Option<String>>;
    async fn set(&self, key: SessionKey, value: &str) -> Result<()>;
    async fn remove(&self, key: SessionKey) -> Result<()>;
    async fn clear(&self) -> Result<()>;

    async fn snapshot(&self) -> Result<SessionSnapshot> {
        Ok(SessionSnapshot {
            tester_id: self.get(SessionKey::TesterId).await?,
            bank_id: self.get(SessionKey::BankId).await?,
            member_type: self.get(SessionKey::MemberType).await?,
            web_app_enabled: self.get(SessionKey::WebAppEnabled).await?,
            tpp_callback: self.get(SessionKey::TppCallback).await?,
            ref_id: self.get(SessionKey::RefId).await?,
            description: self.get(SessionKey::Description).await?,
        })
    }
}
