//! Encryption options.
//!
//! Hosts may build these in code or deserialize them from JSON, e.g.
//! `{"enc":"A128GCM","include_kid":false,"apu":"Alice"}`. Missing members
//! take their defaults.

use serde::{Deserialize, Serialize};

use crate::alg::ContentAlgorithm;
use crate::kem::PartyInfo;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncryptOptions {
    /// Content encryption algorithm (`enc`).
    #[serde(rename = "enc")]
    pub content_algorithm: ContentAlgorithm,

    /// Copy the recipient key's `kid` into the protected header.
    pub include_kid: bool,

    /// Agreement PartyUInfo, ECDH-ES family only.
    pub apu: Option<String>,

    /// Agreement PartyVInfo, ECDH-ES family only.
    pub apv: Option<String>,
}

impl Default for EncryptOptions {
    fn default() -> Self {
        Self {
            content_algorithm: ContentAlgorithm::A256Gcm,
            include_kid: true,
            apu: None,
            apv: None,
        }
    }
}

impl EncryptOptions {
    pub fn with_content_algorithm(mut self, enc: ContentAlgorithm) -> Self {
        self.content_algorithm = enc;
        self
    }

    pub fn with_kid(mut self, include: bool) -> Self {
        self.include_kid = include;
        self
    }

    pub fn with_party_info(mut self, apu: Option<&str>, apv: Option<&str>) -> Self {
        self.apu = apu.map(str::to_owned);
        self.apv = apv.map(str::to_owned);
        self
    }

    pub(crate) fn party_info(&self) -> PartyInfo<'_> {
        PartyInfo {
            apu: self.apu.as_deref().map(str::as_bytes).unwrap_or_default(),
            apv: self.apv.as_deref().map(str::as_bytes).unwrap_or_default(),
        }
    }
}
