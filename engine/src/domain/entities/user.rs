//! Provisioned user entity

use crate::domain::value_objects::Proxy;
use serde::{Deserialize, Serialize};

/// A provisioned user: the unique `identity` key, the proxy credentials
/// provisioned for it, and the inbound tags it is routed through.
///
/// An empty `inbound_tags` set on a sync request means "remove this user";
/// the user directory enforces identity uniqueness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub identity: String,

    #[serde(default)]
    pub proxies: Vec<Proxy>,

    #[serde(default)]
    pub inbound_tags: Vec<String>,
}

impl User {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            proxies: Vec::new(),
            inbound_tags: Vec::new(),
        }
    }

    pub fn with_proxies(mut self, proxies: Vec<Proxy>) -> Self {
        self.proxies = proxies;
        self
    }

    pub fn with_inbound_tags(mut self, tags: Vec<String>) -> Self {
        self.inbound_tags = tags;
        self
    }

    /// A sync request with no inbound tags is a delete request.
    pub fn is_removal(&self) -> bool {
        self.inbound_tags.is_empty()
    }
}
