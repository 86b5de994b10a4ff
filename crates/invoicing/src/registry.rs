//! Party registry lookups (display enrichment only).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use factoring_core::{DomainError, PartyId};

/// Marketplace role a party acts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactoringRole {
    Seller,
    Buyer,
    Broker,
    Exchange,
    Csd,
}

impl FactoringRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            FactoringRole::Seller => "seller",
            FactoringRole::Buyer => "buyer",
            FactoringRole::Broker => "broker",
            FactoringRole::Exchange => "exchange",
            FactoringRole::Csd => "csd",
        }
    }
}

impl core::fmt::Display for FactoringRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for FactoringRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "seller" => Ok(FactoringRole::Seller),
            "buyer" => Ok(FactoringRole::Buyer),
            "broker" => Ok(FactoringRole::Broker),
            "exchange" => Ok(FactoringRole::Exchange),
            "csd" => Ok(FactoringRole::Csd),
            other => Err(DomainError::validation(format!("unknown role: {other}"))),
        }
    }
}

/// Registered user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub party: PartyId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: String,
}

/// An entity paired with the role it was looked up under.
///
/// Built at the join site; the looked-up entity itself is never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WithRole<T> {
    pub entity: T,
    pub role: FactoringRole,
}

impl<T> WithRole<T> {
    pub fn new(entity: T, role: FactoringRole) -> Self {
        Self { entity, role }
    }
}

/// Read-only registry cache mapping parties to display profiles.
///
/// Used for enrichment only; a miss must never change join or aggregate results.
pub trait RegistryLookup: Send + Sync {
    fn resolve(&self, party: &PartyId) -> Option<Profile>;
}

impl<R> RegistryLookup for Arc<R>
where
    R: RegistryLookup + ?Sized,
{
    fn resolve(&self, party: &PartyId) -> Option<Profile> {
        (**self).resolve(party)
    }
}

/// In-memory registry for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    profiles: RwLock<HashMap<PartyId, Profile>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, profile: Profile) {
        if let Ok(mut map) = self.profiles.write() {
            map.insert(profile.party.clone(), profile);
        }
    }
}

impl RegistryLookup for InMemoryRegistry {
    fn resolve(&self, party: &PartyId) -> Option<Profile> {
        let map = self.profiles.read().ok()?;
        map.get(party).cloned()
    }
}
