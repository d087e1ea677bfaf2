//! Client subscriptions: which operation types a connection asked to receive.
//!
//! A `SubscriptionSet` is fixed when the connection is negotiated and never
//! mutated afterwards, so dispatch threads read it without locking.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse operation category a client can opt into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationType {
    Task,
    BuildPhase,
    ProjectConfiguration,
    WorkItem,
    Problems,
}

impl OperationType {
    pub const ALL: [OperationType; 5] = [
        OperationType::Task,
        OperationType::BuildPhase,
        OperationType::ProjectConfiguration,
        OperationType::WorkItem,
        OperationType::Problems,
    ];

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Immutable set of requested operation types.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct SubscriptionSet {
    bits: u8,
}

impl SubscriptionSet {
    pub fn new(types: impl IntoIterator<Item = OperationType>) -> Self {
        let bits = types.into_iter().fold(0, |bits, ty| bits | ty.bit());
        Self { bits }
    }

    pub fn all() -> Self {
        Self::new(OperationType::ALL)
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_requested(&self, ty: OperationType) -> bool {
        self.bits & ty.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = OperationType> + '_ {
        OperationType::ALL
            .into_iter()
            .filter(move |ty| self.is_requested(*ty))
    }
}

impl FromIterator<OperationType> for SubscriptionSet {
    fn from_iter<I: IntoIterator<Item = OperationType>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl fmt::Debug for SubscriptionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl Serialize for SubscriptionSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for SubscriptionSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let types = Vec::<OperationType>::deserialize(deserializer)?;
        Ok(Self::new(types))
    }
}
