//! Archetype signatures: sorted, duplicate-free component-id sequences.
//!
//! A signature is the key of an archetype table. Two signatures are equal
//! iff their identifier sequences are elementwise equal; [`Signature::key`]
//! produces a content-addressed byte encoding usable as a map key across
//! identities.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use trestle_foundation::{ComponentId, Error, Result};

/// A sorted, duplicate-free sequence of component identifiers.
///
/// Signatures are immutable after construction; [`Signature::with`] and
/// [`Signature::without`] derive new signatures instead of mutating.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Signature {
    components: Vec<ComponentId>,
}

impl Signature {
    /// Returns the shared empty signature, the key of the table that holds
    /// freshly committed entities.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    /// Builds a signature from an arbitrary list of component identifiers,
    /// sorting and deduplicating.
    #[must_use]
    pub fn from_components(mut components: Vec<ComponentId>) -> Self {
        components.sort_unstable();
        components.dedup();
        Self { components }
    }

    /// Returns the identifiers in sorted order.
    #[must_use]
    pub fn components(&self) -> &[ComponentId] {
        &self.components
    }

    /// Returns the number of component types in this signature.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns true if this is the empty signature.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Checks membership by binary search.
    #[must_use]
    pub fn contains(&self, component: ComponentId) -> bool {
        self.components.binary_search(&component).is_ok()
    }

    /// Returns the sorted position of `component`, or `None` if absent.
    ///
    /// The position is the column index of the component in the archetype
    /// table keyed by this signature.
    #[must_use]
    pub fn index_of(&self, component: ComponentId) -> Option<usize> {
        self.components.binary_search(&component).ok()
    }

    /// Derives a new signature with `component` inserted at its sort
    /// position.
    ///
    /// # Errors
    ///
    /// Fails with [`trestle_foundation::ErrorKind::DuplicateSignatureComponent`]
    /// if the component is already present.
    pub fn with(&self, component: ComponentId) -> Result<Self> {
        match self.components.binary_search(&component) {
            Ok(_) => Err(Error::duplicate_signature_component(component)),
            Err(position) => {
                let mut components = self.components.clone();
                components.insert(position, component);
                Ok(Self { components })
            }
        }
    }

    /// Derives a new signature with `component` removed.
    ///
    /// # Errors
    ///
    /// Fails with [`trestle_foundation::ErrorKind::MissingSignatureComponent`]
    /// if the component is absent.
    pub fn without(&self, component: ComponentId) -> Result<Self> {
        match self.components.binary_search(&component) {
            Ok(position) => {
                let mut components = self.components.clone();
                components.remove(position);
                Ok(Self { components })
            }
            Err(_) => Err(Error::missing_signature_component(component)),
        }
    }

    /// Returns the content key of this signature: the little-endian 32-bit
    /// words of the identifier sequence, concatenated.
    ///
    /// The encoding is total and deterministic, so two signatures built
    /// through different derivation pathways produce identical keys iff
    /// they contain the same identifiers.
    #[must_use]
    pub fn key(&self) -> SignatureKey {
        let mut bytes = Vec::with_capacity(self.components.len() * 4);
        for component in &self.components {
            bytes.extend_from_slice(&component.id().to_le_bytes());
        }
        SignatureKey(bytes.into_boxed_slice())
    }
}

/// Content-addressed key of a [`Signature`].
///
/// The key is injective: distinct signatures always produce distinct keys,
/// so a map keyed by `SignatureKey` holds at most one table per signature.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SignatureKey(Box<[u8]>);

impl SignatureKey {
    /// Returns the raw encoded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}
