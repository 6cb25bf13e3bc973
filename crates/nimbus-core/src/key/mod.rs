#[cfg(test)]
mod tests;

use crate::{context::AppNamespace, translate::key as key_codec};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use nimbus_proto::{Message, legacy};
use std::{
    cmp::Ordering,
    fmt,
    sync::atomic::{AtomicU64, Ordering as AtomicOrdering},
};
use thiserror::Error as ThisError;

///
/// CONSTANTS
///

/// Reserved property name under which an entity exposes its own key.
pub const KEY_PROPERTY: &str = "__key__";

// Construction counter for incomplete keys. Gives two otherwise identical
// incomplete keys a stable, deterministic order within one process run.
static NEXT_INCOMPLETE: AtomicU64 = AtomicU64::new(1);

///
/// KeyError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum KeyError {
    #[error("key kind must not be empty")]
    EmptyKind,

    #[error("key name must not be empty")]
    EmptyName,

    #[error("key id must not be zero")]
    ZeroId,

    #[error("parent key {parent} is incomplete")]
    IncompleteParent { parent: String },

    #[error("child scope '{child}' does not match parent scope '{parent}'")]
    NamespaceMismatch {
        parent: AppNamespace,
        child: AppNamespace,
    },

    #[error("key {key} is already complete")]
    AlreadyComplete { key: String },

    #[error("key {key} is incomplete")]
    Incomplete { key: String },

    #[error("key path is empty")]
    EmptyPath,

    #[error("key path element has both an id and a name")]
    AmbiguousElement,

    #[error("invalid encoded key: {0}")]
    InvalidEncoding(String),
}

///
/// KeyId
///
/// Identity of one path element. Variant order is the sort order:
/// incomplete keys sort before ids, ids before names.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum KeyId {
    /// Not yet assigned. The payload is a construction sequence number.
    Incomplete(u64),
    Id(i64),
    Name(String),
}

impl KeyId {
    fn incomplete() -> Self {
        Self::Incomplete(NEXT_INCOMPLETE.fetch_add(1, AtomicOrdering::Relaxed))
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        !matches!(self, Self::Incomplete(_))
    }
}

///
/// Key
///
/// Path of (kind, id-or-name) pairs inside an app/namespace scope.
/// Keys are immutable; the only sanctioned mutation is id assignment by the
/// persistence layer, which produces a new key through `complete_with_id`.
///
/// Equality includes the construction sequence number of an incomplete
/// key. An incomplete key equals only its own clones; decoding one from the
/// wire yields a new key, so an entity with an incomplete key does not
/// compare equal to itself after a round trip.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Key {
    scope: AppNamespace,
    kind: String,
    parent: Option<Box<Self>>,
    id: KeyId,
}

impl Key {
    ///
    /// CONSTRUCTION
    ///

    /// Build a key from its parts, enforcing every key invariant.
    pub fn from_parts(
        scope: AppNamespace,
        parent: Option<Self>,
        kind: impl Into<String>,
        id: KeyId,
    ) -> Result<Self, KeyError> {
        let kind = kind.into();
        if kind.is_empty() {
            return Err(KeyError::EmptyKind);
        }

        match &id {
            KeyId::Id(0) => return Err(KeyError::ZeroId),
            KeyId::Name(name) if name.is_empty() => return Err(KeyError::EmptyName),
            _ => {}
        }

        if let Some(parent) = &parent {
            if !parent.is_complete() {
                return Err(KeyError::IncompleteParent {
                    parent: parent.to_string(),
                });
            }
            if parent.scope != scope {
                return Err(KeyError::NamespaceMismatch {
                    parent: parent.scope.clone(),
                    child: scope,
                });
            }
        }

        Ok(Self {
            scope,
            kind,
            parent: parent.map(Box::new),
            id,
        })
    }

    pub fn with_name(
        scope: AppNamespace,
        kind: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self, KeyError> {
        Self::from_parts(scope, None, kind, KeyId::Name(name.into()))
    }

    pub fn with_id(scope: AppNamespace, kind: impl Into<String>, id: i64) -> Result<Self, KeyError> {
        Self::from_parts(scope, None, kind, KeyId::Id(id))
    }

    pub fn incomplete(scope: AppNamespace, kind: impl Into<String>) -> Result<Self, KeyError> {
        Self::from_parts(scope, None, kind, KeyId::incomplete())
    }

    pub fn child_with_name(
        &self,
        kind: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self, KeyError> {
        Self::from_parts(
            self.scope.clone(),
            Some(self.clone()),
            kind,
            KeyId::Name(name.into()),
        )
    }

    pub fn child_with_id(&self, kind: impl Into<String>, id: i64) -> Result<Self, KeyError> {
        Self::from_parts(self.scope.clone(), Some(self.clone()), kind, KeyId::Id(id))
    }

    pub fn child_incomplete(&self, kind: impl Into<String>) -> Result<Self, KeyError> {
        Self::from_parts(
            self.scope.clone(),
            Some(self.clone()),
            kind,
            KeyId::incomplete(),
        )
    }

    /// Incomplete key with a fresh construction sequence.
    pub(crate) fn fresh_incomplete_id() -> KeyId {
        KeyId::incomplete()
    }

    /// Return the id-assigned copy of an incomplete key.
    pub fn complete_with_id(&self, id: i64) -> Result<Self, KeyError> {
        if self.is_complete() {
            return Err(KeyError::AlreadyComplete {
                key: self.to_string(),
            });
        }
        if id == 0 {
            return Err(KeyError::ZeroId);
        }

        Ok(Self {
            id: KeyId::Id(id),
            ..self.clone()
        })
    }

    ///
    /// ACCESSORS
    ///

    #[must_use]
    pub const fn scope(&self) -> &AppNamespace {
        &self.scope
    }

    #[must_use]
    pub fn app_id(&self) -> &str {
        &self.scope.app_id
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.scope.namespace
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[must_use]
    pub fn parent(&self) -> Option<&Self> {
        self.parent.as_deref()
    }

    #[must_use]
    pub const fn key_id(&self) -> &KeyId {
        &self.id
    }

    #[must_use]
    pub const fn id(&self) -> Option<i64> {
        match self.id {
            KeyId::Id(id) => Some(id),
            _ => None,
        }
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match &self.id {
            KeyId::Name(name) => Some(name),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.id.is_complete()
    }

    /// Root-most ancestor (the key itself when it has no parent).
    #[must_use]
    pub fn root(&self) -> &Self {
        let mut current = self;
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    /// Ancestor path from the root down to this key.
    #[must_use]
    pub fn path(&self) -> Vec<&Self> {
        let mut path = Vec::new();
        let mut current = Some(self);
        while let Some(key) = current {
            path.push(key);
            current = key.parent();
        }
        path.reverse();
        path
    }

    /// True when `self` is a strict ancestor of `other`.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        let mut current = other.parent();
        while let Some(key) = current {
            if key == self {
                return true;
            }
            current = key.parent();
        }
        false
    }

    ///
    /// ENCODING
    ///

    /// Websafe string form: the legacy reference message as URL-safe base64.
    pub fn to_websafe(&self) -> Result<String, KeyError> {
        if !self.is_complete() {
            return Err(KeyError::Incomplete {
                key: self.to_string(),
            });
        }
        let reference = key_codec::key_to_reference(self);

        Ok(URL_SAFE_NO_PAD.encode(reference.encode_to_vec()))
    }

    pub fn from_websafe(encoded: &str) -> Result<Self, KeyError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded.trim_end_matches('='))
            .map_err(|err| KeyError::InvalidEncoding(err.to_string()))?;
        let reference = legacy::Reference::decode(bytes.as_slice())
            .map_err(|err| KeyError::InvalidEncoding(err.to_string()))?;

        key_codec::reference_to_key(&reference)
    }

    // Per-element comparison used by the path-wise ordering.
    fn cmp_element(&self, other: &Self) -> Ordering {
        self.scope
            .cmp(&other.scope)
            .then_with(|| self.kind.cmp(&other.kind))
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl Ord for Key {
    /// Root-first, element-wise comparison of the ancestor paths.
    /// When one path is a prefix of the other the shorter path sorts first,
    /// so an ancestor precedes all of its descendants.
    fn cmp(&self, other: &Self) -> Ordering {
        let left = self.path();
        let right = other.path();

        for (l, r) in left.iter().zip(right.iter()) {
            let cmp = l.cmp_element(r);
            if cmp != Ordering::Equal {
                return cmp;
            }
        }

        left.len().cmp(&right.len())
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(parent) = self.parent() {
            write!(f, "{parent}/")?;
        }
        match &self.id {
            KeyId::Incomplete(_) => write!(f, "{}(no-id-yet)", self.kind),
            KeyId::Id(id) => write!(f, "{}({id})", self.kind),
            KeyId::Name(name) => write!(f, "{}(\"{name}\")", self.kind),
        }
    }
}
