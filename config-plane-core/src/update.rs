use crate::Blob;

/// A pending write installed into a [`crate::ConfigRepo`]'s stage.
///
/// This is the concrete shape of spec.md's "Blob ∣ ⊥": `Set` installs a
/// blob override, `Delete` installs a tombstone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    /// Override the key with this blob.
    Set(Blob),
    /// Mark the key as explicitly absent (a tombstone).
    Delete,
}

impl Update {
    /// Convenience constructor from an `Option<Blob>`, matching the
    /// `set(key, Blob | ⊥)` shorthand from the spec.
    pub fn from_option(value: Option<Blob>) -> Self {
        match value {
            Some(blob) => Update::Set(blob),
            None => Update::Delete,
        }
    }

    /// The blob this update would produce, if any.
    pub fn as_blob(&self) -> Option<&Blob> {
        match self {
            Update::Set(blob) => Some(blob),
            Update::Delete => None,
        }
    }
}

impl From<Blob> for Update {
    fn from(blob: Blob) -> Self {
        Update::Set(blob)
    }
}

impl From<Vec<u8>> for Update {
    fn from(bytes: Vec<u8>) -> Self {
        Update::Set(Blob::from(bytes))
    }
}

impl From<&'static [u8]> for Update {
    fn from(bytes: &'static [u8]) -> Self {
        Update::Set(Blob::from_static(bytes))
    }
}
