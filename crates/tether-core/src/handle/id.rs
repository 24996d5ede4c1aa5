use std::fmt;
use std::num::NonZeroU64;

/// Opaque token standing in for a registered native object.
///
/// Raw value `0` is never issued, so hosts can keep using it as "no object".
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Handle(NonZeroU64);

impl Handle {
    #[inline]
    pub(crate) const fn new(raw: NonZeroU64) -> Self {
        Self(raw)
    }

    /// Rebuilds a handle from the integer stored on the host side.
    ///
    /// Returns `None` for `0`. A non-zero value is not validated here; the
    /// registry reports unknown values as [`BridgeError::InvalidHandle`].
    ///
    /// [`BridgeError::InvalidHandle`]: crate::BridgeError::InvalidHandle
    #[inline]
    pub const fn from_raw(raw: u64) -> Option<Self> {
        match NonZeroU64::new(raw) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Integer form handed across the boundary.
    #[inline]
    pub const fn into_raw(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
