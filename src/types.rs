//! Type-safe identifiers for threads and blocks.
//!
//! Blocks reference each other by id (loops included), so ids are the only
//! link between nodes of a flowchart. Newtypes keep thread ids and block ids
//! from being mixed up.
use std::fmt;

/// Value of a shared variable: always a 32-bit unsigned integer.
pub type Value = u32;

/// A thread identifier, unique within a [`Program`][crate::program::Program].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ThreadId(u32);

impl ThreadId {
    pub const fn new(id: u32) -> Self {
        ThreadId(id)
    }

    /// Returns the raw thread id.
    pub const fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

impl From<u32> for ThreadId {
    fn from(id: u32) -> Self {
        ThreadId(id)
    }
}

/// A block identifier, unique within one [`Thread`][crate::thread::Thread].
///
/// The same id may appear in different threads and denote unrelated blocks.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct BlockId(u32);

impl BlockId {
    pub const fn new(id: u32) -> Self {
        BlockId(id)
    }

    /// Returns the raw block id.
    pub const fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B{}", self.0)
    }
}

impl From<u32> for BlockId {
    fn from(id: u32) -> Self {
        BlockId(id)
    }
}

/// Truncates a literal to 32 bits, same as `value & 0xFFFF_FFFF`.
pub const fn wrap_u64(value: u64) -> Value {
    (value & 0xFFFF_FFFF) as Value
}

/// Truncates a (possibly negative) input value to 32 bits, same as `value & 0xFFFF_FFFF`
/// on its two's complement representation.
pub const fn wrap_i64(value: i64) -> Value {
    value as Value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_display() {
        assert_eq!(ThreadId::new(3).to_string(), "T3");
        assert_eq!(BlockId::new(7).to_string(), "B7");
    }

    #[test]
    fn test_ids_order() {
        assert!(ThreadId::new(1) < ThreadId::new(2));
        assert!(BlockId::new(0) < BlockId::new(10));
        assert_eq!(ThreadId::from(5).id(), 5);
        assert_eq!(BlockId::from(5).id(), 5);
    }

    #[test]
    fn test_wrap_u64() {
        assert_eq!(wrap_u64(0), 0);
        assert_eq!(wrap_u64(u32::MAX as u64), u32::MAX);
        assert_eq!(wrap_u64((1 << 32) + 5), 5);
        assert_eq!(wrap_u64(u64::MAX), u32::MAX);
    }

    #[test]
    fn test_wrap_i64() {
        assert_eq!(wrap_i64(42), 42);
        assert_eq!(wrap_i64(-1), u32::MAX);
        assert_eq!(wrap_i64((1 << 32) + 7), 7);
    }
}
