//! Object identifiers and their generation.
//!
//! Xcode keys every object by a 24-character uppercase hexadecimal string.
//! Generators only propose candidates; [`IdAllocator`] owns uniqueness by
//! checking each candidate against the identifiers already in the document
//! and those it has handed out during the run.

use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{PbxError, Result};

/// Length of an object identifier in characters.
pub const ID_LEN: usize = 24;

/// Attempts before [`IdAllocator::allocate`] gives up.
const MAX_ATTEMPTS: usize = 64;

/// A validated 24-character uppercase hexadecimal object identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn parse(s: &str) -> Result<Self> {
        if Self::is_valid(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(PbxError::InvalidId(s.to_string()))
        }
    }

    /// True for exactly 24 characters drawn from `0-9A-F`.
    pub fn is_valid(s: &str) -> bool {
        s.len() == ID_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'A'..=b'F'))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ObjectId {
    type Err = PbxError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ObjectId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Source of candidate identifiers.
pub trait IdGenerator {
    fn next_id(&mut self) -> ObjectId;
}

impl<G: IdGenerator + ?Sized> IdGenerator for Box<G> {
    fn next_id(&mut self) -> ObjectId {
        (**self).next_id()
    }
}

impl<G: IdGenerator + ?Sized> IdGenerator for &mut G {
    fn next_id(&mut self) -> ObjectId {
        (**self).next_id()
    }
}

/// Random identifiers: the leading 96 bits of a v4 UUID.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn next_id(&mut self) -> ObjectId {
        let mut buf = uuid::Uuid::encode_buffer();
        let hex = uuid::Uuid::new_v4().simple().encode_upper(&mut buf);
        ObjectId(hex[..ID_LEN].to_string())
    }
}

/// Run-scoped counter identifiers: a fixed hex prefix followed by a
/// zero-padded counter starting at 1. Deterministic across runs.
#[derive(Debug, Clone)]
pub struct SequentialIdGenerator {
    prefix: String,
    counter: u64,
}

impl SequentialIdGenerator {
    /// `prefix` must be uppercase hex and at most 16 characters, leaving at
    /// least 8 digits for the counter.
    pub fn new(prefix: &str) -> Result<Self> {
        let valid = prefix.len() <= ID_LEN - 8
            && prefix
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'A'..=b'F'));
        if !valid {
            return Err(PbxError::InvalidId(prefix.to_string()));
        }
        Ok(Self {
            prefix: prefix.to_string(),
            counter: 0,
        })
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&mut self) -> ObjectId {
        let width = ID_LEN - self.prefix.len();
        // Wrap inside the available digits so the id never grows past ID_LEN.
        let modulus = 16u128.pow(width as u32);
        self.counter = self.counter.wrapping_add(1);
        let value = u128::from(self.counter) % modulus;
        ObjectId(format!("{}{value:0width$X}", self.prefix))
    }
}

/// Hands out identifiers that are unique within one document.
#[derive(Debug)]
pub struct IdAllocator<G> {
    generator: G,
    taken: HashSet<ObjectId>,
}

impl<G: IdGenerator> IdAllocator<G> {
    /// `taken` is every identifier already present in the document.
    pub fn new(generator: G, taken: impl IntoIterator<Item = ObjectId>) -> Self {
        Self {
            generator,
            taken: taken.into_iter().collect(),
        }
    }

    pub fn allocate(&mut self) -> Result<ObjectId> {
        for _ in 0..MAX_ATTEMPTS {
            let candidate = self.generator.next_id();
            if !self.taken.contains(&candidate) {
                self.taken.insert(candidate.clone());
                return Ok(candidate);
            }
            tracing::debug!(id = %candidate, "object id already in use, retrying");
        }
        Err(PbxError::IdExhausted {
            attempts: MAX_ATTEMPTS,
        })
    }

    pub fn is_taken(&self, id: &str) -> bool {
        self.taken.contains(id)
    }
}
