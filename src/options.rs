//! Reference options - how a record takes part in cross-referencing
//!
//! A record can be any combination of:
//! - `unique`: no other unique record may share its identity
//! - `producer`: defines an identity consumers can link to
//! - `consumer`: refers to an identity defined by a producer
//!
//! Each of those has a `_global` companion that widens its reach from the
//! record's own namespace to the whole run. A `_global` flag on its own does
//! nothing.

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

bitflags::bitflags! {
    /// Combinable set of cross-reference options.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RefOptions: u8 {
        const UNIQUE = 1 << 0;
        const UNIQUE_GLOBAL = 1 << 1;
        const PRODUCER = 1 << 2;
        const PRODUCER_GLOBAL = 1 << 3;
        const CONSUMER = 1 << 4;
        const CONSUMER_GLOBAL = 1 << 5;
        /// Suppresses the "producer has no consumer" finding.
        const ALLOW_ORPHAN_PRODUCER = 1 << 6;
    }
}

impl Default for RefOptions {
    /// A globally unique, globally visible producer.
    fn default() -> Self {
        Self::UNIQUE | Self::UNIQUE_GLOBAL | Self::PRODUCER | Self::PRODUCER_GLOBAL
    }
}

impl RefOptions {
    /// Build from raw bits, rejecting bits that name no option.
    pub fn from_bits_checked(bits: u8) -> Result<Self> {
        Self::from_bits(bits)
            .ok_or_else(|| Error::InvalidOptions(format!("unknown option bits: {:#010b}", bits)))
    }

    /// Parse a list of option names
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .try_fold(Self::empty(), |acc, name| Ok(acc | parse_flag(name.as_ref())?))
    }

    pub fn is_unique(&self) -> bool {
        self.contains(Self::UNIQUE)
    }

    pub fn is_unique_global(&self) -> bool {
        self.contains(Self::UNIQUE | Self::UNIQUE_GLOBAL)
    }

    pub fn is_producer(&self) -> bool {
        self.contains(Self::PRODUCER)
    }

    pub fn is_producer_global(&self) -> bool {
        self.contains(Self::PRODUCER | Self::PRODUCER_GLOBAL)
    }

    pub fn is_consumer(&self) -> bool {
        self.contains(Self::CONSUMER)
    }

    pub fn is_consumer_global(&self) -> bool {
        self.contains(Self::CONSUMER | Self::CONSUMER_GLOBAL)
    }

    pub fn allows_orphan_producer(&self) -> bool {
        self.contains(Self::ALLOW_ORPHAN_PRODUCER)
    }

    /// Lowercase names of the set flags, in declaration order
    pub fn names(&self) -> Vec<String> {
        self.iter_names()
            .map(|(name, _)| name.to_ascii_lowercase())
            .collect()
    }
}

fn parse_flag(name: &str) -> Result<RefOptions> {
    let normalized = name.trim().replace('-', "_");
    RefOptions::all()
        .iter_names()
        .find(|(flag, _)| flag.eq_ignore_ascii_case(&normalized))
        .map(|(_, flag)| flag)
        .ok_or_else(|| Error::InvalidOptions(format!("unknown option: {}", name.trim())))
}

impl FromStr for RefOptions {
    type Err = Error;

    /// Accepts `unique,producer` or `unique | producer`. An empty string is
    /// the empty set.
    fn from_str(s: &str) -> Result<Self> {
        Self::from_names(
            s.split([',', '|'])
                .map(str::trim)
                .filter(|part| !part.is_empty()),
        )
    }
}

impl fmt::Display for RefOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names().join("|"))
    }
}
