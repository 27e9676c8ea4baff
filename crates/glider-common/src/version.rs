use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

macro_rules! protocol_versions {
    ($($variant:ident => ($protocol:literal, $name:literal)),+ $(,)?) => {
        /// A Java Edition protocol revision. Variants are declared oldest first, so the derived
        /// ordering follows the protocol number.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(i32)]
        pub enum ProtocolVersion {
            $($variant = $protocol),+
        }

        impl ProtocolVersion {
            const ALL: &'static [ProtocolVersion] = &[$(ProtocolVersion::$variant),+];

            /// Protocol number sent in the handshake.
            pub fn protocol(self) -> i32 {
                self as i32
            }

            /// Release name, e.g. `1.16.2`.
            pub fn name(self) -> &'static str {
                match self {
                    $(ProtocolVersion::$variant => $name),+
                }
            }

            pub fn from_protocol(protocol: i32) -> Option<Self> {
                match protocol {
                    $($protocol => Some(ProtocolVersion::$variant),)+
                    _ => None,
                }
            }

            fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(ProtocolVersion::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

protocol_versions! {
    V1_7_2 => (4, "1.7.2"),
    V1_7_6 => (5, "1.7.6"),
    V1_8 => (47, "1.8"),
    V1_9 => (107, "1.9"),
    V1_9_1 => (108, "1.9.1"),
    V1_9_2 => (109, "1.9.2"),
    V1_9_4 => (110, "1.9.4"),
    V1_10 => (210, "1.10"),
    V1_11 => (315, "1.11"),
    V1_11_1 => (316, "1.11.1"),
    V1_12 => (335, "1.12"),
    V1_12_1 => (338, "1.12.1"),
    V1_12_2 => (340, "1.12.2"),
    V1_13 => (393, "1.13"),
    V1_13_1 => (401, "1.13.1"),
    V1_13_2 => (404, "1.13.2"),
    V1_14 => (477, "1.14"),
    V1_14_1 => (480, "1.14.1"),
    V1_14_2 => (485, "1.14.2"),
    V1_14_3 => (490, "1.14.3"),
    V1_14_4 => (498, "1.14.4"),
    V1_15 => (573, "1.15"),
    V1_15_1 => (575, "1.15.1"),
    V1_15_2 => (578, "1.15.2"),
    V1_16 => (735, "1.16"),
    V1_16_1 => (736, "1.16.1"),
    V1_16_2 => (751, "1.16.2"),
    V1_16_3 => (753, "1.16.3"),
    V1_16_4 => (754, "1.16.4"),
    V1_17 => (755, "1.17"),
    V1_17_1 => (756, "1.17.1"),
    V1_18 => (757, "1.18"),
    V1_18_2 => (758, "1.18.2"),
    V1_19 => (759, "1.19"),
    V1_19_1 => (760, "1.19.1"),
    V1_19_3 => (761, "1.19.3"),
    V1_19_4 => (762, "1.19.4"),
    V1_20 => (763, "1.20"),
    V1_20_2 => (764, "1.20.2"),
    V1_20_3 => (765, "1.20.3"),
    V1_20_5 => (766, "1.20.5"),
    V1_21 => (767, "1.21"),
    V1_21_2 => (768, "1.21.2"),
    V1_21_4 => (769, "1.21.4"),
    V1_21_5 => (770, "1.21.5"),
}

impl ProtocolVersion {
    pub fn oldest() -> Self {
        Self::ALL[0]
    }

    pub fn newest() -> Self {
        Self::ALL[Self::ALL.len() - 1]
    }

    /// Every supported version, oldest first.
    pub fn all() -> &'static [ProtocolVersion] {
        Self::ALL
    }

    fn index(self) -> usize {
        // ALL is sorted, so a binary search on the protocol number always hits.
        Self::ALL
            .binary_search(&self)
            .unwrap_or_else(|insert_at| insert_at)
    }

    /// The next newer release, if any.
    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// The next older release, if any.
    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }

    /// Versions in `[from, to]`, oldest first.
    pub fn range_inclusive(from: Self, to: Self) -> impl Iterator<Item = ProtocolVersion> {
        Self::ALL
            .iter()
            .copied()
            .filter(move |v| *v >= from && *v <= to)
    }

    pub fn is_at_least(self, other: Self) -> bool {
        self >= other
    }

    pub fn is_before(self, other: Self) -> bool {
        self < other
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.protocol())
    }
}

/// Returned when a release name is not a supported version.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown protocol version `{0}`")]
pub struct UnknownVersion(pub String);

impl FromStr for ProtocolVersion {
    type Err = UnknownVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProtocolVersion::from_name(s.trim()).ok_or_else(|| UnknownVersion(s.to_owned()))
    }
}

impl Serialize for ProtocolVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for ProtocolVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// Inclusive span of protocol versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionRange {
    pub from: ProtocolVersion,
    pub to: ProtocolVersion,
}

impl VersionRange {
    pub fn new(from: ProtocolVersion, to: ProtocolVersion) -> Self {
        Self { from, to }
    }

    /// Range starting at `from` and reaching the newest supported version.
    pub fn since(from: ProtocolVersion) -> Self {
        Self::new(from, ProtocolVersion::newest())
    }

    pub fn contains(&self, version: ProtocolVersion) -> bool {
        version >= self.from && version <= self.to
    }

    pub fn overlaps(&self, other: &VersionRange) -> bool {
        self.from <= other.to && other.from <= self.to
    }

    pub fn iter(&self) -> impl Iterator<Item = ProtocolVersion> {
        ProtocolVersion::range_inclusive(self.from, self.to)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

/// A comparison against a fixed threshold version, e.g. "at least 1.13".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionPredicate {
    pub op: Comparison,
    pub threshold: ProtocolVersion,
}

impl VersionPredicate {
    pub const fn new(op: Comparison, threshold: ProtocolVersion) -> Self {
        Self { op, threshold }
    }

    pub const fn at_least(threshold: ProtocolVersion) -> Self {
        Self::new(Comparison::Ge, threshold)
    }

    pub const fn before(threshold: ProtocolVersion) -> Self {
        Self::new(Comparison::Lt, threshold)
    }

    pub fn matches(&self, version: ProtocolVersion) -> bool {
        match self.op {
            Comparison::Eq => version == self.threshold,
            Comparison::Ne => version != self.threshold,
            Comparison::Gt => version > self.threshold,
            Comparison::Ge => version >= self.threshold,
            Comparison::Lt => version < self.threshold,
            Comparison::Le => version <= self.threshold,
        }
    }
}
