use crate::version::ProtocolVersion;
use std::io;

/// Errors raised while encoding or decoding wire data.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("VarInt is longer than 5 bytes")]
    VarIntTooLong,

    #[error("VarLong is longer than 10 bytes")]
    VarLongTooLong,

    #[error("unexpected end of buffer while reading {0}")]
    UnexpectedEof(&'static str),

    #[error("string of {length} {unit} exceeds the maximum of {max}")]
    StringTooLong {
        length: usize,
        max: usize,
        unit: &'static str,
    },

    #[error("collection of {count} elements exceeds the maximum of {max}")]
    CollectionTooLarge { count: i64, max: usize },

    #[error("negative length prefix {0}")]
    NegativeLength(i64),

    #[error("frame of {size} bytes exceeds the maximum of {max}")]
    FrameTooLarge { size: usize, max: usize },

    #[error("unknown {domain} tag {tag} for {version}")]
    UnknownVariant {
        domain: &'static str,
        tag: i32,
        version: ProtocolVersion,
    },

    #[error("{domain} value `{kind}` cannot be written for {version}")]
    UnsupportedValue {
        domain: &'static str,
        kind: String,
        version: ProtocolVersion,
    },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("section data length mismatch: expected {expected} bytes, wrote {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("NBT error: {0}")]
    Nbt(#[source] io::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ProtocolError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        ProtocolError::InvalidData(msg.into())
    }

    /// Malformed framing. The current message cannot be recovered and the connection has to be
    /// resynchronised or closed.
    pub fn is_frame_corrupt(&self) -> bool {
        matches!(
            self,
            ProtocolError::VarIntTooLong
                | ProtocolError::VarLongTooLong
                | ProtocolError::UnexpectedEof(_)
                | ProtocolError::StringTooLong { .. }
                | ProtocolError::CollectionTooLarge { .. }
                | ProtocolError::NegativeLength(_)
                | ProtocolError::FrameTooLarge { .. }
        )
    }

    /// A value the codec tables do not know. Callers capture the raw bytes and forward them.
    pub fn is_unknown_variant(&self) -> bool {
        matches!(
            self,
            ProtocolError::UnknownVariant { .. } | ProtocolError::UnsupportedValue { .. }
        )
    }
}

/// Registry construction errors. All of them abort startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("{packet} was registered without any id mappings")]
    NoMappings { packet: &'static str },

    #[error("{packet} id {id:#04x} has an explicit upper bound but is not the last mapping")]
    BoundedMappingNotLast { packet: &'static str, id: i32 },

    #[error("{packet} id {id:#04x} has an upper bound {to} below its lower bound {from}")]
    InvalidRange {
        packet: &'static str,
        id: i32,
        from: ProtocolVersion,
        to: ProtocolVersion,
    },

    #[error("{packet} mapping for {next} does not come after {previous}")]
    Misordered {
        packet: &'static str,
        previous: ProtocolVersion,
        next: ProtocolVersion,
    },

    #[error("{packet} reuses id {id:#04x} already taken by {existing} in {version}")]
    DuplicateId {
        packet: &'static str,
        existing: &'static str,
        id: i32,
        version: ProtocolVersion,
    },

    #[error("{packet} is registered twice in {version}")]
    DuplicateType {
        packet: &'static str,
        version: ProtocolVersion,
    },

    #[error("no registry is available for {0}")]
    UnsupportedVersion(ProtocolVersion),
}

/// Configuration and mapping table loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_corrupt_classification() {
        assert!(ProtocolError::VarIntTooLong.is_frame_corrupt());
        assert!(ProtocolError::UnexpectedEof("u8").is_frame_corrupt());
        assert!(ProtocolError::CollectionTooLarge { count: 9, max: 1 }.is_frame_corrupt());
        assert!(!ProtocolError::invalid("bad").is_frame_corrupt());

        let unknown = ProtocolError::UnknownVariant {
            domain: "metadata",
            tag: 99,
            version: ProtocolVersion::V1_12_2,
        };
        assert!(!unknown.is_frame_corrupt());
        assert!(unknown.is_unknown_variant());
    }

    #[test]
    fn test_error_messages() {
        let err = RegistryError::DuplicateId {
            packet: "KeepAlive",
            existing: "Chunk",
            id: 0x21,
            version: ProtocolVersion::V1_13,
        };
        assert_eq!(
            err.to_string(),
            "KeepAlive reuses id 0x21 already taken by Chunk in 1.13 (393)"
        );

        let err = ProtocolError::UnknownVariant {
            domain: "metadata",
            tag: 40,
            version: ProtocolVersion::V1_9,
        };
        assert_eq!(err.to_string(), "unknown metadata tag 40 for 1.9 (107)");
    }
}
