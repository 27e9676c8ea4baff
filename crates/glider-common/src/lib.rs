pub mod config;
pub mod error;
pub mod mapping;
pub mod types;
pub mod version;

pub use config::CodecConfig;
pub use error::{ConfigError, ProtocolError, RegistryError};
pub use mapping::{IdentityMappings, JsonMappings, MappingKind, MappingTable};
pub use types::{BlockPos, ConnectionState, Direction, Result, Rotation, Vec3};
pub use version::{Comparison, ProtocolVersion, VersionPredicate, VersionRange};
