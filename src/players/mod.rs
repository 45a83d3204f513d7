//! Players roster: normalization, serialized writes, and the registry itself.

pub mod normalize;
pub mod registry;
pub mod serializer;

pub use registry::{AddOutcome, DeleteOutcome, PlayersList, PlayersRegistry, RegistryError};
pub use serializer::{StoreId, WriteLocks, WriteSerializer};
