//! Export in das Binärformat der Spiel-Engine.

pub mod binary;
pub mod writer;

pub use binary::BinaryWriter;
pub use writer::{export_binary, EXPORT_VERSION};
