/*
[INPUT]:  Host message schema and serde requirements
[OUTPUT]: Typed Rust structs/enums with serialization support
[POS]:    Data layer - type definitions for host communication
[UPDATE]: When the message schema changes or new types added
*/

pub mod enums;
pub mod payload;

pub use enums::*;
pub use payload::*;
