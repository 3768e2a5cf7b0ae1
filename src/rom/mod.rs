//! Import aus dem Original-ROM: Bytequelle und Datensatz-Decoder.

pub mod image;
pub mod import;

pub use image::{RomCursor, RomImage};
pub use import::{
    decode_scenery, decode_segments, decode_width_height, RomImporter, HEIGHT_ADR,
    NORMAL_LOOKUPS, PAL_GND_TABLE, PAL_SKY_TABLE, ROAD_SPLIT_LOOKUP, SPRITE_MASTER_TABLE,
    STAGE_LOOKUPS,
};
