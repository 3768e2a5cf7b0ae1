//! Streckengeometrie-Kern eines OutRun-Streckeneditors.
//! Control-Point-Modell, Fixed-Point-Integration und die Binärformat-Codecs
//! als Library exportiert; GUI, Vorschau-Renderer und Datei-I/O liegen beim
//! aufrufenden Editor.

pub mod core;
pub mod error;
pub mod export;
pub mod rom;

pub use crate::core::{
    ControlPoint, ControlPointList, HeightSegment, LevelSet, PaletteTable, PathSegment,
    SceneryPattern, ScenerySprite, SectionKind, TrackGeometry, TrackLevel, WidthRender,
};
pub use crate::error::{TrackError, TrackResult};
pub use crate::export::{export_binary, BinaryWriter};
pub use crate::rom::{RomImage, RomImporter};
