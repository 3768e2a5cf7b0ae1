//! Decoder für die Rev.-B-ROM-Daten.
//!
//! Liest Segment-, Breiten-/Höhen- und Szenerie-Datensätze aus einem
//! zusammengesetzten ROM-Abbild und rekonstruiert daraus das editierbare
//! Modell. Die Winkelcodes existieren im ROM nicht und werden über die
//! inverse Suche zurückgewonnen.
//!
//! Alle Terminator-Scans sind hart begrenzt: ein Abbild ohne Endmarke
//! liefert einen Fehler statt einer Endlosschleife, und es entsteht nie
//! ein teilbefülltes Level.

use anyhow::Context;

use crate::core::angle::guess_angle;
use crate::core::control_point::{ControlPoint, ControlPointList};
use crate::core::geometry::{LEVEL_LENGTH, SECTION_LENGTH_MAX};
use crate::core::height::{HeightSegment, HEIGHT_ENTRIES};
use crate::core::level::TrackLevel;
use crate::core::palette::{
    PaletteTable, CENTRE1, CENTRE2, GND_LENGTH, GND_PALS, ROAD1, ROAD2, ROAD_PALS, SIDE1, SIDE2,
    SKY_LENGTH, SKY_PALS, STRIPE1, STRIPE2,
};
use crate::core::scenery::{SceneryPattern, ScenerySprite, SCENERY_ENTRIES};
use crate::core::segment::PathSegment;
use crate::error::{TrackError, TrackResult};
use crate::rom::image::RomImage;

/// Stage-Adressen des Rev.-B-Abbilds; Reihenfolge entspricht der
/// Stage-Liste des Spiels (15 Stages, 3 ungenutzte, 5 Zieleinläufe).
pub const STAGE_LOOKUPS: [u32; 23] = [
    0x1DD36, // Stage 1
    0x1B598, // Stage 2a
    0x1DB5E, // Stage 2b
    0x1B886, // Stage 3a
    0x1CD0E, // Stage 3b
    0x1C812, // Stage 3c
    0x1CB00, // Stage 4a
    0x1D45E, // Stage 4b
    0x1D1B8, // Stage 4c
    0x1BAB6, // Stage 4d
    0x1CFBA, // Stage 5a
    0x1C004, // Stage 5b
    0x1D710, // Stage 5c
    0x1BD1A, // Stage 5d
    0x1C4E4, // Stage 5e
    0x1D904, // ungenutzt (Coconut)
    0x1C2B6, // ungenutzt (Gateway)
    0x1B7BC, // unbekannt
    0x1DFE0, // Zieleinlauf 1
    0x1E03C, // Zieleinlauf 2
    0x1E098, // Zieleinlauf 3
    0x1E0E8, // Zieleinlauf 4
    0x1E140, // Zieleinlauf 5
];

/// Anzahl der Einträge vor den Zieleinläufen in [`STAGE_LOOKUPS`].
pub const NORMAL_LOOKUPS: usize = 18;

/// Adresse der Gabelungssektion.
pub const ROAD_SPLIT_LOOKUP: u32 = 0x1DFA4;

/// Adresse der Höhenprofil-Tabelle (liegt im Slave-CPU-ROM).
pub const HEIGHT_ADR: u32 = 0x220A;

/// Adresse der Szenerie-Mustertabelle.
pub const SPRITE_MASTER_TABLE: u32 = 0x1A43C;

/// Tabelle der Himmelspaletten-Adressen (15 Einträge).
pub const PAL_SKY_TABLE: u32 = 0x17590;

/// Tabelle der Bodenpaletten-Adressen (16 Einträge).
pub const PAL_GND_TABLE: u32 = 0x17350;

/// Obergrenze eines Höhenprofil-Datenblocks; nur zur Terminator-Härtung.
const HEIGHT_DATA_MAX: usize = 0x1000;

/// Decoder über den beiden CPU-Abbildern.
pub struct RomImporter<'a> {
    rom0: &'a RomImage,
    rom1: &'a RomImage,
}

impl<'a> RomImporter<'a> {
    /// `rom0` ist das Master-CPU-Abbild (Strecken, Paletten, Szenerie),
    /// `rom1` das Slave-CPU-Abbild (Höhenprofile).
    pub fn new(rom0: &'a RomImage, rom1: &'a RomImage) -> Self {
        Self { rom0, rom1 }
    }

    // ─── Sektionen ──────────────────────────────────────────────────────

    /// Lädt eine normale Stage samt Palettenindizes in `level`.
    pub fn load_level(
        &self,
        id: usize,
        level: &mut TrackLevel,
        segments: &mut Vec<PathSegment>,
        palette: &mut PaletteTable,
    ) -> anyhow::Result<()> {
        if id >= NORMAL_LOOKUPS {
            return Err(TrackError::IndexOutOfRange {
                index: id,
                len: NORMAL_LOOKUPS,
            })
            .context("stage id");
        }

        self.load_level_palette(id, level, palette)
            .with_context(|| format!("palette of stage {id}"))?;

        // Die ersten 24 Bytes des Stage-Eintrags sind der Palettenblock
        self.load_level_data(STAGE_LOOKUPS[id] + 24, level, segments, LEVEL_LENGTH as i32)
            .with_context(|| format!("track data of stage {id}"))?;

        log::info!(
            "stage {id} importiert: {} Segmente, {} Breiten-, {} Höhen-, {} Szeneriepunkte",
            segments.len(),
            level.width_points.len(),
            level.height_points.len(),
            level.scenery_points.len()
        );
        Ok(())
    }

    /// Lädt einen der fünf Zieleinläufe (ohne Palettendaten).
    pub fn load_end_section(
        &self,
        id: usize,
        level: &mut TrackLevel,
        segments: &mut Vec<PathSegment>,
    ) -> anyhow::Result<()> {
        let lookups = STAGE_LOOKUPS.len() - NORMAL_LOOKUPS;
        if id >= lookups {
            return Err(TrackError::IndexOutOfRange {
                index: id,
                len: lookups,
            })
            .context("end section id");
        }

        let length = level.kind().capacity() as i32;
        self.load_level_data(STAGE_LOOKUPS[NORMAL_LOOKUPS + id], level, segments, length)
            .with_context(|| format!("end section {id}"))
    }

    /// Lädt die Gabelungssektion (ohne Palettendaten).
    pub fn load_split(
        &self,
        level: &mut TrackLevel,
        segments: &mut Vec<PathSegment>,
    ) -> anyhow::Result<()> {
        let length = level.kind().capacity() as i32;
        self.load_level_data(ROAD_SPLIT_LOOKUP, level, segments, length)
            .context("road split section")
    }

    /// Gemeinsamer Kern: Segment-, Breiten-/Höhen- und Szenerie-Daten
    /// eines Stage-Eintrags.
    fn load_level_data(
        &self,
        stage_adr: u32,
        level: &mut TrackLevel,
        segments: &mut Vec<PathSegment>,
        level_length: i32,
    ) -> TrackResult<()> {
        let curve_adr = self.rom0.read_u32(stage_adr)?;
        let new_segments = decode_segments(self.rom0, curve_adr, level_length)?;

        let wh_adr = self.rom0.read_u32(stage_adr + 4)?;
        let (width, height) = decode_width_height(self.rom0, wh_adr, level_length)?;

        let scenery_adr = self.rom0.read_u32(stage_adr + 8)?;
        let scenery = decode_scenery(self.rom0, scenery_adr, level_length)?;

        // Erst wenn alle drei Ströme sauber dekodiert sind, wird das Level
        // angefasst
        *segments = new_segments;
        level.width_points = width;
        level.height_points = height;
        level.scenery_points = scenery;
        level.update_track(segments);
        Ok(())
    }

    // ─── Paletten ───────────────────────────────────────────────────────

    fn load_level_palette(
        &self,
        id: usize,
        level: &mut TrackLevel,
        palette: &mut PaletteTable,
    ) -> TrackResult<()> {
        level.road_pal = id.min(ROAD_PALS - 1) as i32;

        let sky_adr = self.rom0.read_u32(STAGE_LOOKUPS[id])?;
        level.sky_pal = i32::from(self.rom0.read_u16(sky_adr)?);

        let gnd_adr = self.rom0.read_u32(STAGE_LOOKUPS[id] + 20)?;
        level.gnd_pal = i32::from(self.rom0.read_u16(gnd_adr)?);

        self.load_shared_palette(palette)
    }

    /// Füllt die globalen Fahrbahn-, Himmels- und Bodentabellen.
    ///
    /// Die Fahrbahnfarben eines Stage-Eintrags liegen hinter den Zeigern
    /// bei +4 bis +16, jeweils als Paar für die beiden Fahrbahnen.
    pub fn load_shared_palette(&self, palette: &mut PaletteTable) -> TrackResult<()> {
        for pal in 0..ROAD_PALS {
            let base = STAGE_LOOKUPS[pal];

            let mut adr = self.rom0.read_u32(base + 4)?;
            palette.road[pal][CENTRE1] = self.rom0.read_u32(adr)?;
            palette.road[pal][CENTRE2] = self.rom0.read_u32(adr + 4)?;

            adr = self.rom0.read_u32(base + 8)?;
            palette.road[pal][STRIPE1] = self.rom0.read_u32(adr)?;
            palette.road[pal][STRIPE2] = self.rom0.read_u32(adr + 4)?;

            adr = self.rom0.read_u32(base + 12)?;
            palette.road[pal][SIDE1] = self.rom0.read_u32(adr)?;
            palette.road[pal][SIDE2] = self.rom0.read_u32(adr + 4)?;

            adr = self.rom0.read_u32(base + 16)?;
            palette.road[pal][ROAD1] = self.rom0.read_u32(adr)?;
            palette.road[pal][ROAD2] = self.rom0.read_u32(adr + 4)?;
        }

        for pal in 0..SKY_PALS {
            let mut src = self.rom0.cursor(self.rom0.read_u32(PAL_SKY_TABLE + (pal as u32) * 4)?);
            for i in 0..SKY_LENGTH {
                palette.sky[pal][i] = src.next_u32()?;
            }
        }

        for pal in 0..GND_PALS {
            let mut src = self.rom0.cursor(self.rom0.read_u32(PAL_GND_TABLE + (pal as u32) * 4)?);
            for i in 0..GND_LENGTH {
                palette.gnd[pal][i] = src.next_u32()?;
            }
        }

        Ok(())
    }

    // ─── Bibliotheken ───────────────────────────────────────────────────

    /// Liest die 225 Höhenprofile aus dem Slave-CPU-Abbild.
    pub fn load_height_profiles(&self) -> anyhow::Result<Vec<HeightSegment>> {
        let mut list = Vec::with_capacity(HEIGHT_ENTRIES);
        let mut pointers = self.rom1.cursor(HEIGHT_ADR);

        for i in 0..HEIGHT_ENTRIES {
            let mut adr = self.rom1.cursor(pointers.next_u32()?);

            let kind = i32::from(adr.next_u8()?);
            let step = i32::from(adr.next_u8()?);

            let (value1, value2) = match kind {
                // Auf/Ab-Multiplikatoren als Einzelbytes
                0 => (i32::from(adr.next_u8()?), i32::from(adr.next_u8()?)),
                // Verzögerung bzw. neue Grundhöhe
                1..=4 => (i32::from(adr.next_i16()?), 0),
                _ => {
                    return Err(TrackError::MalformedRecord {
                        address: adr.pos(),
                        reason: "unknown height profile kind",
                    })
                    .with_context(|| format!("height profile {i}"));
                }
            };

            let mut data = Vec::new();
            if kind != 4 {
                loop {
                    let v = adr.next_i16()?;
                    if v == -1 {
                        break;
                    }
                    if data.len() >= HEIGHT_DATA_MAX {
                        return Err(TrackError::MalformedRecord {
                            address: adr.pos(),
                            reason: "height data terminator missing",
                        })
                        .with_context(|| format!("height profile {i}"));
                    }
                    data.push(i32::from(v));
                }
            }

            list.push(HeightSegment {
                kind,
                step,
                value1,
                value2,
                data,
            });
        }

        log::info!("{} Höhenprofile importiert", list.len());
        Ok(list)
    }

    /// Liest die 230 Szenerie-Muster samt der bekannten Datenkorrekturen
    /// (doppelte Draw-Routine 14, Wasser- und Wolken-Einträge, ungültige
    /// Sprite-Indizes).
    pub fn load_scenery_patterns(&self) -> anyhow::Result<Vec<SceneryPattern>> {
        let mut list = Vec::with_capacity(SCENERY_ENTRIES);
        let mut pointers = self.rom0.cursor(SPRITE_MASTER_TABLE);

        for _ in 0..SCENERY_ENTRIES {
            let adr = pointers.next_u32()?;

            let frequency = i32::from(self.rom0.read_u16(adr)?);
            let mut offset = i32::from(self.rom0.read_i16(adr + 2)?);
            let base = adr + 4;

            let mut sprites = Vec::new();
            while offset >= 0 {
                let entry_adr = base.wrapping_add(offset as u32);
                let mut entry = ScenerySprite {
                    props: i32::from(self.rom0.read_u8(entry_adr)?),
                    x: i32::from(self.rom0.read_u8(entry_adr + 1)?),
                    y: i32::from(self.rom0.read_i16(entry_adr + 2)?),
                    kind: i32::from(self.rom0.read_u8(entry_adr + 5)?),
                    pal: i32::from(self.rom0.read_u8(entry_adr + 7)?),
                };

                match entry.props >> 4 {
                    // Draw-Routine 14 ist ein Duplikat von 10
                    14 => entry.props = (entry.props & 0xF) + (10 << 4),
                    // Wassereinträge auf das Wasser-Sprite zwingen
                    3 => entry.kind = 62,
                    // Wolkenpalette ist hart verdrahtet
                    2 => entry.pal = 205,
                    _ => {}
                }

                // Vereinzelt stehen ungültige Sprite-Indizes im ROM
                if entry.kind > 149 {
                    entry.kind = 0;
                }

                offset -= 8;
                sprites.push(entry);
            }

            // Die Blöcke liegen rückwärts im ROM
            sprites.reverse();

            list.push(SceneryPattern { frequency, sprites });
        }

        log::info!("{} Szenerie-Muster importiert", list.len());
        Ok(list)
    }
}

// ─── Datensatz-Decoder ──────────────────────────────────────────────────

/// Dekodiert die Segmentliste: 6-Byte-Datensätze `{pos, curveInfo,
/// curveType}`, Endmarke `pos == -1`.
///
/// Die Segmentlänge ergibt sich erst aus der Position des Folgedatensatzes;
/// das letzte Segment reicht bis `level_length`. Zwischensegmente über der
/// Maximallänge werden in zwei Teile gleicher Krümmung zerlegt.
pub fn decode_segments(
    rom: &RomImage,
    data_adr: u32,
    level_length: i32,
) -> TrackResult<Vec<PathSegment>> {
    let mut cursor = rom.cursor(data_adr);
    let mut segments = Vec::new();
    let mut prev: Option<PathSegment> = None;
    let mut records: i32 = 0;

    loop {
        if records > level_length {
            return Err(TrackError::MalformedRecord {
                address: cursor.pos(),
                reason: "curve terminator missing",
            });
        }

        let pos = cursor.next_i16()?;
        if pos == -1 {
            // Ohne einen einzigen Datensatz gibt es auch kein Restsegment
            if let Some(mut last) = prev {
                last.length = level_length - last.pos;
                segments.push(last);
            }
            break;
        }

        let curve_info = i32::from(cursor.next_i16()?);
        let curve_type = cursor.next_u16()?;

        let mut segment = PathSegment::new(guess_angle(curve_info), 0);
        segment.pos = i32::from(pos);
        if curve_type == 2 {
            segment.angle_inc = -segment.angle_inc;
        }

        if let Some(mut finished) = prev.take() {
            finished.length = segment.pos - finished.pos;

            if finished.length > SECTION_LENGTH_MAX {
                let length = finished.length;
                finished.length = SECTION_LENGTH_MAX;
                segments.push(finished);

                finished.pos += SECTION_LENGTH_MAX;
                finished.length = length - SECTION_LENGTH_MAX;
            }

            segments.push(finished);
        }

        prev = Some(segment);
        records += 1;
    }

    Ok(segments)
}

/// Dekodiert den gemischten Breiten-/Höhenstrom: 8-Byte-Datensätze
/// `{pos, type, value1, value2}`, Endmarke `pos == 0x7FFF`. Typ 1 geht in
/// die Breiten-, Typ 0 in die Höhenliste; andere Typen werden ignoriert.
pub fn decode_width_height(
    rom: &RomImage,
    data_adr: u32,
    level_length: i32,
) -> TrackResult<(ControlPointList, ControlPointList)> {
    let mut cursor = rom.cursor(data_adr);
    let mut width = ControlPointList::new();
    let mut height = ControlPointList::new();
    let mut records: i32 = 0;

    loop {
        if records > level_length {
            return Err(TrackError::MalformedRecord {
                address: cursor.pos(),
                reason: "width/height terminator missing",
            });
        }

        let pos = cursor.next_u16()?;
        if pos == 0x7FFF {
            break;
        }

        let kind = cursor.next_u16()?;
        let value1 = cursor.next_u16()?;
        let value2 = cursor.next_u16()?;

        let cp = ControlPoint::new(i32::from(pos), i32::from(value1), i32::from(value2));
        match kind {
            0 => height.push(cp),
            1 => width.push(cp),
            _ => {}
        }

        records += 1;
    }

    Ok((width, height))
}

/// Dekodiert den Szeneriestrom: 4-Byte-Datensätze `{pos, anzahl, muster}`,
/// Endmarke `pos == 0x7FFF`.
pub fn decode_scenery(
    rom: &RomImage,
    data_adr: u32,
    level_length: i32,
) -> TrackResult<ControlPointList> {
    let mut cursor = rom.cursor(data_adr);
    let mut scenery = ControlPointList::new();
    let mut records: i32 = 0;

    loop {
        if records > level_length {
            return Err(TrackError::MalformedRecord {
                address: cursor.pos(),
                reason: "scenery terminator missing",
            });
        }

        let pos = cursor.next_u16()?;
        if pos == 0x7FFF {
            break;
        }

        let count = cursor.next_u8()?;
        let index = cursor.next_u8()?;
        scenery.push(ControlPoint::new(
            i32::from(pos),
            i32::from(count),
            i32::from(index),
        ));

        records += 1;
    }

    Ok(scenery)
}
