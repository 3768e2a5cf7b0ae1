//! Serialisierung des kompletten Projekts in das Binärformat der
//! Spiel-Engine.
//!
//! Der Export läuft in zwei Durchgängen: Durchgang 1 rechnet alle
//! Abschnittsoffsets aus den Datensatz-Zählern vorab, Durchgang 2
//! serialisiert und prüft an jedem Abschnittsanfang gegen den Plan.
//! Eine Abweichung ist ein interner Invariantenbruch und bricht den
//! Export ab, statt eine korrupte Datei zu liefern.

use crate::core::angle::curve_info_between;
use crate::core::control_point::ControlPoint;
use crate::core::geometry::{
    TrackGeometry, END_LENGTH_CPU1, LEVEL_LENGTH_CPU1, SPLIT_LENGTH_CPU1,
};
use crate::core::height::HeightSegment;
use crate::core::level::TrackLevel;
use crate::core::level_set::{LevelSet, MAP_SLOTS, NORMAL_STAGES};
use crate::core::palette::{
    PaletteTable, CENTRE1, CENTRE2, GND_LENGTH, GND_PALS, ROAD1, ROAD2, ROAD_PALS, SIDE1, SIDE2,
    SKY_LENGTH, SKY_PALS, STRIPE1, STRIPE2,
};
use crate::core::scenery::SceneryPattern;
use crate::core::segment::PathSegment;
use crate::error::{TrackError, TrackResult};
use crate::export::binary::BinaryWriter;

/// Versionskennung am Dateianfang.
pub const EXPORT_VERSION: u32 = 1;

/// Headerlänge eines normalen Levels (9 Zeiger).
const LEVEL_HEADER: usize = 9 * 4;

/// Headerlänge von Zieleinlauf und Gabelung (3 Zeiger).
const SECTION_HEADER: usize = 3 * 4;

/// Länge einer Endmarke.
const END_MARKER: usize = 2;

/// Länge des Palettenblocks eines Levels.
const PALETTE_BLOCK: usize = 2 + 8 * 4 + 2 + 2;

/// Serialisiert das Projekt; gibt das fertige Abbild zurück.
pub fn export_binary(
    set: &LevelSet,
    palette: &PaletteTable,
    heights: &[HeightSegment],
    patterns: &[SceneryPattern],
) -> anyhow::Result<Vec<u8>> {
    use anyhow::Context;

    let bytes = write_all(set, palette, heights, patterns).context("binary track export")?;
    log::info!("Export abgeschlossen: {} Bytes", bytes.len());
    Ok(bytes)
}

/// Vorab berechnete Abschnittsoffsets (Durchgang 1).
struct LayoutPlan {
    cpu1_paths: usize,
    levels: Vec<usize>,
    end_cpu1: usize,
    ends: Vec<usize>,
    split_cpu1: usize,
    split_cpu0: usize,
    sky: usize,
    gnd: usize,
    scenery: usize,
    heights: usize,
}

fn level_block_len(level: &TrackLevel, segments: &[PathSegment]) -> usize {
    LEVEL_HEADER
        + PALETTE_BLOCK
        + 6 * segments.len()
        + END_MARKER
        + 8 * (level.width_points.len() + level.height_points.len())
        + END_MARKER
        + 4 * level.scenery_points.len()
        + END_MARKER
}

fn end_block_len(level: &TrackLevel, segments: &[PathSegment]) -> usize {
    SECTION_HEADER
        + 6 * segments.len()
        + END_MARKER
        + 8 * (level.width_points.len() + level.height_points.len())
        + END_MARKER
        + 4 * level.scenery_points.len()
        + END_MARKER
}

fn split_block_len(level: &TrackLevel, segments: &[PathSegment]) -> usize {
    // Breiten/Höhen der Gabelung sind ein fester Leerblock
    SECTION_HEADER
        + 6 * segments.len()
        + END_MARKER
        + 2 * 4
        + END_MARKER
        + 4 * level.scenery_points.len()
        + END_MARKER
}

fn scenery_table_len(patterns: &[SceneryPattern]) -> usize {
    patterns.len() * 4
        + patterns
            .iter()
            .map(|p| p.sprites.len() * 8 + 4)
            .sum::<usize>()
}

fn plan_layout(set: &LevelSet, patterns: &[SceneryPattern]) -> TrackResult<LayoutPlan> {
    // Versionswort, Startlinien-Flag, Master-Header
    let mut offset = 4 + 1 + (MAP_SLOTS + 8) * 4;

    let cpu1_paths = offset;
    offset += LEVEL_LENGTH_CPU1 * 4 * NORMAL_STAGES;

    let mut levels = Vec::with_capacity(NORMAL_STAGES);
    for slot in 0..NORMAL_STAGES {
        let index = set.stage_mapping(slot);
        levels.push(offset);
        offset += level_block_len(set.level(index)?, set.level_segments(index)?);
    }

    let end_cpu1 = offset;
    offset += END_LENGTH_CPU1 * 4;

    let mut ends = Vec::with_capacity(MAP_SLOTS - NORMAL_STAGES);
    for slot in NORMAL_STAGES..MAP_SLOTS {
        let index = set.stage_mapping(slot);
        ends.push(offset);
        offset += end_block_len(set.end_section(index)?, set.end_segments());
    }

    let split_cpu1 = offset;
    offset += SPLIT_LENGTH_CPU1 * 4;

    let split_cpu0 = offset;
    offset += split_block_len(set.split_section(), set.split_segments());

    let sky = offset;
    offset += SKY_PALS * 4 + SKY_PALS * SKY_LENGTH * 4;

    let gnd = offset;
    offset += GND_PALS * 4 + GND_PALS * GND_LENGTH * 4;

    let scenery = offset;
    offset += scenery_table_len(patterns);

    Ok(LayoutPlan {
        cpu1_paths,
        levels,
        end_cpu1,
        ends,
        split_cpu1,
        split_cpu0,
        sky,
        gnd,
        scenery,
        heights: offset,
    })
}

/// Positionsabgleich zwischen Plan und Serialisierung.
fn check(w: &BinaryWriter, planned: usize, section: &'static str) -> TrackResult<()> {
    if w.pos() != planned {
        return Err(TrackError::LayoutMismatch {
            section,
            planned,
            actual: w.pos(),
        });
    }
    Ok(())
}

fn write_all(
    set: &LevelSet,
    palette: &PaletteTable,
    heights: &[HeightSegment],
    patterns: &[SceneryPattern],
) -> TrackResult<Vec<u8>> {
    let plan = plan_layout(set, patterns)?;
    let mut w = BinaryWriter::new();

    // ─── Master-Header ──────────────────────────────────────────────────

    w.push_u32(EXPORT_VERSION);
    w.push_u8(u8::from(set.display_start_line));

    w.push_u32(plan.cpu1_paths as u32);
    for &offset in &plan.levels {
        w.push_u32(offset as u32);
    }
    w.push_u32(plan.end_cpu1 as u32);
    for &offset in &plan.ends {
        w.push_u32(offset as u32);
    }
    w.push_u32(plan.split_cpu1 as u32);
    w.push_u32(plan.split_cpu0 as u32);
    w.push_u32(plan.sky as u32);
    w.push_u32(plan.gnd as u32);
    w.push_u32(plan.scenery as u32);
    w.push_u32(plan.heights as u32);

    // ─── Pfad-Blöcke der Levels ─────────────────────────────────────────

    check(&w, plan.cpu1_paths, "cpu1 paths")?;
    for slot in 0..NORMAL_STAGES {
        let level = set.level(set.stage_mapping(slot))?;
        write_path(&mut w, level.geometry(), LEVEL_LENGTH_CPU1);
    }

    // ─── Level-Blöcke ───────────────────────────────────────────────────

    for slot in 0..NORMAL_STAGES {
        check(&w, plan.levels[slot], "level block")?;

        let index = set.stage_mapping(slot);
        let level = set.level(index)?;
        let segments = set.level_segments(index)?;

        let data_start = w.pos() + LEVEL_HEADER;
        let curve_start = data_start + PALETTE_BLOCK;
        let width_start = curve_start + 6 * segments.len() + END_MARKER;
        let sprite_start =
            width_start + 8 * (level.width_points.len() + level.height_points.len()) + END_MARKER;

        w.push_u32(data_start as u32); // Himmelspalette
        w.push_u32((data_start + 2) as u32); // Mittelstreifen
        w.push_u32((data_start + 10) as u32); // Randstreifen
        w.push_u32((data_start + 18) as u32); // Seitenflächen
        w.push_u32((data_start + 26) as u32); // Fahrbahn
        w.push_u32((data_start + 34) as u32); // Bodenpalette
        w.push_u32(curve_start as u32);
        w.push_u32(width_start as u32);
        w.push_u32(sprite_start as u32);

        write_palette_block(&mut w, level, palette);
        write_curve_data(&mut w, level.geometry(), segments, false);
        write_width_height_data(&mut w, level);
        write_scenery_data(&mut w, level);
    }

    // ─── Zieleinläufe ───────────────────────────────────────────────────

    check(&w, plan.end_cpu1, "end section cpu1 path")?;
    let master_end = set.end_section(set.stage_mapping(NORMAL_STAGES))?;
    write_path(&mut w, master_end.geometry(), END_LENGTH_CPU1);

    for slot in NORMAL_STAGES..MAP_SLOTS {
        check(&w, plan.ends[slot - NORMAL_STAGES], "end section block")?;

        let level = set.end_section(set.stage_mapping(slot))?;
        let segments = set.end_segments();

        write_section_header(&mut w, level, segments.len());
        // Richtungscodes invertiert, der Zieleinlauf läuft im Spiel
        // gegen die Fahrtrichtung der Stages
        write_curve_data(&mut w, level.geometry(), segments, true);
        write_width_height_data(&mut w, level);
        write_scenery_data(&mut w, level);
    }

    // ─── Gabelung ───────────────────────────────────────────────────────

    check(&w, plan.split_cpu1, "split cpu1 path")?;
    let split = set.split_section();
    write_path(&mut w, split.geometry(), SPLIT_LENGTH_CPU1);

    check(&w, plan.split_cpu0, "split block")?;
    {
        let segments = set.split_segments();
        let data_start = w.pos() + SECTION_HEADER;
        let width_start = data_start + 6 * segments.len() + END_MARKER;
        let sprite_start = width_start + 2 * 4 + END_MARKER;

        w.push_u32(data_start as u32);
        w.push_u32(width_start as u32);
        w.push_u32(sprite_start as u32);

        write_curve_data(&mut w, split.geometry(), segments, false);
        // Die Gabelung hat keine Breiten-/Höhenpunkte; die Engine erwartet
        // trotzdem einen Block
        w.push_u32(0);
        w.push_u32(0);
        w.push_u16(0x7FFF);
        write_scenery_data(&mut w, split);
    }

    // ─── Gemeinsame Tabellen ────────────────────────────────────────────

    check(&w, plan.sky, "sky palette table")?;
    let mut sky_data = w.pos() + SKY_PALS * 4;
    for _ in 0..SKY_PALS {
        w.push_u32(sky_data as u32);
        sky_data += SKY_LENGTH * 4;
    }
    for pal in 0..SKY_PALS {
        for i in 0..SKY_LENGTH {
            w.push_u32(palette.sky[pal][i]);
        }
    }

    check(&w, plan.gnd, "ground palette table")?;
    let mut gnd_data = w.pos() + GND_PALS * 4;
    for _ in 0..GND_PALS {
        w.push_u32(gnd_data as u32);
        gnd_data += GND_LENGTH * 4;
    }
    for pal in 0..GND_PALS {
        for i in 0..GND_LENGTH {
            w.push_u32(palette.gnd[pal][i]);
        }
    }

    check(&w, plan.scenery, "scenery pattern table")?;
    write_scenery_table(&mut w, patterns);

    check(&w, plan.heights, "height profile table")?;
    write_height_table(&mut w, heights);

    Ok(w.into_bytes())
}

/// Dichter Richtungsblock; hinter dem Levelende wird mit dem letzten
/// Sample aufgefüllt, damit der Horizont stillsteht.
fn write_path(w: &mut BinaryWriter, geometry: &TrackGeometry, length: usize) {
    let end_pos = geometry.end_pos();
    for j in 0..length {
        let sample = if end_pos == 0 {
            glam::IVec2::ZERO
        } else {
            geometry.direction(j.min(end_pos - 1))
        };
        w.push_i16(sample.x as i16);
        w.push_i16(sample.y as i16);
    }
}

fn write_section_header(w: &mut BinaryWriter, level: &TrackLevel, segment_count: usize) {
    let data_start = w.pos() + SECTION_HEADER;
    let width_start = data_start + 6 * segment_count + END_MARKER;
    let sprite_start =
        width_start + 8 * (level.width_points.len() + level.height_points.len()) + END_MARKER;

    w.push_u32(data_start as u32);
    w.push_u32(width_start as u32);
    w.push_u32(sprite_start as u32);
}

fn write_palette_block(w: &mut BinaryWriter, level: &TrackLevel, palette: &PaletteTable) {
    let road = &palette.road[(level.road_pal.max(0) as usize).min(ROAD_PALS - 1)];

    w.push_u16(level.sky_pal as u16);
    w.push_u32(road[CENTRE1]);
    w.push_u32(road[CENTRE2]);
    w.push_u32(road[STRIPE1]);
    w.push_u32(road[STRIPE2]);
    w.push_u32(road[SIDE1]);
    w.push_u32(road[SIDE2]);
    w.push_u32(road[ROAD1]);
    w.push_u32(road[ROAD2]);
    w.push_u16(level.gnd_pal as u16);
    w.push_u16(level.gnd_pal as u16);
}

/// Segmentliste als 6-Byte-Datensätze. Das Krümmungsmaß entsteht aus den
/// Richtungssamples am Segmentanfang, der Richtungscode aus dem Vorzeichen
/// des Winkelinkrements (1 gerade, 2 rechts, 3 links).
fn write_curve_data(
    w: &mut BinaryWriter,
    geometry: &TrackGeometry,
    segments: &[PathSegment],
    invert: bool,
) {
    let last = geometry.end_pos().saturating_sub(1);
    for segment in segments {
        // Segmentpositionen sind erst nach der Integration verlässlich;
        // auf das letzte gültige Sample geklemmt wie beim Pfadblock
        let pos = (segment.pos.max(0) as usize).min(last);
        let info = curve_info_between(geometry.direction(pos), geometry.direction(pos + 1));

        let curve: u16 = if segment.angle_inc < 0 {
            if invert {
                2
            } else {
                3
            }
        } else if segment.angle_inc > 0 {
            if invert {
                3
            } else {
                2
            }
        } else {
            1
        };

        w.push_u16(segment.pos as u16);
        w.push_i16(info as i16);
        w.push_u16(curve);
    }
    w.push_u16(0xFFFF);
}

fn insert_at_pos(list: &mut Vec<(ControlPoint, u16)>, item: (ControlPoint, u16)) {
    let index = list.iter().filter(|(p, _)| p.pos < item.0.pos).count();
    list.insert(index, item);
}

/// Breiten und Höhen als ein gemischter, positionssortierter Strom.
/// Bei Positionsgleichheit stehen Höhen vor Breiten.
fn write_width_height_data(w: &mut BinaryWriter, level: &TrackLevel) {
    let mut combined: Vec<(ControlPoint, u16)> = Vec::new();

    for cp in &level.width_points {
        insert_at_pos(&mut combined, (*cp, 1));
    }
    for cp in &level.height_points {
        insert_at_pos(&mut combined, (*cp, 0));
    }

    for (cp, kind) in combined {
        w.push_u16(cp.pos as u16);
        w.push_u16(kind);
        w.push_u16(cp.value1 as u16);
        // value2 ist nur für Breitenpunkte belegt
        w.push_u16(if kind == 0 { 0 } else { cp.value2 as u16 });
    }
    w.push_u16(0x7FFF);
}

fn write_scenery_data(w: &mut BinaryWriter, level: &TrackLevel) {
    for cp in &level.scenery_points {
        w.push_i16(cp.pos as i16);
        w.push_u8(cp.value1 as u8);
        w.push_u8(cp.value2 as u8);
    }
    w.push_u16(0x7FFF);
}

fn write_scenery_table(w: &mut BinaryWriter, patterns: &[SceneryPattern]) {
    let mut data = w.pos() + patterns.len() * 4;
    for pattern in patterns {
        w.push_u32(data as u32);
        data += pattern.sprites.len() * 8 + 4;
    }

    for pattern in patterns {
        w.push_u16(pattern.frequency as u16);
        // Die Engine iteriert die Blöcke rückwärts ab diesem Offset
        let offset = (pattern.sprites.len() as i16 - 1) * 8;
        w.push_i16(offset);

        for sprite in &pattern.sprites {
            w.push_u8(sprite.props as u8);
            w.push_i8(sprite.x as i8);
            w.push_i16(sprite.y as i16);
            w.push_u8(0);
            w.push_u8(sprite.kind as u8);
            w.push_u8(0);
            w.push_u8(sprite.pal as u8);
        }
    }
}

fn write_height_table(w: &mut BinaryWriter, heights: &[HeightSegment]) {
    let mut data = w.pos() + heights.len() * 4;
    for seg in heights {
        w.push_u32(data as u32);
        data += 4;
        if seg.kind != 4 {
            data += (seg.data.len() + 1) * 2;
        }
    }

    for seg in heights {
        w.push_u8(seg.kind as u8);
        w.push_u8(seg.step as u8);

        if seg.kind == 0 {
            w.push_u8(seg.value1 as u8);
            w.push_u8(seg.value2 as u8);
        } else {
            w.push_i16(seg.value1 as i16);
        }

        if seg.kind != 4 {
            for &v in &seg.data {
                w.push_i16(v as i16);
            }
            w.push_i16(-1);
        }
    }
}
