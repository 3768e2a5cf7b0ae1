//! Integrationstest für das Exportlayout: jeder Zeiger des Master-Headers
//! und der Sektionsheader muss exakt auf die Stelle zeigen, an der die
//! Daten (bzw. ihre Endmarken) tatsächlich liegen.

use layout_editor::export::writer::EXPORT_VERSION;
use layout_editor::{
    export_binary, HeightSegment, LevelSet, PaletteTable, PathSegment, RomImage, SceneryPattern,
    ScenerySprite,
};

const LEVEL_LENGTH_CPU1: usize = 2308;
const END_LENGTH_CPU1: usize = 624;
const SPLIT_LENGTH_CPU1: usize = 744;

/// Adresse des n-ten Master-Header-Zeigers (hinter Version und Flag).
fn header_slot(n: usize) -> u32 {
    (5 + n * 4) as u32
}

fn sample_project() -> (LevelSet, PaletteTable, Vec<HeightSegment>, Vec<SceneryPattern>) {
    let mut set = LevelSet::new();
    {
        let (level, path) = set.level_mut(0).unwrap();
        level.insert_path_segment(path, 0).unwrap();
        level.insert_path_segment(path, 1).unwrap();
        path[1].angle_inc = 80;
        level.update_track(path);

        level.insert_width_point(50);
        level.insert_height_point(120);
        level.insert_scenery_point(300);
    }
    {
        let (level, path) = set.end_section_mut(0).unwrap();
        level.insert_path_segment(path, 0).unwrap();
        path[0].angle_inc = -40;
        level.update_track(path);
    }
    set.refresh_end_sections();
    {
        let (level, path) = set.split_section_mut();
        level.insert_path_segment(path, 0).unwrap();
    }

    let heights = vec![HeightSegment {
        kind: 1,
        step: 4,
        value1: 10,
        value2: 0,
        data: vec![5, 6],
    }];
    let patterns = vec![SceneryPattern {
        frequency: 1,
        sprites: vec![ScenerySprite::default()],
    }];

    (set, PaletteTable::default(), heights, patterns)
}

#[test]
fn test_master_header_und_level_bloecke() {
    let (set, palette, heights, patterns) = sample_project();
    let bytes = export_binary(&set, &palette, &heights, &patterns).unwrap();
    let image = RomImage::new(bytes);

    assert_eq!(image.read_u32(0).unwrap(), EXPORT_VERSION);
    assert_eq!(image.read_u8(4).unwrap(), 1); // Startlinien-Flag

    // Zeiger 0: Pfadblöcke direkt hinter dem Master-Header
    let cpu1 = image.read_u32(header_slot(0)).unwrap();
    assert_eq!(cpu1, 5 + 28 * 4);

    // Erstes Pfadsample: gerade Strecke, Richtung (0, 4096)
    assert_eq!(image.read_i16(cpu1).unwrap(), 0);
    assert_eq!(image.read_i16(cpu1 + 2).unwrap(), 4096);

    // Das Levelende wird mit dem letzten Sample aufgefüllt
    let level0 = set.level(0).unwrap();
    let end_pos = level0.geometry().end_pos() as u32;
    let last = cpu1 + (LEVEL_LENGTH_CPU1 as u32 - 1) * 4;
    assert_eq!(
        image.read_u32(last).unwrap(),
        image.read_u32(cpu1 + (end_pos - 1) * 4).unwrap()
    );

    // Zeiger 1: erster Level-Block hinter allen 15 Pfadblöcken
    let block = image.read_u32(header_slot(1)).unwrap();
    assert_eq!(block as usize, cpu1 as usize + LEVEL_LENGTH_CPU1 * 4 * 15);

    // Level-Header: Palettenzeiger, dann Kurven-, Breiten-, Szeneriedaten
    let data_start = image.read_u32(block).unwrap();
    assert_eq!(data_start, block + 36);
    let curve = image.read_u32(block + 24).unwrap();
    assert_eq!(curve, data_start + 38);

    // Kurvenblock: 2 Segmente à 6 Byte, Endmarke direkt vor den Breiten
    let width = image.read_u32(block + 28).unwrap();
    assert_eq!((width - 2 - curve) % 6, 0);
    assert_eq!((width - 2 - curve) / 6, 2);
    assert_eq!(image.read_u16(width - 2).unwrap(), 0xFFFF);

    // Gerades erstes Segment: Richtungscode 1; gekrümmtes zweites: Code 2
    assert_eq!(image.read_u16(curve).unwrap(), 0);
    assert_eq!(image.read_u16(curve + 4).unwrap(), 1);
    assert_eq!(image.read_u16(curve + 6 + 4).unwrap(), 2);

    // Breitenblock: 1 Breiten- + 1 Höhenpunkt à 8 Byte
    let sprite = image.read_u32(block + 32).unwrap();
    assert_eq!((sprite - 2 - width) / 8, 2);
    assert_eq!(image.read_u16(sprite - 2).unwrap(), 0x7FFF);

    // Szenerieblock endet mit der Endmarke genau am Blockende
    let next_block = image.read_u32(header_slot(2)).unwrap();
    assert_eq!(image.read_u16(next_block - 2).unwrap(), 0x7FFF);
}

#[test]
fn test_endsektionen_und_gabelung() {
    let (set, palette, heights, patterns) = sample_project();
    let bytes = export_binary(&set, &palette, &heights, &patterns).unwrap();
    let image = RomImage::new(bytes);

    // Zeiger 16: gemeinsamer Pfadblock der Zieleinläufe
    let end_cpu1 = image.read_u32(header_slot(16)).unwrap();
    let first_end = image.read_u32(header_slot(17)).unwrap();
    assert_eq!(first_end as usize, end_cpu1 as usize + END_LENGTH_CPU1 * 4);

    // Endsektions-Header: 3 Zeiger, Kurvendaten direkt dahinter
    let curve = image.read_u32(first_end).unwrap();
    assert_eq!(curve, first_end + 12);

    // Negatives Winkelinkrement wird im Zieleinlauf invertiert kodiert
    assert_eq!(image.read_u16(curve + 4).unwrap(), 2);

    // Gabelung: Pfadblock, dann Block mit synthetischem Leer-Breitenblock
    let split_cpu1 = image.read_u32(header_slot(22)).unwrap();
    let split = image.read_u32(header_slot(23)).unwrap();
    assert_eq!(split as usize, split_cpu1 as usize + SPLIT_LENGTH_CPU1 * 4);

    let split_width = image.read_u32(split + 4).unwrap();
    assert_eq!(image.read_u32(split_width).unwrap(), 0);
    assert_eq!(image.read_u32(split_width + 4).unwrap(), 0);
    assert_eq!(image.read_u16(split_width + 8).unwrap(), 0x7FFF);

    // Der feste Checkpoint der Gabelung steht im Szenerieblock
    let split_scenery = image.read_u32(split + 8).unwrap();
    assert_eq!(image.read_i16(split_scenery).unwrap(), 398);
    assert_eq!(image.read_u8(split_scenery + 2).unwrap(), 4);
}

#[test]
fn test_export_mit_nicht_integriertem_pfad_bleibt_robust() {
    let mut set = LevelSet::new();
    {
        let (_, path) = set.level_mut(0).unwrap();
        // Segment direkt angehängt, ohne Neuintegration: `pos` zeigt
        // hinter jedes gültige Sample
        let mut segment = PathSegment::new(40, 200);
        segment.pos = 5000;
        path.push(segment);
    }

    let bytes = export_binary(&set, &PaletteTable::default(), &[], &[]).unwrap();
    let image = RomImage::new(bytes);

    // Der Datensatz wird geschrieben, das Krümmungsmaß auf das letzte
    // gültige Sample geklemmt (hier: leerer Pfad, Maß 0)
    let block = image.read_u32(9).unwrap();
    let curve = image.read_u32(block + 24).unwrap();
    assert_eq!(image.read_u16(curve).unwrap(), 5000);
    assert_eq!(image.read_i16(curve + 2).unwrap(), 0);
    assert_eq!(image.read_u16(curve + 6).unwrap(), 0xFFFF);
}

#[test]
fn test_gemeinsame_tabellen_und_dateiende() {
    let (set, palette, heights, patterns) = sample_project();
    let bytes = export_binary(&set, &palette, &heights, &patterns).unwrap();
    let len = bytes.len();
    let image = RomImage::new(bytes);

    // Paletten: erster Zeiger springt über die Zeigertabelle
    let sky = image.read_u32(header_slot(24)).unwrap();
    assert_eq!(image.read_u32(sky).unwrap(), sky + 15 * 4);
    let gnd = image.read_u32(header_slot(25)).unwrap();
    assert_eq!(image.read_u32(gnd).unwrap(), gnd + 16 * 4);
    assert_eq!(gnd as usize, sky as usize + 15 * 4 + 15 * 32 * 4);

    // Szenerie-Muster: ein Eintrag, Offset (n-1)*8 = 0
    let scenery = image.read_u32(header_slot(26)).unwrap();
    let pattern = image.read_u32(scenery).unwrap();
    assert_eq!(pattern, scenery + 4);
    assert_eq!(image.read_u16(pattern).unwrap(), 1);
    assert_eq!(image.read_i16(pattern + 2).unwrap(), 0);

    // Höhenprofile bilden den Dateischluss
    let heights_adr = image.read_u32(header_slot(27)).unwrap();
    let profile = image.read_u32(heights_adr).unwrap();
    assert_eq!(profile, heights_adr + 4);
    assert_eq!(image.read_u8(profile).unwrap(), 1); // kind
    assert_eq!(image.read_u8(profile + 1).unwrap(), 4); // step
    assert_eq!(image.read_i16(profile + 2).unwrap(), 10);
    assert_eq!(image.read_i16(profile + 8).unwrap(), -1);

    // kind, step, value1, zwei Datenworte, Endmarke
    assert_eq!(len, profile as usize + 4 + 3 * 2);
}
