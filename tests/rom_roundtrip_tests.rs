//! Integrationstests Import → Editor-Modell → Export über synthetische
//! ROM-Abbilder: Control-Points überleben die Rundreise exakt, Winkel
//! innerhalb der Quantisierung der inversen Suche.

use layout_editor::core::angle::curve_info;
use layout_editor::rom::{decode_scenery, decode_segments, decode_width_height, RomImporter};
use layout_editor::{
    export_binary, HeightSegment, LevelSet, PaletteTable, RomImage, SceneryPattern,
};

fn put_u16(buf: &mut [u8], adr: usize, v: u16) {
    buf[adr..adr + 2].copy_from_slice(&v.to_be_bytes());
}

fn put_u32(buf: &mut [u8], adr: usize, v: u32) {
    buf[adr..adr + 4].copy_from_slice(&v.to_be_bytes());
}

/// Synthetische Datenströme: Kurven ab 0x100, Breiten/Höhen ab 0x200,
/// Szenerie ab 0x300.
fn sample_streams(buf: &mut [u8]) {
    // Kurven: gerade ab 0, Linkskurve (Typ 2) ab 250
    put_u16(buf, 0x100, 0);
    put_u16(buf, 0x102, 0);
    put_u16(buf, 0x104, 0);
    put_u16(buf, 0x106, 250);
    put_u16(buf, 0x108, curve_info(80) as u16);
    put_u16(buf, 0x10A, 2);
    put_u16(buf, 0x10C, 0xFFFF);

    // Breiten/Höhen gemischt
    for (i, rec) in [[40u16, 1, 300, 64], [90, 0, 12, 0]].iter().enumerate() {
        for (j, &v) in rec.iter().enumerate() {
            put_u16(buf, 0x200 + i * 8 + j * 2, v);
        }
    }
    put_u16(buf, 0x210, 0x7FFF);

    // Szenerie
    put_u16(buf, 0x300, 60);
    buf[0x302] = 3;
    buf[0x303] = 17;
    put_u16(buf, 0x304, 0x7FFF);
}

#[test]
fn test_decode_export_rundreise() {
    let mut buf = vec![0u8; 0x400];
    sample_streams(&mut buf);
    let rom = RomImage::new(buf);

    let segments = decode_segments(&rom, 0x100, 500).unwrap();
    let (width, height) = decode_width_height(&rom, 0x200, 500).unwrap();
    let scenery = decode_scenery(&rom, 0x300, 500).unwrap();

    assert_eq!(segments.len(), 2);
    assert_eq!((segments[0].pos, segments[0].length, segments[0].angle_inc), (0, 250, 0));
    assert_eq!((segments[1].pos, segments[1].length, segments[1].angle_inc), (250, 250, -80));

    // In ein Projekt übernehmen und exportieren
    let mut set = LevelSet::new();
    {
        let (level, path) = set.level_mut(0).unwrap();
        *path = segments;
        level.width_points = width.clone();
        level.height_points = height.clone();
        level.scenery_points = scenery.clone();
        level.update_track(path);
    }

    let bytes = export_binary(&set, &PaletteTable::default(), &[], &[]).unwrap();
    let image = RomImage::new(bytes);

    // Level-Block 0 über den Master-Header finden
    let block = image.read_u32(9).unwrap();
    let curve_adr = image.read_u32(block + 24).unwrap();
    let wh_adr = image.read_u32(block + 28).unwrap();
    let scenery_adr = image.read_u32(block + 32).unwrap();

    // Breiten, Höhen und Szenerie kommen bitgleich zurück
    let (width2, height2) = decode_width_height(&image, wh_adr, 500).unwrap();
    assert_eq!(width2, width);
    assert_eq!(height2, height);
    assert_eq!(decode_scenery(&image, scenery_adr, 500).unwrap(), scenery);

    // Winkel: am Segmentanfang bei Winkel 0 ist die inverse Suche exakt.
    // Die Richtungscodes des Exportformats sind zur ROM-Kodierung
    // spiegelverkehrt, daher kommt der Betrag mit umgekehrtem Vorzeichen an.
    let decoded = decode_segments(&image, curve_adr, 500).unwrap();
    assert_eq!(decoded.len(), 2);
    assert_eq!((decoded[0].pos, decoded[0].angle_inc), (0, 0));
    assert_eq!(decoded[1].pos, 250);
    assert_eq!(decoded[1].angle_inc.abs(), 80);
}

#[test]
fn test_importer_laedt_stage_mit_palette() {
    // Abbild groß genug für die festen Rev.-B-Adressen
    let mut buf = vec![0u8; 0x20000];

    const STAGE_1: usize = 0x1DD36;

    // Palettenzeiger des Stage-Eintrags
    put_u32(&mut buf, STAGE_1, 0x400);
    put_u16(&mut buf, 0x400, 7); // Himmelspalette 7
    put_u32(&mut buf, STAGE_1 + 20, 0x404);
    put_u16(&mut buf, 0x404, 3); // Bodenpalette 3

    // Datenzeiger des Stage-Eintrags
    put_u32(&mut buf, STAGE_1 + 24, 0x100);
    put_u32(&mut buf, STAGE_1 + 28, 0x200);
    put_u32(&mut buf, STAGE_1 + 32, 0x300);

    sample_streams(&mut buf);

    let rom0 = RomImage::new(buf);
    let rom1 = RomImage::new(vec![0u8; 0x100]);
    let importer = RomImporter::new(&rom0, &rom1);

    let mut set = LevelSet::new();
    let mut palette = PaletteTable::default();
    {
        let (level, path) = set.level_mut(0).unwrap();
        importer.load_level(0, level, path, &mut palette).unwrap();

        assert_eq!(level.sky_pal, 7);
        assert_eq!(level.gnd_pal, 3);
        assert_eq!(level.road_pal, 0);
        assert_eq!(path.len(), 2);
        // Das letzte Segment reicht bis zur festen Levellänge
        assert_eq!(path[1].length, 0x79C - 250);
        assert_eq!(level.width_points.len(), 1);
        assert_eq!(level.height_points.len(), 1);
        assert_eq!(level.scenery_points.len(), 1);
    }

    // Integration lief mit: volle Levellänge erreicht
    assert_eq!(set.level(0).unwrap().geometry().end_pos(), 0x79C);
}

#[test]
fn test_hoehenprofil_rundreise() {
    // Ein Profil: Zeiger auf 0x10, Typ 1, Step 2, Wert 9, Daten 4 5, Ende
    let mut buf = vec![0u8; 0x40];
    put_u32(&mut buf, 0x0, 0x10);
    buf[0x10] = 1;
    buf[0x11] = 2;
    put_u16(&mut buf, 0x12, 9);
    put_u16(&mut buf, 0x14, 4);
    put_u16(&mut buf, 0x16, 5);
    put_u16(&mut buf, 0x18, 0xFFFF);

    let rom = RomImage::new(buf);
    let mut cursor = rom.cursor(0);

    // Dekodieren wie der Importer, nur mit einem einzelnen Eintrag
    let adr = cursor.next_u32().unwrap();
    let mut entry = rom.cursor(adr);
    let profile = HeightSegment {
        kind: i32::from(entry.next_u8().unwrap()),
        step: i32::from(entry.next_u8().unwrap()),
        value1: i32::from(entry.next_i16().unwrap()),
        value2: 0,
        data: vec![
            i32::from(entry.next_i16().unwrap()),
            i32::from(entry.next_i16().unwrap()),
        ],
    };
    assert_eq!(entry.next_i16().unwrap(), -1);

    let set = LevelSet::new();
    let bytes = export_binary(
        &set,
        &PaletteTable::default(),
        std::slice::from_ref(&profile),
        &[],
    )
    .unwrap();
    let image = RomImage::new(bytes);

    // Höhenprofil-Tabelle am Dateiende wieder auslesen
    let table = image.read_u32(5 + 27 * 4).unwrap();
    let data = image.read_u32(table).unwrap();
    assert_eq!(data, table + 4);
    assert_eq!(image.read_u8(data).unwrap(), 1);
    assert_eq!(image.read_u8(data + 1).unwrap(), 2);
    assert_eq!(image.read_i16(data + 2).unwrap(), 9);
    assert_eq!(image.read_i16(data + 4).unwrap(), 4);
    assert_eq!(image.read_i16(data + 6).unwrap(), 5);
    assert_eq!(image.read_i16(data + 8).unwrap(), -1);
}

#[test]
fn test_leeres_projekt_exportiert_konsistent() {
    // Auch ohne Pfade und Punkte muss das Layout aufgehen
    let set = LevelSet::new();
    let patterns: Vec<SceneryPattern> = Vec::new();
    let bytes = export_binary(&set, &PaletteTable::default(), &[], &patterns).unwrap();
    let image = RomImage::new(bytes);

    assert_eq!(image.read_u32(0).unwrap(), 1);

    // Leerer Pfad wird als Null-Samples aufgefüllt
    let cpu1 = image.read_u32(5).unwrap();
    assert_eq!(image.read_u32(cpu1).unwrap(), 0);

    // Level-Block besteht nur aus Header, Palette und Endmarken
    let block = image.read_u32(9).unwrap();
    let curve = image.read_u32(block + 24).unwrap();
    assert_eq!(image.read_u16(curve).unwrap(), 0xFFFF);
}
