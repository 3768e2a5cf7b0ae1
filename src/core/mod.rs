//! Domänenmodell: Segmente, Control-Points, abgeleitete Geometrie und die
//! Sektionsverwaltung.

pub mod angle;
pub mod control_point;
pub mod geometry;
pub mod height;
pub mod level;
pub mod level_set;
pub mod palette;
pub mod scenery;
pub mod segment;

pub use angle::{curve_info, curve_info_between, guess_angle, ANGLE_CODE_RANGE};
pub use control_point::{ControlPoint, ControlPointList};
pub use geometry::{TrackGeometry, WidthRender, FIXED_ONE, LEVEL_LENGTH};
pub use height::{HeightSegment, HEIGHT_ENTRIES};
pub use level::{SectionKind, TrackLevel, START_WIDTH, START_WIDTH_L1};
pub use level_set::{LevelSet, PathId, MAP_SLOTS, NORMAL_STAGES};
pub use palette::PaletteTable;
pub use scenery::{SceneryPattern, ScenerySprite, SCENERY_ENTRIES};
pub use segment::PathSegment;
