//! # Lanefix Savefile
//!
//! Archive container codec and outer-document plumbing for the junction
//! repair engine.
//!
//! An archive is a 4-byte little-endian length of the decompressed payload
//! followed by a zlib stream that inflates to a UTF-8 JSON document. The
//! entity table lives at an arbitrary depth inside that document; this crate
//! locates it, hands it to the graph layer, and puts the rebuilt table back
//! in the same place before re-encoding.

mod archive;
mod backup;
mod document;
mod error;
mod keys;

pub use archive::{export_json, read_archive, write_archive};
pub use backup::backup_path;
pub use document::{
    locate_entity_container, restore_entity_container, take_entity_container, value_at_mut,
    PathSeg,
};
pub use error::{Result, SavefileError};
pub use keys::{entity_id_from_key, entity_key};
