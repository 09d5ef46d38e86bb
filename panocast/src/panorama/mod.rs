//! Tile fetching and panorama assembly.

mod assembler;
mod tile_store;

pub use assembler::{
    encode_jpeg, grid_size, AssemblerSettings, Panorama, PanoramaAssembler, DEFAULT_JPEG_QUALITY,
    DEFAULT_TILE_SIZE, DEFAULT_ZOOM,
};
pub use tile_store::{validate_tile, TileStore, DEFAULT_MIN_TILE_BYTES};
