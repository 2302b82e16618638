pub mod launchbox;
pub mod libretro;

pub use launchbox::{find_game_images, GameImagePaths, LaunchBoxImporter};
pub use libretro::{parse_dat, parse_dat_file, merge_dat_files, DatFile, DatGame, DatHeader, DatRom};
