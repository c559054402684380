//! Sprite sets and level image composition

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use pcgrl_core::{PcgError, Result};

use crate::grid::{Coord, Tile, TileMap};
use crate::problem::GraphicsMode;

/// Key of the path overlay sprite
pub const PATH_SPRITE: &str = "path";

impl GraphicsMode {
    /// Relative sprite paths for each tile and the path overlay
    #[must_use]
    pub fn sprite_paths(self) -> [(&'static str, &'static str); 3] {
        match self {
            GraphicsMode::Binary => [
                ("empty", "binary/empty.png"),
                ("solid", "binary/solid.png"),
                (PATH_SPRITE, "binary/path_g.png"),
            ],
            GraphicsMode::Gvgai => [
                ("empty", "sprites/oryx/floor3.png"),
                ("solid", "sprites/oryx/wall3.png"),
                (PATH_SPRITE, "sprites/newset/snowmanchest.png"),
            ],
        }
    }
}

/// Loaded sprites, all scaled to `tile_size` pixels
#[derive(Debug, Clone)]
pub struct TileSet {
    sprites: HashMap<String, RgbaImage>,
    tile_size: u32,
}

impl TileSet {
    /// Load the sprites of `mode` from `dir`
    pub fn load(dir: &Path, mode: GraphicsMode, tile_size: u32) -> Result<Self> {
        let mut sprites = HashMap::new();
        for (name, rel) in mode.sprite_paths() {
            let path = dir.join(rel);
            let sprite = load_sprite(&path)?;
            tracing::debug!(sprite = name, path = %path.display(), "loaded sprite");
            sprites.insert(name.to_string(), fit(sprite, tile_size));
        }
        Ok(Self { sprites, tile_size })
    }

    /// Flat-colour sprites for rendering without asset files
    #[must_use]
    pub fn flat(tile_size: u32) -> Self {
        let swatch = |rgba: [u8; 4]| RgbaImage::from_pixel(tile_size, tile_size, Rgba(rgba));

        // Path marker: translucent dot on a transparent tile.
        let mut path = RgbaImage::new(tile_size, tile_size);
        let quarter = tile_size / 4;
        for y in quarter..tile_size - quarter {
            for x in quarter..tile_size - quarter {
                path.put_pixel(x, y, Rgba([46, 204, 64, 200]));
            }
        }

        let sprites = HashMap::from([
            (Tile::Empty.name().to_string(), swatch([230, 230, 230, 255])),
            (Tile::Solid.name().to_string(), swatch([40, 40, 40, 255])),
            (PATH_SPRITE.to_string(), path),
        ]);
        Self { sprites, tile_size }
    }

    /// Side length of every sprite, in pixels
    #[must_use]
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Sprite by name
    #[must_use]
    pub fn sprite(&self, name: &str) -> Option<&RgbaImage> {
        self.sprites.get(name)
    }

    fn require(&self, name: &str) -> Result<&RgbaImage> {
        self.sprite(name).ok_or_else(|| PcgError::Asset {
            path: PathBuf::from(name),
            reason: "sprite missing from tile set".to_string(),
        })
    }

    /// Draw `map` one sprite per cell, then blend the path sprite over
    /// every cell of `path`.
    pub fn compose(&self, map: &TileMap, path: &[Coord]) -> Result<RgbaImage> {
        let (rows, cols) = map.dim();
        let size = self.tile_size;
        let mut canvas = RgbaImage::new(cols as u32 * size, rows as u32 * size);

        for ((r, c), tile) in map.indexed_iter() {
            let sprite = self.require(tile.name())?;
            imageops::replace(&mut canvas, sprite, i64::from(size) * c as i64, i64::from(size) * r as i64);
        }

        let marker = self.require(PATH_SPRITE)?;
        for &(r, c) in path {
            if r < rows && c < cols {
                imageops::overlay(&mut canvas, marker, i64::from(size) * c as i64, i64::from(size) * r as i64);
            }
        }
        Ok(canvas)
    }
}

fn load_sprite(path: &Path) -> Result<RgbaImage> {
    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|e| PcgError::Asset {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn fit(sprite: RgbaImage, tile_size: u32) -> RgbaImage {
    if sprite.dimensions() == (tile_size, tile_size) {
        sprite
    } else {
        imageops::resize(&sprite, tile_size, tile_size, FilterType::Nearest)
    }
}
