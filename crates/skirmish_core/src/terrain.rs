//! Tile grid: terrain classification and the fog-of-war layer.
//!
//! Tiles are addressed by `(col, row)` with signed coordinates so callers can
//! ask about positions off the edge of the map; every out-of-bounds query is
//! answered as impassable and not visible.

use serde::{Deserialize, Serialize};

use crate::math::{Fixed, Vec2Fixed};

/// Terrain classification of a single tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Tile {
    /// Open ground.
    #[default]
    Open,
    /// River water (impassable).
    Water,
    /// Bridge deck over water.
    Bridge,
    /// Cliff face (impassable).
    Cliff,
    /// Road surface.
    Road,
    /// Single-tile stand of trees.
    Forest,
    /// Settlement building lot.
    Settlement,
}

impl Tile {
    /// Returns true if ground units can enter this tile.
    #[must_use]
    pub const fn is_passable(self) -> bool {
        !matches!(self, Self::Water | Self::Cliff)
    }
}

/// Terrain and visibility for the whole battlefield.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridMap {
    /// Grid width in tiles.
    width: u32,
    /// Grid height in tiles.
    height: u32,
    /// Size of each tile in pixels.
    tile_size: u32,
    /// Terrain stored in row-major order.
    tiles: Vec<Tile>,
    /// Fog layer in row-major order; `true` means never seen.
    shrouded: Vec<bool>,
}

impl GridMap {
    /// Create a map of open ground, fully shrouded.
    ///
    /// # Panics
    ///
    /// Panics if `width`, `height` or `tile_size` is zero.
    #[must_use]
    pub fn new(width: u32, height: u32, tile_size: u32) -> Self {
        assert!(width > 0, "GridMap width must be positive");
        assert!(height > 0, "GridMap height must be positive");
        assert!(tile_size > 0, "GridMap tile_size must be positive");

        let cell_count = (width as usize) * (height as usize);
        Self {
            width,
            height,
            tile_size,
            tiles: vec![Tile::Open; cell_count],
            shrouded: vec![true; cell_count],
        }
    }

    /// Grid width in tiles.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in tiles.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Tile size in pixels.
    #[must_use]
    pub const fn tile_size(&self) -> u32 {
        self.tile_size
    }

    #[inline]
    fn index(&self, col: i32, row: i32) -> Option<usize> {
        if self.in_bounds(col, row) {
            Some((row as usize) * (self.width as usize) + (col as usize))
        } else {
            None
        }
    }

    /// Check if tile coordinates are within the grid.
    #[must_use]
    pub fn in_bounds(&self, col: i32, row: i32) -> bool {
        col >= 0 && row >= 0 && (col as u32) < self.width && (row as u32) < self.height
    }

    /// Terrain at tile coordinates, `None` outside the grid.
    #[must_use]
    pub fn tile(&self, col: i32, row: i32) -> Option<Tile> {
        self.index(col, row).map(|i| self.tiles[i])
    }

    /// Terrain under a pixel position.
    #[must_use]
    pub fn tile_at(&self, point: Vec2Fixed) -> Option<Tile> {
        let (col, row) = self.pixel_to_tile(point);
        self.tile(col, row)
    }

    /// Overwrite a tile. Returns `false` if out of bounds.
    ///
    /// Only map generation and test setup mutate terrain.
    pub fn set_tile(&mut self, col: i32, row: i32, tile: Tile) -> bool {
        match self.index(col, row) {
            Some(i) => {
                self.tiles[i] = tile;
                true
            }
            None => false,
        }
    }

    /// Whether ground units may occupy the tile. False outside the grid.
    #[must_use]
    pub fn is_tile_passable(&self, col: i32, row: i32) -> bool {
        self.tile(col, row).is_some_and(Tile::is_passable)
    }

    /// Whether the tile under a pixel position is passable.
    #[must_use]
    pub fn is_pixel_passable(&self, point: Vec2Fixed) -> bool {
        self.tile_at(point).is_some_and(Tile::is_passable)
    }

    /// Tile coordinates containing a pixel position (floor division).
    #[must_use]
    pub fn pixel_to_tile(&self, point: Vec2Fixed) -> (i32, i32) {
        let size = Fixed::from_num(self.tile_size);
        let col = (point.x / size).floor().to_num::<i32>();
        let row = (point.y / size).floor().to_num::<i32>();
        (col, row)
    }

    /// Pixel position of a tile's center.
    #[must_use]
    pub fn tile_center(&self, col: i32, row: i32) -> Vec2Fixed {
        let size = Fixed::from_num(self.tile_size);
        let half = size / 2;
        Vec2Fixed::new(
            Fixed::from_num(col) * size + half,
            Fixed::from_num(row) * size + half,
        )
    }

    /// Whether a tile has never been seen. True outside the grid.
    #[must_use]
    pub fn is_shrouded(&self, col: i32, row: i32) -> bool {
        self.index(col, row).map_or(true, |i| self.shrouded[i])
    }

    /// Whether the tile under a pixel position has been revealed.
    #[must_use]
    pub fn is_pixel_visible(&self, point: Vec2Fixed) -> bool {
        let (col, row) = self.pixel_to_tile(point);
        !self.is_shrouded(col, row)
    }

    /// Number of tiles revealed so far.
    #[must_use]
    pub fn revealed_count(&self) -> usize {
        self.shrouded.iter().filter(|s| !**s).count()
    }

    /// Row-major fog layer (`true` = shrouded).
    #[must_use]
    pub fn shroud(&self) -> &[bool] {
        &self.shrouded
    }

    /// Row-major terrain layer.
    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Permanently lift the fog around a pixel position.
    ///
    /// The radius is converted to whole tiles (rounded up) and every tile
    /// whose offset from the tile holding `point` lies inside that circle is
    /// revealed. Revealed tiles never return to the shroud.
    pub fn reveal(&mut self, point: Vec2Fixed, radius: Fixed) {
        if radius < Fixed::ZERO {
            return;
        }
        let (center_col, center_row) = self.pixel_to_tile(point);
        let range = (radius / Fixed::from_num(self.tile_size))
            .ceil()
            .to_num::<i32>();
        let range_sq = range * range;

        for row in (center_row - range)..=(center_row + range) {
            for col in (center_col - range)..=(center_col + range) {
                let dx = col - center_col;
                let dy = row - center_row;
                if dx * dx + dy * dy > range_sq {
                    continue;
                }
                if let Some(i) = self.index(col, row) {
                    self.shrouded[i] = false;
                }
            }
        }
    }
}

impl Default for GridMap {
    /// A 40x30 tile map with 32 pixel tiles.
    fn default() -> Self {
        Self::new(40, 30, 32)
    }
}
