/// Sprite sheet loading and slicing.
///
/// Sheets are decoded with the `image` crate, sliced into tile-sized
/// sub-images, then box-filtered down to a `SUB` x `SUB` grid of terminal
/// "pixels". The renderer draws two pixel rows per terminal row using
/// upper-half-block glyphs, so one grid cell is `SUB` columns by `SUB / 2`
/// rows on screen.

use std::fmt;
use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::config::AssetConfig;

/// Downsampled sprite edge length, in terminal pixels.
pub const SUB: usize = 4;

/// Sprite positions in tile units: (x, y) on their sheet.
const PLAYER_TILE: (u32, u32) = (0, 0);
const ENEMY_TILE: (u32, u32) = (4, 1);
const ITEM_TILE: (u32, u32) = (6, 8);
const FLOOR_TILE: (u32, u32) = (9, 7);

pub type Rgb = (u8, u8, u8);

// ── Errors ──

#[derive(Debug)]
pub enum AssetError {
    Load { path: PathBuf, source: image::ImageError },
    OutOfBounds { x: u32, y: u32, w: u32, h: u32, sheet_w: u32, sheet_h: u32 },
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::Load { path, source } => {
                write!(f, "failed to load {}: {}", path.display(), source)
            }
            AssetError::OutOfBounds { x, y, w, h, sheet_w, sheet_h } => write!(
                f,
                "sprite {w}x{h} at ({x}, {y}) is outside the {sheet_w}x{sheet_h} sheet",
            ),
        }
    }
}

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AssetError::Load { source, .. } => Some(source),
            AssetError::OutOfBounds { .. } => None,
        }
    }
}

// ── Loading ──

pub fn load_sheet(path: &Path) -> Result<RgbaImage, AssetError> {
    let img = image::open(path).map_err(|source| AssetError::Load {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(img.to_rgba8())
}

/// Cut a `w` x `h` sub-image at pixel `(x, y)`.
pub fn slice(sheet: &RgbaImage, x: u32, y: u32, w: u32, h: u32) -> Result<RgbaImage, AssetError> {
    let (sheet_w, sheet_h) = sheet.dimensions();
    let fits = x.checked_add(w).is_some_and(|r| r <= sheet_w)
        && y.checked_add(h).is_some_and(|b| b <= sheet_h);
    if !fits || w == 0 || h == 0 {
        return Err(AssetError::OutOfBounds { x, y, w, h, sheet_w, sheet_h });
    }
    Ok(image::imageops::crop_imm(sheet, x, y, w, h).to_image())
}

// ── Sprite ──

/// A sprite reduced to `SUB` x `SUB` pixels. `None` is transparent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sprite {
    pixels: [[Option<Rgb>; SUB]; SUB],
}

impl Sprite {
    /// Box-filter `img` down to `SUB` x `SUB`. A target pixel is opaque when
    /// at least half of its source block is, and takes the mean of the
    /// opaque source pixels.
    pub fn from_image(img: &RgbaImage) -> Self {
        let (w, h) = img.dimensions();
        let mut pixels = [[None; SUB]; SUB];

        for (ty, row) in pixels.iter_mut().enumerate() {
            let y0 = ty as u32 * h / SUB as u32;
            let y1 = ((ty as u32 + 1) * h / SUB as u32).max(y0 + 1).min(h);
            for (tx, px) in row.iter_mut().enumerate() {
                let x0 = tx as u32 * w / SUB as u32;
                let x1 = ((tx as u32 + 1) * w / SUB as u32).max(x0 + 1).min(w);

                let mut sum = [0u32; 3];
                let mut opaque = 0u32;
                let mut total = 0u32;
                for sy in y0..y1 {
                    for sx in x0..x1 {
                        let p = img.get_pixel(sx, sy);
                        total += 1;
                        if p[3] >= 128 {
                            opaque += 1;
                            sum[0] += p[0] as u32;
                            sum[1] += p[1] as u32;
                            sum[2] += p[2] as u32;
                        }
                    }
                }

                if total > 0 && opaque * 2 >= total {
                    *px = Some((
                        (sum[0] / opaque) as u8,
                        (sum[1] / opaque) as u8,
                        (sum[2] / opaque) as u8,
                    ));
                }
            }
        }

        Sprite { pixels }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        self.pixels.get(y).and_then(|row| row.get(x)).copied().flatten()
    }
}

/// The four sprites the game draws.
#[derive(Clone, Debug)]
pub struct SpriteSet {
    pub player: Sprite,
    pub enemy: Sprite,
    pub item: Sprite,
    pub floor: Sprite,
}

impl SpriteSet {
    pub fn load(cfg: &AssetConfig) -> Result<Self, AssetError> {
        let chars = load_sheet(&cfg.character_sheet)?;
        let tiles = load_sheet(&cfg.tileset)?;
        let t = cfg.tile_size;

        let cut = |sheet: &RgbaImage, (tx, ty): (u32, u32)| -> Result<Sprite, AssetError> {
            let img = slice(sheet, tx * t, ty * t, t, t)?;
            Ok(Sprite::from_image(&img))
        };

        Ok(SpriteSet {
            player: cut(&chars, PLAYER_TILE)?,
            enemy: cut(&chars, ENEMY_TILE)?,
            item: cut(&tiles, ITEM_TILE)?,
            floor: cut(&tiles, FLOOR_TILE)?,
        })
    }
}
