/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::{Path, PathBuf};

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub grid: GridConfig,
    pub viewport: ViewportConfig,
    pub spawn: SpawnConfig,
    pub assets: AssetConfig,
    pub gamepad: GamepadConfig,
    pub log_file: PathBuf,
    pub seed: Option<u64>,
    /// Problems found while loading (parse errors, clamped values).
    /// Collected here because logging starts only after the config is read.
    pub warnings: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridConfig {
    pub width: usize,
    pub height: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewportConfig {
    pub width: usize,
    pub height: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnConfig {
    pub initial_items: usize,
    pub initial_enemies: usize,
    pub refill_items: usize,
}

#[derive(Clone, Debug)]
pub struct AssetConfig {
    pub character_sheet: PathBuf,
    pub tileset: PathBuf,
    pub tile_size: u32,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub quit: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    grid: TomlGrid,
    #[serde(default)]
    viewport: TomlViewport,
    #[serde(default)]
    spawn: TomlSpawn,
    #[serde(default)]
    assets: TomlAssets,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlGrid {
    #[serde(default = "default_grid_size")]
    width: usize,
    #[serde(default = "default_grid_size")]
    height: usize,
}

#[derive(Deserialize, Debug)]
struct TomlViewport {
    #[serde(default = "default_view_w")]
    width: usize,
    #[serde(default = "default_view_h")]
    height: usize,
}

#[derive(Deserialize, Debug)]
struct TomlSpawn {
    #[serde(default = "default_initial_items")]
    initial_items: usize,
    #[serde(default = "default_initial_enemies")]
    initial_enemies: usize,
    #[serde(default = "default_refill_items")]
    refill_items: usize,
}

#[derive(Deserialize, Debug)]
struct TomlAssets {
    #[serde(default = "default_character_sheet")]
    character_sheet: String,
    #[serde(default = "default_tileset")]
    tileset: String,
    #[serde(default = "default_tile_size")]
    tile_size: u32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_quit")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_log_file")]
    log_file: String,
    #[serde(default)]
    seed: Option<u64>,
}

// ── Defaults ──

fn default_grid_size() -> usize { 30 }
fn default_view_w() -> usize { 14 }
fn default_view_h() -> usize { 12 }
fn default_initial_items() -> usize { 10 }
fn default_initial_enemies() -> usize { 10 }
fn default_refill_items() -> usize { 5 }
fn default_character_sheet() -> String { "Resources/Dungeon_Character_2.png".into() }
fn default_tileset() -> String { "Resources/Dungeon_Tileset.png".into() }
fn default_tile_size() -> u32 { 16 }
fn default_quit() -> Vec<String> { vec!["Select".into()] }
fn default_log_file() -> String { "gridgame.log".into() }

/// Largest accepted grid side. Keeps `width * height` well inside `usize`.
pub const MAX_GRID_SIDE: usize = 1024;

impl Default for TomlGrid {
    fn default() -> Self {
        TomlGrid { width: default_grid_size(), height: default_grid_size() }
    }
}

impl Default for TomlViewport {
    fn default() -> Self {
        TomlViewport { width: default_view_w(), height: default_view_h() }
    }
}

impl Default for TomlSpawn {
    fn default() -> Self {
        TomlSpawn {
            initial_items: default_initial_items(),
            initial_enemies: default_initial_enemies(),
            refill_items: default_refill_items(),
        }
    }
}

impl Default for TomlAssets {
    fn default() -> Self {
        TomlAssets {
            character_sheet: default_character_sheet(),
            tileset: default_tileset(),
            tile_size: default_tile_size(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad { quit: default_quit() }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral { log_file: default_log_file(), seed: None }
    }
}

// ── Loading ──

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[], Vec::new())
    }
}

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let mut warnings = Vec::new();
        let toml_cfg = load_toml(&search_dirs, &mut warnings);
        GameConfig::from_toml(toml_cfg, &search_dirs, warnings)
    }

    /// Parse config text directly. Asset paths stay as written.
    #[cfg(test)]
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(GameConfig::from_toml(cfg, &[], Vec::new()))
    }

    fn from_toml(cfg: TomlConfig, search_dirs: &[PathBuf], mut warnings: Vec<String>) -> Self {
        let grid = GridConfig {
            width: cfg.grid.width.clamp(1, MAX_GRID_SIDE),
            height: cfg.grid.height.clamp(1, MAX_GRID_SIDE),
        };
        if grid.width != cfg.grid.width || grid.height != cfg.grid.height {
            warnings.push(format!(
                "grid {}x{} out of range 1..={MAX_GRID_SIDE}, using {}x{}",
                cfg.grid.width, cfg.grid.height, grid.width, grid.height,
            ));
        }

        // The window never exceeds the grid, so the clamp in Viewport always has room.
        let viewport = ViewportConfig {
            width: cfg.viewport.width.clamp(1, grid.width),
            height: cfg.viewport.height.clamp(1, grid.height),
        };
        if viewport.width != cfg.viewport.width || viewport.height != cfg.viewport.height {
            warnings.push(format!(
                "viewport {}x{} does not fit grid {}x{}, using {}x{}",
                cfg.viewport.width, cfg.viewport.height,
                grid.width, grid.height,
                viewport.width, viewport.height,
            ));
        }

        let spawn = clamp_spawn(
            SpawnConfig {
                initial_items: cfg.spawn.initial_items,
                initial_enemies: cfg.spawn.initial_enemies,
                refill_items: cfg.spawn.refill_items,
            },
            grid,
            &mut warnings,
        );

        GameConfig {
            grid,
            viewport,
            spawn,
            assets: AssetConfig {
                character_sheet: resolve_path(&cfg.assets.character_sheet, search_dirs),
                tileset: resolve_path(&cfg.assets.tileset, search_dirs),
                tile_size: cfg.assets.tile_size.max(1),
            },
            gamepad: GamepadConfig { quit: cfg.gamepad.quit },
            log_file: PathBuf::from(cfg.general.log_file),
            seed: cfg.general.seed,
            warnings,
        }
    }
}

/// Items and enemies must leave at least one free cell besides the player,
/// otherwise a bumped enemy has nowhere to go.
fn clamp_spawn(spawn: SpawnConfig, grid: GridConfig, warnings: &mut Vec<String>) -> SpawnConfig {
    let capacity = grid.width.saturating_mul(grid.height).saturating_sub(2);
    let enemies = spawn.initial_enemies.min(capacity);
    let items = spawn.initial_items.min(capacity - enemies);
    let refill = spawn.refill_items.min(capacity - enemies);

    if enemies != spawn.initial_enemies || items != spawn.initial_items || refill != spawn.refill_items {
        warnings.push(format!(
            "spawn counts too large for a {}x{} grid, using items={} enemies={} refill={}",
            grid.width, grid.height, items, enemies, refill,
        ));
    }

    SpawnConfig {
        initial_items: items,
        initial_enemies: enemies,
        refill_items: refill,
    }
}

/// Absolute paths are kept; relative paths are looked up in the candidate
/// directories and default to CWD-relative when no match exists.
fn resolve_path(path: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        return p.to_path_buf();
    }
    search_dirs.iter()
        .map(|d| d.join(p))
        .find(|candidate| candidate.exists())
        .unwrap_or_else(|| p.to_path_buf())
}

/// Candidate directories to search: exe dir + CWD + system paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/gridgame)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/gridgame");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory
    let sys = PathBuf::from("/usr/share/gridgame");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf], warnings: &mut Vec<String>) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        warnings.push(format!(
                            "{} parse error, using default settings: {e}",
                            path.display(),
                        ));
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    warnings.push(format!("could not read {}: {e}", path.display()));
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_gives_defaults() {
        let cfg = GameConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.grid, GridConfig { width: 30, height: 30 });
        assert_eq!(cfg.viewport, ViewportConfig { width: 14, height: 12 });
        assert_eq!(cfg.spawn, SpawnConfig { initial_items: 10, initial_enemies: 10, refill_items: 5 });
        assert_eq!(cfg.assets.tile_size, 16);
        assert_eq!(cfg.assets.tileset, PathBuf::from("Resources/Dungeon_Tileset.png"));
        assert_eq!(cfg.gamepad.quit, vec!["Select".to_string()]);
        assert_eq!(cfg.seed, None);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::from_toml_str("[grid]\nwidth = 40\n\n[general]\nseed = 7\n").unwrap();
        assert_eq!(cfg.grid.width, 40);
        assert_eq!(cfg.grid.height, 30);
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.log_file, PathBuf::from("gridgame.log"));
    }

    #[test]
    fn viewport_is_clamped_to_grid() {
        let cfg = GameConfig::from_toml_str(
            "[grid]\nwidth = 8\nheight = 6\n[viewport]\nwidth = 14\nheight = 12\n",
        ).unwrap();
        assert_eq!(cfg.viewport, ViewportConfig { width: 8, height: 6 });
        assert_eq!(cfg.warnings.len(), 1);
        assert!(cfg.warnings[0].contains("viewport 14x12"));
    }

    #[test]
    fn defaults_report_no_warnings() {
        assert!(GameConfig::from_toml_str("").unwrap().warnings.is_empty());
        assert!(GameConfig::default().warnings.is_empty());
    }

    #[test]
    fn oversized_grid_is_bounded() {
        let cfg = GameConfig::from_toml_str(
            "[grid]\nwidth = 8589934592\nheight = 8589934592\n",
        ).unwrap();
        assert_eq!(cfg.grid, GridConfig { width: MAX_GRID_SIDE, height: MAX_GRID_SIDE });
        assert_eq!(cfg.spawn, SpawnConfig { initial_items: 10, initial_enemies: 10, refill_items: 5 });
        assert!(cfg.warnings.iter().any(|w| w.starts_with("grid 8589934592x8589934592")));
    }

    #[test]
    fn zero_grid_becomes_one_cell() {
        let cfg = GameConfig::from_toml_str("[grid]\nwidth = 0\nheight = 0\n").unwrap();
        assert_eq!(cfg.grid, GridConfig { width: 1, height: 1 });
        assert_eq!(cfg.viewport, ViewportConfig { width: 1, height: 1 });
        assert_eq!(cfg.spawn.initial_items, 0);
        assert_eq!(cfg.spawn.initial_enemies, 0);
    }

    #[test]
    fn spawn_counts_leave_a_free_cell() {
        let cfg = GameConfig::from_toml_str(
            "[grid]\nwidth = 3\nheight = 3\n[viewport]\nwidth = 3\nheight = 3\n\
             [spawn]\ninitial_items = 10\ninitial_enemies = 4\nrefill_items = 9\n",
        ).unwrap();
        assert_eq!(cfg.spawn.initial_enemies, 4);
        assert_eq!(cfg.spawn.initial_items, 3);
        assert_eq!(cfg.spawn.refill_items, 3);
        assert!(cfg.warnings.iter().any(|w| w.starts_with("spawn counts too large")));
    }

    #[test]
    fn unreadable_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "[grid\nwidth = ").unwrap();
        let mut warnings = Vec::new();
        let cfg = load_toml(&[dir.path().to_path_buf()], &mut warnings);
        assert_eq!(cfg.grid.width, 30);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("parse error"));
    }

    #[test]
    fn bad_toml_is_an_error() {
        assert!(GameConfig::from_toml_str("[grid\nwidth = ").is_err());
    }

    #[test]
    fn relative_asset_path_resolves_in_search_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sheet.png"), b"x").unwrap();
        let resolved = resolve_path("sheet.png", &[dir.path().to_path_buf()]);
        assert_eq!(resolved, dir.path().join("sheet.png"));

        let missing = resolve_path("other.png", &[dir.path().to_path_buf()]);
        assert_eq!(missing, PathBuf::from("other.png"));
    }
}
