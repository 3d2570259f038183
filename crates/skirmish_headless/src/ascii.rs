//! ASCII battlefield renderer for quick terminal review.
//!
//! One character per tile. Coalition units are upper case, insurgents lower
//! case; unexplored tiles are blank.

use std::fmt::Write as _;

use skirmish_core::archetype::Archetype;
use skirmish_core::factions::Faction;
use skirmish_core::simulation::Simulation;
use skirmish_core::terrain::Tile;

/// ASCII rendering configuration.
#[derive(Debug, Clone)]
pub struct AsciiConfig {
    /// Draw tiles that have not been explored yet.
    pub reveal_all: bool,
    /// Show the legend and roster counts.
    pub show_legend: bool,
    /// Use colored output (ANSI).
    pub use_color: bool,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            reveal_all: false,
            show_legend: true,
            use_color: false,
        }
    }
}

/// ANSI color codes.
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BLUE: &str = "\x1b[34m";
    pub const RED: &str = "\x1b[31m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";
}

fn tile_char(tile: Tile) -> char {
    match tile {
        Tile::Open => '.',
        Tile::Water => '~',
        Tile::Bridge => '=',
        Tile::Cliff => '#',
        Tile::Road => ':',
        Tile::Forest => '"',
        Tile::Settlement => '+',
    }
}

fn unit_char(archetype: Archetype, faction: Faction) -> char {
    let base = match archetype {
        Archetype::Minigunner => 'm',
        Archetype::Humvee => 'h',
        Archetype::MediumTank => 't',
        Archetype::Apc => 'a',
        Archetype::Buggy => 'b',
        Archetype::LightTank => 'l',
        Archetype::RocketInfantry => 'r',
        Archetype::Turret => 'g',
    };
    if faction.is_player_controlled() {
        base.to_ascii_uppercase()
    } else {
        base
    }
}

fn faction_color(faction: Faction) -> &'static str {
    match faction {
        Faction::Coalition => colors::BLUE,
        Faction::Insurgents => colors::RED,
        Faction::Civilian => colors::YELLOW,
    }
}

/// Render the battlefield as text.
#[must_use]
pub fn render_battlefield(sim: &Simulation, config: &AsciiConfig) -> String {
    let map = sim.map();
    let width = map.width() as usize;
    let height = map.height() as usize;

    let mut grid: Vec<Vec<(char, &'static str)>> = (0..height)
        .map(|row| {
            (0..width)
                .map(|col| {
                    let (col, row) = (col as i32, row as i32);
                    if !config.reveal_all && map.is_shrouded(col, row) {
                        (' ', "")
                    } else {
                        let tile = map.tile(col, row).unwrap_or_default();
                        let color = if tile.is_passable() { "" } else { colors::CYAN };
                        (tile_char(tile), color)
                    }
                })
                .collect()
        })
        .collect();

    let (obj_col, obj_row) = map.pixel_to_tile(sim.objective().center);
    if let Some(cell) = cell_mut(&mut grid, obj_col, obj_row) {
        *cell = ('*', colors::YELLOW);
    }

    for projectile in sim.projectiles() {
        let (col, row) = map.pixel_to_tile(projectile.position);
        if let Some(cell) = cell_mut(&mut grid, col, row) {
            *cell = ('`', colors::GRAY);
        }
    }

    for unit in sim.units() {
        let (col, row) = map.pixel_to_tile(unit.position);
        let spotted = config.reveal_all || map.is_pixel_visible(unit.position);
        if !spotted {
            continue;
        }
        if let Some(cell) = cell_mut(&mut grid, col, row) {
            *cell = (unit_char(unit.archetype, unit.faction), faction_color(unit.faction));
        }
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "+-- tick {} | {} | t={:.1}s --",
        sim.tick(),
        sim.mission_state().name(),
        sim.clock_ms().to_num::<f64>() / 1000.0
    );
    for row in &grid {
        out.push('|');
        for (ch, color) in row {
            if config.use_color && !color.is_empty() {
                out.push_str(color);
                out.push(*ch);
                out.push_str(colors::RESET);
            } else {
                out.push(*ch);
            }
        }
        out.push_str("|\n");
    }
    out.push('+');
    out.push_str(&"-".repeat(width));
    out.push_str("+\n");

    if config.show_legend {
        out.push_str("M/m minigunner  H humvee  T/t tank  A apc  b buggy  l light tank\n");
        out.push_str("r rockets  g turret  * objective  ~ water  = bridge  # cliff\n");
        let _ = writeln!(
            out,
            "{}: {}  {}: {}  in flight: {}",
            Faction::Coalition.display_name(),
            sim.faction_strength(Faction::Coalition),
            Faction::Insurgents.display_name(),
            sim.faction_strength(Faction::Insurgents),
            sim.projectiles().len()
        );
    }
    out
}

fn cell_mut<T>(grid: &mut [Vec<T>], col: i32, row: i32) -> Option<&mut T> {
    let row = usize::try_from(row).ok()?;
    let col = usize::try_from(col).ok()?;
    grid.get_mut(row)?.get_mut(col)
}
