//! Plain-text rendering of the current level.

use ascii_wars_core::{Cell, CellCoord, EntityKind};
use ascii_wars_world::{query, World};

const WALL: char = '#';
const FLOOR: char = ' ';
const EXIT_LOCKED: char = 'x';
const EXIT_OPEN: char = 'X';
const TOKEN: char = '*';
const SPEED_BONUS: char = '+';
const PLAYER: char = '@';
const ENEMY: char = 'M';
const SNAKE_HEAD: char = 'S';
const SNAKE_BODY: char = 's';
const CARRIER: char = 'C';
const DISC: char = 'o';

/// Draws terrain, pickups, entities, discs and the player, one text row per grid row.
pub(crate) fn render(world: &World) -> String {
    let grid = query::grid(world);
    let columns = usize::try_from(grid.columns()).unwrap_or(0);
    let mut canvas: Vec<Vec<char>> = (0..grid.rows())
        .map(|row| {
            (0..grid.columns())
                .map(|column| match grid.cell(CellCoord::new(column, row)) {
                    Cell::Wall => WALL,
                    Cell::Floor => FLOOR,
                    Cell::Exit if query::is_exit_unlocked(world) => EXIT_OPEN,
                    Cell::Exit => EXIT_LOCKED,
                })
                .collect()
        })
        .collect();

    let mut plot = |cell: CellCoord, glyph: char| {
        let row = usize::try_from(cell.row()).unwrap_or(usize::MAX);
        let column = usize::try_from(cell.column()).unwrap_or(usize::MAX);
        if let Some(slot) = canvas.get_mut(row).and_then(|line| line.get_mut(column)) {
            *slot = glyph;
        }
    };

    for token in query::tokens(world) {
        plot(*token, TOKEN);
    }
    for bonus in query::speed_bonuses(world) {
        plot(*bonus, SPEED_BONUS);
    }
    for entity in query::entity_view(world).iter().filter(|entity| entity.alive) {
        for segment in &entity.body {
            plot(*segment, SNAKE_BODY);
        }
        let glyph = match entity.kind {
            EntityKind::Enemy => ENEMY,
            EntityKind::Snake => SNAKE_HEAD,
            EntityKind::Carrier => CARRIER,
        };
        plot(entity.cell, glyph);
    }
    for disc in query::discs(world).iter().filter(|disc| disc.active) {
        plot(disc.cell, DISC);
    }
    let player = query::player(world);
    if player.alive {
        plot(player.cell, PLAYER);
    }

    let mut text = String::with_capacity(canvas.len() * (columns + 1));
    for line in canvas {
        text.extend(line);
        text.push('\n');
    }
    text
}
