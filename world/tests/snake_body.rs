use std::time::Duration;

use ascii_wars_core::{
    Cell, CellCoord, Command, Direction, EntityId, EntityKind, GameConfig, Grid, LevelLayout,
    SpawnPlan,
};
use ascii_wars_world::{self as world, query, World};
use proptest::prelude::*;

const ROWS: [&str; 10] = [
    "##########",
    "#........#",
    "#..##....#",
    "#........#",
    "#....#...#",
    "#....#...#",
    "#........#",
    "#..###...#",
    "#........#",
    "##########",
];

fn loaded_world() -> World {
    let mut config = GameConfig::default();
    config.snake.stuck_threshold_ms = 2_400;
    let mut world = World::new(config);
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::LoadLevel {
            layout: LevelLayout {
                level: 4,
                grid: Grid::from_rows(&ROWS),
                start: CellCoord::new(1, 1),
                exit: CellCoord::new(8, 8),
                tokens: vec![CellCoord::new(8, 1)],
                speed_bonuses: Vec::new(),
                spawns: vec![SpawnPlan {
                    kind: EntityKind::Snake,
                    cell: CellCoord::new(6, 4),
                    body: vec![
                        CellCoord::new(6, 5),
                        CellCoord::new(6, 6),
                        CellCoord::new(6, 7),
                    ],
                }],
            },
        },
        &mut events,
    );
    world
}

fn direction() -> impl Strategy<Value = Option<Direction>> {
    prop_oneof![
        Just(None),
        Just(Some(Direction::North)),
        Just(Some(Direction::South)),
        Just(Some(Direction::West)),
        Just(Some(Direction::East)),
    ]
}

fn assert_border_intact(grid: &Grid) {
    for column in 0..grid.columns() {
        for row in 0..grid.rows() {
            let cell = CellCoord::new(column, row);
            if grid.is_border(cell) {
                assert_eq!(grid.cell(cell), Cell::Wall, "border eaten at {cell:?}");
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn snake_body_stays_a_connected_chain(moves in proptest::collection::vec(direction(), 1..120)) {
        let mut world = loaded_world();
        let id = EntityId::new(0);

        for direction in moves {
            let mut events = Vec::new();
            world::apply(&mut world, Command::Tick { dt: Duration::from_secs(5) }, &mut events);
            world::apply(&mut world, Command::StepEntity { entity: id, direction }, &mut events);

            let view = query::entity_view(&world);
            let snake = view.get(id).expect("snake stays in the view");
            prop_assert_eq!(snake.body.len(), 3);

            let mut chain = vec![snake.cell];
            chain.extend(snake.body.iter().copied());
            for pair in chain.windows(2) {
                prop_assert_eq!(pair[0].manhattan_distance(pair[1]), 1);
            }
            let mut unique = chain.clone();
            unique.sort();
            unique.dedup();
            prop_assert_eq!(unique.len(), chain.len());
            for cell in &chain {
                prop_assert!(query::grid(&world).is_walkable_cell(*cell));
            }
        }

        assert_border_intact(query::grid(&world));
    }
}
