use crate::app::{ParticleSource, RenderContext};
use crate::worldgen::Terrain;
use crate::Vec2;

use super::entity::WorldCommands;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Tile whose unit square contains `position`.
    pub fn containing(position: Vec2) -> Self {
        Self {
            x: position.x.floor() as i32,
            y: position.y.floor() as i32,
        }
    }

    pub fn offset(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    pub fn origin(self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
    }

    pub fn center(self) -> Vec2 {
        Vec2::new(self.x as f32 + 0.5, self.y as f32 + 0.5)
    }
}

/// Neighbour directions, cardinals clockwise from north then diagonals clockwise from
/// north-west. North is negative y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    East,
    South,
    West,
    NorthWest,
    NorthEast,
    SouthEast,
    SouthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::NorthWest,
        Direction::NorthEast,
        Direction::SouthEast,
        Direction::SouthWest,
    ];

    pub const CARDINALS: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub const DIAGONALS: [Direction; 4] = [
        Direction::NorthWest,
        Direction::NorthEast,
        Direction::SouthEast,
        Direction::SouthWest,
    ];

    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (-1, -1),
            Direction::NorthEast => (1, -1),
            Direction::SouthEast => (1, 1),
            Direction::SouthWest => (-1, 1),
        }
    }

    const fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
            Direction::NorthWest => 4,
            Direction::NorthEast => 5,
            Direction::SouthEast => 6,
            Direction::SouthWest => 7,
        }
    }

    /// The two cardinals that flank a diagonal; `None` for cardinals.
    pub const fn flanking_cardinals(self) -> Option<(Direction, Direction)> {
        match self {
            Direction::NorthWest => Some((Direction::North, Direction::West)),
            Direction::NorthEast => Some((Direction::North, Direction::East)),
            Direction::SouthEast => Some((Direction::South, Direction::East)),
            Direction::SouthWest => Some((Direction::South, Direction::West)),
            _ => None,
        }
    }
}

/// The eight optional neighbours of a tile, in [`Direction::ALL`] order.
#[derive(Clone, Copy)]
pub struct Neighbors<'a> {
    tiles: [Option<&'a dyn Tile>; 8],
}

impl<'a> Neighbors<'a> {
    pub(crate) fn from_lookup<F>(coord: TileCoord, mut lookup: F) -> Self
    where
        F: FnMut(TileCoord) -> Option<&'a dyn Tile>,
    {
        Self {
            tiles: Direction::ALL.map(|direction| lookup(coord.offset(direction))),
        }
    }

    pub fn empty() -> Self {
        Self { tiles: [None; 8] }
    }

    pub fn get(&self, direction: Direction) -> Option<&'a dyn Tile> {
        self.tiles[direction.index()]
    }

    pub fn terrain(&self, direction: Direction) -> Option<Terrain> {
        self.get(direction).and_then(|tile| tile.terrain())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Direction, Option<&'a dyn Tile>)> + '_ {
        Direction::ALL
            .iter()
            .map(move |direction| (*direction, self.get(*direction)))
    }
}

/// Grid-locked world object. Drawing happens in tile-local space: `(0, 0)` is the tile's
/// top-left corner and `(1, 1)` its bottom-right.
pub trait Tile {
    fn layer(&self) -> i32 {
        0
    }

    fn is_solid(&self) -> bool {
        false
    }

    fn terrain(&self) -> Option<Terrain> {
        None
    }

    fn update(&mut self, _dt: f32) {}

    fn draw(&self, ctx: &mut RenderContext, neighbors: &Neighbors<'_>);

    fn on_click(&mut self, _world_pos: Vec2, _commands: &mut WorldCommands<'_>) {}

    fn particle_source(&self) -> Option<ParticleSource> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containing_floors_negative_coordinates() {
        assert_eq!(TileCoord::containing(Vec2::new(-0.5, 2.9)), TileCoord::new(-1, 2));
        assert_eq!(TileCoord::containing(Vec2::new(3.0, -3.0)), TileCoord::new(3, -3));
    }

    #[test]
    fn directions_are_distinct_unit_offsets() {
        let mut seen = std::collections::HashSet::new();
        for direction in Direction::ALL {
            let (dx, dy) = direction.delta();
            assert!(dx.abs() <= 1 && dy.abs() <= 1 && (dx, dy) != (0, 0));
            assert!(seen.insert((dx, dy)), "direction={direction:?}");
        }
    }

    #[test]
    fn diagonals_flank_matching_cardinals() {
        for diagonal in Direction::DIAGONALS {
            let (a, b) = diagonal.flanking_cardinals().expect("diagonal");
            let (dx, dy) = diagonal.delta();
            let (ax, ay) = a.delta();
            let (bx, by) = b.delta();
            assert_eq!((ax + bx, ay + by), (dx, dy));
        }
        assert!(Direction::North.flanking_cardinals().is_none());
    }
}
