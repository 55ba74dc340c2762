use crate::constants::*;
use crate::location::*;
use bitflags::*;
use fnv::FnvHasher;
use serde::{Deserialize, Serialize};
use std::hash::Hasher;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct TerrainFlags: u8 {
        const NONE = 0;
        const WALL = 1;
        const SWAMP = 2;
    }
}

/// Walkability classification of a single tile.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainTile {
    Plain,
    Swamp,
    Wall,
}

impl From<TerrainFlags> for TerrainTile {
    fn from(flags: TerrainFlags) -> Self {
        if flags.contains(TerrainFlags::WALL) {
            TerrainTile::Wall
        } else if flags.contains(TerrainFlags::SWAMP) {
            TerrainTile::Swamp
        } else {
            TerrainTile::Plain
        }
    }
}

/// Read-only terrain of one region, one flag byte per tile in row-major order.
#[derive(Clone)]
pub struct FastRoomTerrain {
    buffer: Vec<u8>,
}

impl FastRoomTerrain {
    /// Wraps a raw terrain buffer. Missing trailing tiles are treated as walls.
    pub fn new(mut buffer: Vec<u8>) -> FastRoomTerrain {
        buffer.resize(ROOM_AREA, TerrainFlags::WALL.bits());
        FastRoomTerrain { buffer }
    }

    /// Builds terrain from a per-tile classifier, mainly for synthetic regions.
    pub fn from_fn<F>(classify: F) -> FastRoomTerrain
    where
        F: Fn(u8, u8) -> TerrainTile,
    {
        let mut buffer = Vec::with_capacity(ROOM_AREA);
        for y in 0..ROOM_HEIGHT {
            for x in 0..ROOM_WIDTH {
                let flags = match classify(x, y) {
                    TerrainTile::Plain => TerrainFlags::NONE,
                    TerrainTile::Swamp => TerrainFlags::SWAMP,
                    TerrainTile::Wall => TerrainFlags::WALL,
                };
                buffer.push(flags.bits());
            }
        }
        FastRoomTerrain { buffer }
    }

    pub fn get(&self, pos: &Location) -> TerrainFlags {
        self.get_xy(pos.x(), pos.y())
    }

    pub fn get_xy(&self, x: u8, y: u8) -> TerrainFlags {
        let index = (y as usize * ROOM_WIDTH as usize) + (x as usize);
        TerrainFlags::from_bits_truncate(self.buffer[index])
    }

    pub fn get_tile(&self, x: u8, y: u8) -> TerrainTile {
        self.get_xy(x, y).into()
    }

    pub fn is_wall(&self, x: u8, y: u8) -> bool {
        self.get_xy(x, y).contains(TerrainFlags::WALL)
    }

    pub fn is_wall_at(&self, loc: Location) -> bool {
        self.is_wall(loc.x(), loc.y())
    }

    pub fn is_swamp(&self, x: u8, y: u8) -> bool {
        self.get_xy(x, y).contains(TerrainFlags::SWAMP)
    }

    pub fn has_walkable_tile(&self) -> bool {
        self.buffer
            .iter()
            .any(|b| !TerrainFlags::from_bits_truncate(*b).contains(TerrainFlags::WALL))
    }

    /// Stable FNV-1a hash of the terrain, used to detect terrain changes.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = FnvHasher::default();
        hasher.write(&self.buffer);
        hasher.finish()
    }
}

/// A 50x50 array for room-sized data.
#[derive(Clone, Debug, PartialEq)]
pub struct RoomDataArray<T: Copy> {
    data: Vec<T>,
}

impl<T: Copy> RoomDataArray<T> {
    pub fn new(initial: T) -> Self {
        RoomDataArray {
            data: vec![initial; ROOM_AREA],
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &T {
        let index = y * (ROOM_WIDTH as usize) + x;
        &self.data[index]
    }

    #[inline]
    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        let index = y * (ROOM_WIDTH as usize) + x;
        &mut self.data[index]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        *self.get_mut(x, y) = value;
    }

    #[inline]
    pub fn at(&self, loc: Location) -> T {
        self.data[loc.index()]
    }

    #[inline]
    pub fn set_at(&mut self, loc: Location, value: T) {
        self.data[loc.index()] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &T)> {
        self.data.iter().enumerate().map(|(i, v)| {
            let x = i % (ROOM_WIDTH as usize);
            let y = i / (ROOM_WIDTH as usize);
            ((x, y), v)
        })
    }
}

impl<T: Copy + Serialize> Serialize for RoomDataArray<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.data.serialize(serializer)
    }
}

impl<'de, T: Copy + Deserialize<'de>> Deserialize<'de> for RoomDataArray<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let data = Vec::<T>::deserialize(deserializer)?;
        if data.len() != ROOM_AREA {
            return Err(serde::de::Error::custom("Invalid room data array size"));
        }
        Ok(RoomDataArray { data })
    }
}

/// Neighbor offsets for 8-directional movement.
pub const NEIGHBORS_8: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
];

/// Neighbor offsets for 4-directional (cardinal) movement.
pub const NEIGHBORS_4: [(i8, i8); 4] = [(-1, 0), (0, 1), (1, 0), (0, -1)];

/// Diagonal offsets in the order NW, NE, SE, SW.
pub const DIAGONALS: [(i8, i8); 4] = [(-1, -1), (1, -1), (1, 1), (-1, 1)];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_tiles() {
        let terrain = FastRoomTerrain::from_fn(|x, y| match (x, y) {
            (1, 1) => TerrainTile::Wall,
            (2, 1) => TerrainTile::Swamp,
            _ => TerrainTile::Plain,
        });
        assert_eq!(terrain.get_tile(1, 1), TerrainTile::Wall);
        assert_eq!(terrain.get_tile(2, 1), TerrainTile::Swamp);
        assert_eq!(terrain.get_tile(3, 1), TerrainTile::Plain);
        assert!(terrain.is_swamp(2, 1));
        assert!(!terrain.is_wall(2, 1));
    }

    #[test]
    fn short_buffers_are_padded_with_walls() {
        let terrain = FastRoomTerrain::new(vec![0; 10]);
        assert!(!terrain.is_wall(9, 0));
        assert!(terrain.is_wall(10, 0));
        assert!(terrain.is_wall(49, 49));
    }

    #[test]
    fn fingerprint_tracks_terrain_changes() {
        let open = FastRoomTerrain::from_fn(|_, _| TerrainTile::Plain);
        let same = FastRoomTerrain::from_fn(|_, _| TerrainTile::Plain);
        let walled = FastRoomTerrain::from_fn(|x, _| {
            if x == 5 {
                TerrainTile::Wall
            } else {
                TerrainTile::Plain
            }
        });
        assert_eq!(open.fingerprint(), same.fingerprint());
        assert_ne!(open.fingerprint(), walled.fingerprint());
    }

    #[test]
    fn room_data_array_round_trips_through_json() {
        let mut grid = RoomDataArray::new(0u8);
        grid.set(3, 4, 7);
        let json = serde_json::to_string(&grid).unwrap();
        let back: RoomDataArray<u8> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.at(Location::from_xy(3, 4)), 7);
        assert!(serde_json::from_str::<RoomDataArray<u8>>("[1,2,3]").is_err());
    }
}
