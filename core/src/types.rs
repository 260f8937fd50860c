use serde::{Deserialize, Serialize};
use std::fmt;

/* ===================== Handles ===================== */

/// Index of a task inside the application's task arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(pub usize);

/// Index of a scheduler inside the application's scheduler arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SchedulerId(pub usize);

/// Opaque handle to a unit owned by the world collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(pub u32);

/// Opaque handle to a faction owned by the world collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FactionId(pub u32);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

impl fmt::Display for SchedulerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scheduler#{}", self.0)
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit#{}", self.0)
    }
}

impl fmt::Display for FactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "faction#{}", self.0)
    }
}

/* ===================== Coordinates ===================== */

/// Integer coordinate of one cube in the world grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cube {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl Cube {
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance between cube coordinates
    pub fn distance(&self, other: &Cube) -> f64 {
        let dx = self.x as f64 - other.x as f64;
        let dy = self.y as f64 - other.y as f64;
        let dz = self.z as f64 - other.z as f64;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// The face-sharing neighbours, in a fixed order
    ///
    /// Neighbours whose coordinates would overflow are left out.
    pub fn directly_adjacent(&self) -> Vec<Cube> {
        let Cube { x, y, z } = *self;
        [
            x.checked_sub(1).map(|x| Cube::new(x, y, z)),
            x.checked_add(1).map(|x| Cube::new(x, y, z)),
            y.checked_sub(1).map(|y| Cube::new(x, y, z)),
            y.checked_add(1).map(|y| Cube::new(x, y, z)),
            z.checked_sub(1).map(|z| Cube::new(x, y, z)),
            z.checked_add(1).map(|z| Cube::new(x, y, z)),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// True if `other` shares a face with this cube or is this cube
    pub fn touches(&self, other: &Cube) -> bool {
        let d = self
            .x
            .abs_diff(other.x)
            .saturating_add(self.y.abs_diff(other.y))
            .saturating_add(self.z.abs_diff(other.z));
        d <= 1
    }
}

impl fmt::Display for Cube {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/* ===================== Terrain ===================== */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TerrainKind {
    #[default]
    Air,
    Rock,
    Tree,
    Workshop,
}

impl TerrainKind {
    pub fn is_passable(self) -> bool {
        matches!(self, TerrainKind::Air | TerrainKind::Workshop)
    }
}

/// What the world reports about a single in-bounds cube
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CubeInfo {
    pub terrain: TerrainKind,
    pub is_passable: bool,
}

impl From<TerrainKind> for CubeInfo {
    fn from(terrain: TerrainKind) -> Self {
        Self {
            terrain,
            is_passable: terrain.is_passable(),
        }
    }
}

/* ===================== Unit actions ===================== */

/// Progress of the action a unit collaborator is currently carrying out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    InProgress,
    Completed,
    Failed,
}
