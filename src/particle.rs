//! records shared with the compute backend
//!
//! Layouts are `#[repr(C)]` + `Pod` so they can be uploaded as raw bytes.

use bevy::prelude::*;
use bytemuck::{Pod, Zeroable};

/// id of a free slot
pub const EMPTY_ID: i32 = -1;

/* ===========================================================
   materials
   =========================================================== */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Material {
    Rock,
    Oil,
    Fire,
    Water,
}

impl Material {
    /// one‑hot fraction vector (x:rock, y:oil, z:fire/smoke, w:water/steam)
    pub fn fractions(self) -> [f32; 4] {
        match self {
            Material::Rock  => [1.0, 0.0, 0.0, 0.0],
            Material::Oil   => [0.0, 1.0, 0.0, 0.0],
            Material::Fire  => [0.0, 0.0, 1.0, 0.0],
            Material::Water => [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/* ===========================================================
   particle
   =========================================================== */
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Particle {
    pub id: i32,
    pub position: [f32; 2],
    pub radius: f32,
    pub velocity: [f32; 2],
    pub mass: f32,
    pub heat: f32,
    pub types: [f32; 4],
}

impl Particle {
    pub const EMPTY: Particle = Particle {
        id: EMPTY_ID,
        position: [0.0; 2],
        radius: 0.0,
        velocity: [0.0; 2],
        mass: 0.0,
        heat: 0.0,
        types: [0.0; 4],
    };

    /// resting particle of a single material; the pool assigns the id
    pub fn new(material: Material, position: Vec2, radius: f32, mass: f32) -> Self {
        Self {
            position: position.to_array(),
            radius,
            mass,
            types: material.fractions(),
            ..Self::EMPTY
        }
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity.to_array();
        self
    }

    pub fn with_heat(mut self, heat: f32) -> Self {
        self.heat = heat;
        self
    }

    /// a slot with id −1 is absent whatever the other fields hold
    #[inline]
    pub fn is_live(&self) -> bool {
        self.id != EMPTY_ID
    }

    pub fn position(&self) -> Vec2 {
        Vec2::from_array(self.position)
    }
}

impl Default for Particle {
    fn default() -> Self {
        Self::EMPTY
    }
}

/* ===========================================================
   grid cell (owned by the backend once uploaded)
   =========================================================== */
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct GridCell {
    pub mass: i32,
    pub heat: i32,
    pub velocity: [i32; 2],
    pub types: [i32; 4],
}
