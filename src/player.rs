//! player record, input, jet‑pack exhaust and trace aiming
//!
//! Player physics runs on the backend; the host only writes intent and
//! reads the record back once per frame.

use bevy::input::ButtonInput;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bytemuck::{Pod, Zeroable};
use rand::Rng;

use crate::camera::{DisplayCamera, Viewport};
use crate::constants::*;
use crate::particle::{Material, Particle};
use crate::pool::ParticlePool;

/* ===========================================================
   records mirrored to / from the backend
   =========================================================== */
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PlayerRecord {
    pub position: [f32; 2],
    pub velocity: [f32; 2],
    /// x: walk velocity, y: jump impulse (0 when idle)
    pub input: [f32; 2],
    pub radius: f32,
    /// written by the backend
    pub grounded: i32,
}

impl PlayerRecord {
    pub fn at(position: Vec2) -> Self {
        Self {
            position: position.to_array(),
            radius: PLAYER_RADIUS,
            ..default()
        }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::from_array(self.position)
    }

    pub fn grounded(&self) -> bool {
        self.grounded != 0
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct TracePoint {
    pub position: [f32; 2],
    /// grid mass found at `position`, filled by the trace pass
    pub mass: f32,
    /// non‑zero once the ray has hit solid material
    pub hit: i32,
}

/* ===========================================================
   resources
   =========================================================== */
#[derive(Resource, Clone, Debug, Default)]
pub struct PlayerState {
    pub record: PlayerRecord,
    pub jetpack: bool,
}

/// fixed‑size ray from the player towards the cursor
#[derive(Resource, Clone, Debug)]
pub struct TraceState {
    pub points: Vec<TracePoint>,
    pub active: bool,
}

impl Default for TraceState {
    fn default() -> Self {
        Self {
            points: vec![TracePoint::default(); TRACE_LEN],
            active: false,
        }
    }
}

impl TraceState {
    /// spread the trace points evenly from `origin` to `target`
    pub fn aim(&mut self, origin: Vec2, target: Vec2) {
        let last = (self.points.len().max(2) - 1) as f32;
        for (i, point) in self.points.iter_mut().enumerate() {
            *point = TracePoint {
                position: origin.lerp(target, i as f32 / last).to_array(),
                ..default()
            };
        }
        self.active = true;
    }
}

/// Insert `EXHAUST_RATE` hot smoke particles under the player.
pub fn emit_exhaust<R: Rng>(record: &PlayerRecord, pool: &mut ParticlePool, rng: &mut R) {
    let feet = record.position() + Vec2::new(0.0, record.radius);
    for _ in 0..EXHAUST_RATE {
        let particle = Particle::new(
            Material::Fire,
            feet + Vec2::new(rng.gen_range(-2.0..2.0), 0.0),
            EXHAUST_RADIUS,
            EXHAUST_MASS,
        )
        .with_velocity(Vec2::new(
            rng.gen_range(EXHAUST_SPEED_X),
            rng.gen_range(EXHAUST_SPEED_Y),
        ))
        .with_heat(EXHAUST_HEAT);
        pool.insert_one(particle);
    }
}

/* ===========================================================
   input (A / D / Space)
   =========================================================== */
pub fn player_input_system(keys: Res<ButtonInput<KeyCode>>, mut player: ResMut<PlayerState>) {
    let walk = match (keys.pressed(KeyCode::KeyA), keys.pressed(KeyCode::KeyD)) {
        (true, false) => -WALK_SPEED,
        (false, true) => WALK_SPEED,
        _ => 0.0,
    };
    let grounded = player.record.grounded();
    let jump = if keys.just_pressed(KeyCode::Space) && grounded {
        JUMP_SPEED
    } else {
        0.0
    };
    player.record.input = [walk, jump];
    player.jetpack = keys.pressed(KeyCode::Space) && !grounded;
}

/* ===========================================================
   jet‑pack exhaust
   =========================================================== */
pub fn exhaust_emit_system(player: Res<PlayerState>, mut pool: ResMut<ParticlePool>) {
    if player.jetpack {
        emit_exhaust(&player.record, &mut pool, &mut rand::thread_rng());
    }
}

/* ===========================================================
   trace aiming (hold LMB)
   =========================================================== */
pub fn trace_aim_system(
    mouse: Res<ButtonInput<MouseButton>>,
    window_q: Query<&Window, With<PrimaryWindow>>,
    display: Res<DisplayCamera>,
    viewport: Res<Viewport>,
    player: Res<PlayerState>,
    mut trace: ResMut<TraceState>,
) {
    trace.active = false;
    if !mouse.pressed(MouseButton::Left) {
        return;
    }
    let Ok(window) = window_q.get_single() else { return };
    let Some(cursor) = window.physical_cursor_position() else { return };

    let target = display.0.screen_to_world(cursor, viewport.0.as_vec2());
    trace.aim(player.record.position(), target);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::num::NonZeroUsize;

    #[test]
    fn record_layouts() {
        assert_eq!(std::mem::size_of::<PlayerRecord>(), 32);
        assert_eq!(std::mem::size_of::<TracePoint>(), 16);
    }

    #[test]
    fn trace_spans_origin_to_target() {
        let mut trace = TraceState::default();
        trace.aim(Vec2::ZERO, Vec2::new(63.0, 0.0));
        assert!(trace.active);
        assert_eq!(trace.points.len(), TRACE_LEN);
        assert_eq!(trace.points[0].position, [0.0, 0.0]);
        assert_eq!(trace.points[TRACE_LEN - 1].position, [63.0, 0.0]);
        assert_eq!(trace.points[1].position, [1.0, 0.0]);
    }

    #[test]
    fn exhaust_lands_in_recyclable_region() {
        let mut pool = ParticlePool::new(NonZeroUsize::new(32).unwrap());
        pool.insert_many(&mut vec![Particle::default(); 20]).unwrap();
        pool.lock_floor();
        let record = PlayerRecord::at(Vec2::new(100.0, 100.0));
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..4 {
            emit_exhaust(&record, &mut pool, &mut rng);
        }
        let slots = pool.as_slice();
        assert!(slots[..20].iter().all(|p| p.types == [0.0; 4]));
        let fire: Vec<_> = slots[20..].iter().filter(|p| p.types[2] == 1.0).collect();
        assert_eq!(fire.len(), 12);
        assert!(fire.iter().all(|p| p.velocity[1] > 0.0 && p.heat == EXHAUST_HEAT));
    }
}
