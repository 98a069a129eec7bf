use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::config::LevelConfig;
use crate::constants::*;
use crate::player::PlayerState;

/// pixel snapping helper – keeps the camera centre on whole pixels so
/// particles never land on half‑pixels and shimmer
#[inline]
fn snap(v: f32, zoom: f32) -> f32 {
    (v / zoom).round() * zoom
}

/// World‑space focus point plus world units per pixel.
///
/// This is the authoritative camera that game logic moves around. The
/// renderer only ever sees its clamped copy in [`DisplayCamera`].
#[derive(Resource, Clone, Copy, Debug, PartialEq)]
pub struct ViewCamera {
    pub center: Vec2,
    pub zoom: f32,
}

impl Default for ViewCamera {
    fn default() -> Self {
        Self {
            center: GRID_SIZE.as_vec2() * 0.5,
            zoom: DEFAULT_ZOOM,
        }
    }
}

/// clamped camera handed to the render pass and used for input mapping
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq)]
pub struct DisplayCamera(pub ViewCamera);

/// render target size in physical pixels
#[derive(Resource, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport(pub UVec2);

impl Default for Viewport {
    fn default() -> Self {
        Self(WINDOW_SIZE)
    }
}

impl ViewCamera {
    pub fn world_to_screen(&self, world: Vec2, viewport: Vec2) -> Vec2 {
        (world - self.center) / self.zoom + viewport * 0.5
    }

    pub fn screen_to_world(&self, screen: Vec2, viewport: Vec2) -> Vec2 {
        (screen - viewport * 0.5) * self.zoom + self.center
    }

    /// Copy of this camera that never shows space outside `[0, world]`.
    ///
    /// Zoom is shared, so x is settled first and y sees its result.
    pub fn clamp(&self, viewport: Vec2, world: Vec2) -> Self {
        let mut out = *self;
        clamp_axis(&mut out.center.x, &mut out.zoom, viewport.x, world.x);
        clamp_axis(&mut out.center.y, &mut out.zoom, viewport.y, world.y);
        out
    }
}

fn clamp_axis(center: &mut f32, zoom: &mut f32, viewport: f32, world: f32) {
    if viewport <= 0.0 {
        return;
    }

    /* world narrower than the screen: fit it and centre it */
    if *zoom <= 0.0 || world / *zoom < viewport {
        *zoom = world / viewport;
        *center = world * 0.5;
        return;
    }

    /* otherwise slide until neither edge shows empty space */
    let half = viewport * 0.5;
    let low_edge = (0.0 - *center) / *zoom + half;
    let high_edge = (world - *center) / *zoom + half;
    if low_edge >= 0.0 {
        *center = half * *zoom;
    } else if high_edge <= viewport {
        *center = world - half * *zoom;
    }
}

/* ===========================================================
   systems
   =========================================================== */

/// keep the viewport in sync with the primary window's physical size
pub fn viewport_track_system(
    window_q: Query<&Window, With<PrimaryWindow>>,
    mut viewport: ResMut<Viewport>,
) {
    let Ok(window) = window_q.get_single() else { return };
    let size = UVec2::new(window.physical_width(), window.physical_height());
    if size.x == 0 || size.y == 0 || size == viewport.0 {
        return;
    }
    info!("viewport resized to {}x{}", size.x, size.y);
    viewport.0 = size;
}

/// authoritative camera follows the player record read back last frame
pub fn camera_follow_system(mut camera: ResMut<ViewCamera>, player: Res<PlayerState>) {
    let target = player.record.position();
    let zoom = camera.zoom;
    camera.center = Vec2::new(snap(target.x, zoom), snap(target.y, zoom));
}

/// recompute the display copy every frame; the authoritative camera is
/// never written back
pub fn camera_clamp_system(
    camera: Res<ViewCamera>,
    config: Res<LevelConfig>,
    viewport: Res<Viewport>,
    mut display: ResMut<DisplayCamera>,
) {
    display.0 = camera.clamp(viewport.0.as_vec2(), config.world_size.as_vec2());
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const VIEW: Vec2 = Vec2::new(1024.0, 768.0);
    const WORLD: Vec2 = Vec2::new(2048.0, 2048.0);

    fn cam(x: f32, y: f32, zoom: f32) -> ViewCamera {
        ViewCamera {
            center: Vec2::new(x, y),
            zoom,
        }
    }

    fn close(a: ViewCamera, b: ViewCamera) -> bool {
        (a.center - b.center).abs().max_element() < 1e-2 && (a.zoom - b.zoom).abs() < 1e-5
    }

    #[test]
    fn screen_and_world_are_inverse() {
        let c = cam(300.0, 900.0, 1.5);
        let w = Vec2::new(123.0, 456.0);
        let back = c.screen_to_world(c.world_to_screen(w, VIEW), VIEW);
        assert!((back - w).length() < 1e-3);
        assert_eq!(c.world_to_screen(c.center, VIEW), VIEW * 0.5);
    }

    #[test]
    fn interior_camera_is_unchanged() {
        let c = cam(1024.0, 1024.0, 1.0);
        assert_eq!(c.clamp(VIEW, WORLD), c);
    }

    #[test]
    fn slides_off_the_edges() {
        let c = cam(10.0, 2040.0, 1.0).clamp(VIEW, WORLD);
        assert_eq!(c.center, Vec2::new(512.0, 2048.0 - 384.0));
        assert_eq!(c.world_to_screen(Vec2::ZERO, VIEW).x, 0.0);
        assert_eq!(c.world_to_screen(WORLD, VIEW).y, VIEW.y);
    }

    #[test]
    fn zoomed_out_fits_and_centres() {
        let c = cam(0.0, 0.0, 4.0).clamp(VIEW, WORLD);
        assert_eq!(c.zoom, 2.0);
        assert_eq!(c.center.x, 1024.0);
        // y fits too at zoom 2 (2048 / 2 = 1024 >= 768) and slides flush
        assert_eq!(c.world_to_screen(Vec2::ZERO, VIEW).y, 0.0);
    }

    #[test]
    fn tall_view_refits_zoom_on_y() {
        let view = Vec2::new(300.0, 1200.0);
        let world = Vec2::new(4096.0, 1000.0);
        let fit = world.y / view.y;

        for c in [cam(0.0, 0.0, 5.0), cam(100.0, 100.0, 2.0), cam(4000.0, 900.0, 0.5)] {
            let once = c.clamp(view, world);
            if c.zoom > fit {
                assert!((once.zoom - fit).abs() < 1e-6, "{c:?} -> {once:?}");
                assert!((once.center.y - world.y * 0.5).abs() < 1e-3);
            }

            // visible rectangle stays inside the world on both axes
            let lo = once.screen_to_world(Vec2::ZERO, view);
            let hi = once.screen_to_world(view, view);
            assert!(lo.x >= -1e-3 && lo.y >= -1e-3, "{c:?} -> {once:?}");
            assert!(hi.x <= world.x + 1e-3 && hi.y <= world.y + 1e-3, "{c:?} -> {once:?}");

            assert!(close(once, once.clamp(view, world)));
        }
    }

    #[test]
    fn clamp_is_idempotent() {
        let mut rng = StdRng::seed_from_u64(13);
        for _ in 0..500 {
            let c = cam(
                rng.gen_range(-1000.0..3000.0),
                rng.gen_range(-1000.0..3000.0),
                rng.gen_range(0.1..6.0),
            );
            let once = c.clamp(VIEW, WORLD);
            let twice = once.clamp(VIEW, WORLD);
            assert!(close(once, twice), "{c:?} -> {once:?} -> {twice:?}");
        }
    }
}
