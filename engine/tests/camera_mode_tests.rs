//! Camera Mode Tests - Mode Composition, Surface Gating and Bounds Clamping

use glam::Vec3;
use yard_engine::camera::{CameraConfig, CameraMode, CameraModeController, OrbitDrag, Viewport};
use yard_engine::input::MovementKeys;
use yard_engine::physics::FlatGround;
use yard_engine::world::YardLayoutConfig;

const EPSILON: f32 = 1e-2;

fn controller() -> CameraModeController {
    let layout = YardLayoutConfig::default();
    let mut camera = CameraModeController::new(CameraConfig::default(), layout.bounds(), Viewport::new(1280, 720));
    camera.mark_surface_ready();
    camera
}

fn inside(camera: &CameraModeController, p: Vec3) -> bool {
    let b = camera.bounds();
    p.cmpge(b.min - Vec3::splat(EPSILON)).all() && p.cmple(b.max + Vec3::splat(EPSILON)).all()
}

// ============================================================================
// Mode composition
// ============================================================================

#[test]
fn test_first_person_while_building_keeps_orbit_disabled() {
    let mut camera = controller();
    camera.set_build_active(true);
    assert!(!camera.orbit_enabled());

    assert!(camera.set_first_person(true));
    assert!(camera.build_active());
    assert!(!camera.orbit_enabled());

    assert!(camera.set_first_person(false));
    assert!(camera.build_active());
    assert!(!camera.orbit_enabled(), "leaving first person must not re-enable orbit while building");

    camera.set_build_active(false);
    assert!(camera.orbit_enabled());
}

#[test]
fn test_build_does_not_touch_first_person() {
    let mut camera = controller();
    camera.set_first_person(true);
    camera.set_build_active(true);
    assert!(camera.is_first_person());
    camera.set_build_active(false);
    assert!(camera.is_first_person());
    assert!(!camera.orbit_enabled());
}

#[test]
fn test_leaving_first_person_reenables_orbit() {
    let mut camera = controller();
    camera.set_first_person(true);
    assert!(!camera.orbit_enabled());
    camera.set_first_person(false);
    assert!(camera.orbit_enabled());
    assert_eq!(camera.mode(), CameraMode::Orbit);
}

#[test]
fn test_user_action_stops_auto_orbit() {
    let mut camera = controller();
    camera.set_auto_orbit(true);
    camera.zoom(1.0);
    assert!(!camera.is_auto_orbit());

    camera.set_auto_orbit(true);
    camera.drag(OrbitDrag::Rotate, true);
    assert!(!camera.is_auto_orbit());
}

// ============================================================================
// Surface gating
// ============================================================================

#[test]
fn test_mode_calls_before_surface_are_noops() {
    let layout = YardLayoutConfig::default();
    let mut camera = CameraModeController::new(CameraConfig::default(), layout.bounds(), Viewport::new(800, 600));

    assert!(!camera.set_first_person(true));
    assert!(!camera.set_auto_orbit(true));
    assert_eq!(camera.mode(), CameraMode::Orbit);

    camera.mark_surface_ready();
    assert!(camera.set_first_person(true));

    camera.mark_surface_lost();
    assert!(!camera.set_first_person(false));
    assert!(camera.is_first_person());
}

// ============================================================================
// Bounds
// ============================================================================

#[test]
fn test_orbit_clamped_every_frame_after_pan_and_zoom() {
    let mut camera = controller();
    let keys = MovementKeys::new();

    camera.drag(OrbitDrag::Pan, true);
    camera.pointer_moved(0.0, 0.0, 0.016);
    for i in 1..50 {
        camera.pointer_moved(i as f32 * 400.0, i as f32 * 300.0, 0.016);
    }
    camera.drag(OrbitDrag::Pan, false);
    for _ in 0..20 {
        camera.zoom(-10.0);
    }

    for _ in 0..10 {
        camera.update(0.016, &keys, &FlatGround);
        assert!(inside(&camera, camera.look_at()), "target {:?}", camera.look_at());
        assert!(inside(&camera, camera.eye()), "eye {:?}", camera.eye());
        assert!(camera.eye().y > 0.0);
    }
}

#[test]
fn test_auto_orbit_stays_in_bounds() {
    let mut camera = controller();
    let keys = MovementKeys::new();
    camera.set_auto_orbit(true);
    for _ in 0..600 {
        camera.update(0.05, &keys, &FlatGround);
        assert!(inside(&camera, camera.eye()));
    }
}

#[test]
fn test_first_person_walks_inside_bounds() {
    let mut camera = controller();
    camera.set_first_person(true);
    let mut keys = MovementKeys::new();
    keys.forward = true;
    keys.sprint = true;
    for _ in 0..2000 {
        camera.update(0.05, &keys, &FlatGround);
    }
    let b = camera.bounds();
    let eye = camera.eye();
    assert!(eye.x >= b.min.x - EPSILON && eye.x <= b.max.x + EPSILON);
    assert!(eye.z >= b.min.z - EPSILON && eye.z <= b.max.z + EPSILON);
    assert!(eye.y > 0.0);
}

// ============================================================================
// Resize
// ============================================================================

#[test]
fn test_resize_only_changes_viewport() {
    let mut camera = controller();
    let eye = camera.eye();
    let mode = camera.mode();
    camera.resize(1920, 1080);
    assert_eq!(camera.viewport(), Viewport::new(1920, 1080));
    assert_eq!(camera.eye(), eye);
    assert_eq!(camera.mode(), mode);
}
