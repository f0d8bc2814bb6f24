//! Input Router
//!
//! Single entry point for pointer and keyboard events. The router decides who
//! an event belongs to and returns that decision as [`Command`]s; the scene
//! applies them to the camera, selection and build controllers. The router
//! itself never holds references to those controllers.
//!
//! Pointer routing order:
//! 1. A point inside either UI region is swallowed.
//! 2. Build active: build preview on move, build commit on left press.
//! 3. Otherwise: selection on left press, orbit drag on right/middle.
//!
//! The interact key is bound once. What it does is decided when it fires:
//! build primary action while building, crosshair select in first person.

use super::bindings::{InputAction, InputBindings};
use super::keyboard::MovementKeys;
use super::mouse::{ButtonState, KeyEvent, KeyTarget, MouseButton, PointerEvent, Position};
use super::regions::{RegionProbe, RegionSet, UiRegion};
use crate::camera::OrbitDrag;

/// Mode snapshot the router needs to resolve an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteContext {
    pub build_active: bool,
    pub first_person: bool,
}

/// Where the build/select action aims.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aim {
    Pointer(Position),
    Crosshair,
}

/// A routed event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Select(Aim),
    BuildPreview(Position),
    BuildCommit(Aim),
    OrbitDrag { drag: OrbitDrag, pressed: bool },
    OrbitMove(Position),
    Look { dx: f32, dy: f32 },
    Zoom(f32),
    Action(InputAction),
}

pub struct InputRouter {
    bindings: InputBindings,
    regions: Box<dyn RegionProbe>,
    buttons: ButtonState,
    movement: MovementKeys,
    last_pointer: Option<Position>,
    attached: bool,
}

impl InputRouter {
    pub fn new(bindings: InputBindings) -> Self {
        Self::with_regions(bindings, Box::new(RegionSet::new()))
    }

    pub fn with_regions(bindings: InputBindings, regions: Box<dyn RegionProbe>) -> Self {
        Self {
            bindings,
            regions,
            buttons: ButtonState::new(),
            movement: MovementKeys::new(),
            last_pointer: None,
            attached: true,
        }
    }

    pub fn set_regions(&mut self, regions: Box<dyn RegionProbe>) {
        self.regions = regions;
    }

    pub fn bindings(&self) -> &InputBindings {
        &self.bindings
    }

    pub fn movement(&self) -> &MovementKeys {
        &self.movement
    }

    pub fn last_pointer(&self) -> Option<Position> {
        self.last_pointer
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Stop routing. Every later event is dropped and held state released.
    pub fn detach(&mut self) {
        self.attached = false;
        self.buttons.reset();
        self.movement.reset();
        self.last_pointer = None;
    }

    /// Window lost focus: release held keys and buttons.
    pub fn release_all(&mut self) -> Vec<Command> {
        let mut out = Vec::new();
        if self.buttons.right {
            out.push(Command::OrbitDrag {
                drag: OrbitDrag::Rotate,
                pressed: false,
            });
        }
        if self.buttons.middle {
            out.push(Command::OrbitDrag {
                drag: OrbitDrag::Pan,
                pressed: false,
            });
        }
        self.buttons.reset();
        self.movement.reset();
        out
    }

    fn in_ui(&self, at: Position) -> bool {
        self.regions.contains(UiRegion::General, at.x, at.y)
            || self.regions.contains(UiRegion::BuildPalette, at.x, at.y)
    }

    pub fn route_pointer(&mut self, event: PointerEvent, mode: RouteContext) -> Vec<Command> {
        if !self.attached {
            return Vec::new();
        }

        match event {
            PointerEvent::Moved(at) => {
                self.last_pointer = Some(at);
                let dragging = self.buttons.right || self.buttons.middle;
                if self.in_ui(at) {
                    // A drag that wanders over a panel keeps rotating the
                    // camera; the build preview never sees UI points
                    return if dragging && !mode.build_active {
                        vec![Command::OrbitMove(at)]
                    } else {
                        Vec::new()
                    };
                }
                if mode.build_active && !mode.first_person {
                    let mut out = vec![Command::BuildPreview(at)];
                    if dragging {
                        out.push(Command::OrbitMove(at));
                    }
                    return out;
                }
                vec![Command::OrbitMove(at)]
            }
            PointerEvent::Pressed { button, at } => {
                self.last_pointer = Some(at);
                if self.in_ui(at) {
                    log::debug!("Pointer press at ({}, {}) swallowed by UI", at.x, at.y);
                    return Vec::new();
                }
                self.buttons.set(button, true);
                let aim = if mode.first_person {
                    Aim::Crosshair
                } else {
                    Aim::Pointer(at)
                };
                match button {
                    MouseButton::Left if mode.build_active => vec![Command::BuildCommit(aim)],
                    MouseButton::Left => vec![Command::Select(aim)],
                    MouseButton::Right => vec![Command::OrbitDrag {
                        drag: OrbitDrag::Rotate,
                        pressed: true,
                    }],
                    MouseButton::Middle => vec![Command::OrbitDrag {
                        drag: OrbitDrag::Pan,
                        pressed: true,
                    }],
                    MouseButton::Other(_) => Vec::new(),
                }
            }
            PointerEvent::Released { button, at } => {
                self.last_pointer = Some(at);
                // Releases always end a drag, even over UI, so a drag never sticks
                let was_down = self.buttons.is_pressed(button);
                self.buttons.set(button, false);
                match button {
                    MouseButton::Right if was_down => vec![Command::OrbitDrag {
                        drag: OrbitDrag::Rotate,
                        pressed: false,
                    }],
                    MouseButton::Middle if was_down => vec![Command::OrbitDrag {
                        drag: OrbitDrag::Pan,
                        pressed: false,
                    }],
                    _ => Vec::new(),
                }
            }
            PointerEvent::Scrolled(delta) => {
                if let Some(at) = self.last_pointer
                    && self.in_ui(at)
                {
                    return Vec::new();
                }
                if delta.is_zero() {
                    Vec::new()
                } else {
                    vec![Command::Zoom(delta.y)]
                }
            }
            PointerEvent::Motion { dx, dy } => {
                if mode.first_person {
                    vec![Command::Look { dx, dy }]
                } else {
                    Vec::new()
                }
            }
        }
    }

    pub fn route_key(&mut self, event: KeyEvent, mode: RouteContext) -> Vec<Command> {
        if !self.attached || event.target == KeyTarget::TextInput {
            return Vec::new();
        }

        if self.movement.handle_key(event.key, event.pressed) {
            return Vec::new();
        }
        if !event.pressed || event.repeat {
            return Vec::new();
        }

        let Some(action) = self.bindings.action(event.key) else {
            return Vec::new();
        };

        if action == InputAction::Interact {
            return match (mode.build_active, mode.first_person) {
                (true, true) => vec![Command::BuildCommit(Aim::Crosshair)],
                (true, false) => self
                    .last_pointer
                    .map(|at| vec![Command::BuildCommit(Aim::Pointer(at))])
                    .unwrap_or_default(),
                (false, true) => vec![Command::Select(Aim::Crosshair)],
                (false, false) => Vec::new(),
            };
        }

        vec![Command::Action(action)]
    }
}
