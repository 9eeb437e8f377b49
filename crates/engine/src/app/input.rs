use winit::event::{ElementState, MouseButton, MouseScrollDelta};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    ZoomIn,
    ZoomOut,
    Quit,
}

const ACTION_COUNT: usize = 7;

impl InputAction {
    pub const ALL: [InputAction; ACTION_COUNT] = [
        InputAction::MoveUp,
        InputAction::MoveDown,
        InputAction::MoveLeft,
        InputAction::MoveRight,
        InputAction::ZoomIn,
        InputAction::ZoomOut,
        InputAction::Quit,
    ];

    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::ZoomIn => 4,
            InputAction::ZoomOut => 5,
            InputAction::Quit => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

/// Input state for one frame: held actions plus edges collected since the previous frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    actions: ActionStates,
    cursor_position_px: Option<Vec2>,
    left_click_pressed: bool,
    right_click_pressed: bool,
    zoom_delta_steps: i32,
    window_width: u32,
    window_height: u32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    /// Held movement keys as a direction with components in `-1..=1`; y grows southward.
    pub fn movement_axis(&self) -> Vec2 {
        let axis = |negative: InputAction, positive: InputAction| {
            let mut value = 0.0;
            if self.is_down(negative) {
                value -= 1.0;
            }
            if self.is_down(positive) {
                value += 1.0;
            }
            value
        };
        Vec2::new(
            axis(InputAction::MoveLeft, InputAction::MoveRight),
            axis(InputAction::MoveUp, InputAction::MoveDown),
        )
    }

    pub fn cursor_position_px(&self) -> Option<Vec2> {
        self.cursor_position_px
    }

    pub fn left_click_pressed(&self) -> bool {
        self.left_click_pressed
    }

    pub fn right_click_pressed(&self) -> bool {
        self.right_click_pressed
    }

    pub fn zoom_delta_steps(&self) -> i32 {
        self.zoom_delta_steps
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }

    pub fn with_quit_requested(mut self, quit_requested: bool) -> Self {
        self.quit_requested = quit_requested;
        self
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_cursor_position_px(mut self, cursor_position_px: Option<Vec2>) -> Self {
        self.cursor_position_px = cursor_position_px;
        self
    }

    pub fn with_left_click_pressed(mut self, left_click_pressed: bool) -> Self {
        self.left_click_pressed = left_click_pressed;
        self
    }

    pub fn with_right_click_pressed(mut self, right_click_pressed: bool) -> Self {
        self.right_click_pressed = right_click_pressed;
        self
    }

    pub fn with_zoom_delta_steps(mut self, zoom_delta_steps: i32) -> Self {
        self.zoom_delta_steps = zoom_delta_steps;
        self
    }

    pub fn with_window_size(mut self, window_size: (u32, u32)) -> Self {
        self.window_width = window_size.0;
        self.window_height = window_size.1;
        self
    }

    pub(crate) fn with_actions(mut self, actions: ActionStates) -> Self {
        self.actions = actions;
        self
    }
}

/// Press counter for one key or button. Repeats while held do not count.
#[derive(Debug, Clone, Copy, Default)]
struct Latch {
    held: bool,
    presses: u32,
}

impl Latch {
    fn apply(&mut self, pressed: bool) {
        if pressed && !self.held {
            self.presses = self.presses.saturating_add(1);
        }
        self.held = pressed;
    }

    fn take(&mut self) -> u32 {
        std::mem::take(&mut self.presses)
    }
}

fn action_for_key(code: KeyCode) -> Option<InputAction> {
    Some(match code {
        KeyCode::KeyW | KeyCode::ArrowUp => InputAction::MoveUp,
        KeyCode::KeyS | KeyCode::ArrowDown => InputAction::MoveDown,
        KeyCode::KeyA | KeyCode::ArrowLeft => InputAction::MoveLeft,
        KeyCode::KeyD | KeyCode::ArrowRight => InputAction::MoveRight,
        KeyCode::Equal | KeyCode::NumpadAdd => InputAction::ZoomIn,
        KeyCode::Minus | KeyCode::NumpadSubtract => InputAction::ZoomOut,
        KeyCode::Escape => InputAction::Quit,
        _ => return None,
    })
}

/// Wheel notches rounded to whole zoom steps; touchpad pixel deltas count as one step.
fn wheel_steps(delta: MouseScrollDelta) -> i32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y.round() as i32,
        MouseScrollDelta::PixelDelta(offset) if offset.y > 0.0 => 1,
        MouseScrollDelta::PixelDelta(offset) if offset.y < 0.0 => -1,
        MouseScrollDelta::PixelDelta(_) => 0,
    }
}

/// Window events folded together between frames. `take_frame` hands the scene one
/// snapshot and clears the per-frame edges.
#[derive(Debug, Default)]
pub(crate) struct PendingInput {
    quit: bool,
    held: ActionStates,
    zoom_in: Latch,
    zoom_out: Latch,
    wheel: i32,
    left: Latch,
    right: Latch,
    cursor: Option<Vec2>,
    window: (u32, u32),
}

impl PendingInput {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self {
            window: (width, height),
            ..Self::default()
        }
    }

    pub(crate) fn request_quit(&mut self) {
        self.quit = true;
    }

    pub(crate) fn wants_quit(&self) -> bool {
        self.quit
    }

    pub(crate) fn key(&mut self, key: PhysicalKey, state: ElementState) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        let Some(action) = action_for_key(code) else {
            return;
        };
        let pressed = state == ElementState::Pressed;
        match action {
            InputAction::ZoomIn => self.zoom_in.apply(pressed),
            InputAction::ZoomOut => self.zoom_out.apply(pressed),
            InputAction::Quit if pressed => self.quit = true,
            _ => {}
        }
        self.held.set(action, pressed);
    }

    pub(crate) fn button(&mut self, button: MouseButton, state: ElementState) {
        let pressed = state == ElementState::Pressed;
        match button {
            MouseButton::Left => self.left.apply(pressed),
            MouseButton::Right => self.right.apply(pressed),
            _ => {}
        }
    }

    pub(crate) fn scroll(&mut self, delta: MouseScrollDelta) {
        self.wheel = self.wheel.saturating_add(wheel_steps(delta));
    }

    pub(crate) fn cursor(&mut self, position: Option<Vec2>) {
        self.cursor = position;
    }

    pub(crate) fn resize(&mut self, width: u32, height: u32) {
        self.window = (width, height);
    }

    pub(crate) fn take_frame(&mut self) -> InputSnapshot {
        let zoom = self.zoom_in.take() as i32 - self.zoom_out.take() as i32;
        InputSnapshot::empty()
            .with_quit_requested(self.quit)
            .with_actions(self.held)
            .with_cursor_position_px(self.cursor)
            .with_left_click_pressed(self.left.take() > 0)
            .with_right_click_pressed(self.right.take() > 0)
            .with_zoom_delta_steps(zoom.saturating_add(std::mem::take(&mut self.wheel)))
            .with_window_size(self.window)
    }
}
