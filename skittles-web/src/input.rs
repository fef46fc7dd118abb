/// Browser pointer state accumulated between frames.
#[derive(Debug, Default, Clone)]
pub struct InputState {
    pub mouse_x: f64,
    pub mouse_y: f64,
    pub mouse_dx: f64,
    pub mouse_dy: f64,
    pub wheel: f64,
    pub mouse_buttons: [bool; 3],
}

/// Input consumed by one frame.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PointerDelta {
    pub dx: f64,
    pub dy: f64,
    pub wheel: f64,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pointer_down(&mut self, button: i16, x: f64, y: f64) {
        if let Some(down) = self.mouse_buttons.get_mut(button as usize) {
            *down = true;
        }
        self.mouse_x = x;
        self.mouse_y = y;
    }

    pub fn pointer_up(&mut self, button: i16) {
        if let Some(down) = self.mouse_buttons.get_mut(button as usize) {
            *down = false;
        }
    }

    /// Pointer left the canvas; `button()` carries no button then, so release all.
    pub fn release_all(&mut self) {
        self.mouse_buttons = [false; 3];
    }

    /// Pointer moves only accumulate while the primary button is held.
    pub fn pointer_move(&mut self, x: f64, y: f64) {
        if self.mouse_buttons[0] {
            self.mouse_dx += x - self.mouse_x;
            self.mouse_dy += y - self.mouse_y;
        }
        self.mouse_x = x;
        self.mouse_y = y;
    }

    pub fn wheel(&mut self, delta_y: f64) {
        self.wheel += delta_y;
    }

    /// Return and reset the per-frame deltas.
    pub fn take(&mut self) -> PointerDelta {
        let delta = PointerDelta {
            dx: self.mouse_dx,
            dy: self.mouse_dy,
            wheel: self.wheel,
        };
        self.mouse_dx = 0.0;
        self.mouse_dy = 0.0;
        self.wheel = 0.0;
        delta
    }
}
