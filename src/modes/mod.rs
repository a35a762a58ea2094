pub mod framebuffer;
pub mod windowed;

#[derive(Debug, PartialEq, Copy, Clone)]
pub enum Mode {
    /// Straight to the Linux framebuffer, input from touch and terminal.
    Framebuffer,
    /// A desktop window, input from its keyboard events.
    Window,
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Framebuffer => "framebuffer",
            Mode::Window => "window",
        }
    }
}
