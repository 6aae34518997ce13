use crate::input::{Key, KeyState};

/// Event surfaced by [`WindowHost::poll_events`] for the frame loop to dispatch.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// The drawable surface changed size, in physical pixels.
    FramebufferResized { width: u32, height: u32 },
}

/// Polling interface to the window: close flag, key state, event pump.
pub trait WindowHost {
    /// True once the window was asked to close, or no window remains.
    fn should_close(&self) -> bool;

    fn set_should_close(&mut self, value: bool);

    fn key_state(&self, key: Key) -> KeyState;

    /// Processes pending OS events without blocking.
    ///
    /// Returns the events the frame loop must react to, in arrival order.
    fn poll_events(&mut self) -> Vec<HostEvent>;

    /// Current drawable size in physical pixels.
    fn framebuffer_size(&self) -> (u32, u32);
}
