use winit::event::WindowEvent;

use super::system::Scheduler;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by the host binary.
///
/// The runtime owns the window, the GPU surface and the `Scheduler`; the app
/// registers units once and reacts to input between frames.
pub trait App {
    /// Called once after the scheduler exists, before the first frame.
    fn setup(&mut self, scheduler: &mut Scheduler) -> anyhow::Result<()>;

    /// Called for window events, between frames.
    fn on_window_event(&mut self, scheduler: &mut Scheduler, event: &WindowEvent) -> AppControl {
        let _ = (scheduler, event);
        AppControl::Continue
    }

    /// Called after every completed frame.
    fn after_frame(&mut self, scheduler: &mut Scheduler) -> AppControl {
        let _ = scheduler;
        AppControl::Continue
    }
}
