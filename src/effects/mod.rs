use crossterm::event::Event;
use std::io::Write;

pub mod fireworks;

pub trait Effect {
    /// Advance one fixed simulation step of `dt` seconds.
    fn update(&mut self, dt: f32);
    fn render<W: Write>(&mut self, out: &mut W) -> std::io::Result<()>;
    /// New drawing size in surface pixels (two per terminal row).
    fn resize(&mut self, width: usize, height: usize);
    fn handle_event(&mut self, _event: &Event) {}
}
