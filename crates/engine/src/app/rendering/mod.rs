mod canvas;
mod font;
mod renderer;
mod transform;

pub use renderer::Renderer;
pub use transform::{circle_on_screen, world_to_screen_px};
