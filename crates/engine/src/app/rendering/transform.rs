use crate::app::camera::{Camera2D, Viewport};
use crate::app::math::Vec2;

/// One world unit is one framebuffer pixel; the camera is the view's
/// top-left corner.
pub fn world_to_screen_px(world: Vec2, camera: &Camera2D) -> (i32, i32) {
    let view = camera.world_to_view(world);
    (view.x.round() as i32, view.y.round() as i32)
}

/// Whether a circle at `center` (screen px) touches the viewport.
pub fn circle_on_screen(center: (i32, i32), radius: f32, viewport: Viewport) -> bool {
    let reach = radius.ceil() as i32 + 1;
    center.0 + reach >= 0
        && center.1 + reach >= 0
        && center.0 - reach < viewport.width as i32
        && center.1 - reach < viewport.height as i32
}
