
use super::math::{clamp, Vec2};

/// Screen size in world units; the view is unscaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn half_extent(self) -> Vec2 {
        Vec2::new(self.width as f32 * 0.5, self.height as f32 * 0.5)
    }
}

/// The playable rectangle, anchored at the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub width: f32,
    pub height: f32,
}

impl WorldBounds {
    pub fn center(self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Keeps a circle of `radius` fully inside the world.
    pub fn confine(self, position: Vec2, radius: f32) -> Vec2 {
        Vec2::new(
            clamp(position.x, radius, self.width - radius),
            clamp(position.y, radius, self.height - radius),
        )
    }
}

/// Top-left corner of the view in world coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Camera2D {
    pub position: Vec2,
}

impl Camera2D {
    /// Centers on `target`, then clamps so the view never leaves the world.
    pub fn follow(&mut self, target: Vec2, viewport: Viewport, bounds: WorldBounds) {
        let desired = target.minus(viewport.half_extent());
        self.position = Vec2::new(
            clamp(desired.x, 0.0, bounds.width - viewport.width as f32),
            clamp(desired.y, 0.0, bounds.height - viewport.height as f32),
        );
    }

    pub fn world_to_view(&self, world: Vec2) -> Vec2 {
        world.minus(self.position)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimapMarker {
    pub position: Vec2,
    pub radius: f32,
    pub color: [u8; 4],
}

/// Minimap geometry in minimap-local pixels, origin at its top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimapView {
    pub size: Vec2,
    pub scale: f32,
    pub planets: Vec<MinimapMarker>,
    pub player: Option<(Vec2, f32)>,
    /// The camera's view rectangle: top-left and size.
    pub view_rect: (Vec2, Vec2),
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Viewport {
        width: 800,
        height: 600,
    };
    const BOUNDS: WorldBounds = WorldBounds {
        width: 4000.0,
        height: 3000.0,
    };

    #[test]
    fn camera_centers_on_target_inside_world() {
        let mut camera = Camera2D::default();
        camera.follow(Vec2::new(2000.0, 1500.0), VIEWPORT, BOUNDS);
        assert_eq!(camera.position, Vec2::new(1600.0, 1200.0));
    }

    #[test]
    fn camera_clamps_at_world_edges() {
        let mut camera = Camera2D::default();
        camera.follow(Vec2::new(10.0, 10.0), VIEWPORT, BOUNDS);
        assert_eq!(camera.position, Vec2::ZERO);

        camera.follow(Vec2::new(3990.0, 2990.0), VIEWPORT, BOUNDS);
        assert_eq!(camera.position, Vec2::new(3200.0, 2400.0));
    }

    #[test]
    fn camera_pins_to_origin_when_world_is_smaller_than_view() {
        let mut camera = Camera2D::default();
        let tiny = WorldBounds {
            width: 300.0,
            height: 200.0,
        };
        camera.follow(Vec2::new(150.0, 100.0), VIEWPORT, tiny);
        assert_eq!(camera.position, Vec2::ZERO);
    }

    #[test]
    fn confine_keeps_circle_inside_world() {
        let confined = BOUNDS.confine(Vec2::new(-50.0, 3100.0), 10.0);
        assert_eq!(confined, Vec2::new(10.0, 2990.0));
    }

    #[test]
    fn world_to_view_subtracts_camera_offset() {
        let camera = Camera2D {
            position: Vec2::new(100.0, 50.0),
        };
        assert_eq!(
            camera.world_to_view(Vec2::new(120.0, 60.0)),
            Vec2::new(20.0, 10.0)
        );
    }
}
