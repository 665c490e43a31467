use std::f32::consts::PI;
use std::sync::Arc;
use std::time::Instant;

use pixels::{Error, Pixels, SurfaceTexture};
use tracing::{debug, info};
use winit::window::Window;

use crate::app::camera::{Camera2D, MinimapView, Viewport};
use crate::app::entity::{EntityRole, Planet, Ship};
use crate::app::math::Vec2;
use crate::app::ui::{AdvisoryDuration, LeaveRequest, PlanetInfo, RenderSink, UiSink};

use super::canvas::Canvas;
use super::font::{draw_text, glyph_advance, line_height, text_width, wrap};
use super::transform::{circle_on_screen, world_to_screen_px};

const CLEAR_COLOR: [u8; 4] = [8, 10, 18, 255];
const GRID_COLOR: [u8; 4] = [20, 24, 38, 255];
const GRID_SPACING_WORLD: f32 = 200.0;
const PLAYER_COLOR: [u8; 4] = [240, 244, 250, 255];
const NPC_COLOR: [u8; 4] = [230, 150, 90, 255];
const BOOST_FLAME_COLOR: [u8; 4] = [255, 196, 80, 255];
const SHIP_NOSE_FACTOR: f32 = 1.4;
const SHIP_WING_ANGLE: f32 = PI * 0.8;

const MINIMAP_MARGIN_PX: i32 = 12;
const MINIMAP_BG_COLOR: [u8; 4] = [6, 8, 14, 200];
const MINIMAP_BORDER_COLOR: [u8; 4] = [92, 106, 126, 255];
const MINIMAP_VIEW_COLOR: [u8; 4] = [150, 170, 200, 255];

const PANEL_BG_COLOR: [u8; 4] = [10, 12, 16, 220];
const PANEL_BORDER_COLOR: [u8; 4] = [92, 106, 126, 255];
const TEXT_PRIMARY_COLOR: [u8; 4] = [244, 248, 252, 255];
const TEXT_DIM_COLOR: [u8; 4] = [176, 198, 220, 255];
const PANEL_PADDING_PX: i32 = 14;
const ADVISORY_SCALE: i32 = 2;
const ADVISORY_BOTTOM_OFFSET_PX: i32 = 56;
const MODAL_TITLE_SCALE: i32 = 4;
const MODAL_BODY_SCALE: i32 = 2;
const MODAL_WIDTH_FRACTION: f32 = 0.6;
const MODAL_FOOTER: &str = "Press E to take off";

#[derive(Debug, Clone, PartialEq)]
struct ActiveAdvisory {
    text: String,
    expires_at: Option<Instant>,
}

/// What the frontend overlays on top of the world: the advisory line and
/// the planet view.
#[derive(Debug, Default)]
struct Hud {
    advisory: Option<ActiveAdvisory>,
    modal: Option<(PlanetInfo, LeaveRequest)>,
}

impl Hud {
    /// Returns whether the visible text changed.
    fn show_advisory(&mut self, text: &str, duration: AdvisoryDuration, now: Instant) -> bool {
        let expires_at = match duration {
            AdvisoryDuration::Persistent => None,
            AdvisoryDuration::Timed(duration) => now.checked_add(duration),
        };
        let changed = self.advisory_text() != Some(text);
        self.advisory = Some(ActiveAdvisory {
            text: text.to_string(),
            expires_at,
        });
        changed
    }

    fn clear_advisory(&mut self) -> bool {
        self.advisory.take().is_some()
    }

    fn expire(&mut self, now: Instant) -> bool {
        let expired = self
            .advisory
            .as_ref()
            .and_then(|advisory| advisory.expires_at)
            .is_some_and(|deadline| now >= deadline);
        if expired {
            self.advisory = None;
        }
        expired
    }

    fn advisory_text(&self) -> Option<&str> {
        self.advisory.as_ref().map(|advisory| advisory.text.as_str())
    }
}

/// Software renderer over a `pixels` framebuffer. Implements both
/// presentation boundaries so the frame loop can hand it to the world as is.
pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
    base_title: String,
    hud: Hud,
}

impl Renderer {
    pub fn new(window: Arc<Window>, base_title: impl Into<String>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
            base_title: base_title.into(),
            hud: Hud::default(),
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    /// The leave token of the planet view currently on screen, if any.
    pub fn active_leave_request(&self) -> Option<LeaveRequest> {
        self.hud.modal.as_ref().map(|(_, request)| *request)
    }

    /// Draws the overlay on top of the world drawn this frame and presents.
    pub fn finish_frame(&mut self, now: Instant) -> Result<(), Error> {
        if self.hud.expire(now) {
            debug!("advisory_expired");
            self.apply_title();
        }
        let mut canvas = Canvas::new(
            self.pixels.frame_mut(),
            self.viewport.width,
            self.viewport.height,
        );
        draw_hud(&mut canvas, &self.hud);
        self.pixels.render()
    }

    fn apply_title(&self) {
        match self.hud.advisory_text() {
            Some(text) => self
                .window
                .set_title(&format!("{} | {}", self.base_title, text)),
            None => self.window.set_title(&self.base_title),
        }
    }

    fn canvas(&mut self) -> Canvas<'_> {
        Canvas::new(
            self.pixels.frame_mut(),
            self.viewport.width,
            self.viewport.height,
        )
    }
}

impl UiSink for Renderer {
    fn show_advisory(&mut self, text: &str, duration: AdvisoryDuration) {
        if self.hud.show_advisory(text, duration, Instant::now()) {
            info!(text, "advisory_shown");
            self.apply_title();
        }
    }

    fn clear_advisory(&mut self) {
        if self.hud.clear_advisory() {
            debug!("advisory_cleared");
            self.apply_title();
        }
    }

    fn show_modal_info(&mut self, info: &PlanetInfo, on_leave: LeaveRequest) {
        info!(planet = %info.name, features = info.features.len(), "planet_view_opened");
        self.hud.modal = Some((info.clone(), on_leave));
    }

    fn hide_modal_info(&mut self) {
        if let Some((info, _)) = self.hud.modal.take() {
            info!(planet = %info.name, "planet_view_closed");
        }
    }
}

impl RenderSink for Renderer {
    fn begin_frame(&mut self, camera: &Camera2D, _viewport: Viewport) {
        let mut canvas = self.canvas();
        canvas.clear(CLEAR_COLOR);
        draw_backdrop(&mut canvas, camera);
    }

    fn draw_planet(&mut self, planet: &Planet, camera: &Camera2D) {
        let viewport = self.viewport;
        draw_planet(&mut self.canvas(), planet, camera, viewport);
    }

    fn draw_ship(&mut self, ship: &Ship, role: EntityRole, camera: &Camera2D) {
        let viewport = self.viewport;
        draw_ship(&mut self.canvas(), ship, role, camera, viewport);
    }

    fn draw_minimap(&mut self, minimap: &MinimapView) {
        draw_minimap(&mut self.canvas(), minimap);
    }
}

fn draw_backdrop(canvas: &mut Canvas<'_>, camera: &Camera2D) {
    let width = canvas.width() as i32;
    let height = canvas.height() as i32;

    let mut x = -camera.position.x.rem_euclid(GRID_SPACING_WORLD);
    while (x as i32) < width {
        canvas.fill_rect(x.round() as i32, 0, 1, height, GRID_COLOR);
        x += GRID_SPACING_WORLD;
    }
    let mut y = -camera.position.y.rem_euclid(GRID_SPACING_WORLD);
    while (y as i32) < height {
        canvas.fill_rect(0, y.round() as i32, width, 1, GRID_COLOR);
        y += GRID_SPACING_WORLD;
    }
}

fn draw_planet(canvas: &mut Canvas<'_>, planet: &Planet, camera: &Camera2D, viewport: Viewport) {
    let center = world_to_screen_px(planet.position, camera);
    if !circle_on_screen(center, planet.radius, viewport) {
        return;
    }
    let radius = planet.radius.round() as i32;
    canvas.fill_circle(center.0, center.1, radius, planet.color);
    canvas.circle_outline(center.0, center.1, radius, lighten(planet.color));
}

fn draw_ship(
    canvas: &mut Canvas<'_>,
    ship: &Ship,
    role: EntityRole,
    camera: &Camera2D,
    viewport: Viewport,
) {
    let center = world_to_screen_px(ship.position, camera);
    let radius = ship.radius();
    if !circle_on_screen(center, radius * SHIP_NOSE_FACTOR, viewport) {
        return;
    }
    let heading = ship.heading();
    let nose = offset_px(center, Vec2::from_heading(heading).scaled(radius * SHIP_NOSE_FACTOR));
    let left = offset_px(center, Vec2::from_heading(heading + SHIP_WING_ANGLE).scaled(radius));
    let right = offset_px(center, Vec2::from_heading(heading - SHIP_WING_ANGLE).scaled(radius));

    if ship.boost_overlay() > 0.0 {
        let tail = offset_px(center, Vec2::from_heading(heading).scaled(-radius * 1.8));
        canvas.fill_triangle([left, right, tail], BOOST_FLAME_COLOR);
    }
    let color = match role {
        EntityRole::Player => PLAYER_COLOR,
        EntityRole::Npc => NPC_COLOR,
    };
    canvas.fill_triangle([nose, left, right], color);
}

fn draw_minimap(canvas: &mut Canvas<'_>, minimap: &MinimapView) {
    let width = minimap.size.x.round() as i32;
    let height = minimap.size.y.round() as i32;
    let left = canvas.width() as i32 - width - MINIMAP_MARGIN_PX;
    let top = MINIMAP_MARGIN_PX;
    let to_px = |point: Vec2| {
        (
            left + point.x.round() as i32,
            top + point.y.round() as i32,
        )
    };

    canvas.fill_rect(left, top, width, height, MINIMAP_BG_COLOR);
    canvas.outline_rect(left - 1, top - 1, width + 2, height + 2, MINIMAP_BORDER_COLOR);

    for marker in &minimap.planets {
        let (x, y) = to_px(marker.position);
        canvas.fill_circle(x, y, marker.radius.round() as i32, marker.color);
    }

    let (view_origin, view_size) = minimap.view_rect;
    let (view_x, view_y) = to_px(view_origin);
    canvas.outline_rect(
        view_x,
        view_y,
        view_size.x.round() as i32,
        view_size.y.round() as i32,
        MINIMAP_VIEW_COLOR,
    );

    if let Some((position, heading)) = minimap.player {
        let (x, y) = to_px(position);
        canvas.fill_circle(x, y, 2, PLAYER_COLOR);
        let tip = offset_px((x, y), Vec2::from_heading(heading).scaled(6.0));
        canvas.line((x, y), tip, PLAYER_COLOR);
    }
}

fn draw_hud(canvas: &mut Canvas<'_>, hud: &Hud) {
    if let Some(text) = hud.advisory_text() {
        draw_advisory(canvas, text);
    }
    if let Some((info, _)) = hud.modal.as_ref() {
        draw_planet_view(canvas, info);
    }
}

fn draw_advisory(canvas: &mut Canvas<'_>, text: &str) {
    let panel_width = text_width(text, ADVISORY_SCALE) + PANEL_PADDING_PX * 2;
    let panel_height = line_height(ADVISORY_SCALE) + PANEL_PADDING_PX;
    let left = (canvas.width() as i32 - panel_width) / 2;
    let top = canvas.height() as i32 - ADVISORY_BOTTOM_OFFSET_PX - panel_height;
    draw_panel(canvas, left, top, panel_width, panel_height);
    draw_text(
        canvas,
        left + PANEL_PADDING_PX,
        top + PANEL_PADDING_PX / 2 + ADVISORY_SCALE,
        text,
        ADVISORY_SCALE,
        TEXT_PRIMARY_COLOR,
    );
}

fn draw_planet_view(canvas: &mut Canvas<'_>, info: &PlanetInfo) {
    let panel_width = (canvas.width() as f32 * MODAL_WIDTH_FRACTION) as i32;
    let inner_width = (panel_width - PANEL_PADDING_PX * 2).max(0);
    let max_chars = (inner_width / glyph_advance(MODAL_BODY_SCALE)).max(1) as usize;

    let mut body = wrap(&info.description, max_chars);
    if !info.features.is_empty() {
        body.push(String::new());
        body.extend(wrap(
            &format!("Features: {}", info.features.join(", ")),
            max_chars,
        ));
    }

    let body_height = body.len() as i32 * line_height(MODAL_BODY_SCALE);
    let panel_height = PANEL_PADDING_PX * 3
        + line_height(MODAL_TITLE_SCALE)
        + body_height
        + line_height(MODAL_BODY_SCALE) * 2;
    let left = (canvas.width() as i32 - panel_width) / 2;
    let top = ((canvas.height() as i32 - panel_height) / 2).max(0);
    draw_panel(canvas, left, top, panel_width, panel_height);

    let x = left + PANEL_PADDING_PX;
    let mut y = top + PANEL_PADDING_PX;
    draw_text(canvas, x, y, &info.name, MODAL_TITLE_SCALE, TEXT_PRIMARY_COLOR);
    y += line_height(MODAL_TITLE_SCALE) + PANEL_PADDING_PX;
    for line in &body {
        draw_text(canvas, x, y, line, MODAL_BODY_SCALE, TEXT_PRIMARY_COLOR);
        y += line_height(MODAL_BODY_SCALE);
    }
    y += line_height(MODAL_BODY_SCALE);
    draw_text(canvas, x, y, MODAL_FOOTER, MODAL_BODY_SCALE, TEXT_DIM_COLOR);
}

fn draw_panel(canvas: &mut Canvas<'_>, left: i32, top: i32, width: i32, height: i32) {
    canvas.fill_rect(left, top, width, height, PANEL_BG_COLOR);
    canvas.outline_rect(left, top, width, height, PANEL_BORDER_COLOR);
}

fn offset_px(origin: (i32, i32), delta: Vec2) -> (i32, i32) {
    (
        origin.0 + delta.x.round() as i32,
        origin.1 + delta.y.round() as i32,
    )
}

fn lighten(color: [u8; 4]) -> [u8; 4] {
    [
        color[0].saturating_add(48),
        color[1].saturating_add(48),
        color[2].saturating_add(48),
        color[3],
    ]
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::app::camera::MinimapMarker;
    use crate::app::entity::{EntityId, ShipTuning};

    const WIDTH: u32 = 320;
    const HEIGHT: u32 = 240;
    const VIEWPORT: Viewport = Viewport {
        width: WIDTH,
        height: HEIGHT,
    };

    fn blank() -> Vec<u8> {
        vec![0u8; (WIDTH * HEIGHT * 4) as usize]
    }

    fn pixel(frame: &[u8], x: u32, y: u32) -> [u8; 4] {
        let offset = ((y * WIDTH + x) * 4) as usize;
        [
            frame[offset],
            frame[offset + 1],
            frame[offset + 2],
            frame[offset + 3],
        ]
    }

    fn planet(x: f32, y: f32, radius: f32) -> Planet {
        Planet {
            position: Vec2::new(x, y),
            radius,
            color: [90, 140, 200, 255],
            name: "Ivel".to_string(),
            description: "Ivel is a frozen world of drifting ice.".to_string(),
            features: vec!["rings".to_string()],
        }
    }

    #[test]
    fn timed_advisory_expires_and_persistent_does_not() {
        let now = Instant::now();
        let mut hud = Hud::default();

        assert!(hud.show_advisory(
            "Departing Ivel",
            AdvisoryDuration::Timed(Duration::from_secs(2)),
            now
        ));
        assert!(!hud.expire(now + Duration::from_secs(1)));
        assert!(hud.expire(now + Duration::from_secs(2)));
        assert_eq!(hud.advisory_text(), None);

        hud.show_advisory("Press E to land on Ivel", AdvisoryDuration::Persistent, now);
        assert!(!hud.expire(now + Duration::from_secs(3600)));
    }

    #[test]
    fn repeated_advisory_reports_no_change() {
        let now = Instant::now();
        let mut hud = Hud::default();
        assert!(hud.show_advisory("Slow down", AdvisoryDuration::Persistent, now));
        assert!(!hud.show_advisory("Slow down", AdvisoryDuration::Persistent, now));
        assert!(hud.clear_advisory());
        assert!(!hud.clear_advisory());
    }

    #[test]
    fn planet_is_drawn_relative_to_camera() {
        let mut frame = blank();
        let camera = Camera2D {
            position: Vec2::new(1000.0, 1000.0),
        };
        draw_planet(
            &mut Canvas::new(&mut frame, WIDTH, HEIGHT),
            &planet(1100.0, 1100.0, 30.0),
            &camera,
            VIEWPORT,
        );

        assert_eq!(pixel(&frame, 100, 100), [90, 140, 200, 255]);
        assert_eq!(pixel(&frame, 10, 10), [0, 0, 0, 0]);
    }

    #[test]
    fn offscreen_planet_leaves_frame_untouched() {
        let mut frame = blank();
        draw_planet(
            &mut Canvas::new(&mut frame, WIDTH, HEIGHT),
            &planet(5000.0, 5000.0, 80.0),
            &Camera2D::default(),
            VIEWPORT,
        );
        assert!(frame.iter().all(|byte| *byte == 0));
    }

    #[test]
    fn player_and_npc_ships_use_distinct_colors() {
        let ship = Ship::new(Vec2::new(160.0, 120.0), 0.0, ShipTuning::default());
        for (role, color) in [
            (EntityRole::Player, PLAYER_COLOR),
            (EntityRole::Npc, NPC_COLOR),
        ] {
            let mut frame = blank();
            draw_ship(
                &mut Canvas::new(&mut frame, WIDTH, HEIGHT),
                &ship,
                role,
                &Camera2D::default(),
                VIEWPORT,
            );
            assert_eq!(pixel(&frame, 162, 120), color);
        }
    }

    #[test]
    fn minimap_sits_in_top_right_corner() {
        let mut frame = blank();
        let minimap = MinimapView {
            size: Vec2::new(60.0, 60.0),
            scale: 0.015,
            planets: vec![MinimapMarker {
                position: Vec2::new(30.0, 30.0),
                radius: 3.0,
                color: [200, 100, 50, 255],
            }],
            player: Some((Vec2::new(10.0, 10.0), 0.0)),
            view_rect: (Vec2::new(5.0, 5.0), Vec2::new(12.0, 9.0)),
        };
        draw_minimap(&mut Canvas::new(&mut frame, WIDTH, HEIGHT), &minimap);

        let left = WIDTH - 60 - MINIMAP_MARGIN_PX as u32;
        let top = MINIMAP_MARGIN_PX as u32;
        assert_eq!(pixel(&frame, left + 30, top + 30), [200, 100, 50, 255]);
        assert_eq!(pixel(&frame, left + 10, top + 10), PLAYER_COLOR);
        assert_eq!(pixel(&frame, 5, 5), [0, 0, 0, 0]);
    }

    #[test]
    fn planet_view_panel_covers_screen_centre() {
        let mut frame = blank();
        let hud = Hud {
            advisory: None,
            modal: Some((
                PlanetInfo::from_planet(EntityId(4), &planet(0.0, 0.0, 10.0)),
                LeaveRequest::new(EntityId(4)),
            )),
        };
        draw_hud(&mut Canvas::new(&mut frame, WIDTH, HEIGHT), &hud);

        let left = (WIDTH as i32 - (WIDTH as f32 * MODAL_WIDTH_FRACTION) as i32) / 2;
        assert_ne!(pixel(&frame, left as u32 + 2, HEIGHT / 2), [0, 0, 0, 0]);
        assert_eq!(pixel(&frame, 2, HEIGHT / 2), [0, 0, 0, 0]);
    }
}
