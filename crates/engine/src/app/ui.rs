//! The boundary between the simulation core and whatever draws it.
//!
//! The core only ever calls into these traits; implementations must not
//! mutate world state. A frontend that needs to act on the world (leaving a
//! planet, moving a slider) goes back through [`super::GameWorld`].

use std::time::Duration;

use super::camera::{Camera2D, MinimapView, Viewport};
use super::entity::{EntityId, EntityRole, Planet, Ship};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvisoryDuration {
    Persistent,
    Timed(Duration),
}

/// Display-only copy of a planet handed to the modal view.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanetInfo {
    pub planet: EntityId,
    pub name: String,
    pub description: String,
    pub features: Vec<String>,
}

impl PlanetInfo {
    pub(crate) fn from_planet(id: EntityId, planet: &Planet) -> Self {
        Self {
            planet: id,
            name: planet.name.clone(),
            description: planet.description.clone(),
            features: planet.features.clone(),
        }
    }
}

/// Handed out with the modal view; give it back to
/// [`super::GameWorld::leave_planet`] when the player dismisses the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaveRequest {
    planet: EntityId,
}

impl LeaveRequest {
    pub(crate) fn new(planet: EntityId) -> Self {
        Self { planet }
    }

    pub fn planet(&self) -> EntityId {
        self.planet
    }
}

pub trait UiSink {
    /// Replaces whatever advisory is showing.
    fn show_advisory(&mut self, text: &str, duration: AdvisoryDuration);
    fn clear_advisory(&mut self);
    fn show_modal_info(&mut self, info: &PlanetInfo, on_leave: LeaveRequest);
    fn hide_modal_info(&mut self);
}

pub trait RenderSink {
    fn begin_frame(&mut self, camera: &Camera2D, viewport: Viewport);
    fn draw_planet(&mut self, planet: &Planet, camera: &Camera2D);
    fn draw_ship(&mut self, ship: &Ship, role: EntityRole, camera: &Camera2D);
    fn draw_minimap(&mut self, minimap: &MinimapView);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AdvisoryKind {
    LandingReady,
    LandingTooFast,
    Departure,
    Notice,
}

impl AdvisoryKind {
    fn is_landing(self) -> bool {
        matches!(self, Self::LandingReady | Self::LandingTooFast)
    }
}

/// Remembers what the core last put on the advisory line so it only ever
/// clears its own landing hints.
#[derive(Debug, Default)]
pub(crate) struct AdvisoryChannel {
    last: Option<AdvisoryKind>,
}

impl AdvisoryChannel {
    pub(crate) fn show(
        &mut self,
        ui: &mut dyn UiSink,
        kind: AdvisoryKind,
        text: &str,
        duration: AdvisoryDuration,
    ) {
        ui.show_advisory(text, duration);
        self.last = Some(kind);
    }

    pub(crate) fn clear_landing(&mut self, ui: &mut dyn UiSink) -> bool {
        match self.last {
            Some(kind) if kind.is_landing() => {
                ui.clear_advisory();
                self.last = None;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn last(&self) -> Option<AdvisoryKind> {
        self.last
    }
}

#[cfg(test)]
pub(crate) mod recording {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum DrawCall {
        Begin,
        Planet(String),
        Ship(EntityRole),
        Minimap,
    }

    /// Presentation fake that records every call for assertions.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingPresenter {
        pub(crate) advisory: Option<(String, AdvisoryDuration)>,
        pub(crate) advisory_history: Vec<String>,
        pub(crate) clear_count: usize,
        pub(crate) modal: Option<(PlanetInfo, LeaveRequest)>,
        pub(crate) modal_shown_count: usize,
        pub(crate) hide_count: usize,
        pub(crate) draws: Vec<DrawCall>,
        pub(crate) last_minimap: Option<MinimapView>,
    }

    impl RecordingPresenter {
        pub(crate) fn advisory_text(&self) -> Option<&str> {
            self.advisory.as_ref().map(|(text, _)| text.as_str())
        }
    }

    impl UiSink for RecordingPresenter {
        fn show_advisory(&mut self, text: &str, duration: AdvisoryDuration) {
            self.advisory = Some((text.to_string(), duration));
            self.advisory_history.push(text.to_string());
        }

        fn clear_advisory(&mut self) {
            self.advisory = None;
            self.clear_count += 1;
        }

        fn show_modal_info(&mut self, info: &PlanetInfo, on_leave: LeaveRequest) {
            self.modal = Some((info.clone(), on_leave));
            self.modal_shown_count += 1;
        }

        fn hide_modal_info(&mut self) {
            self.modal = None;
            self.hide_count += 1;
        }
    }

    impl RenderSink for RecordingPresenter {
        fn begin_frame(&mut self, _camera: &Camera2D, _viewport: Viewport) {
            self.draws.clear();
            self.draws.push(DrawCall::Begin);
        }

        fn draw_planet(&mut self, planet: &Planet, _camera: &Camera2D) {
            self.draws.push(DrawCall::Planet(planet.name.clone()));
        }

        fn draw_ship(&mut self, _ship: &Ship, role: EntityRole, _camera: &Camera2D) {
            self.draws.push(DrawCall::Ship(role));
        }

        fn draw_minimap(&mut self, minimap: &MinimapView) {
            self.draws.push(DrawCall::Minimap);
            self.last_minimap = Some(minimap.clone());
        }
    }
}
