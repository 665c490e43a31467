use super::entity::EntityId;

/// Work pushed to a later frame so the input that caused it cannot also be
/// read by what it opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredAction {
    ShowPlanetInfo { planet: EntityId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Scheduled {
    due_frame: u64,
    action: DeferredAction,
}

/// One-shot actions keyed by frame number. Drained once per frame; nothing
/// scheduled during frame N fires before frame N + 1.
#[derive(Debug, Default)]
pub struct DeferredQueue {
    scheduled: Vec<Scheduled>,
}

impl DeferredQueue {
    pub fn schedule(&mut self, current_frame: u64, delay_frames: u64, action: DeferredAction) {
        self.scheduled.push(Scheduled {
            due_frame: current_frame.saturating_add(delay_frames.max(1)),
            action,
        });
    }

    /// Removes and returns every action due at `frame`, oldest first.
    pub fn drain_due(&mut self, frame: u64) -> Vec<DeferredAction> {
        let mut due = Vec::new();
        self.scheduled.retain(|entry| {
            if entry.due_frame <= frame {
                due.push(entry.action);
                false
            } else {
                true
            }
        });
        due
    }

    pub fn len(&self) -> usize {
        self.scheduled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scheduled.is_empty()
    }
}
