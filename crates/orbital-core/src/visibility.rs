//! Display visibility gate.

/// Tracks whether the display is visible and for how long it was hidden.
#[derive(Debug, Clone, Default)]
pub struct VisibilityGate {
    hidden_since_ms: Option<u64>,
}

impl VisibilityGate {
    /// Create a gate that starts visible.
    pub const fn new() -> Self {
        Self {
            hidden_since_ms: None,
        }
    }

    /// Record a visibility change at `now_ms`.
    ///
    /// On a hidden-to-visible change returns how long the display was
    /// hidden. Repeated calls with the same state are no-ops.
    pub const fn set(&mut self, visible: bool, now_ms: u64) -> Option<u64> {
        match (visible, self.hidden_since_ms) {
            (false, None) => {
                self.hidden_since_ms = Some(now_ms);
                None
            }
            (true, Some(since)) => {
                self.hidden_since_ms = None;
                Some(now_ms.saturating_sub(since))
            }
            _ => None,
        }
    }

    /// Whether the display is currently visible.
    pub const fn is_visible(&self) -> bool {
        self.hidden_since_ms.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resume_reports_hidden_duration() {
        let mut gate = VisibilityGate::new();
        assert!(gate.is_visible());
        assert_eq!(gate.set(false, 1000), None);
        assert!(!gate.is_visible());
        // A second hide does not reset the start.
        assert_eq!(gate.set(false, 2000), None);
        assert_eq!(gate.set(true, 4500), Some(3500));
        assert!(gate.is_visible());
        assert_eq!(gate.set(true, 5000), None);
    }
}
