//! Refresh gate for the saved-cities list.
//!
//! Ensures only one refresh runs at a time. Used by HomeModel.

/// Refresh state for a screen that owns a city list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshState {
    #[default]
    Idle,
    Loading,
}

impl RefreshState {
    /// True if a new refresh can be started.
    pub fn can_start_refresh(self) -> bool {
        matches!(self, RefreshState::Idle)
    }

    /// True while a refresh is in flight.
    pub fn is_loading(self) -> bool {
        matches!(self, RefreshState::Loading)
    }

    /// State after a refresh was requested. Stays `Loading` if one is already running.
    pub fn on_refresh_started(self) -> Self {
        RefreshState::Loading
    }

    /// State after processing a RefreshDone message, success or failure.
    pub fn on_refresh_done(self) -> Self {
        RefreshState::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_allows_refresh() {
        let s = RefreshState::Idle;
        assert!(s.can_start_refresh());
        assert!(!s.is_loading());
    }

    #[test]
    fn loading_blocks_refresh() {
        let s = RefreshState::Loading;
        assert!(!s.can_start_refresh());
        assert!(s.is_loading());
    }

    #[test]
    fn start_transitions_to_loading() {
        assert_eq!(RefreshState::Idle.on_refresh_started(), RefreshState::Loading);
    }

    #[test]
    fn refresh_done_transitions_to_idle() {
        assert_eq!(RefreshState::Loading.on_refresh_done(), RefreshState::Idle);
    }

    #[test]
    fn default_is_idle() {
        assert_eq!(RefreshState::default(), RefreshState::Idle);
    }
}
