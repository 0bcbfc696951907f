//! Edge labels and their auto-hide timer
//!
//! Timers are not owned here: arming one returns a [`HideTicket`], the
//! presentation layer waits for the delay and hands the ticket back. Only
//! the most recently armed ticket can still fire, which keeps at most one
//! pending hide at a time.

/// Token for one scheduled hide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HideTicket(u64);

/// A cancellable, restartable one-shot timer
#[derive(Debug, Clone, Default)]
pub struct HideTimer {
    generation: u64,
    armed: Option<u64>,
}

impl HideTimer {
    /// Start (or restart) the timer, superseding any pending ticket
    pub fn arm(&mut self) -> HideTicket {
        self.generation += 1;
        self.armed = Some(self.generation);
        HideTicket(self.generation)
    }

    pub fn cancel(&mut self) {
        self.armed = None;
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Returns true if `ticket` is the pending one; disarms the timer
    pub fn fire(&mut self, ticket: HideTicket) -> bool {
        if self.armed == Some(ticket.0) {
            self.armed = None;
            true
        } else {
            false
        }
    }
}

/// Text and visibility of the two edge labels
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Labels {
    pub left: String,
    pub right: String,
    pub visible: bool,
}

/// Labels plus their hide timer
#[derive(Debug, Clone, Default)]
pub struct LabelState {
    labels: Labels,
    timer: HideTimer,
}

impl LabelState {
    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    /// Show new label text right away
    ///
    /// Cancels any pending hide. When `auto_hide` is set a new hide is
    /// armed and its ticket returned for scheduling.
    pub fn show(&mut self, left: String, right: String, auto_hide: bool) -> Option<HideTicket> {
        self.labels = Labels {
            left,
            right,
            visible: true,
        };
        self.timer.cancel();
        auto_hide.then(|| self.timer.arm())
    }

    /// Hide and clear the labels (empty state)
    pub fn suppress(&mut self) {
        self.labels = Labels::default();
        self.timer.cancel();
    }

    /// The delay for `ticket` elapsed; hide if it is still the pending one
    pub fn expire(&mut self, ticket: HideTicket) -> bool {
        if self.timer.fire(ticket) {
            self.labels.visible = false;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restart_supersedes_pending_ticket() {
        let mut state = LabelState::default();

        let first = state.show("a".into(), "b".into(), true).unwrap();
        let second = state.show("a".into(), "c".into(), true).unwrap();

        assert!(!state.expire(first));
        assert!(state.labels().visible);

        assert!(state.expire(second));
        assert!(!state.labels().visible);
        assert_eq!(state.labels().right, "c");
    }

    #[test]
    fn test_no_auto_hide_cancels_pending() {
        let mut state = LabelState::default();

        let ticket = state.show("a".into(), "b".into(), true).unwrap();
        assert_eq!(state.show("a".into(), String::new(), false), None);

        assert!(!state.expire(ticket));
        assert!(state.labels().visible);
    }

    #[test]
    fn test_suppress_clears_everything() {
        let mut state = LabelState::default();
        let ticket = state.show("a".into(), "b".into(), true).unwrap();

        state.suppress();

        assert_eq!(state.labels(), &Labels::default());
        assert!(!state.expire(ticket));
    }

    #[test]
    fn test_timer_fires_once() {
        let mut timer = HideTimer::default();
        let ticket = timer.arm();

        assert!(timer.is_armed());
        assert!(timer.fire(ticket));
        assert!(!timer.fire(ticket));
        assert!(!timer.is_armed());
    }
}
