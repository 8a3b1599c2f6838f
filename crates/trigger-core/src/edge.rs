//! Edge detection

use trigger_api::{TransitionType, TriggerMode};

/// Previous result of one trigger's condition plus the mode deciding which
/// changes are reported.
#[derive(Debug, Clone)]
pub struct EdgeDetector {
    mode: TriggerMode,
    previous: bool,
}

impl EdgeDetector {
    pub fn new(mode: TriggerMode) -> Self {
        Self {
            mode,
            previous: false,
        }
    }

    pub fn mode(&self) -> TriggerMode {
        self.mode
    }

    pub fn previous(&self) -> bool {
        self.previous
    }

    /// Record a new evaluation and return the transition to report, if any.
    ///
    /// `dependency_touched` only matters in ALWAYS mode, where a condition that
    /// stays true reports NO_CHANGE whenever one of its inputs changed.
    pub fn observe(&mut self, result: bool, dependency_touched: bool) -> Option<TransitionType> {
        let transition = match (self.previous, result) {
            (false, true) if self.mode != TriggerMode::Falling => Some(TransitionType::Rising),
            (true, false) if self.mode != TriggerMode::Rising => Some(TransitionType::Falling),
            (true, true) if self.mode == TriggerMode::Always && dependency_touched => {
                Some(TransitionType::NoChange)
            }
            _ => None,
        };
        self.previous = result;
        transition
    }

    pub fn reset(&mut self) {
        self.previous = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(mode: TriggerMode, results: &[bool]) -> Vec<TransitionType> {
        let mut detector = EdgeDetector::new(mode);
        results
            .iter()
            .filter_map(|r| detector.observe(*r, true))
            .collect()
    }

    #[test]
    fn test_both_reports_each_edge_once() {
        assert_eq!(
            run(TriggerMode::Both, &[false, true, true, false, false]),
            vec![TransitionType::Rising, TransitionType::Falling]
        );
    }

    #[test]
    fn test_rising_never_falls() {
        assert_eq!(
            run(TriggerMode::Rising, &[true, false, true, false]),
            vec![TransitionType::Rising, TransitionType::Rising]
        );
    }

    #[test]
    fn test_falling_only() {
        assert_eq!(
            run(TriggerMode::Falling, &[true, false, true, false]),
            vec![TransitionType::Falling, TransitionType::Falling]
        );
    }

    #[test]
    fn test_always_reports_no_change_while_true() {
        assert_eq!(
            run(TriggerMode::Always, &[true, true, true, false]),
            vec![
                TransitionType::Rising,
                TransitionType::NoChange,
                TransitionType::NoChange,
                TransitionType::Falling
            ]
        );
    }

    #[test]
    fn test_always_needs_touched_dependency() {
        let mut detector = EdgeDetector::new(TriggerMode::Always);
        assert_eq!(detector.observe(true, false), Some(TransitionType::Rising));
        assert_eq!(detector.observe(true, false), None);
        assert_eq!(detector.observe(true, true), Some(TransitionType::NoChange));
    }

    #[test]
    fn test_initial_false_reports_nothing() {
        let mut detector = EdgeDetector::new(TriggerMode::Both);
        assert_eq!(detector.observe(false, true), None);
        assert!(!detector.previous());
    }

    #[test]
    fn test_previous_updates_even_without_report() {
        let mut detector = EdgeDetector::new(TriggerMode::Falling);
        assert_eq!(detector.observe(true, true), None);
        assert!(detector.previous());
        detector.reset();
        assert!(!detector.previous());
    }
}
