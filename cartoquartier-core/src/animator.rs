//! Phase progression rule for the "play" animation.
//!
//! The timer lives in the service crate; this module only decides what the
//! phase filter becomes on each tick.

use std::time::Duration;

use crate::models::{Phase, PhaseFilter};

/// Time between two ticks.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1200);

/// The phase filter after one tick.
///
/// A recognized phase moves to the next one in [`Phase::CYCLE`], wrapping after
/// the last. Anything else, `All` included, restarts at the first phase.
pub fn advance(current: &PhaseFilter) -> PhaseFilter {
    let next = match current {
        PhaseFilter::Only(phase) => phase
            .position()
            .map_or(0, |i| (i + 1) % Phase::CYCLE.len()),
        PhaseFilter::All => 0,
    };
    PhaseFilter::Only(Phase::CYCLE[next].clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_from_all_selects_phase_one() {
        assert_eq!(advance(&PhaseFilter::All), PhaseFilter::Only(Phase::One));
    }

    #[test]
    fn ticks_follow_cycle_order_and_wrap() {
        let mut filter = PhaseFilter::Only(Phase::One);
        let mut seen = Vec::new();
        for _ in 0..4 {
            filter = advance(&filter);
            seen.push(filter.clone());
        }
        assert_eq!(
            seen,
            vec![
                PhaseFilter::Only(Phase::Two),
                PhaseFilter::Only(Phase::Three),
                PhaseFilter::Only(Phase::One),
                PhaseFilter::Only(Phase::Two),
            ]
        );
    }

    #[test]
    fn unrecognized_phase_restarts_cycle() {
        let current = PhaseFilter::Only(Phase::Other("phase 4".to_string()));
        assert_eq!(advance(&current), PhaseFilter::Only(Phase::One));
    }
}
