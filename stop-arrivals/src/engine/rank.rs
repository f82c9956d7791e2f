//! Arrival ranking.
//!
//! Arrivals are ordered by how much we know about them:
//! 1. Those with an ETA, soonest first
//! 2. Those with only a stop count, nearest first
//! 3. Live vehicles with neither
//! 4. Anything else
//!
//! Ties keep discovery order, so output is reproducible for the same input.

use super::fusion::Arrival;

/// Sort key: (tier, value within tier).
fn rank_key(arrival: &Arrival) -> (u8, u32) {
    match (arrival.eta_minutes, arrival.stops_away) {
        (Some(eta), _) => (0, eta),
        (None, Some(stops)) => (1, stops),
        (None, None) if arrival.is_realtime => (2, 0),
        (None, None) => (3, 0),
    }
}

/// Rank arrivals best-first. The sort is stable.
pub fn rank_arrivals(mut arrivals: Vec<Arrival>) -> Vec<Arrival> {
    arrivals.sort_by_key(rank_key);
    arrivals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arrival(name: &str, eta: Option<u32>, stops: Option<u32>, realtime: bool) -> Arrival {
        Arrival {
            route_short_name: name.to_string(),
            eta_minutes: eta,
            stops_away: stops,
            is_realtime: realtime,
            ..Arrival::default()
        }
    }

    fn names(arrivals: &[Arrival]) -> Vec<&str> {
        arrivals
            .iter()
            .map(|a| a.route_short_name.as_str())
            .collect()
    }

    #[test]
    fn eta_ascending() {
        let ranked = rank_arrivals(vec![
            arrival("b", Some(12), None, false),
            arrival("a", Some(3), None, false),
            arrival("c", Some(40), None, true),
        ]);
        assert_eq!(names(&ranked), ["a", "b", "c"]);
    }

    #[test]
    fn tiers_in_order() {
        let ranked = rank_arrivals(vec![
            arrival("rest", None, None, false),
            arrival("live", None, None, true),
            arrival("stops", None, Some(1), true),
            arrival("eta", Some(50), Some(9), false),
        ]);
        assert_eq!(names(&ranked), ["eta", "stops", "live", "rest"]);
    }

    #[test]
    fn stops_away_ascending_within_tier() {
        let ranked = rank_arrivals(vec![
            arrival("far", None, Some(6), true),
            arrival("near", None, Some(0), true),
        ]);
        assert_eq!(names(&ranked), ["near", "far"]);
    }

    #[test]
    fn ties_keep_discovery_order() {
        let ranked = rank_arrivals(vec![
            arrival("x", Some(5), None, false),
            arrival("y", Some(5), None, true),
            arrival("v1", None, None, true),
            arrival("v2", None, None, true),
            arrival("z", Some(5), None, false),
        ]);
        assert_eq!(names(&ranked), ["x", "y", "z", "v1", "v2"]);
    }

    #[test]
    fn empty_input() {
        assert!(rank_arrivals(vec![]).is_empty());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_arrival() -> impl Strategy<Value = Arrival> {
        (
            proptest::option::of(0u32..300),
            proptest::option::of(0u32..30),
            any::<bool>(),
            any::<u32>(),
        )
            .prop_map(|(eta, stops, realtime, tag)| Arrival {
                route_short_name: tag.to_string(),
                eta_minutes: eta,
                stops_away: stops,
                is_realtime: realtime,
                ..Arrival::default()
            })
    }

    proptest! {
        /// Anything with an ETA precedes anything without one.
        #[test]
        fn eta_bearing_first(arrivals in proptest::collection::vec(arb_arrival(), 0..40)) {
            let ranked = rank_arrivals(arrivals);
            let first_without = ranked.iter().position(|a| a.eta_minutes.is_none());
            if let Some(pos) = first_without {
                prop_assert!(ranked[pos..].iter().all(|a| a.eta_minutes.is_none()));
            }
        }

        /// ETAs are non-decreasing among ETA-bearing arrivals.
        #[test]
        fn etas_ascending(arrivals in proptest::collection::vec(arb_arrival(), 0..40)) {
            let ranked = rank_arrivals(arrivals);
            let etas: Vec<u32> = ranked.iter().filter_map(|a| a.eta_minutes).collect();
            prop_assert!(etas.windows(2).all(|w| w[0] <= w[1]));
        }

        /// Ranking is a permutation of its input.
        #[test]
        fn preserves_elements(arrivals in proptest::collection::vec(arb_arrival(), 0..40)) {
            let ranked = rank_arrivals(arrivals.clone());
            prop_assert_eq!(ranked.len(), arrivals.len());
            for a in &arrivals {
                let in_input = arrivals.iter().filter(|x| *x == a).count();
                let in_output = ranked.iter().filter(|x| *x == a).count();
                prop_assert_eq!(in_input, in_output);
            }
        }

        /// Ranking twice changes nothing.
        #[test]
        fn idempotent(arrivals in proptest::collection::vec(arb_arrival(), 0..40)) {
            let once = rank_arrivals(arrivals);
            let twice = rank_arrivals(once.clone());
            prop_assert_eq!(once, twice);
        }
    }
}
