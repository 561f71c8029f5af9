//! Churn scenarios
//!
//! Each scenario drives a fresh dispatcher through rounds of subscribe,
//! fire and unsubscribe, and reports how the storage behaved.

use crate::config::ScenarioConfig;
use event_dispatch::{Dispatcher, DispatcherConfig, DispatcherStats, ExecRule, Listener, TargetId};
use serde::Serialize;
use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Instant;

/// Outcome of one scenario run
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub rounds: usize,
    pub subscriptions: u64,
    pub invocations: u64,
    /// Callback executions observed by the listeners
    pub delivered: u64,
    /// Callback executions predicted from the live count before each fire
    pub expected: u64,
    pub peak_live: usize,
    /// Distinct capacities in the order they were reached
    pub capacity_history: Vec<usize>,
    pub final_stats: DispatcherStats,
    pub elapsed_ms: f64,
}

impl ScenarioReport {
    pub fn is_consistent(&self) -> bool {
        self.delivered == self.expected
    }
}

/// A subscriber that counts the calls it receives
struct Probe {
    id: TargetId,
    hits: Rc<Cell<u64>>,
}

impl Listener for Probe {
    fn listener_id(&self) -> TargetId {
        self.id
    }
}

impl Probe {
    fn hit(&self, _round: &usize) {
        self.hits.set(self.hits.get() + 1);
    }
}

/// Run one scenario on its own dispatcher
pub fn run_scenario(
    scenario: &ScenarioConfig,
    dispatcher_config: &DispatcherConfig,
) -> anyhow::Result<ScenarioReport> {
    log::info!(
        "Running scenario '{}' ({} rounds, {} subscribers per round)",
        scenario.name,
        scenario.rounds,
        scenario.subscribers
    );
    let started = Instant::now();

    let mut dispatcher: Dispatcher<usize> = Dispatcher::with_config(dispatcher_config.clone());
    let hits = Rc::new(Cell::new(0u64));
    let mut retiring: VecDeque<(usize, Vec<TargetId>)> = VecDeque::new();
    let mut capacity_history = vec![dispatcher.capacity()];
    let mut subscriptions = 0u64;
    let mut invocations = 0u64;
    let mut expected = 0u64;
    let mut peak_live = 0;

    for round in 0..scenario.rounds {
        let mut added = Vec::with_capacity(scenario.subscribers);
        for _ in 0..scenario.subscribers {
            let rule = if scenario.trigger_once_every > 0
                && subscriptions % scenario.trigger_once_every as u64 == 0
            {
                ExecRule::TriggerOnce
            } else {
                ExecRule::Persistent
            };

            let probe = Rc::new(Probe {
                id: TargetId::next(),
                hits: Rc::clone(&hits),
            });
            dispatcher.add_method(&probe, Probe::hit, rule)?;
            added.push(probe.listener_id());
            subscriptions += 1;
            track_capacity(&mut capacity_history, dispatcher.capacity());
        }
        if scenario.lifetime > 0 {
            retiring.push_back((round + scenario.lifetime, added));
        }

        peak_live = peak_live.max(dispatcher.live_count());
        expected += dispatcher.live_count() as u64;
        dispatcher.invoke(&round);
        invocations += 1;

        while retiring.front().is_some_and(|(due, _)| *due <= round + 1) {
            if let Some((_, targets)) = retiring.pop_front() {
                for target in targets {
                    dispatcher.remove_object(target)?;
                }
            }
        }

        if scenario.optimize_every > 0 && (round + 1) % scenario.optimize_every == 0 {
            dispatcher.optimize();
        }
        log::trace!("Round {} of '{}': {:?}", round, scenario.name, dispatcher.stats());
    }

    if scenario.shrink_at_end {
        dispatcher.shrink_to_fit();
        track_capacity(&mut capacity_history, dispatcher.capacity());
    }

    let report = ScenarioReport {
        name: scenario.name.clone(),
        rounds: scenario.rounds,
        subscriptions,
        invocations,
        delivered: hits.get(),
        expected,
        peak_live,
        capacity_history,
        final_stats: dispatcher.stats(),
        elapsed_ms: started.elapsed().as_secs_f64() * 1000.0,
    };

    if !report.is_consistent() {
        log::warn!(
            "Scenario '{}' delivered {} calls, expected {}",
            report.name,
            report.delivered,
            report.expected
        );
    }
    log::debug!("Scenario '{}' finished in {:.2} ms", report.name, report.elapsed_ms);
    Ok(report)
}

fn track_capacity(history: &mut Vec<usize>, capacity: usize) {
    if history.last() != Some(&capacity) {
        history.push(capacity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steady_scenario_doubles_capacity() {
        let scenario = ScenarioConfig::new("steady", 3, 3);
        let report = run_scenario(&scenario, &DispatcherConfig::default()).unwrap();

        assert_eq!(report.subscriptions, 9);
        assert_eq!(report.invocations, 3);
        // 3 + 6 + 9 live records across the three fires
        assert_eq!(report.expected, 18);
        assert!(report.is_consistent());
        assert_eq!(report.capacity_history, vec![0, 1, 2, 4, 8, 16]);
        assert_eq!(report.final_stats.live, 9);
    }

    #[test]
    fn test_churn_scenario_stays_bounded() {
        let scenario = ScenarioConfig {
            lifetime: 1,
            ..ScenarioConfig::new("churn", 200, 4)
        };
        let report = run_scenario(&scenario, &DispatcherConfig::default()).unwrap();

        assert!(report.is_consistent());
        assert_eq!(report.delivered, 800);
        assert_eq!(report.final_stats.live, 0);
        assert!(report.final_stats.capacity <= 8);
        assert!(report.final_stats.compact_count > 0);
    }

    #[test]
    fn test_trigger_once_scenario() {
        let scenario = ScenarioConfig {
            trigger_once_every: 1,
            shrink_at_end: true,
            ..ScenarioConfig::new("once", 10, 2)
        };
        let report = run_scenario(&scenario, &DispatcherConfig::default()).unwrap();

        assert_eq!(report.delivered, 20);
        assert!(report.is_consistent());
        assert_eq!(report.final_stats.capacity, 0);
        assert_eq!(report.capacity_history.last(), Some(&0));
    }

    #[test]
    fn test_initial_capacity_is_respected() {
        let scenario = ScenarioConfig::new("prealloc", 2, 2);
        let config = DispatcherConfig::new().with_initial_capacity(32);
        let report = run_scenario(&scenario, &config).unwrap();

        assert_eq!(report.capacity_history, vec![32]);
    }
}
