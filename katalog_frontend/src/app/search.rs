use std::time::Instant;

use log::{debug, warn};

use crate::api::RemoteError;
use crate::config::SearchSettings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    Debouncing,
    Loading,
    Results,
    Empty,
    Error(String),
}

/// A lookup the owner must send to the gateway, tagged with the generation
/// it answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub generation: u64,
    pub query: String,
}

/// Search-as-you-type over any result type.
///
/// Every input change bumps `generation`. A lookup is released by `tick`
/// only after the input has been quiet for the configured interval and no
/// other lookup is in flight; a response is applied only if its generation
/// is still current, so superseded answers never reach `results`.
pub struct DebouncedSearch<T> {
    settings: SearchSettings,
    query: String,
    dirty_since: Option<Instant>,
    generation: u64,
    in_flight: Option<u64>,
    results: Vec<T>,
    phase: SearchPhase,
}

impl<T> DebouncedSearch<T> {
    pub fn new(settings: SearchSettings) -> Self {
        Self {
            settings,
            query: String::new(),
            dirty_since: None,
            generation: 0,
            in_flight: None,
            results: Vec::new(),
            phase: SearchPhase::Idle,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[T] {
        &self.results
    }

    pub fn phase(&self) -> &SearchPhase {
        &self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == SearchPhase::Loading
    }

    pub fn set_query(&mut self, text: impl Into<String>, now: Instant) {
        let text = text.into();
        if text == self.query {
            return;
        }
        self.query = text;
        self.generation += 1;

        if self.query.trim().chars().count() < self.settings.min_chars {
            self.dirty_since = None;
            self.results.clear();
            self.phase = SearchPhase::Idle;
            return;
        }
        self.dirty_since = Some(now);
        self.phase = SearchPhase::Debouncing;
    }

    pub fn clear(&mut self) {
        self.set_query(String::new(), Instant::now());
    }

    pub fn tick(&mut self, now: Instant) -> Option<SearchRequest> {
        let since = self.dirty_since?;
        if now.saturating_duration_since(since) < self.settings.quiet_interval {
            return None;
        }
        if self.in_flight.is_some() {
            // Released once the outstanding lookup settles.
            return None;
        }
        self.dirty_since = None;
        self.in_flight = Some(self.generation);
        self.phase = SearchPhase::Loading;
        Some(SearchRequest {
            generation: self.generation,
            query: self.query.trim().to_string(),
        })
    }

    /// Applies a lookup result. Returns false when it was superseded.
    pub fn apply(&mut self, generation: u64, result: Result<Vec<T>, RemoteError>) -> bool {
        if self.in_flight == Some(generation) {
            self.in_flight = None;
        }
        if generation != self.generation {
            debug!(
                "dropping search response for generation {generation}, current is {}",
                self.generation
            );
            return false;
        }
        match result {
            Ok(items) => {
                self.phase = if items.is_empty() {
                    SearchPhase::Empty
                } else {
                    SearchPhase::Results
                };
                self.results = items;
            }
            Err(err) => {
                warn!("search for {:?} failed: {err}", self.query);
                self.results.clear();
                self.phase = SearchPhase::Error(err.message().to_string());
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;

    const QUIET: Duration = Duration::from_millis(300);

    fn engine() -> DebouncedSearch<String> {
        DebouncedSearch::new(SearchSettings {
            quiet_interval: QUIET,
            min_chars: 2,
        })
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn rapid_typing_sends_only_the_last_query() {
        let t0 = Instant::now();
        let mut search = engine();
        let mut requests = Vec::new();

        search.set_query("a", t0);
        requests.extend(search.tick(t0 + ms(50)));
        search.set_query("ab", t0 + ms(100));
        requests.extend(search.tick(t0 + ms(150)));
        search.set_query("abc", t0 + ms(200));
        requests.extend(search.tick(t0 + ms(400)));
        requests.extend(search.tick(t0 + ms(500)));
        requests.extend(search.tick(t0 + ms(900)));

        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].query, "abc");
        assert_eq!(search.phase(), &SearchPhase::Loading);
    }

    #[test]
    fn short_input_clears_results_without_lookup() {
        let t0 = Instant::now();
        let mut search = engine();
        search.set_query("dune", t0);
        let request = search.tick(t0 + QUIET).expect("lookup issued");
        assert!(search.apply(request.generation, Ok(vec!["Dune".to_string()])));
        assert_eq!(search.results().len(), 1);

        search.set_query("d", t0 + ms(1000));
        assert!(search.results().is_empty());
        assert_eq!(search.phase(), &SearchPhase::Idle);
        assert_eq!(search.tick(t0 + ms(5000)), None);
    }

    #[test]
    fn stale_response_is_ignored_and_next_lookup_waits_for_it() {
        let t0 = Instant::now();
        let mut search = engine();
        search.set_query("dun", t0);
        let first = search.tick(t0 + QUIET).unwrap();

        search.set_query("dune", t0 + ms(400));
        assert_eq!(search.phase(), &SearchPhase::Debouncing);
        // Quiet interval elapsed, but the first lookup has not settled.
        assert_eq!(search.tick(t0 + ms(800)), None);

        assert!(!search.apply(first.generation, Ok(vec!["Dunkirk".to_string()])));
        assert!(search.results().is_empty());

        let second = search.tick(t0 + ms(801)).unwrap();
        assert_eq!(second.query, "dune");
        assert!(search.apply(second.generation, Ok(vec![])));
        assert_eq!(search.phase(), &SearchPhase::Empty);
    }

    #[test]
    fn failure_clears_previous_results() {
        let t0 = Instant::now();
        let mut search = engine();
        search.set_query("arrival", t0);
        let first = search.tick(t0 + QUIET).unwrap();
        search.apply(first.generation, Ok(vec!["Arrival".to_string()]));

        search.set_query("arrival 2", t0 + ms(1000));
        let second = search.tick(t0 + ms(1300)).unwrap();
        search.apply(second.generation, Err(RemoteError::new("Search is unavailable")));

        assert!(search.results().is_empty());
        assert_eq!(
            search.phase(),
            &SearchPhase::Error("Search is unavailable".to_string())
        );
    }

    #[test]
    fn lookup_query_is_trimmed() {
        let t0 = Instant::now();
        let mut search = engine();
        search.set_query("  solaris ", t0);
        assert_eq!(search.tick(t0 + QUIET).unwrap().query, "solaris");
    }
}
