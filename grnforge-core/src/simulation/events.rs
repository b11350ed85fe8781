//! Queues of events that happen after a fixed delay rather than an exponential wait.

use crate::error::GrnforgeError;
use grnforge_schemas::{engine_config::NumericalParams, genotype::GeneId};
use std::collections::VecDeque;

/// The closed set of deterministic events. Declaration order is the tie-break priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixedEventKind {
    TranscriptionEnd,
    TranslationInitEnd,
    SignalAStart,
    SignalBStart,
    BurnInEnd,
    /// Only scheduled when a trajectory is being recorded.
    SamplingPoint,
}

impl FixedEventKind {
    pub const ALL: [FixedEventKind; 6] = [
        FixedEventKind::TranscriptionEnd,
        FixedEventKind::TranslationInitEnd,
        FixedEventKind::SignalAStart,
        FixedEventKind::SignalBStart,
        FixedEventKind::BurnInEnd,
        FixedEventKind::SamplingPoint,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedEvent {
    /// The gene the event belongs to, or `None` for cell-wide events.
    pub subject: Option<GeneId>,
    pub time: f64,
}

/// One time-ordered queue per event kind, owned by a single cell.
#[derive(Debug, Clone)]
pub struct FixedEventQueues {
    queues: [VecDeque<FixedEvent>; 6],
    time_offset: f64,
    collision_epsilon: f64,
    max_nudges: usize,
}

impl FixedEventQueues {
    pub fn new(numerical: &NumericalParams) -> Self {
        Self {
            queues: Default::default(),
            time_offset: numerical.time_offset,
            collision_epsilon: numerical.collision_epsilon,
            max_nudges: numerical.max_nudges,
        }
    }

    fn collides(&self, time: f64) -> bool {
        self.queues
            .iter()
            .flatten()
            .any(|e| e.time == time || (e.time - time).abs() < self.collision_epsilon)
    }

    /// Inserts an event, pushing its time forward until no queued event shares it.
    /// Returns the time actually scheduled.
    pub fn schedule(&mut self, kind: FixedEventKind, subject: Option<GeneId>, time: f64) -> Result<f64, GrnforgeError> {
        let mut scheduled = time;
        let mut attempts = 0;
        while self.collides(scheduled) {
            if attempts == self.max_nudges {
                return Err(GrnforgeError::EventCollision { kind, time, attempts });
            }
            scheduled += self.time_offset;
            attempts += 1;
        }
        if attempts > 0 {
            log::debug!("{:?} event moved from t = {} to t = {}", kind, time, scheduled);
        }

        let queue = &mut self.queues[kind.index()];
        let idx = queue.partition_point(|e| e.time <= scheduled);
        queue.insert(idx, FixedEvent { subject, time: scheduled });
        Ok(scheduled)
    }

    /// The earliest queued event at or before `limit`.
    pub fn peek_earliest(&self, limit: f64) -> Option<(FixedEventKind, f64)> {
        let mut earliest: Option<(FixedEventKind, f64)> = None;
        for kind in FixedEventKind::ALL {
            if let Some(head) = self.queues[kind.index()].front() {
                if head.time <= limit && earliest.map_or(true, |(_, t)| head.time < t) {
                    earliest = Some((kind, head.time));
                }
            }
        }
        earliest
    }

    /// Removes and returns the earliest queued event at or before `limit`.
    pub fn pop_earliest(&mut self, limit: f64) -> Option<(FixedEventKind, FixedEvent)> {
        let (kind, _) = self.peek_earliest(limit)?;
        self.queues[kind.index()].pop_front().map(|e| (kind, e))
    }

    /// Removes the `occurrence`-th (zero-based) queued event of `kind` for `subject`.
    pub fn remove_nth(&mut self, kind: FixedEventKind, subject: GeneId, occurrence: usize) -> Option<FixedEvent> {
        let queue = &mut self.queues[kind.index()];
        let idx = queue
            .iter()
            .enumerate()
            .filter(|(_, e)| e.subject == Some(subject))
            .nth(occurrence)
            .map(|(i, _)| i)?;
        queue.remove(idx)
    }

    pub fn iter(&self, kind: FixedEventKind) -> impl Iterator<Item = &FixedEvent> {
        self.queues[kind.index()].iter()
    }

    pub fn len(&self, kind: FixedEventKind) -> usize {
        self.queues[kind.index()].len()
    }

    pub fn count_for(&self, kind: FixedEventKind, subject: GeneId) -> usize {
        self.iter(kind).filter(|e| e.subject == Some(subject)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.iter().all(|q| q.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queues() -> FixedEventQueues {
        FixedEventQueues::new(&NumericalParams::default())
    }

    #[test]
    fn colliding_times_across_queues_are_separated() {
        let mut q = queues();
        let t1 = q.schedule(FixedEventKind::TranscriptionEnd, Some(0), 5.0).unwrap();
        let t2 = q.schedule(FixedEventKind::TranslationInitEnd, Some(1), 5.0).unwrap();
        assert_eq!(t1, 5.0);
        assert!(t2 > t1);
        assert!((t2 - t1).abs() >= NumericalParams::default().collision_epsilon);
    }

    #[test]
    fn near_collisions_are_nudged_too() {
        let mut q = queues();
        q.schedule(FixedEventKind::SignalAStart, None, 2.0).unwrap();
        let t = q.schedule(FixedEventKind::BurnInEnd, None, 2.0 + 1e-8).unwrap();
        assert!((t - (2.0 + 1e-8 + 0.01)).abs() < 1e-12);
    }

    #[test]
    fn nudging_is_bounded() {
        let params = NumericalParams { max_nudges: 0, ..NumericalParams::default() };
        let mut q = FixedEventQueues::new(&params);
        q.schedule(FixedEventKind::TranscriptionEnd, Some(0), 1.0).unwrap();
        let err = q.schedule(FixedEventKind::TranscriptionEnd, Some(1), 1.0).unwrap_err();
        assert!(err.is_numerical());
    }

    #[test]
    fn queues_stay_time_ordered() {
        let mut q = queues();
        for t in [3.0, 1.0, 2.0, 0.5] {
            q.schedule(FixedEventKind::TranscriptionEnd, Some(0), t).unwrap();
        }
        let times: Vec<f64> = q.iter(FixedEventKind::TranscriptionEnd).map(|e| e.time).collect();
        assert_eq!(times, vec![0.5, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn pop_returns_global_earliest_within_limit() {
        let mut q = queues();
        q.schedule(FixedEventKind::TranscriptionEnd, Some(0), 4.0).unwrap();
        q.schedule(FixedEventKind::SignalBStart, None, 3.0).unwrap();
        q.schedule(FixedEventKind::TranslationInitEnd, Some(2), 6.0).unwrap();

        assert!(q.pop_earliest(2.0).is_none());
        let (kind, event) = q.pop_earliest(10.0).unwrap();
        assert_eq!(kind, FixedEventKind::SignalBStart);
        assert_eq!(event.subject, None);
        let (kind, _) = q.pop_earliest(10.0).unwrap();
        assert_eq!(kind, FixedEventKind::TranscriptionEnd);
        assert_eq!(q.peek_earliest(5.0), None);
        assert_eq!(q.peek_earliest(10.0), Some((FixedEventKind::TranslationInitEnd, 6.0)));
    }

    #[test]
    fn remove_nth_matches_subject_occurrence() {
        let mut q = queues();
        q.schedule(FixedEventKind::TranslationInitEnd, Some(1), 1.0).unwrap();
        q.schedule(FixedEventKind::TranslationInitEnd, Some(0), 2.0).unwrap();
        q.schedule(FixedEventKind::TranslationInitEnd, Some(1), 3.0).unwrap();

        let removed = q.remove_nth(FixedEventKind::TranslationInitEnd, 1, 1).unwrap();
        assert_eq!(removed.time, 3.0);
        assert_eq!(q.count_for(FixedEventKind::TranslationInitEnd, 1), 1);
        assert!(q.remove_nth(FixedEventKind::TranslationInitEnd, 1, 1).is_none());
        assert_eq!(q.len(FixedEventKind::TranslationInitEnd), 2);
    }
}
