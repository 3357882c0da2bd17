use autoraffle_execution::Raffle;
use autoraffle_types::Event;
use prometheus_client::{
    encoding::text::encode,
    metrics::{counter::Counter, gauge::Gauge},
    registry::Registry,
};
use std::sync::atomic::AtomicU64;

/// Raffle metrics. Clones share the same underlying values.
#[derive(Clone, Default)]
pub struct Metrics {
    pub entries: Counter<u64, AtomicU64>,
    pub draws_requested: Counter<u64, AtomicU64>,
    pub winners_picked: Counter<u64, AtomicU64>,
    pub rejected: Counter<u64, AtomicU64>,
    pub pool: Gauge<u64, AtomicU64>,
    pub participants: Gauge<u64, AtomicU64>,
}

impl Metrics {
    pub fn register(registry: &mut Registry) -> Self {
        let metrics = Self::default();
        registry.register(
            "raffle_entries",
            "Number of accepted entries.",
            metrics.entries.clone(),
        );
        registry.register(
            "raffle_draws_requested",
            "Number of randomness requests issued.",
            metrics.draws_requested.clone(),
        );
        registry.register(
            "raffle_winners_picked",
            "Number of settled draws.",
            metrics.winners_picked.clone(),
        );
        registry.register(
            "raffle_rejected",
            "Number of rejected raffle operations.",
            metrics.rejected.clone(),
        );
        registry.register(
            "raffle_pool",
            "Value currently held in the pool.",
            metrics.pool.clone(),
        );
        registry.register(
            "raffle_participants",
            "Entries in the current draw cycle.",
            metrics.participants.clone(),
        );
        metrics
    }

    pub(crate) fn observe(&self, event: &Event) {
        match event {
            Event::RaffleEntered { .. } => self.entries.inc(),
            Event::WinnerRequested { .. } => self.draws_requested.inc(),
            Event::WinnerPicked { .. } => self.winners_picked.inc(),
        };
    }

    pub(crate) fn record_state(&self, raffle: &Raffle) {
        self.pool.set(raffle.pool());
        self.participants.set(raffle.participant_count() as u64);
    }
}

/// Render `registry` in the Prometheus text format.
pub fn render(registry: &Registry) -> Result<String, std::fmt::Error> {
    let mut buffer = String::new();
    encode(&mut buffer, registry)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoraffle_execution::mocks::create_participant;

    #[test]
    fn test_render_includes_counters() {
        let mut registry = Registry::default();
        let metrics = Metrics::register(&mut registry);
        metrics.observe(&Event::RaffleEntered {
            participant: create_participant(1),
            amount: 10,
        });
        metrics.observe(&Event::WinnerRequested { request_id: 1 });

        let rendered = render(&registry).unwrap();
        assert!(rendered.contains("raffle_entries_total 1"));
        assert!(rendered.contains("raffle_draws_requested_total 1"));
        assert!(rendered.contains("raffle_winners_picked_total 0"));
        assert!(rendered.contains("raffle_pool 0"));
    }
}
