//! Metrics for [crate::FifoSlab].

use prometheus_client::{
    metrics::{counter::Counter, gauge::Gauge},
    registry::Registry,
};

/// Metrics for [crate::FifoSlab].
#[derive(Default)]
pub struct Metrics {
    /// Live records.
    pub items: Gauge,
    /// Unread bytes, including padding.
    pub bytes: Gauge,
    /// Arena capacity in bytes.
    pub capacity: Gauge,
    /// Reallocations of the arena or the index.
    pub grows: Counter,
    /// Times the slab was drained and rewound to offset zero.
    pub compactions: Counter,
}

impl Metrics {
    /// Register metrics with the given registry.
    ///
    /// Metric names will be prefixed with the registry's prefix, if any.
    pub fn register(&self, registry: &mut Registry) {
        registry.register("items", "Live records", self.items.clone());
        registry.register("bytes", "Unread bytes including padding", self.bytes.clone());
        registry.register("capacity", "Arena capacity in bytes", self.capacity.clone());
        registry.register("grows", "Arena or index reallocations", self.grows.clone());
        registry.register(
            "compactions",
            "Drains that rewound the slab",
            self.compactions.clone(),
        );
    }
}
