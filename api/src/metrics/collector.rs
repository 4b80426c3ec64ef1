//! Scrape-time collector over the sample store.
//!
//! `SampleCollector` is registered in the application's Prometheus registry and
//! turns the store into metric families on every scrape. It never waits on the
//! update worker: it copies the store under its lock and filters expired samples
//! itself, so a scrape that races a pending sweep is still correct.

use chrono::{DateTime, Utc};
use prometheus::core::{Collector, Desc};
use prometheus::proto::{Counter, Gauge, LabelPair, Metric, MetricFamily, MetricType};
use shared::models::{Sample, ValueKind};
use shared::storage::SampleStore;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::LastPush;

/// Name of the liveness gauge.
pub const LAST_PUSH_METRIC: &str = "domoticz_last_push_timestamp_seconds";

/// Help text of the liveness gauge.
pub const LAST_PUSH_HELP: &str =
    "Unix timestamp of the last received domoticz metrics push in seconds.";

/// Prometheus collector exposing every live sample plus the liveness gauge.
pub struct SampleCollector {
    store: Arc<dyn SampleStore>,
    last_push: Arc<LastPush>,
    desc: Desc,
}

impl SampleCollector {
    /// Creates a collector reading from `store` and `last_push`.
    ///
    /// # Errors
    ///
    /// Returns an error if the liveness gauge descriptor is rejected.
    pub fn new(store: Arc<dyn SampleStore>, last_push: Arc<LastPush>) -> prometheus::Result<Self> {
        let desc = Desc::new(
            LAST_PUSH_METRIC.to_string(),
            LAST_PUSH_HELP.to_string(),
            Vec::new(),
            HashMap::new(),
        )?;

        Ok(Self {
            store,
            last_push,
            desc,
        })
    }

    /// Collects metric families as seen at `now`.
    ///
    /// The liveness gauge always comes first. Samples expired at `now` are skipped,
    /// as are samples whose name or labels Prometheus would reject.
    #[must_use]
    pub fn collect_at(&self, now: DateTime<Utc>) -> Vec<MetricFamily> {
        let snapshot = self.store.snapshot_all();

        let mut families = Vec::with_capacity(snapshot.len() + 1);
        families.push(metric_family(
            LAST_PUSH_METRIC,
            LAST_PUSH_HELP,
            ValueKind::Gauge,
            &BTreeMap::new(),
            self.last_push.seconds(),
        ));

        let mut skipped = 0usize;
        for sample in snapshot {
            if sample.is_expired_at(now) {
                skipped += 1;
                continue;
            }
            if let Err(e) = check_exportable(&sample) {
                tracing::warn!(
                    sensor_id = sample.id,
                    metric = %sample.name,
                    error = %e,
                    "Skipping sample with invalid metric descriptor"
                );
                continue;
            }
            families.push(sample_family(&sample));
        }

        if skipped > 0 {
            tracing::debug!(skipped, "Skipped expired samples awaiting sweep");
        }

        families
    }
}

impl Collector for SampleCollector {
    fn desc(&self) -> Vec<&Desc> {
        vec![&self.desc]
    }

    fn collect(&self) -> Vec<MetricFamily> {
        self.collect_at(Utc::now())
    }
}

/// Validates a sample's name, help, and labels the way a registered descriptor would be.
fn check_exportable(sample: &Sample) -> prometheus::Result<()> {
    let labels: HashMap<String, String> = sample
        .labels
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Desc::new(sample.name.clone(), sample.help.clone(), Vec::new(), labels).map(|_| ())
}

fn sample_family(sample: &Sample) -> MetricFamily {
    metric_family(
        &sample.name,
        &sample.help,
        sample.kind,
        &sample.labels,
        sample.value,
    )
}

fn metric_family(
    name: &str,
    help: &str,
    kind: ValueKind,
    labels: &BTreeMap<String, String>,
    value: f64,
) -> MetricFamily {
    let mut metric = Metric::default();
    for (label, label_value) in labels {
        let mut pair = LabelPair::default();
        pair.set_name(label.clone());
        pair.set_value(label_value.clone());
        metric.mut_label().push(pair);
    }

    let mut family = MetricFamily::default();
    match kind {
        ValueKind::Counter => {
            let mut counter = Counter::default();
            counter.set_value(value);
            metric.set_counter(counter);
            family.set_field_type(MetricType::COUNTER);
        }
        ValueKind::Gauge => {
            let mut gauge = Gauge::default();
            gauge.set_value(value);
            metric.set_gauge(gauge);
            family.set_field_type(MetricType::GAUGE);
        }
    }
    family.set_name(name.to_string());
    family.set_help(help.to_string());
    family.mut_metric().push(metric);
    family
}
