use monitor_core::RunMetrics;
use serde::Serialize;

type Extractor = (&'static str, fn(&RunMetrics) -> Option<f64>);

/// Metrics aggregated across seeds, in table order.
const EXTRACTORS: &[Extractor] = &[
    ("alarms_raised", |m: &RunMetrics| Some(m.alarms_raised as f64)),
    ("alarms_cleared", |m: &RunMetrics| Some(m.alarms_cleared as f64)),
    ("faults_injected", |m: &RunMetrics| Some(m.faults_injected as f64)),
    ("dropout_faults", |m: &RunMetrics| Some(m.dropout_faults as f64)),
    ("spike_faults", |m: &RunMetrics| Some(m.spike_faults as f64)),
    ("time_nominal_ms", |m: &RunMetrics| Some(m.nominal_ms as f64)),
    ("time_alarmed_ms", |m: &RunMetrics| Some(m.alarmed_ms as f64)),
    ("alarmed_fraction", alarmed_fraction),
    // Seeds that never cleared an alarm contribute no sample.
    ("mean_time_to_clear_ms", RunMetrics::mean_time_to_clear_ms),
];

fn alarmed_fraction(metrics: &RunMetrics) -> Option<f64> {
    let total = metrics.alarmed_ms + metrics.nominal_ms;
    (total > 0).then(|| metrics.alarmed_ms as f64 / total as f64)
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub seed_count: usize,
    pub failed_count: usize,
    pub metrics: Vec<MetricSummary>,
}

#[derive(Debug, Serialize)]
pub struct MetricSummary {
    pub name: String,
    /// Seeds that contributed a value.
    pub samples: usize,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub stddev: Option<f64>,
}

pub fn compute_summary(metrics: &[&RunMetrics], failed_count: usize) -> SummaryStats {
    SummaryStats {
        seed_count: metrics.len(),
        failed_count,
        metrics: EXTRACTORS
            .iter()
            .map(|(name, extract)| {
                let values: Vec<f64> = metrics.iter().filter_map(|m| extract(m)).collect();
                compute_metric_summary(name, &values)
            })
            .collect(),
    }
}

fn compute_metric_summary(name: &str, values: &[f64]) -> MetricSummary {
    if values.is_empty() {
        return MetricSummary {
            name: name.to_string(),
            samples: 0,
            mean: None,
            min: None,
            max: None,
            stddev: None,
        };
    }
    let count = values.len() as f64;
    let mean = values.iter().sum::<f64>() / count;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;

    MetricSummary {
        name: name.to_string(),
        samples: values.len(),
        mean: Some(mean),
        min: Some(min),
        max: Some(max),
        stddev: Some(variance.sqrt()),
    }
}

/// `{ "metric": { "samples", "mean", "min", "max", "stddev" }, ... }`
pub fn build_aggregated_metrics(stats: &SummaryStats) -> serde_json::Value {
    let map = stats
        .metrics
        .iter()
        .map(|metric| {
            (
                metric.name.clone(),
                serde_json::json!({
                    "samples": metric.samples,
                    "mean": metric.mean,
                    "min": metric.min,
                    "max": metric.max,
                    "stddev": metric.stddev,
                }),
            )
        })
        .collect();
    serde_json::Value::Object(map)
}

fn cell(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}

pub fn format_summary(batch_name: &str, ticks: u64, stats: &SummaryStats) -> String {
    let mut out = format!(
        "\n=== {} ({} seeds, {} ticks each) ===\n\n",
        batch_name, stats.seed_count, ticks
    );
    out.push_str(&format!(
        "{:<24} {:>10} {:>10} {:>10} {:>10}\n",
        "Metric", "Mean", "Min", "Max", "StdDev"
    ));
    out.push_str(&"-".repeat(68));
    out.push('\n');
    for metric in &stats.metrics {
        out.push_str(&format!(
            "{:<24} {:>10} {:>10} {:>10} {:>10}\n",
            metric.name,
            cell(metric.mean),
            cell(metric.min),
            cell(metric.max),
            cell(metric.stddev)
        ));
    }
    out.push_str(&format!(
        "{:<24} {}/{}\n",
        "failed_seeds",
        stats.failed_count,
        stats.seed_count + stats.failed_count
    ));
    out
}

pub fn print_summary(batch_name: &str, ticks: u64, stats: &SummaryStats) {
    print!("{}", format_summary(batch_name, ticks, stats));
}
