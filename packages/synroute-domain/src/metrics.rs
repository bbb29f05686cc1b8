//! Run-level metrics. The evaluator reports snake_case fields; the dashboard stores and serves
//! camelCase. Conversion between the two is field-for-field.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::MetricsError;

pub const SOLVABILITY_METRIC: &str = "solvability";

const TOP_K_METRIC_PREFIX: &str = "top-";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reliability {
	pub code: String,
	pub message: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorStatistics {
	pub solvability: EvaluatorStratifiedMetric,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub top_k_accuracy: Option<BTreeMap<u32, EvaluatorStratifiedMetric>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorStratifiedMetric {
	pub overall: EvaluatorMetricResult,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub by_group: Option<BTreeMap<String, EvaluatorMetricResult>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorMetricResult {
	pub value: f64,
	pub ci_lower: f64,
	pub ci_upper: f64,
	pub n_samples: u32,
	pub reliability: Reliability,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatistics {
	pub solvability: StratifiedMetric,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub top_k_accuracy: Option<BTreeMap<u32, StratifiedMetric>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StratifiedMetric {
	pub overall: MetricResult,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub by_group: Option<BTreeMap<String, MetricResult>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricResult {
	pub value: f64,
	pub ci_lower: f64,
	pub ci_upper: f64,
	pub n_samples: u32,
	pub reliability: Reliability,
}

/// One queryable row: a metric's overall value (`group_key` is `None`) or one bucket.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricRow {
	pub metric_name: String,
	pub group_key: Option<String>,
	pub result: MetricResult,
}

impl From<EvaluatorMetricResult> for MetricResult {
	fn from(value: EvaluatorMetricResult) -> Self {
		let EvaluatorMetricResult { value, ci_lower, ci_upper, n_samples, reliability } = value;

		Self { value, ci_lower, ci_upper, n_samples, reliability }
	}
}

impl From<EvaluatorStratifiedMetric> for StratifiedMetric {
	fn from(value: EvaluatorStratifiedMetric) -> Self {
		Self {
			overall: value.overall.into(),
			by_group: value.by_group.filter(|groups| !groups.is_empty()).map(|groups| {
				groups.into_iter().map(|(key, result)| (key, result.into())).collect()
			}),
		}
	}
}

/// Empty `by_group` and `top_k_accuracy` maps become `None`, the shape the metric rows rebuild to.
impl From<EvaluatorStatistics> for RunStatistics {
	fn from(value: EvaluatorStatistics) -> Self {
		Self {
			solvability: value.solvability.into(),
			top_k_accuracy: value
				.top_k_accuracy
				.filter(|by_k| !by_k.is_empty())
				.map(|by_k| by_k.into_iter().map(|(k, metric)| (k, metric.into())).collect()),
		}
	}
}

impl RunStatistics {
	pub fn to_rows(&self) -> Vec<MetricRow> {
		let mut rows = Vec::new();

		push_metric_rows(&mut rows, SOLVABILITY_METRIC, &self.solvability);

		if let Some(by_k) = self.top_k_accuracy.as_ref() {
			for (k, metric) in by_k {
				push_metric_rows(&mut rows, &top_k_metric_name(*k), metric);
			}
		}

		rows
	}

	/// Rebuilds the metrics object from its rows. A metric without bucket rows comes back with
	/// `by_group: None`.
	pub fn from_rows(rows: Vec<MetricRow>) -> Result<Self, MetricsError> {
		let mut overall: BTreeMap<String, MetricResult> = BTreeMap::new();
		let mut groups: BTreeMap<String, BTreeMap<String, MetricResult>> = BTreeMap::new();

		for row in rows {
			match row.group_key {
				None => {
					overall.insert(row.metric_name, row.result);
				},
				Some(group_key) => {
					groups.entry(row.metric_name).or_default().insert(group_key, row.result);
				},
			}
		}

		for metric in groups.keys() {
			if !overall.contains_key(metric) {
				return Err(MetricsError::MissingOverall { metric: metric.clone() });
			}
		}

		let solvability_overall = overall.remove(SOLVABILITY_METRIC).ok_or_else(|| {
			MetricsError::MissingOverall { metric: SOLVABILITY_METRIC.to_string() }
		})?;
		let solvability = StratifiedMetric {
			overall: solvability_overall,
			by_group: groups.remove(SOLVABILITY_METRIC),
		};
		let mut top_k_accuracy = BTreeMap::new();

		for (name, result) in overall {
			let k = parse_top_k_metric_name(&name)
				.ok_or_else(|| MetricsError::UnknownMetric { name: name.clone() })?;

			top_k_accuracy
				.insert(k, StratifiedMetric { overall: result, by_group: groups.remove(&name) });
		}

		Ok(Self {
			solvability,
			top_k_accuracy: (!top_k_accuracy.is_empty()).then_some(top_k_accuracy),
		})
	}
}

pub fn top_k_metric_name(k: u32) -> String {
	format!("{TOP_K_METRIC_PREFIX}{k}")
}

pub fn parse_top_k_metric_name(name: &str) -> Option<u32> {
	name.strip_prefix(TOP_K_METRIC_PREFIX)?.parse().ok()
}

fn push_metric_rows(rows: &mut Vec<MetricRow>, name: &str, metric: &StratifiedMetric) {
	rows.push(MetricRow {
		metric_name: name.to_string(),
		group_key: None,
		result: metric.overall.clone(),
	});

	if let Some(by_group) = metric.by_group.as_ref() {
		for (group_key, result) in by_group {
			rows.push(MetricRow {
				metric_name: name.to_string(),
				group_key: Some(group_key.clone()),
				result: result.clone(),
			});
		}
	}
}
