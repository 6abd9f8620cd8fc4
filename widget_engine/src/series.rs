use crate::palette;
use serde_json::Value as JsonValue;
use std::collections::VecDeque;
use std::num::NonZeroUsize;
use types::{ChartData, ChartSeries, RawDataset, RawSeries};

/// Parse a point limit as servers send it: a number, or a string that
/// starts with an integer (`"30"`, `" 30 points"`).
///
/// Anything else, including zero and negative values, means "unbounded".
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_limit(value: Option<&JsonValue>) -> Option<NonZeroUsize> {
    let limit = match value? {
        JsonValue::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.is_finite() && *float >= 1.0)
                .map(|float| float.trunc() as u64)
        })?,
        JsonValue::String(text) => leading_integer(text)?,
        _ => return None,
    };

    NonZeroUsize::new(usize::try_from(limit).ok()?)
}

fn leading_integer(text: &str) -> Option<u64> {
    let text = text.trim_start();
    let text = text.strip_prefix('+').unwrap_or(text);
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());

    text[..end].parse().ok()
}

#[derive(Debug, Clone, PartialEq)]
struct Series {
    name: String,
    values: VecDeque<f64>,
}

/// Labels plus per-series values, optionally bounded.
///
/// When a limit is set, every push evicts the oldest entries until the
/// labels and each series hold at most `limit` points. Series are trimmed
/// independently, so a series that skipped some pushes keeps older points.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SeriesBuffer {
    labels: VecDeque<JsonValue>,
    series: Vec<Series>,
    limit: Option<NonZeroUsize>,
}

impl SeriesBuffer {
    pub const fn new(limit: Option<NonZeroUsize>) -> Self {
        Self {
            labels: VecDeque::new(),
            series: Vec::new(),
            limit,
        }
    }

    pub fn from_raw(raw: RawDataset, limit: Option<NonZeroUsize>) -> Self {
        let mut buffer = Self {
            labels: raw.labels.into(),
            series: raw
                .series
                .into_iter()
                .map(|series| Series {
                    name: series.name,
                    values: series.values.into(),
                })
                .collect(),
            limit,
        };
        buffer.evict();
        buffer
    }

    pub const fn limit(&self) -> Option<NonZeroUsize> {
        self.limit
    }

    /// Number of labels currently held
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    pub fn labels(&self) -> impl Iterator<Item = &JsonValue> {
        self.labels.iter()
    }

    pub fn values(&self, series: usize) -> Option<Vec<f64>> {
        self.series
            .get(series)
            .map(|series| series.values.iter().copied().collect())
    }

    /// Append one label and one value per series.
    ///
    /// Values past the known series open new series.
    pub fn push(&mut self, label: JsonValue, values: &[f64]) {
        self.labels.push_back(label);

        for (index, value) in values.iter().enumerate() {
            if index == self.series.len() {
                self.series.push(Series {
                    name: format!("series {}", index + 1),
                    values: VecDeque::new(),
                });
            }
            self.series[index].values.push_back(*value);
        }

        self.evict();
    }

    pub fn clear(&mut self) {
        self.labels.clear();
        self.series.clear();
    }

    fn evict(&mut self) {
        let Some(limit) = self.limit.map(NonZeroUsize::get) else {
            return;
        };

        while self.labels.len() > limit {
            self.labels.pop_front();
        }
        for series in &mut self.series {
            while series.values.len() > limit {
                series.values.pop_front();
            }
        }
    }

    pub fn to_raw(&self) -> RawDataset {
        RawDataset {
            labels: self.labels.iter().cloned().collect(),
            series: self
                .series
                .iter()
                .map(|series| RawSeries {
                    name: series.name.clone(),
                    values: series.values.iter().copied().collect(),
                })
                .collect(),
        }
    }

    /// Renderer-native data, one palette color pair per series position.
    pub fn chart_data(&self) -> ChartData {
        ChartData {
            labels: self.labels.iter().cloned().collect(),
            datasets: self
                .series
                .iter()
                .enumerate()
                .map(|(index, series)| {
                    let (border, fill) = palette::colors(index);
                    ChartSeries {
                        label: series.name.clone(),
                        data: series.values.iter().copied().collect(),
                        border_color: border.to_string(),
                        background_color: fill.to_string(),
                    }
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn limit(n: usize) -> Option<NonZeroUsize> {
        NonZeroUsize::new(n)
    }

    #[test]
    fn test_parse_limit_numbers() {
        assert_eq!(parse_limit(Some(&json!(30))), limit(30));
        assert_eq!(parse_limit(Some(&json!(12.9))), limit(12));
        assert_eq!(parse_limit(Some(&json!(0))), None);
        assert_eq!(parse_limit(Some(&json!(-4))), None);
        assert_eq!(parse_limit(Some(&json!(0.5))), None);
    }

    #[test]
    fn test_parse_limit_strings() {
        assert_eq!(parse_limit(Some(&json!("30"))), limit(30));
        assert_eq!(parse_limit(Some(&json!("  8 points"))), limit(8));
        assert_eq!(parse_limit(Some(&json!("+5"))), limit(5));
        assert_eq!(parse_limit(Some(&json!("-5"))), None);
        assert_eq!(parse_limit(Some(&json!("lots"))), None);
        assert_eq!(parse_limit(Some(&json!(""))), None);
    }

    #[test]
    fn test_parse_limit_other_values() {
        assert_eq!(parse_limit(None), None);
        assert_eq!(parse_limit(Some(&json!(null))), None);
        assert_eq!(parse_limit(Some(&json!(true))), None);
        assert_eq!(parse_limit(Some(&json!([10]))), None);
    }

    #[test]
    fn test_push_keeps_most_recent_points_in_order() {
        let mut buffer = SeriesBuffer::new(limit(3));

        for step in 0..10 {
            buffer.push(json!(step), &[f64::from(step)]);
        }

        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.values(0), Some(vec![7.0, 8.0, 9.0]));
        assert_eq!(
            buffer.labels().cloned().collect::<Vec<_>>(),
            vec![json!(7), json!(8), json!(9)]
        );
    }

    #[test]
    fn test_unbounded_buffer_keeps_everything() {
        let mut buffer = SeriesBuffer::new(None);

        for step in 0..50 {
            buffer.push(json!(step), &[1.0, 2.0]);
        }

        assert_eq!(buffer.len(), 50);
        assert_eq!(buffer.values(1).map(|values| values.len()), Some(50));
    }

    #[test]
    fn test_series_are_trimmed_independently() {
        let mut buffer = SeriesBuffer::new(limit(2));

        buffer.push(json!("a"), &[1.0, 10.0]);
        buffer.push(json!("b"), &[2.0]);
        buffer.push(json!("c"), &[3.0]);

        assert_eq!(buffer.values(0), Some(vec![2.0, 3.0]));
        assert_eq!(buffer.values(1), Some(vec![10.0]));
    }

    #[test]
    fn test_extra_values_open_new_series() {
        let mut buffer = SeriesBuffer::new(None);

        buffer.push(json!(1), &[1.0]);
        buffer.push(json!(2), &[2.0, 5.0]);

        assert_eq!(buffer.series_count(), 2);
        assert_eq!(buffer.values(1), Some(vec![5.0]));
        assert_eq!(buffer.to_raw().series[1].name, "series 2");
    }

    #[test]
    fn test_from_raw_applies_limit() {
        let raw = RawDataset {
            labels: (0..5).map(|step| json!(step)).collect(),
            series: vec![RawSeries {
                name: "load".to_string(),
                values: vec![0.0, 1.0, 2.0, 3.0, 4.0],
            }],
        };

        let buffer = SeriesBuffer::from_raw(raw, limit(2));

        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.values(0), Some(vec![3.0, 4.0]));
    }

    #[test]
    fn test_chart_data_assigns_palette_colors() {
        let mut buffer = SeriesBuffer::new(None);
        buffer.push(json!("t0"), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);

        let data = buffer.chart_data();

        assert_eq!(data.labels, vec![json!("t0")]);
        assert_eq!(data.datasets.len(), 7);
        for (index, series) in data.datasets.iter().enumerate() {
            let (border, fill) = palette::colors(index);
            assert_eq!(series.border_color, border);
            assert_eq!(series.background_color, fill);
        }
        assert_eq!(data.datasets[6].border_color, data.datasets[0].border_color);
    }
}
