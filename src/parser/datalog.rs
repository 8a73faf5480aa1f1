use serde::Serialize;
/// One device line after tokenizing and scaling.
///
/// The three vectors always have the same length; that length may differ
/// between lines because the channel count drifts with the stream.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ParsedLine {
    #[serde(rename = "rawData")]
    raw_values: Vec<f64>,
    #[serde(rename = "conversionFactors")]
    applied_factors: Vec<f64>,
    #[serde(rename = "parsedData")]
    scaled_values: Vec<f64>,
}
impl ParsedLine {
    /// Pairs each raw value with the factor at the same index.
    ///
    /// Callers reconcile the calibration first; extra factors are ignored and
    /// missing ones default to unity so the length invariant always holds.
    pub fn new(raw_values: Vec<f64>, factors: &[f64]) -> Self {
        let applied_factors: Vec<f64> = (0..raw_values.len())
            .map(|i| factors.get(i).copied().unwrap_or(1.0))
            .collect();
        let scaled_values = raw_values
            .iter()
            .zip(&applied_factors)
            .map(|(raw, factor)| raw * factor)
            .collect();
        Self {
            raw_values,
            applied_factors,
            scaled_values,
        }
    }
    #[cfg(test)]
    pub fn raw_values(&self) -> &[f64] {
        &self.raw_values
    }
    #[cfg(test)]
    pub fn applied_factors(&self) -> &[f64] {
        &self.applied_factors
    }
    pub fn scaled_values(&self) -> &[f64] {
        &self.scaled_values
    }
    /// Whether all three arrays have the same length. Always true for lines
    /// built with [`ParsedLine::new`].
    #[cfg(test)]
    pub fn is_consistent(&self) -> bool {
        self.raw_values.len() == self.applied_factors.len()
            && self.raw_values.len() == self.scaled_values.len()
    }
    pub fn num_channels(&self) -> usize {
        self.raw_values.len()
    }
    /// Scaled values joined with `", "`, as shown in the live view.
    pub fn display(&self) -> String {
        self.scaled_values
            .iter()
            .map(|v| format!("{v:?}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
/// Append-only history of parsed lines in arrival order.
#[derive(Clone, Debug, Default)]
pub struct DataLog {
    lines: Vec<ParsedLine>,
}
impl DataLog {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }
    pub fn append(&mut self, line: ParsedLine) {
        self.lines.push(line);
    }
    pub fn len(&self) -> usize {
        self.lines.len()
    }
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
    pub fn lines(&self) -> &[ParsedLine] {
        &self.lines
    }
    /// The trailing `min(n, len)` lines, oldest first.
    pub fn window(&self, n: usize) -> &[ParsedLine] {
        let start = self.lines.len().saturating_sub(n);
        &self.lines[start..]
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    fn log_of(count: usize) -> DataLog {
        let mut log = DataLog::new();
        for i in 0..count {
            log.append(ParsedLine::new(vec![i as f64], &[1.0]));
        }
        log
    }
    #[test]
    fn parsed_line_scales_elementwise() {
        let line = ParsedLine::new(vec![1.0, 2.0, 3.0], &[2.0, 1.0, 1.0]);
        assert_eq!(line.scaled_values(), &[2.0, 2.0, 3.0]);
        assert_eq!(line.applied_factors(), &[2.0, 1.0, 1.0]);
        assert_eq!(line.display(), "2.0, 2.0, 3.0");
    }
    #[test]
    fn parsed_line_lengths_always_match() {
        let short = ParsedLine::new(vec![1.0, 2.0, 3.0], &[4.0]);
        assert_eq!(short.applied_factors(), &[4.0, 1.0, 1.0]);
        let long = ParsedLine::new(vec![1.0], &[4.0, 5.0, 6.0]);
        assert_eq!(long.applied_factors().len(), 1);
        assert_eq!(long.scaled_values().len(), 1);
        let empty = ParsedLine::new(Vec::new(), &[2.0]);
        assert_eq!(empty.num_channels(), 0);
        assert!(empty.scaled_values().is_empty());
    }
    #[test]
    fn window_returns_trailing_entries_in_order() {
        let log = log_of(5);
        let window: Vec<f64> = log.window(3).iter().map(|l| l.raw_values()[0]).collect();
        assert_eq!(window, vec![2.0, 3.0, 4.0]);
        assert_eq!(log.window(10).len(), 5);
        assert!(log.window(0).is_empty());
        assert!(DataLog::new().window(3).is_empty());
    }
    #[test]
    fn window_is_idempotent() {
        let log = log_of(40);
        let first = log.window(30).to_vec();
        let second = log.window(30).to_vec();
        assert_eq!(first, second);
        assert_eq!(log.len(), 40);
    }
}
