use crate::parser::tokenizer::parse_token;
pub const DEFAULT_FACTOR: f64 = 1.0;
/// One slot added to or removed from the calibration vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResizeStep {
    /// A new channel was appended at this index.
    Added(usize),
    /// The channel at this index was removed from the tail.
    Removed(usize),
}
/// Per-channel scale factors, index = channel number.
#[derive(Clone, Debug, Default)]
pub struct ChannelCalibration {
    factors: Vec<f64>,
}
impl ChannelCalibration {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.factors.len()
    }
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }
    #[cfg(test)]
    pub fn get(&self, index: usize) -> Option<f64> {
        self.factors.get(index).copied()
    }
    /// Grows or shrinks one slot at a time until `len() == target_len`.
    ///
    /// Every slot change is reported in order so observers can mirror the
    /// channel list step by step. New slots start at [`DEFAULT_FACTOR`].
    pub fn reconcile(&mut self, target_len: usize) -> Vec<ResizeStep> {
        let mut steps = Vec::new();
        while self.factors.len() < target_len {
            steps.push(ResizeStep::Added(self.factors.len()));
            self.factors.push(DEFAULT_FACTOR);
        }
        while self.factors.len() > target_len {
            self.factors.pop();
            steps.push(ResizeStep::Removed(self.factors.len()));
        }
        steps
    }
    /// Drops every factor and seeds `len` unity factors.
    pub fn reset(&mut self, len: usize) -> Vec<ResizeStep> {
        let mut steps = self.reconcile(0);
        steps.extend(self.reconcile(len));
        steps
    }
    /// Overwrites one factor. Returns `false` (and keeps the old value) when
    /// `index` is out of range or `value` is not finite.
    pub fn set(&mut self, index: usize, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        match self.factors.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
    /// Like [`set`](Self::set) but takes the raw text typed by the user.
    pub fn set_from_str(&mut self, index: usize, text: &str) -> bool {
        match parse_token(text) {
            Some(value) => self.set(index, value),
            None => false,
        }
    }
    /// Detached copy of the current factors.
    pub fn snapshot(&self) -> Vec<f64> {
        self.factors.clone()
    }
}
