#[cfg(test)]
use std::collections::VecDeque;
use std::thread;
use std::time::{Duration, Instant};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::parser::ParserError;
/// Anything that yields device lines one at a time.
pub trait LineSource {
    /// Next complete line with its terminator stripped.
    ///
    /// `Ok(None)` means no full line arrived within the read timeout; that is
    /// the normal idle state, not an error.
    fn read_line(&mut self) -> Result<Option<String>, ParserError>;
    /// Drops anything buffered but not yet returned by `read_line`.
    fn discard_input(&mut self) -> Result<(), ParserError>;
    fn set_baud_rate(&mut self, _baud_rate: u32) -> Result<(), ParserError> {
        Ok(())
    }
}
impl<S: LineSource + ?Sized> LineSource for Box<S> {
    fn read_line(&mut self) -> Result<Option<String>, ParserError> {
        (**self).read_line()
    }
    fn discard_input(&mut self) -> Result<(), ParserError> {
        (**self).discard_input()
    }
    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<(), ParserError> {
        (**self).set_baud_rate(baud_rate)
    }
}
/// In-memory source for deterministic playback.
///
/// `None` entries play back as read timeouts.
#[cfg(test)]
pub struct ManualSource {
    queue: VecDeque<Option<String>>,
}
#[cfg(test)]
impl ManualSource {
    pub fn new<I, L>(lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        Self {
            queue: lines.into_iter().map(|l| Some(l.into())).collect(),
        }
    }
    pub fn push_timeout(&mut self) {
        self.queue.push_back(None);
    }
    pub fn push_line(&mut self, line: impl Into<String>) {
        self.queue.push_back(Some(line.into()));
    }
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}
#[cfg(test)]
impl LineSource for ManualSource {
    fn read_line(&mut self) -> Result<Option<String>, ParserError> {
        Ok(self.queue.pop_front().flatten())
    }
    fn discard_input(&mut self) -> Result<(), ParserError> {
        self.queue.clear();
        Ok(())
    }
}
/// Synthetic device emitting delimited sine-plus-noise readings.
///
/// A small share of lines carry a garbled token or lose their last channel,
/// so the malformed-token and channel-drift paths get exercised too.
pub struct SimulatedSource {
    delimiter: String,
    channels: usize,
    period: Duration,
    timeout: Duration,
    glitch_rate: f64,
    phase: f64,
    next_due: Instant,
    rng: StdRng,
}
impl SimulatedSource {
    pub fn new(
        delimiter: impl Into<String>,
        channels: usize,
        period: Duration,
        timeout: Duration,
        glitch_rate: f64,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            delimiter: delimiter.into(),
            channels,
            period,
            timeout,
            glitch_rate: glitch_rate.clamp(0.0, 1.0),
            phase: 0.0,
            next_due: Instant::now(),
            rng,
        }
    }
    fn render_line(&mut self) -> String {
        self.phase += 0.1;
        let mut channels = self.channels;
        let glitch = self.rng.gen_bool(self.glitch_rate);
        if glitch && channels > 1 && self.rng.gen_bool(0.5) {
            channels -= 1;
        }
        let garbled = if glitch { Some(self.rng.gen_range(0..channels.max(1))) } else { None };
        let mut line = String::new();
        for ch in 0..channels {
            if garbled == Some(ch) {
                line.push_str("#?");
            } else {
                let wave = (self.phase * (ch as f64 * 0.3 + 1.0)).sin() * 100.0;
                let noise: f64 = self.rng.gen_range(-2.0..2.0);
                line.push_str(&format!("{:.3}", wave + noise + ch as f64 * 10.0));
            }
            line.push_str(&self.delimiter);
        }
        line
    }
}
impl LineSource for SimulatedSource {
    fn read_line(&mut self) -> Result<Option<String>, ParserError> {
        let now = Instant::now();
        if now < self.next_due {
            let wait = self.next_due - now;
            if wait > self.timeout {
                thread::sleep(self.timeout);
                return Ok(None);
            }
            thread::sleep(wait);
        }
        self.next_due = Instant::now() + self.period;
        Ok(Some(self.render_line()))
    }
    fn discard_input(&mut self) -> Result<(), ParserError> {
        self.next_due = Instant::now() + self.period;
        Ok(())
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::tokenizer::{tokenize, Delimiter};
    #[test]
    fn manual_source_plays_back_timeouts() {
        let mut source = ManualSource::new(["a,"]);
        source.push_timeout();
        source.push_line("b,");
        assert_eq!(source.read_line().unwrap().as_deref(), Some("a,"));
        assert_eq!(source.read_line().unwrap(), None);
        assert_eq!(source.read_line().unwrap().as_deref(), Some("b,"));
        assert_eq!(source.read_line().unwrap(), None);
    }
    #[test]
    fn manual_source_discard_drops_queue() {
        let mut source = ManualSource::new(["1,", "2,"]);
        source.discard_input().unwrap();
        assert_eq!(source.remaining(), 0);
    }
    #[test]
    fn simulated_lines_tokenize_to_channel_count() {
        let mut source = SimulatedSource::new(
            ",",
            4,
            Duration::ZERO,
            Duration::from_millis(5),
            0.0,
            Some(7),
        );
        let delim = Delimiter::new(",").unwrap();
        for _ in 0..10 {
            let line = source.read_line().unwrap().unwrap();
            assert_eq!(tokenize(&line, &delim).len(), 4);
        }
    }
    #[test]
    fn simulated_glitches_never_add_channels() {
        let mut source = SimulatedSource::new(
            ";",
            3,
            Duration::ZERO,
            Duration::from_millis(5),
            1.0,
            Some(11),
        );
        let delim = Delimiter::new(";").unwrap();
        for _ in 0..20 {
            let line = source.read_line().unwrap().unwrap();
            assert!(tokenize(&line, &delim).len() < 3);
        }
    }
    #[test]
    fn simulated_source_times_out_between_lines() {
        let mut source = SimulatedSource::new(
            ",",
            2,
            Duration::from_secs(60),
            Duration::from_millis(1),
            0.0,
            Some(1),
        );
        assert!(source.read_line().unwrap().is_some());
        assert!(source.read_line().unwrap().is_none());
    }
}
