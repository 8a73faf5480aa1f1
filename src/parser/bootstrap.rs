use log::{info, warn};
use crate::parser::calibration::{ChannelCalibration, ResizeStep};
use crate::parser::source::LineSource;
use crate::parser::tokenizer::{tokenize, Delimiter};
use crate::parser::ParserError;
/// Outcome of priming the calibration from the first line of a connection.
#[derive(Clone, Debug, PartialEq)]
pub struct Bootstrap {
    pub channel_count: usize,
    pub steps: Vec<ResizeStep>,
}
/// Reads one priming line and seeds `calibration` with one unity factor per
/// token found on it.
///
/// A timeout leaves the calibration empty; the first ingested line then grows
/// it through the normal reconciliation path.
pub fn bootstrap<S: LineSource + ?Sized>(
    source: &mut S,
    delimiter: &Delimiter,
    calibration: &mut ChannelCalibration,
) -> Result<Bootstrap, ParserError> {
    let channel_count = match source.read_line()? {
        Some(line) => tokenize(&line, delimiter).len(),
        None => {
            warn!("no priming line before timeout; starting with 0 channels");
            0
        }
    };
    let steps = calibration.reset(channel_count);
    info!("calibration bootstrapped with {channel_count} channel(s)");
    Ok(Bootstrap {
        channel_count,
        steps,
    })
}
