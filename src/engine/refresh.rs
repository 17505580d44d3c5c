//! Transport state refresh
//!
//! Decoder data is gathered into an [`Observation`] while the decoder lock
//! is held, then published into the transport state under the control lock,
//! so the two locks are never held together.

use super::control::Control;
use crate::decoder::{FormatError, ModuleDecoder};
use crate::navigator::preview_positions;
use crate::pattern_text::{parse_instrument_column, EMPTY_CELL};
use crate::state::PatternRowPreview;

/// A channel is considered audible above this VU level
const AUDIBLE_LEVEL: f32 = 0.01;

pub(crate) struct ChannelObservation {
    pub line: Result<String, FormatError>,
    pub vu_left: f32,
    pub vu_right: f32,
}

/// Decoder state captured for one refresh
pub(crate) struct Observation {
    pub order: i32,
    pub pattern: i32,
    pub row: i32,
    pub speed: i32,
    pub position_seconds: f64,
    pub channels: Vec<ChannelObservation>,
    pub preview_rows: Vec<PatternRowPreview>,
}

fn cell_or_placeholder(decoder: &dyn ModuleDecoder, pattern: i32, row: i32, channel: i32) -> String {
    decoder
        .format_pattern_row_channel(pattern, row, channel)
        .unwrap_or_else(|err| {
            log::debug!("preview: {err}");
            EMPTY_CELL.to_string()
        })
}

impl Observation {
    pub fn gather(decoder: &dyn ModuleDecoder, preview_limit: usize) -> Self {
        let order = decoder.current_order();
        let pattern = decoder.current_pattern();
        let row = decoder.current_row();
        let channel_count = decoder.num_channels().max(0);

        let channels = (0..channel_count)
            .map(|ch| ChannelObservation {
                line: decoder.format_pattern_row_channel(pattern, row, ch),
                vu_left: decoder.channel_vu_left(ch),
                vu_right: decoder.channel_vu_right(ch),
            })
            .collect();

        let preview_rows = if channel_count > 0 {
            preview_positions(decoder, order, pattern, row, preview_limit)
                .into_iter()
                .map(|pos| PatternRowPreview {
                    order: pos.order,
                    pattern: pos.pattern,
                    row: pos.row,
                    channels: (0..channel_count)
                        .map(|ch| cell_or_placeholder(decoder, pos.pattern, pos.row, ch))
                        .collect(),
                })
                .collect()
        } else {
            Vec::new()
        };

        Observation {
            order,
            pattern,
            row,
            speed: decoder.current_speed(),
            position_seconds: decoder.position_seconds(),
            channels,
            preview_rows,
        }
    }
}

impl Control {
    /// Copy an observation into the transport state.
    ///
    /// `instrument_names` bounds which instrument numbers are accepted from
    /// the pattern text.
    pub fn publish(&mut self, observation: Observation, instrument_names: &[String]) {
        let count = observation.channels.len();
        let state = &mut self.state;
        state.order = observation.order;
        state.pattern = observation.pattern;
        state.row = observation.row;
        state.speed = observation.speed;
        state.position_seconds = observation.position_seconds.max(0.0);
        state.finished = self.finished;
        state.resize_channels(count);
        self.channel_instruments.resize(count, -1);

        for ((status, seen), channel) in state
            .channels
            .iter_mut()
            .zip(self.channel_instruments.iter_mut())
            .zip(observation.channels)
        {
            status.vu_left = channel.vu_left;
            status.vu_right = channel.vu_right;

            let line = match channel.line {
                Ok(line) => line,
                Err(err) => {
                    log::debug!("{err}");
                    status.line = EMPTY_CELL.to_string();
                    status.clear_instrument();
                    continue;
                }
            };

            if let Some(number) = parse_instrument_column(&line) {
                if number > 0 && number as usize <= instrument_names.len() {
                    *seen = number - 1;
                }
            }
            status.line = line;

            let sticky = *seen;
            if status.level() > AUDIBLE_LEVEL && sticky >= 0 {
                if let Some(name) = instrument_names.get(sticky as usize) {
                    status.instrument_index = sticky;
                    status.instrument_name.clone_from(name);
                    continue;
                }
            }
            status.clear_instrument();
        }

        state.preview_rows = observation.preview_rows;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["kick".into(), "snare".into(), "bass".into()]
    }

    fn channel(line: &str, vu: f32) -> ChannelObservation {
        ChannelObservation {
            line: Ok(line.to_string()),
            vu_left: vu,
            vu_right: 0.0,
        }
    }

    fn observation(channels: Vec<ChannelObservation>) -> Observation {
        Observation {
            order: 1,
            pattern: 2,
            row: 3,
            speed: 6,
            position_seconds: 1.5,
            channels,
            preview_rows: Vec::new(),
        }
    }

    #[test]
    fn test_instrument_is_sticky_while_audible() {
        let mut control = Control::new(1);
        control.publish(observation(vec![channel("C-4 02 .. ...", 0.5)]), &names());
        assert_eq!(control.state.channels[0].instrument_index, 1);
        assert_eq!(control.state.channels[0].instrument_name, "snare");

        // no instrument on this row, still ringing
        control.publish(observation(vec![channel("--- .. .. ...", 0.3)]), &names());
        assert_eq!(control.state.channels[0].instrument_index, 1);

        // silent: nothing reported, but remembered
        control.publish(observation(vec![channel("--- .. .. ...", 0.0)]), &names());
        assert_eq!(control.state.channels[0].instrument_index, -1);
        assert!(control.state.channels[0].instrument_name.is_empty());
        assert_eq!(control.channel_instruments[0], 1);
    }

    #[test]
    fn test_out_of_range_instrument_ignored() {
        let mut control = Control::new(1);
        control.publish(observation(vec![channel("C-4 09 .. ...", 0.5)]), &names());
        assert_eq!(control.state.channels[0].instrument_index, -1);
    }

    #[test]
    fn test_format_error_substitutes_placeholder() {
        let mut control = Control::new(2);
        let failing = ChannelObservation {
            line: Err(FormatError {
                pattern: 2,
                row: 3,
                channel: 1,
                reason: "bad cell".into(),
            }),
            vu_left: 0.9,
            vu_right: 0.9,
        };
        control.publish(
            observation(vec![channel("C-4 01 .. ...", 0.5), failing]),
            &names(),
        );
        assert_eq!(control.state.channels[1].line, EMPTY_CELL);
        assert_eq!(control.state.channels[1].instrument_index, -1);
        assert_eq!(control.state.channels[0].instrument_index, 0);
    }

    #[test]
    fn test_channel_count_follows_observation() {
        let mut control = Control::new(2);
        control.publish(
            observation((0..6).map(|_| channel("--- .. .. ...", 0.0)).collect()),
            &names(),
        );
        assert_eq!(control.state.channels.len(), 6);
        assert_eq!(control.channel_instruments.len(), 6);
        assert_eq!(control.state.order, 1);
        assert_eq!(control.state.speed, 6);
    }
}
