#[cfg(feature = "rtrb")]
use rtrb::Consumer;

use crate::{dsp::resonator::Resonator, onset::OnsetDetector};

/// Parameter changes sent from a control thread to the audio thread.
///
/// Messages are drained at block boundaries only, so a block is always
/// processed with one consistent set of parameters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum DetectorMessage {
    SetAttack(f64),
    SetDecay(f64),
    SetBandwidthPercent(f64),
    SetThresholdDb(f32),
    SetTiltDb(f32),
    SetHoldMs(f64),
    SetNumBands(usize),
    SetLowestPitch(f32),
    SetHighestPitch(f32),
    /// Clear filter, follower and hold state.
    Reset,
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<DetectorMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<DetectorMessage> {
    fn pop(&mut self) -> Option<DetectorMessage> {
        Consumer::pop(self).ok()
    }
}

impl<R: Resonator> OnsetDetector<R> {
    pub fn handle_message(&mut self, msg: DetectorMessage) {
        match msg {
            DetectorMessage::SetAttack(periods) => self.set_attack(periods),
            DetectorMessage::SetDecay(periods) => self.set_decay(periods),
            DetectorMessage::SetBandwidthPercent(percent) => self.set_bandwidth_percent(percent),
            DetectorMessage::SetThresholdDb(db) => self.set_threshold_db(db),
            DetectorMessage::SetTiltDb(db) => self.set_tilt_db(db),
            DetectorMessage::SetHoldMs(ms) => self.set_hold_ms(ms),
            DetectorMessage::SetNumBands(n) => self.set_num_bands(n),
            DetectorMessage::SetLowestPitch(pitch) => self.set_lowest_pitch(pitch),
            DetectorMessage::SetHighestPitch(pitch) => self.set_highest_pitch(pitch),
            DetectorMessage::Reset => self.reset(),
        }
    }

    /// Drain pending messages, then process the block.
    pub fn process_with<M: MessageReceiver>(
        &mut self,
        rx: &mut M,
        channels: &[&[f32]],
    ) -> Option<usize> {
        self.drain(rx);
        self.process(channels)
    }

    /// Interleaved counterpart of [`process_with`](Self::process_with).
    pub fn process_interleaved_with<M: MessageReceiver>(
        &mut self,
        rx: &mut M,
        data: &[f32],
        num_channels: usize,
    ) -> Option<usize> {
        self.drain(rx);
        self.process_interleaved(data, num_channels)
    }

    fn drain<M: MessageReceiver>(&mut self, rx: &mut M) {
        while let Some(msg) = rx.pop() {
            self.handle_message(msg);
        }
    }
}
