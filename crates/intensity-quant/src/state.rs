//! Accumulated per-stack state.

/// State carried from one slice of a stack to the next.
///
/// A fresh (default) state belongs to exactly one stack. Stacks never share a
/// state, so independent stacks can be quantified on different threads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuantificationState {
    running_background_mean: f64,
    frozen_background_mean: f64,
    background_frozen: bool,
    slices_processed: u32,
}

impl QuantificationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Streaming mean of every background mean seen so far.
    pub fn running_background_mean(&self) -> f64 {
        self.running_background_mean
    }

    /// The frozen background, once the area threshold has been reached.
    pub fn frozen_background_mean(&self) -> Option<f64> {
        self.background_frozen.then_some(self.frozen_background_mean)
    }

    pub fn is_frozen(&self) -> bool {
        self.background_frozen
    }

    pub fn slices_processed(&self) -> u32 {
        self.slices_processed
    }

    /// Index the next slice must carry.
    pub fn next_slice_index(&self) -> u32 {
        self.slices_processed + 1
    }

    /// Start over for a new stack.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Fold one background mean into the running mean.
    ///
    /// `slice_index` must equal [`next_slice_index`](Self::next_slice_index);
    /// the caller checks this before mutating.
    pub(crate) fn observe_background(&mut self, slice_index: u32, background_mean: f64) {
        let delta = background_mean - self.running_background_mean;
        self.running_background_mean += delta / f64::from(slice_index);
        self.slices_processed = slice_index;
    }

    /// Lock the current running mean as the background. No-op once frozen.
    ///
    /// Returns true if this call performed the freeze.
    pub(crate) fn freeze(&mut self) -> bool {
        if self.background_frozen {
            return false;
        }
        self.frozen_background_mean = self.running_background_mean;
        self.background_frozen = true;
        true
    }
}
