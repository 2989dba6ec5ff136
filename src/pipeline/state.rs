//! Capture state machine and per-interaction session data.
//!
//! [`CaptureState::next`] is the complete transition table; the controller
//! never assigns a state without going through it.  [`CaptureSession`] holds
//! the resources the presentation layer reads, and [`SharedSession`] is the
//! `Arc<Mutex<…>>` handle both sides share.

use std::sync::{Arc, Mutex};

use crate::resource::{AudioResource, ImageResource};

// ---------------------------------------------------------------------------
// CaptureState / Trigger
// ---------------------------------------------------------------------------

/// States of one capture interaction.
///
/// ```text
/// Idle ──Start──▶ Recording ──Stop──▶ Processing ──Settle──▶ Finished
///  ▲                  │                                         │
///  └──────Abort───────┘                                         │
///  └───────────────────────────Reset────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    /// Nothing captured; waiting for the user to start.
    #[default]
    Idle,

    /// The input device is owned and audio is accumulating.
    Recording,

    /// The audio resource exists; the spectrogram is being prepared.
    Processing,

    /// Both resources are available for display.
    Finished,
}

/// Inputs to the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// User asked to record.
    Start,
    /// Device access refused or the recording failed at runtime.
    Abort,
    /// Recording ended (timeout or the source closed).
    Stop,
    /// Synthesis and the settling delay are complete.
    Settle,
    /// User abandoned the result.
    Reset,
}

impl CaptureState {
    /// Target state for `trigger`, or `None` when the pair is not a valid
    /// transition.
    ///
    /// ```
    /// use acoustic_capture::pipeline::{CaptureState, Trigger};
    ///
    /// assert_eq!(CaptureState::Idle.next(Trigger::Start), Some(CaptureState::Recording));
    /// assert_eq!(CaptureState::Recording.next(Trigger::Start), None);
    /// assert_eq!(CaptureState::Idle.next(Trigger::Reset), Some(CaptureState::Idle));
    /// ```
    pub fn next(self, trigger: Trigger) -> Option<CaptureState> {
        use CaptureState::*;
        match (self, trigger) {
            (Idle, Trigger::Start) => Some(Recording),
            (Recording, Trigger::Abort) => Some(Idle),
            (Recording, Trigger::Stop) => Some(Processing),
            (Processing, Trigger::Settle) => Some(Finished),
            (Finished, Trigger::Reset) | (Idle, Trigger::Reset) => Some(Idle),
            _ => None,
        }
    }

    /// `true` while the state is an exclusive gate (no start, no reset).
    pub fn is_busy(&self) -> bool {
        matches!(self, CaptureState::Recording | CaptureState::Processing)
    }

    /// A short human-readable label suitable for a status bar.
    pub fn label(&self) -> &'static str {
        match self {
            CaptureState::Idle => "Idle",
            CaptureState::Recording => "Recording",
            CaptureState::Processing => "Processing",
            CaptureState::Finished => "Done",
        }
    }

    /// Guidance text shown to the user in this state.
    pub fn prompt(&self) -> &'static str {
        match self {
            CaptureState::Idle => {
                "Click the button to simulate recording a sustained \"aaah\" vowel."
            }
            CaptureState::Recording => "Please sustain the vowel \"aaah\" into your microphone.",
            CaptureState::Processing => "Simulating audio upload and cloud-based analysis...",
            CaptureState::Finished => "Analysis simulation complete. See mock results below.",
        }
    }

    /// Text of the single action button in this state.
    pub fn action_label(&self) -> &'static str {
        match self {
            CaptureState::Idle => "Start 5-Second Vowel Test",
            CaptureState::Recording => "Recording... (5s)",
            CaptureState::Processing => "Processing...",
            CaptureState::Finished => "Run Test Again",
        }
    }
}

// ---------------------------------------------------------------------------
// CaptureSession
// ---------------------------------------------------------------------------

/// Everything one interaction cycle produces.
///
/// Invariants, upheld by the controller:
/// * `image` is `Some` only in [`CaptureState::Finished`];
/// * `audio` is `Some` only in `Processing` or `Finished`.
#[derive(Debug, Clone, Default)]
pub struct CaptureSession {
    pub state: CaptureState,
    pub audio: Option<AudioResource>,
    pub image: Option<ImageResource>,
    /// Last user-facing notification (permission denied, aborted recording).
    pub notice: Option<String>,
    /// Length of the captured clip in seconds; `0.0` until a recording stops.
    pub recording_secs: f32,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` when the resource invariants hold for the current state.
    pub fn is_consistent(&self) -> bool {
        let image_ok = self.image.is_none() || self.state == CaptureState::Finished;
        let audio_ok = self.audio.is_none()
            || matches!(self.state, CaptureState::Processing | CaptureState::Finished);
        image_ok && audio_ok
    }
}

// ---------------------------------------------------------------------------
// SharedSession
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`CaptureSession`].
///
/// Lock for a short critical section; do **not** hold the lock across
/// `.await` points.
pub type SharedSession = Arc<Mutex<CaptureSession>>;

pub fn new_shared_session() -> SharedSession {
    Arc::new(Mutex::new(CaptureSession::new()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{ResourceHandle, ResourceRegistry};

    const ALL_STATES: [CaptureState; 4] = [
        CaptureState::Idle,
        CaptureState::Recording,
        CaptureState::Processing,
        CaptureState::Finished,
    ];
    const ALL_TRIGGERS: [Trigger; 5] = [
        Trigger::Start,
        Trigger::Abort,
        Trigger::Stop,
        Trigger::Settle,
        Trigger::Reset,
    ];

    #[test]
    fn happy_path_visits_every_state_in_order() {
        let mut s = CaptureState::Idle;
        let mut visited = vec![s];
        for t in [Trigger::Start, Trigger::Stop, Trigger::Settle, Trigger::Reset] {
            s = s.next(t).expect("valid transition");
            visited.push(s);
        }
        assert_eq!(
            visited,
            vec![
                CaptureState::Idle,
                CaptureState::Recording,
                CaptureState::Processing,
                CaptureState::Finished,
                CaptureState::Idle,
            ]
        );
    }

    #[test]
    fn only_listed_transitions_are_valid() {
        let valid: usize = ALL_STATES
            .iter()
            .flat_map(|s| ALL_TRIGGERS.iter().map(move |t| s.next(*t)))
            .filter(Option::is_some)
            .count();
        assert_eq!(valid, 6);
    }

    #[test]
    fn start_while_recording_is_rejected() {
        assert_eq!(CaptureState::Recording.next(Trigger::Start), None);
        assert_eq!(CaptureState::Processing.next(Trigger::Start), None);
        assert_eq!(CaptureState::Finished.next(Trigger::Start), None);
    }

    #[test]
    fn abort_returns_to_idle() {
        assert_eq!(
            CaptureState::Recording.next(Trigger::Abort),
            Some(CaptureState::Idle)
        );
    }

    #[test]
    fn busy_states() {
        assert!(!CaptureState::Idle.is_busy());
        assert!(CaptureState::Recording.is_busy());
        assert!(CaptureState::Processing.is_busy());
        assert!(!CaptureState::Finished.is_busy());
    }

    #[test]
    fn labels() {
        assert_eq!(CaptureState::Idle.label(), "Idle");
        assert_eq!(CaptureState::Finished.label(), "Done");
        assert_eq!(CaptureState::Idle.action_label(), "Start 5-Second Vowel Test");
        assert_eq!(CaptureState::Finished.action_label(), "Run Test Again");
        assert!(CaptureState::Recording.prompt().contains("aaah"));
    }

    #[test]
    fn default_session_is_idle_and_empty() {
        let session = CaptureSession::default();
        assert_eq!(session.state, CaptureState::Idle);
        assert!(session.audio.is_none());
        assert!(session.image.is_none());
        assert!(session.notice.is_none());
        assert!(session.is_consistent());
    }

    #[test]
    fn image_outside_finished_is_inconsistent() {
        let registry = ResourceRegistry::new();
        let handle: ResourceHandle = registry.register("image/png", vec![0]);
        let session = CaptureSession {
            state: CaptureState::Processing,
            image: Some(ImageResource {
                handle: Some(handle),
                width: 1,
                height: 1,
                data_uri: String::new(),
            }),
            ..CaptureSession::default()
        };
        assert!(!session.is_consistent());
    }

    #[test]
    fn shared_session_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SharedSession>();
    }
}
