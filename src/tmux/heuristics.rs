use once_cell::sync::Lazy;
use regex::Regex;

/// Status of a supervised session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionStatus {
    /// Output is still changing, the agent is producing
    Working,
    /// Blocked on a yes/no decision from the user
    Waiting,
    /// Idle at a prompt with output the user has not looked at yet
    #[default]
    Ready,
    /// Idle at a prompt and already seen by the user
    Read,
}

impl SessionStatus {
    /// Display priority, lower surfaces first
    pub fn priority(self) -> u8 {
        match self {
            SessionStatus::Waiting => 1,
            SessionStatus::Working => 2,
            SessionStatus::Ready => 3,
            SessionStatus::Read => 4,
        }
    }
}

/// Phrases printed when the agent asks for a confirmation
static RE_CONFIRMATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Would you like to proceed\?|1\. Yes|Do you want to").unwrap());

const PROMPT_MARKER: char = '>';

/// Turns consecutive pane samples into session status transitions
pub struct StatusClassifier;

impl StatusClassifier {
    /// Compute the next status from the latest sample, the previous one and
    /// the current status. Returns `(next, changed)`.
    ///
    /// Rules are evaluated in order:
    /// 1. any change in content means the session is working;
    /// 2. a prompt marker means idle, but an acknowledged `Read` session stays `Read`;
    /// 3. a confirmation phrase means the session is waiting on the user;
    /// 4. anything else static (spinners, progress lines) is still working.
    pub fn classify(
        sample: &str,
        previous: &str,
        current: SessionStatus,
    ) -> (SessionStatus, bool) {
        if sample != previous {
            return (SessionStatus::Working, true);
        }

        if sample.contains(PROMPT_MARKER) {
            if current == SessionStatus::Read {
                return (SessionStatus::Read, false);
            }
            return (SessionStatus::Ready, current != SessionStatus::Ready);
        }

        if RE_CONFIRMATION.is_match(sample) {
            return (SessionStatus::Waiting, current != SessionStatus::Waiting);
        }

        (SessionStatus::Working, current != SessionStatus::Working)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [SessionStatus; 4] = [
        SessionStatus::Working,
        SessionStatus::Waiting,
        SessionStatus::Ready,
        SessionStatus::Read,
    ];

    #[test]
    fn test_changed_content_is_always_working() {
        for current in ALL {
            assert_eq!(
                StatusClassifier::classify("new line\n> ", "old line\n> ", current),
                (SessionStatus::Working, true),
                "from {:?}",
                current
            );
        }
        // First sample after discovery differs from the empty default
        assert_eq!(
            StatusClassifier::classify("Do you want to continue?", "", SessionStatus::Waiting),
            (SessionStatus::Working, true)
        );
    }

    #[test]
    fn test_static_prompt_transitions() {
        let sample = "done.\n> ";
        let cases = [
            (SessionStatus::Working, SessionStatus::Ready, true),
            (SessionStatus::Waiting, SessionStatus::Ready, true),
            (SessionStatus::Ready, SessionStatus::Ready, false),
            (SessionStatus::Read, SessionStatus::Read, false),
        ];
        for (current, expected, changed) in cases {
            assert_eq!(
                StatusClassifier::classify(sample, sample, current),
                (expected, changed),
                "from {:?}",
                current
            );
        }
    }

    #[test]
    fn test_static_confirmation_is_waiting() {
        for phrase in ["Would you like to proceed?", "  1. Yes\n  2. No", "Do you want to create foo.rs?"] {
            assert_eq!(
                StatusClassifier::classify(phrase, phrase, SessionStatus::Working),
                (SessionStatus::Waiting, true)
            );
            assert_eq!(
                StatusClassifier::classify(phrase, phrase, SessionStatus::Waiting),
                (SessionStatus::Waiting, false)
            );
        }
    }

    #[test]
    fn test_prompt_marker_wins_over_confirmation() {
        let sample = "cargo test -- --nocapture 2>&1\nDo you want to proceed?";
        assert_eq!(
            StatusClassifier::classify(sample, sample, SessionStatus::Working),
            (SessionStatus::Ready, true)
        );
    }

    #[test]
    fn test_static_busy_line_is_working() {
        let sample = "⠹ Thinking… (12s)";
        assert_eq!(
            StatusClassifier::classify(sample, sample, SessionStatus::Working),
            (SessionStatus::Working, false)
        );
        assert_eq!(
            StatusClassifier::classify(sample, sample, SessionStatus::Read),
            (SessionStatus::Working, true)
        );
    }

    #[test]
    fn test_priority_order() {
        let mut statuses = vec![
            SessionStatus::Read,
            SessionStatus::Ready,
            SessionStatus::Working,
            SessionStatus::Waiting,
        ];
        statuses.sort_by_key(|s| s.priority());
        assert_eq!(
            statuses,
            vec![
                SessionStatus::Waiting,
                SessionStatus::Working,
                SessionStatus::Ready,
                SessionStatus::Read,
            ]
        );
    }
}
