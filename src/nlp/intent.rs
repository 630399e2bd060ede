/// Intent classification for chat messages.
///
/// Maps a lower-cased message to exactly one [`Intent`] by checking ordered
/// keyword groups; the first group with a hit wins. There is no confidence
/// score and no failure mode: unmatched text is [`Intent::GeneralChat`].
///
/// Group order:
///
/// 1. cancel verbs, always by substring containment, so any message that
///    contains "cancel", "stop" or "remove" is a cancellation
/// 2. scheduling verbs and appliance nouns
/// 3. modify verbs
/// 4. status words
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::matching::{MatchMode, contains_any};

/// What the user wants the assistant to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    ScheduleTask,
    ModifySchedule,
    CancelTask,
    GetStatus,
    GeneralChat,
}

impl Intent {
    /// Every intent, in classification order.
    pub const ALL: [Intent; 5] = [
        Intent::CancelTask,
        Intent::ScheduleTask,
        Intent::ModifySchedule,
        Intent::GetStatus,
        Intent::GeneralChat,
    ];
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ScheduleTask => write!(f, "SCHEDULE_TASK"),
            Self::ModifySchedule => write!(f, "MODIFY_SCHEDULE"),
            Self::CancelTask => write!(f, "CANCEL_TASK"),
            Self::GetStatus => write!(f, "GET_STATUS"),
            Self::GeneralChat => write!(f, "GENERAL_CHAT"),
        }
    }
}

const CANCEL_KEYWORDS: &[&str] = &["cancel", "stop", "remove"];

/// Scheduling stems plus the inflected and compound forms that contain them,
/// so whole-word matching still catches "dishes", "washing" or "cooking".
/// "scheduled" stays in the status group.
const SCHEDULE_KEYWORDS: &[&str] = &[
    "schedule", "schedules",
    "run", "runs", "running",
    "start", "starts", "starting",
    "cook", "cooks", "cooking", "cooked",
    "laundry",
    "charge", "charges", "charging", "charged",
    "wash", "washes", "washing", "washed", "washer",
    "dry", "drying", "dryer",
    "dish", "dishes", "dishwasher",
];

const MODIFY_KEYWORDS: &[&str] = &["change", "modify", "update"];

const STATUS_KEYWORDS: &[&str] = &["status", "when", "scheduled"];

/// Classify a message. `text` should already be lower-cased.
pub fn classify(text: &str, mode: MatchMode) -> Intent {
    if contains_any(text, CANCEL_KEYWORDS, MatchMode::Substring) {
        return Intent::CancelTask;
    }

    if contains_any(text, SCHEDULE_KEYWORDS, mode) {
        return Intent::ScheduleTask;
    }

    if contains_any(text, MODIFY_KEYWORDS, mode) {
        return Intent::ModifySchedule;
    }

    if contains_any(text, STATUS_KEYWORDS, mode) {
        return Intent::GetStatus;
    }

    Intent::GeneralChat
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str) -> Intent {
        classify(&text.to_lowercase(), MatchMode::Word)
    }

    #[test]
    fn scheduling_phrases() {
        assert_eq!(word("I need to do laundry"), Intent::ScheduleTask);
        assert_eq!(word("Schedule the dishwasher"), Intent::ScheduleTask);
        assert_eq!(word("I want to cook dinner tonight"), Intent::ScheduleTask);
        assert_eq!(word("charge my electric vehicle"), Intent::ScheduleTask);
    }

    #[test]
    fn inflected_forms_schedule() {
        assert_eq!(word("Please do the dishes"), Intent::ScheduleTask);
        assert_eq!(word("I need the washing machine tonight"), Intent::ScheduleTask);
        assert_eq!(word("cooking dinner later"), Intent::ScheduleTask);
        assert_eq!(word("drying clothes"), Intent::ScheduleTask);
        assert_eq!(word("keep the car charging overnight"), Intent::ScheduleTask);
        assert_eq!(word("is the dishwasher running?"), Intent::ScheduleTask);
    }

    #[test]
    fn inflected_forms_agree_with_substring_mode() {
        for text in [
            "please do the dishes",
            "i need the washing machine tonight",
            "cooking dinner later",
            "drying clothes",
        ] {
            assert_eq!(
                classify(text, MatchMode::Word),
                classify(text, MatchMode::Substring),
                "{text:?}"
            );
        }
    }

    #[test]
    fn cancel_wins_over_schedule_keywords() {
        assert_eq!(word("cancel my washer task"), Intent::CancelTask);
        assert_eq!(word("Cancel the laundry"), Intent::CancelTask);
        assert_eq!(word("STOP charging the car"), Intent::CancelTask);
        assert_eq!(word("remove the dryer run"), Intent::CancelTask);
    }

    #[test]
    fn cancel_matches_inside_longer_words() {
        assert_eq!(word("I want a cancellation"), Intent::CancelTask);
        assert_eq!(word("removed?"), Intent::CancelTask);
    }

    #[test]
    fn modify_phrases() {
        assert_eq!(word("I need to modify this"), Intent::ModifySchedule);
        assert_eq!(word("change the time please"), Intent::ModifySchedule);
    }

    #[test]
    fn status_phrases() {
        assert_eq!(word("what is the status"), Intent::GetStatus);
        assert_eq!(word("when is it"), Intent::GetStatus);
    }

    #[test]
    fn everything_else_is_general_chat() {
        assert_eq!(word("What can you help me with?"), Intent::GeneralChat);
        assert_eq!(word(""), Intent::GeneralChat);
        assert_eq!(word("hello there"), Intent::GeneralChat);
    }

    #[test]
    fn substring_mode_reproduces_legacy_overlaps() {
        // "scheduled" contains "schedule", so legacy matching never reaches
        // the status group for it.
        assert_eq!(
            classify("what is scheduled", MatchMode::Substring),
            Intent::ScheduleTask
        );
        assert_eq!(
            classify("what is scheduled", MatchMode::Word),
            Intent::GetStatus
        );
    }

    #[test]
    fn display_uses_wire_names() {
        assert_eq!(Intent::ScheduleTask.to_string(), "SCHEDULE_TASK");
        assert_eq!(Intent::GeneralChat.to_string(), "GENERAL_CHAT");
        assert_eq!(
            serde_json::to_string(&Intent::CancelTask).unwrap(),
            "\"CANCEL_TASK\""
        );
    }
}
