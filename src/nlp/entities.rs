/// Entity extraction: appliances, deadline, urgency, and duration.
///
/// Scans a lower-cased message for keywords from fixed vocabularies and
/// produces an [`ExtractedEntities`] record. Extraction never fails; a
/// message with no hits yields the defaults
/// `{tasks: [], deadline: FLEXIBLE, duration: 2, priority: MEDIUM}`.
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::matching::{MatchMode, contains_any};

// ---------------------------------------------------------------------------
// Appliance vocabulary
// ---------------------------------------------------------------------------

/// A household load type the assistant knows how to schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Appliance {
    Washer,
    Dryer,
    Oven,
    Dishwasher,
    Ev,
    Vacuum,
}

impl Appliance {
    /// The closed vocabulary, in detection order.
    pub const ALL: [Appliance; 6] = [
        Appliance::Washer,
        Appliance::Dryer,
        Appliance::Oven,
        Appliance::Dishwasher,
        Appliance::Ev,
        Appliance::Vacuum,
    ];

    /// Wire identifier (`"washer"`, `"ev"`, ...).
    pub fn id(self) -> &'static str {
        match self {
            Self::Washer => "washer",
            Self::Dryer => "dryer",
            Self::Oven => "oven",
            Self::Dishwasher => "dishwasher",
            Self::Ev => "ev",
            Self::Vacuum => "vacuum",
        }
    }

    /// Human-readable name used in schedule listings.
    pub fn label(self) -> &'static str {
        match self {
            Self::Washer => "Washer",
            Self::Dryer => "Dryer",
            Self::Oven => "Oven",
            Self::Dishwasher => "Dishwasher",
            Self::Ev => "EV",
            Self::Vacuum => "Vacuum",
        }
    }

    /// Parse a wire identifier, case-insensitively.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|appliance| appliance.id().eq_ignore_ascii_case(id))
    }

    /// Keywords that indicate this appliance.
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Washer => &["washer", "washing machine", "wash", "laundry", "do laundry"],
            Self::Dryer => &["dryer", "drying", "dry", "dry clothes"],
            Self::Oven => &[
                "oven",
                "cook",
                "cooking",
                "bake",
                "baking",
                "cook dinner",
                "bake something",
            ],
            Self::Dishwasher => &["dishwasher", "dishes", "dish washing", "wash dishes"],
            Self::Ev => &[
                "ev",
                "electric vehicle",
                "car",
                "vehicle",
                "charging",
                "charge ev",
                "charge car",
            ],
            Self::Vacuum => &["vacuum", "cleaning", "clean", "vacuuming"],
        }
    }
}

impl fmt::Display for Appliance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

// ---------------------------------------------------------------------------
// Deadline / priority
// ---------------------------------------------------------------------------

/// When the user needs the task finished by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Deadline {
    #[default]
    Flexible,
    Morning,
    Evening,
    Tomorrow,
}

impl fmt::Display for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flexible => write!(f, "FLEXIBLE"),
            Self::Morning => write!(f, "MORNING"),
            Self::Evening => write!(f, "EVENING"),
            Self::Tomorrow => write!(f, "TOMORROW"),
        }
    }
}

/// Task urgency. Ordered so that `High > Medium > Low`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

// ---------------------------------------------------------------------------
// Extracted entities
// ---------------------------------------------------------------------------

/// Default task duration in hours when the message names none.
pub const DEFAULT_DURATION_HOURS: f64 = 2.0;

/// Structured request extracted from a single message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntities {
    /// Detected appliances, each at most once, in vocabulary order.
    pub tasks: Vec<Appliance>,
    pub deadline: Deadline,
    pub priority: Priority,
    /// Requested run time in hours.
    pub duration: f64,
}

impl Default for ExtractedEntities {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            deadline: Deadline::Flexible,
            priority: Priority::Medium,
            duration: DEFAULT_DURATION_HOURS,
        }
    }
}

impl ExtractedEntities {
    /// Task identifiers as wire strings.
    pub fn task_ids(&self) -> Vec<String> {
        self.tasks.iter().map(|t| t.id().to_string()).collect()
    }
}

const DEADLINE_QUALIFIERS: &[&str] = &["by", "before"];
const MORNING_KEYWORDS: &[&str] = &["morning", "am"];
const EVENING_KEYWORDS: &[&str] = &["evening", "pm"];
const TOMORROW_KEYWORDS: &[&str] = &["tomorrow"];
const URGENCY_KEYWORDS: &[&str] = &["urgent", "asap", "immediately"];

/// Matches "2 hours", "3.5h", "1 hr". Minutes are not recognised.
static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*(?:hours?|hrs?|h)\b").expect("duration regex is valid")
});

/// A clock time with a meridiem, spaced or not: "8am", "7 pm", "10:30pm".
static CLOCK_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d(?::[0-5]\d)?\s*(am|pm)\b").expect("clock suffix regex is valid")
});

/// Extract entities from a message. `text` should already be lower-cased.
pub fn extract(text: &str, mode: MatchMode) -> ExtractedEntities {
    let mut entities = ExtractedEntities::default();

    for appliance in Appliance::ALL {
        if contains_any(text, appliance.keywords(), mode) && !entities.tasks.contains(&appliance) {
            entities.tasks.push(appliance);
        }
    }

    entities.deadline = extract_deadline(text, mode);

    if contains_any(text, URGENCY_KEYWORDS, mode) {
        entities.priority = Priority::High;
    }

    if let Some(hours) = extract_duration(text) {
        entities.duration = hours;
    }

    entities
}

/// A deadline only counts when a "by"/"before" qualifier is present.
fn extract_deadline(text: &str, mode: MatchMode) -> Deadline {
    if !contains_any(text, DEADLINE_QUALIFIERS, mode) {
        return Deadline::Flexible;
    }

    let meridiem = clock_meridiem(text);

    if contains_any(text, MORNING_KEYWORDS, mode) || meridiem == Some("am") {
        Deadline::Morning
    } else if contains_any(text, EVENING_KEYWORDS, mode) || meridiem == Some("pm") {
        Deadline::Evening
    } else if contains_any(text, TOMORROW_KEYWORDS, mode) {
        Deadline::Tomorrow
    } else {
        Deadline::Flexible
    }
}

/// Meridiem of the first clock time in the text, if any.
fn clock_meridiem(text: &str) -> Option<&str> {
    CLOCK_SUFFIX_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// First positive "N hours" figure in the text, if any.
fn extract_duration(text: &str) -> Option<f64> {
    DURATION_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<f64>().ok())
        .find(|hours| *hours > 0.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
