//! Timeline pin documents built from forecast entries.

use serde::{Deserialize, Serialize};

use crate::schedule::{BucketClock, ScheduleEntry};

use super::KnownEntryId;

/// Pin layout block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinLayout {
    /// Layout type (`genericPin`, `genericReminder`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Headline.
    pub title: String,
    /// Secondary line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// System icon URI.
    pub tiny_icon: String,
}

/// Reminder attached to a pin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    /// ISO-8601 time the reminder fires.
    pub time: String,
    /// Reminder layout.
    pub layout: PinLayout,
}

/// Action offered on a pin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinAction {
    /// Button text.
    pub title: String,
    /// Action type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Opaque value handed to the app on launch.
    pub launch_code: i64,
}

/// A timeline pin as sent to the timeline service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pin {
    /// `identity@bucket`.
    pub id: String,
    /// ISO-8601 start time.
    pub time: String,
    /// Length in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    /// Main layout.
    pub layout: PinLayout,
    /// Reminders, omitted when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reminders: Vec<Reminder>,
    /// Actions.
    pub actions: Vec<PinAction>,
}

/// Subtitle shown for an entry.
pub fn subtitle(entry: &ScheduleEntry) -> String {
    if entry.new_item_count == entry.cumulative_item_count {
        format!("{} items.", entry.cumulative_item_count)
    } else {
        format!(
            "{} items ({} new)",
            entry.cumulative_item_count, entry.new_item_count
        )
    }
}

/// Content fingerprint of the pin built for `entry`.
///
/// Two entries with the same revision produce the same pin body.
pub fn revision(entry: &ScheduleEntry) -> String {
    let duration = entry
        .duration_buckets
        .map_or_else(|| "-".to_string(), |d| d.to_string());
    format!(
        "{}/{}/{duration}",
        entry.new_item_count, entry.cumulative_item_count
    )
}

/// Builds pins for one identity.
#[derive(Debug, Clone)]
pub struct PinBuilder {
    clock: BucketClock,
    title: String,
}

impl PinBuilder {
    /// Builder stamping pins with `title`.
    pub fn new(clock: BucketClock, title: impl Into<String>) -> Self {
        Self {
            clock,
            title: title.into(),
        }
    }

    /// Pin describing `entry`.
    pub fn build(&self, identity: &str, entry: &ScheduleEntry) -> Pin {
        let time = self.clock.iso(entry.time_bucket);
        let reminders = if entry.new_item_count == entry.cumulative_item_count {
            Vec::new()
        } else {
            vec![Reminder {
                time: time.clone(),
                layout: PinLayout {
                    kind: "genericReminder".into(),
                    title: format!(
                        "{} reviews are available now.",
                        entry.cumulative_item_count
                    ),
                    subtitle: None,
                    tiny_icon: "system://images/TIMELINE_CALENDAR".into(),
                },
            }]
        };

        Pin {
            id: KnownEntryId::new(identity, entry.time_bucket).to_string(),
            time,
            duration: entry.duration_buckets.map(|d| self.clock.minutes(d)),
            layout: PinLayout {
                kind: "genericPin".into(),
                title: self.title.clone(),
                subtitle: Some(subtitle(entry)),
                tiny_icon: "system://images/SCHEDULED_EVENT".into(),
            },
            reminders,
            actions: vec![PinAction {
                title: "Check".into(),
                kind: "openWatchApp".into(),
                launch_code: entry.time_bucket,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(new: u32, total: u32, duration: Option<i64>) -> ScheduleEntry {
        ScheduleEntry {
            time_bucket: 4,
            new_item_count: new,
            cumulative_item_count: total,
            duration_buckets: duration,
            expiration_bucket: duration.map(|d| 4 + d),
        }
    }

    #[test]
    fn test_subtitle_text() {
        assert_eq!(subtitle(&entry(7, 7, None)), "7 items.");
        assert_eq!(subtitle(&entry(2, 9, None)), "9 items (2 new)");
    }

    #[test]
    fn test_pin_body() {
        let pins = PinBuilder::new(BucketClock::default(), "Review");
        let pin = pins.build("koichi", &entry(2, 9, Some(3)));

        assert_eq!(pin.id, "koichi@4");
        assert_eq!(pin.time, "1970-01-01T01:00:00.000Z");
        assert_eq!(pin.duration, Some(45));
        assert_eq!(pin.reminders.len(), 1);
        assert_eq!(pin.actions[0].launch_code, 4);

        let json = serde_json::to_value(&pin).unwrap();
        assert_eq!(json["layout"]["type"], "genericPin");
        assert_eq!(json["layout"]["tinyIcon"], "system://images/SCHEDULED_EVENT");
        assert_eq!(json["actions"][0]["launchCode"], 4);
    }

    #[test]
    fn test_no_reminder_when_all_items_are_new() {
        let pins = PinBuilder::new(BucketClock::default(), "Review");
        let pin = pins.build("koichi", &entry(5, 5, None));
        assert!(pin.reminders.is_empty());
        assert!(pin.duration.is_none());

        let json = serde_json::to_value(&pin).unwrap();
        assert!(json.get("reminders").is_none());
        assert!(json.get("duration").is_none());
    }

    #[test]
    fn test_revision_tracks_content() {
        assert_eq!(revision(&entry(2, 9, Some(3))), "2/9/3");
        assert_eq!(revision(&entry(2, 9, None)), "2/9/-");
        assert_ne!(revision(&entry(2, 9, None)), revision(&entry(3, 9, None)));
    }
}
