//! Metric types accepted on the command line and the datasets they load.

use clap::ValueEnum;
use fitbit_client::DataRequest;

/// One collection in the store plus the request that fills it, one document per day.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dataset {
    pub collection: &'static str,
    /// Top-level array in the provider response holding the day's entry.
    pub document_key: &'static str,
    /// Field of that entry carrying the calendar date.
    pub timestamp_key: &'static str,
    pub request: DataRequest,
}

impl Dataset {
    /// Dotted path to the date inside the raw response, e.g.
    /// `activities-steps.0.dateTime`. Absent when the provider has no entry
    /// for the day.
    pub fn payload_date_path(&self) -> String {
        format!("{}.0.{}", self.document_key, self.timestamp_key)
    }

    /// The date the provider stamped on a response, if it carries one.
    pub fn record_date<'a>(&self, payload: &'a serde_json::Value) -> Option<&'a str> {
        payload
            .get(self.document_key)?
            .get(0)?
            .get(self.timestamp_key)?
            .as_str()
    }
}

const fn daily(
    collection: &'static str,
    document_key: &'static str,
    resource: &'static str,
) -> Dataset {
    Dataset {
        collection,
        document_key,
        timestamp_key: "dateTime",
        request: DataRequest::TimeSeries {
            resource,
            period: "1d",
        },
    }
}

const HEART: &[Dataset] = &[Dataset {
    collection: "heart",
    document_key: "activities-heart",
    timestamp_key: "dateTime",
    request: DataRequest::Intraday {
        resource: "activities/heart",
        detail_level: "1sec",
    },
}];

const SLEEP: &[Dataset] = &[Dataset {
    collection: "sleep",
    document_key: "sleep",
    timestamp_key: "dateOfSleep",
    request: DataRequest::Sleep,
}];

const STEPS: &[Dataset] = &[daily("steps", "activities-steps", "activities/steps")];
const FLOORS: &[Dataset] = &[daily("floors", "activities-floors", "activities/floors")];
const DISTANCE: &[Dataset] = &[daily(
    "distance",
    "activities-distance",
    "activities/distance",
)];
const CALORIES: &[Dataset] = &[daily(
    "calories",
    "activities-calories",
    "activities/calories",
)];

const ACTIVITY: &[Dataset] = &[
    daily(
        "activity_sedentary",
        "activities-minutesSedentary",
        "activities/minutesSedentary",
    ),
    daily(
        "activity_lightly_active",
        "activities-minutesLightlyActive",
        "activities/minutesLightlyActive",
    ),
    daily(
        "activity_fairly_active",
        "activities-minutesFairlyActive",
        "activities/minutesFairlyActive",
    ),
    daily(
        "activity_very_active",
        "activities-minutesVeryActive",
        "activities/minutesVeryActive",
    ),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum MetricType {
    Heart,
    Sleep,
    Steps,
    Floors,
    Distance,
    Activity,
    Calories,
}

impl MetricType {
    pub fn datasets(self) -> &'static [Dataset] {
        match self {
            MetricType::Heart => HEART,
            MetricType::Sleep => SLEEP,
            MetricType::Steps => STEPS,
            MetricType::Floors => FLOORS,
            MetricType::Distance => DISTANCE,
            MetricType::Activity => ACTIVITY,
            MetricType::Calories => CALORIES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_date_path_joins_document_and_timestamp_keys() {
        assert_eq!(
            MetricType::Steps.datasets()[0].payload_date_path(),
            "activities-steps.0.dateTime"
        );
        assert_eq!(
            MetricType::Sleep.datasets()[0].payload_date_path(),
            "sleep.0.dateOfSleep"
        );
    }

    #[test]
    fn activity_expands_to_four_collections() {
        let names: Vec<_> = MetricType::Activity
            .datasets()
            .iter()
            .map(|d| d.collection)
            .collect();
        assert_eq!(
            names,
            vec![
                "activity_sedentary",
                "activity_lightly_active",
                "activity_fairly_active",
                "activity_very_active"
            ]
        );
    }

    #[test]
    fn collections_are_unique_across_types() {
        let mut all: Vec<&str> = MetricType::value_variants()
            .iter()
            .flat_map(|m| m.datasets().iter().map(|d| d.collection))
            .collect();
        let n = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), n);
    }

    #[test]
    fn heart_uses_intraday_request() {
        assert_eq!(
            MetricType::Heart.datasets()[0].request,
            DataRequest::Intraday {
                resource: "activities/heart",
                detail_level: "1sec"
            }
        );
    }

    #[test]
    fn record_date_reads_nested_path() {
        let ds = &MetricType::Sleep.datasets()[0];
        let payload = json!({"sleep": [{"dateOfSleep": "2024-03-09"}], "summary": {}});
        assert_eq!(ds.record_date(&payload), Some("2024-03-09"));
        let empty = json!({"sleep": [], "summary": {}});
        assert_eq!(ds.record_date(&empty), None);
    }
}
