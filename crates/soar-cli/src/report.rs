//! Flight results for logging and JSON output.

use crate::sim::FlightLog;
use anyhow::{Context, Result};
use chrono::{NaiveTime, Timelike};
use serde::Serialize;
use soar_core::{OrderedTask, TaskEvent};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Time of day of `seconds` since midnight, wrapping at midnight.
pub fn time_of_day(seconds: f64) -> NaiveTime {
    let secs = seconds.rem_euclid(SECONDS_PER_DAY).floor() as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, 0).unwrap_or(NaiveTime::MIN)
}

/// Parse "HH:MM" or "HH:MM:SS" into seconds since midnight.
pub fn parse_time_of_day(text: &str) -> Result<f64> {
    let time = NaiveTime::parse_from_str(text, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .with_context(|| format!("invalid time of day '{}'", text))?;
    Ok(time.num_seconds_from_midnight() as f64)
}

#[derive(Debug, Clone, Serialize)]
pub struct TimedEvent {
    pub time: NaiveTime,
    #[serde(flatten)]
    pub event: TaskEvent,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlightReport {
    pub task: String,
    pub started: Option<NaiveTime>,
    pub finished: Option<NaiveTime>,
    pub distance_nominal: f64,
    pub distance_min: f64,
    pub distance_max: f64,
    pub distance_scored: f64,
    /// Average task speed in m/s, zero before the finish
    pub speed: f64,
    pub fixes: usize,
    pub events: Vec<TimedEvent>,
}

impl FlightReport {
    pub fn new(task: &OrderedTask, log: &FlightLog) -> Self {
        let stats = task.stats();
        let started = task.task_started(false).then(|| time_of_day(task.start_state().time));
        let finished = task.task_finished().then(|| time_of_day(task.finish_state().time));
        let elapsed = task.finish_state().time - task.start_state().time;
        let speed = if task.task_finished() && elapsed > 0.0 {
            stats.distance_scored / elapsed
        } else {
            0.0
        };

        Self {
            task: task.name().to_string(),
            started,
            finished,
            distance_nominal: stats.distance_nominal,
            distance_min: stats.distance_min,
            distance_max: stats.distance_max,
            distance_scored: stats.distance_scored,
            speed,
            fixes: log.fixes,
            events: log
                .events
                .iter()
                .map(|(time, event)| TimedEvent {
                    time: time_of_day(*time),
                    event: *event,
                })
                .collect(),
        }
    }

    pub fn log(&self) {
        tracing::info!(
            "Task '{}': nominal {:.1} km, min {:.1} km, max {:.1} km",
            self.task,
            self.distance_nominal / 1_000.0,
            self.distance_min / 1_000.0,
            self.distance_max / 1_000.0
        );
        match (self.started, self.finished) {
            (Some(start), Some(finish)) => tracing::info!(
                "Started {} finished {}: {:.1} km scored at {:.1} km/h",
                start,
                finish,
                self.distance_scored / 1_000.0,
                self.speed * 3.6
            ),
            (Some(start), None) => tracing::warn!(
                "Started {} but did not finish, {:.1} km scored",
                start,
                self.distance_scored / 1_000.0
            ),
            _ => tracing::warn!("Task was not started after {} fixes", self.fixes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_of_day() {
        assert_eq!(time_of_day(36_000.0).to_string(), "10:00:00");
        assert_eq!(time_of_day(86_400.0 + 61.5).to_string(), "00:01:01");
        assert_eq!(time_of_day(-1.0).to_string(), "23:59:59");
    }

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(parse_time_of_day("10:30").unwrap(), 37_800.0);
        assert_eq!(parse_time_of_day("00:00:05").unwrap(), 5.0);
        assert!(parse_time_of_day("noon").is_err());
    }

    #[test]
    fn test_timed_event_json() {
        let event = TimedEvent {
            time: time_of_day(3_600.0),
            event: TaskEvent::ActiveAdvanced(2),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["time"], "01:00:00");
        assert_eq!(json["event"], "active_advanced");
        assert_eq!(json["point"], 2);
    }
}
