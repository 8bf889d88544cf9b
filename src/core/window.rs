use std::fmt::{Display, Formatter};

use chrono::NaiveTime;

use crate::{core::slot::SlotKey, prelude::*};

/// Time-of-day window with inclusive start and exclusive end.
///
/// When the end is not after the start, the window wraps past midnight.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SlotWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl SlotWindow {
    #[must_use]
    pub const fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Parse the window from `HH:MM` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Ok(Self::new(parse_time_of_day(start)?, parse_time_of_day(end)?))
    }

    #[must_use]
    pub fn contains(self, slot: SlotKey) -> bool {
        let time = slot.start_time();
        if self.end <= self.start {
            time >= self.start || time < self.end
        } else {
            self.start <= time && time < self.end
        }
    }

    pub fn slots(self) -> impl Iterator<Item = SlotKey> {
        SlotKey::iter().filter(move |slot| self.contains(*slot))
    }
}

impl Display for SlotWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

fn parse_time_of_day(text: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(text.trim(), "%H:%M")
        .with_context(|| format!("invalid time of day `{text}`, expected `HH:MM`"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn afternoon() -> Result {
        let window = SlotWindow::parse("14:00", "20:00")?;
        assert_eq!(window.slots().count(), 12);
        assert!(window.contains(SlotKey::at(14, 0)));
        assert!(window.contains(SlotKey::at(19, 30)));
        assert!(!window.contains(SlotKey::at(20, 0)));
        Ok(())
    }

    #[test]
    fn wraps_past_midnight() -> Result {
        let window = SlotWindow::parse("22:00", "02:00")?;
        assert_eq!(window.slots().count(), 8);
        assert!(window.contains(SlotKey::at(23, 30)));
        assert!(window.contains(SlotKey::MIDNIGHT));
        assert!(!window.contains(SlotKey::at(2, 0)));
        assert!(!window.contains(SlotKey::at(12, 0)));
        Ok(())
    }

    #[test]
    fn malformed() {
        assert!(SlotWindow::parse("4pm", "20:00").is_err());
        assert!(SlotWindow::parse("16:00", "25:00").is_err());
    }

    #[test]
    fn display() -> Result {
        assert_eq!(SlotWindow::parse("07:00", " 09:30")?.to_string(), "07:00-09:30");
        Ok(())
    }
}
