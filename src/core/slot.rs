use std::{
    fmt::{Display, Formatter},
    ops::{Index, IndexMut},
    str::FromStr,
};

use chrono::{NaiveTime, TimeDelta, Timelike};
use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::prelude::*;

/// One of the 48 recurring half-hour periods of a day.
///
/// Rendered as `PERIOD_HH_MM` only when talking to the outside world.
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    SerializeDisplay,
    DeserializeFromStr,
)]
pub struct SlotKey(u8);

impl SlotKey {
    pub const N_SLOTS: usize = 48;

    pub const MIDNIGHT: Self = Self(0);

    /// Slot starting at the given time of day.
    ///
    /// # Panics
    ///
    /// Panics when the time is not on a half-hour boundary, so only use it with literals.
    #[must_use]
    #[expect(clippy::cast_possible_truncation)]
    pub const fn at(hour: u32, minute: u32) -> Self {
        assert!(hour < 24 && (minute == 0 || minute == 30));
        Self((hour * 2 + minute / 30) as u8)
    }

    /// Slot containing the time of day, minutes truncated to the half hour.
    #[must_use]
    pub fn containing(time: &impl Timelike) -> Self {
        Self::at(time.hour(), time.minute() / 30 * 30)
    }

    pub fn iter() -> impl DoubleEndedIterator<Item = Self> + ExactSizeIterator {
        (0..48).map(Self)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[must_use]
    pub const fn hour(self) -> u32 {
        self.0 as u32 / 2
    }

    #[must_use]
    pub const fn minute(self) -> u32 {
        if self.0 % 2 == 0 { 0 } else { 30 }
    }

    #[must_use]
    pub fn start_time(self) -> NaiveTime {
        NaiveTime::MIN + TimeDelta::minutes(i64::from(self.hour() * 60 + self.minute()))
    }

    /// Following slot, wrapping past midnight.
    #[must_use]
    #[expect(clippy::cast_possible_truncation)]
    pub const fn next(self) -> Self {
        Self((self.0 + 1) % Self::N_SLOTS as u8)
    }
}

impl Display for SlotKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "PERIOD_{:02}_{:02}", self.hour(), self.minute())
    }
}

impl FromStr for SlotKey {
    type Err = Error;

    fn from_str(label: &str) -> Result<Self> {
        let (hour, minute) = label
            .strip_prefix("PERIOD_")
            .and_then(|rest| rest.split_once('_'))
            .with_context(|| format!("`{label}` is not a period label"))?;
        let hour: u32 = hour.parse().with_context(|| format!("invalid hour in `{label}`"))?;
        let minute: u32 = minute.parse().with_context(|| format!("invalid minute in `{label}`"))?;
        ensure!(hour < 24 && (minute == 0 || minute == 30), "`{label}` is not a half-hour period");
        Ok(Self::at(hour, minute))
    }
}

/// Value per slot of a day.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotMap<T>([T; SlotKey::N_SLOTS]);

impl<T> SlotMap<T> {
    #[expect(clippy::cast_possible_truncation)]
    pub fn from_fn(mut f: impl FnMut(SlotKey) -> T) -> Self {
        Self(std::array::from_fn(|index| f(SlotKey(index as u8))))
    }

    pub fn try_from_fn(mut f: impl FnMut(SlotKey) -> Result<T>) -> Result<Self> {
        let mut values = Vec::with_capacity(SlotKey::N_SLOTS);
        for slot in SlotKey::iter() {
            values.push(f(slot)?);
        }
        let values = values.try_into().map_err(|_| anyhow!("slot count mismatch"))?;
        Ok(Self(values))
    }

    pub fn iter(&self) -> impl Iterator<Item = (SlotKey, &T)> {
        SlotKey::iter().zip(&self.0)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (SlotKey, &mut T)> {
        SlotKey::iter().zip(&mut self.0)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }

    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> SlotMap<U> {
        SlotMap(self.0.map(f))
    }
}

impl<T: Default> Default for SlotMap<T> {
    fn default() -> Self {
        Self::from_fn(|_| T::default())
    }
}

impl<T> Index<SlotKey> for SlotMap<T> {
    type Output = T;

    fn index(&self, slot: SlotKey) -> &Self::Output {
        &self.0[slot.index()]
    }
}

impl<T> IndexMut<SlotKey> for SlotMap<T> {
    fn index_mut(&mut self, slot: SlotKey) -> &mut Self::Output {
        &mut self.0[slot.index()]
    }
}
