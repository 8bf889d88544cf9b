quantity!(
    /// Energy price in currency per kilowatt-hour, the unit of the rendered tariff.
    KilowattHourPrice,
    f64,
    "$/kWh"
);

quantity!(
    /// Energy price in cents per kilowatt-hour, the unit of the price feed.
    CentsPerKilowattHour,
    f64,
    "¢/kWh"
);

quantity!(
    /// Wholesale market price in currency per megawatt-hour.
    MegawattHourPrice,
    f64,
    "$/MWh"
);

impl KilowattHourPrice {
    /// Round to at most four fractional digits.
    #[must_use]
    pub fn round(self) -> Self {
        Self((self.0 * 10_000.0).round() / 10_000.0)
    }

    /// Arithmetic mean, or `None` for no prices.
    #[expect(clippy::cast_precision_loss)]
    pub fn mean(prices: &[Self]) -> Option<Self> {
        if prices.is_empty() {
            None
        } else {
            Some(prices.iter().copied().sum::<Self>() / prices.len() as f64)
        }
    }
}

impl From<CentsPerKilowattHour> for KilowattHourPrice {
    fn from(price: CentsPerKilowattHour) -> Self {
        Self(price.0 / 100.0)
    }
}

impl From<KilowattHourPrice> for CentsPerKilowattHour {
    fn from(price: KilowattHourPrice) -> Self {
        Self(price.0 * 100.0)
    }
}

impl From<KilowattHourPrice> for MegawattHourPrice {
    fn from(price: KilowattHourPrice) -> Self {
        Self(price.0 * 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::prelude::*;

    #[test]
    fn round_to_four_digits() {
        let price = KilowattHourPrice::from(CentsPerKilowattHour(20.141_913)).round();
        assert_abs_diff_eq!(price.0, 0.2014);
        let price = KilowattHourPrice::from(CentsPerKilowattHour(19.9)).round();
        assert_abs_diff_eq!(price.0, 0.199);
    }

    #[test]
    fn negated_feed_in() {
        let price = KilowattHourPrice::from(-CentsPerKilowattHour(-10.44)).round();
        assert_abs_diff_eq!(price.0, 0.1044);
    }

    #[test]
    fn floor_at_zero() {
        assert_eq!(KilowattHourPrice(-0.01).floor_at_zero(), KilowattHourPrice::ZERO);
        assert_eq!(KilowattHourPrice(0.25).floor_at_zero(), KilowattHourPrice(0.25));
    }

    #[test]
    fn mean() -> Result {
        let mean = KilowattHourPrice::mean(&[KilowattHourPrice(0.1), KilowattHourPrice(0.2)])
            .context("no mean")?;
        assert_abs_diff_eq!(mean.0, 0.15, epsilon = 1e-12);
        assert!(KilowattHourPrice::mean(&[]).is_none());
        Ok(())
    }

    #[test]
    fn megawatt_hour() {
        assert_abs_diff_eq!(MegawattHourPrice::from(KilowattHourPrice(0.085)).0, 85.0);
    }
}
