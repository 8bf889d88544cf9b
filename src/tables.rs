use chrono::TimeDelta;
use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};
use itertools::Itertools;

use crate::{
    core::slot::SlotKey,
    quantity::{KilowattHourPrice, KilowattRate},
    tariff::Tariff,
};

#[must_use]
pub fn build_tariff_table(tariff: &Tariff) -> Table {
    let median_buy = tariff
        .buy
        .values()
        .copied()
        .sorted()
        .nth(SlotKey::N_SLOTS / 2)
        .unwrap_or(KilowattHourPrice::ZERO);

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .set_header(vec!["Slot", "Until", "Buy", "Sell", "Demand"]);
    table.enforce_styling();
    for (slot, buy) in tariff.buy.iter() {
        let sell = tariff.sell[slot];
        let demand = tariff.demand_charges.as_ref().map(|charges| charges.rates[slot]);
        let start_time = slot.start_time();
        table.add_row(vec![
            Cell::new(start_time.format("%H:%M")),
            Cell::new((start_time + TimeDelta::minutes(30)).format("%H:%M"))
                .add_attribute(Attribute::Dim),
            Cell::new(buy)
                .set_alignment(CellAlignment::Right)
                .fg(if *buy >= median_buy { Color::Red } else { Color::Green }),
            Cell::new(sell).set_alignment(CellAlignment::Right).fg(
                if sell > KilowattHourPrice::ZERO { Color::Green } else { Color::Reset },
            ),
            match demand {
                Some(rate) if rate > KilowattRate::ZERO => {
                    Cell::new(rate).set_alignment(CellAlignment::Right).fg(Color::Red)
                }
                Some(rate) => Cell::new(rate)
                    .set_alignment(CellAlignment::Right)
                    .add_attribute(Attribute::Dim),
                None => Cell::new(""),
            },
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{schedule::Schedules, slot::SlotMap},
        tariff::Provider,
    };

    #[test]
    fn one_row_per_slot() {
        let tariff = Tariff::new(
            Schedules {
                buy: SlotMap::from_fn(|slot| KilowattHourPrice(f64::from(slot.hour()) / 100.0)),
                sell: SlotMap::default(),
            },
            Provider::Amber,
        );
        let table = build_tariff_table(&tariff);
        assert_eq!(table.row_iter().count(), SlotKey::N_SLOTS);
        assert!(table.to_string().contains("23:30"));
    }
}
