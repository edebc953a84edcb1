use chrono::{DateTime, Local};
use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::core::schedule::PriceSchedule;

pub fn build_rates_table(schedule: &PriceSchedule, now: DateTime<Local>, window: usize) -> Table {
    let upcoming: Vec<_> = schedule.upcoming(now).take(window).collect();
    let mean = {
        let sum: f64 = upcoming.iter().map(|(_, rate)| rate.0.0).sum();
        #[expect(clippy::cast_precision_loss)]
        let count = upcoming.len().max(1) as f64;
        sum / count
    };

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table.set_header(vec!["Date", "Start", "Rate"]);
    for (start, rate) in upcoming {
        table.add_row(vec![
            Cell::new(start.format("%b %d")).add_attribute(Attribute::Dim),
            Cell::new(start.format("%H:%M")),
            Cell::new(rate).set_alignment(CellAlignment::Right).fg(if rate.0.0 >= mean {
                Color::Red
            } else {
                Color::Green
            }),
        ]);
    }
    table
}
