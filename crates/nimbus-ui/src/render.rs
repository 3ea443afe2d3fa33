//! Plain-text rendering of the view trees for the terminal.

use std::fmt::Write as _;

use nimbus_weather::{CityList, CitySuggestion};

use crate::view::{CityDetailsView, HomeContent, HomeView};

pub fn render_home(view: &HomeView) -> String {
    let mut out = String::new();

    match &view.content {
        HomeContent::Empty(empty) => {
            let _ = writeln!(out, "[{}]", empty.illustration);
            let _ = writeln!(out, "{}", empty.message);
        }
        HomeContent::Cities(list) => {
            let _ = writeln!(out, "{}", list.header);
            for card in &list.cards {
                let _ = write!(
                    out,
                    "  {:<28} {:>6}  {} [{}]",
                    card.name, card.temperature, card.condition, card.icon
                );
                if let Some(range) = &card.range {
                    let _ = write!(out, "  ({})", range);
                }
                let _ = writeln!(out, "  #{}", card.id);
            }
        }
    }

    let _ = writeln!(out, "[+ {}]", view.add_city_label);

    if view.modal.visible {
        let _ = writeln!(out);
        let _ = writeln!(out, "!! {}", view.modal.title);
        let _ = writeln!(out, "   {}", view.modal.message);
    }

    out
}

pub fn render_details(view: &CityDetailsView) -> String {
    let mut out = String::new();

    match &view.country {
        Some(country) => {
            let _ = writeln!(out, "{}, {}", view.name, country);
        }
        None => {
            let _ = writeln!(out, "{}", view.name);
        }
    }
    let _ = writeln!(out, "  id:          {}", view.id);
    let _ = writeln!(out, "  location:    {}", view.coordinates);
    let _ = writeln!(out, "  now:         {} {} [{}]", view.temperature, view.condition, view.icon);

    let rows = [
        ("feels like", &view.feels_like),
        ("today", &view.range),
        ("humidity", &view.humidity),
        ("wind", &view.wind),
        ("updated", &view.updated_at),
    ];
    for (label, value) in rows {
        if let Some(value) = value {
            let _ = writeln!(out, "  {:<12} {}", format!("{}:", label), value);
        }
    }

    out
}

/// Numbered list, 1-based to match `add --pick`
pub fn render_suggestions(suggestions: &[CitySuggestion]) -> String {
    if suggestions.is_empty() {
        return "No matching cities.\n".to_string();
    }

    let mut out = String::new();
    for (i, s) in suggestions.iter().enumerate() {
        let place = [s.region.as_deref(), s.country.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(
            out,
            "{:>2}. {} ({}) [{:.2}, {:.2}]",
            i + 1,
            s.name,
            place,
            s.latitude,
            s.longitude
        );
    }
    out
}

/// Saved cities without weather details, for `list`
pub fn render_city_list(cities: &CityList, last_update: Option<&str>) -> String {
    if cities.is_empty() {
        return "No saved cities.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "Last updated: {}", last_update.unwrap_or("never"));
    for city in cities {
        let temperature = city
            .weather
            .as_ref()
            .map(|w| w.format_temperature())
            .unwrap_or_else(|| "--".to_string());
        let _ = writeln!(out, "  {:<12} {:<28} {:>6}", city.id, city.display_name(), temperature);
    }
    out
}
