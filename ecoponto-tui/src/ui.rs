use ecoponto_core::{
    discovery::{MapViewport, Phase, PositionState, Snapshot},
    model::{Category, PointId},
};
use ratatui::{
    prelude::*,
    symbols::Marker,
    widgets::{
        Block, Borders, List, ListItem, ListState, Paragraph, Wrap,
        canvas::{Canvas, Points},
    },
};

use crate::app::{App, RegionFocus, Screen};

const CATEGORY_GAP: usize = 2;

pub(crate) fn draw(frame: &mut Frame<'_>, app: &App) {
    let area = frame.area();

    // Outer layout: title, main content, status line
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [header_area, content_area, status_area] = chunks else {
        return;
    };

    let header_text = match (app.screen, app.snapshot()) {
        (Screen::RegionSelect, _) | (_, None) => {
            "Your waste collection marketplace · find collection points near you".to_owned()
        }
        (_, Some(snapshot)) => format!(
            "Welcome! Find collection points near you in {}",
            snapshot.region
        ),
    };
    let header = Paragraph::new(header_text)
        .block(Block::default().borders(Borders::ALL).title("Ecoponto"));
    frame.render_widget(header, *header_area);

    // Main screen
    match app.screen {
        Screen::RegionSelect => draw_region_select(frame, app, *content_area),
        Screen::Points => draw_points(frame, app, *content_area),
        Screen::PointDetail(point_id) => draw_point_detail(frame, app, point_id, *content_area),
    }

    // Status bar
    let nav_hint = match app.screen {
        Screen::RegionSelect => "↑/↓ move · Enter pick state/city · Tab/←/→ switch list · q quit",
        Screen::Points => {
            "←/→ category · Space toggle · ↑/↓ point · Enter details · +/- zoom · x dismiss · Esc back · q quit"
        }
        Screen::PointDetail(_) => "Esc/←/b back to map · q quit",
    };

    let loading = app.is_loading || app.snapshot().is_some_and(|snapshot| snapshot.points_loading);
    let mut errors: Vec<String> = app
        .snapshot()
        .map(|snapshot| snapshot.errors.iter().map(ToString::to_string).collect())
        .unwrap_or_default();
    if let Some(msg) = &app.error_message {
        errors.push(msg.clone());
    }

    let status_text = if !errors.is_empty() {
        format!("{} · {nav_hint}", errors.join(" · "))
    } else if loading {
        format!("Loading… · {nav_hint}")
    } else {
        nav_hint.to_owned()
    };

    let status_style = if !errors.is_empty() {
        Style::default().fg(Color::Red)
    } else if loading {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let status = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(status_style)
        .wrap(Wrap { trim: true });

    frame.render_widget(status, *status_area);
}

fn draw_region_select(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let layout_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(16), Constraint::Min(0)])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [states_area, cities_area] = chunks else {
        return;
    };

    let states = app
        .states
        .iter()
        .map(|state| ListItem::new(state.0.clone()))
        .collect::<Vec<ListItem<'_>>>();
    let cities = if app.cities.is_empty() {
        vec![ListItem::new("Select a state first.")]
    } else {
        app.cities
            .iter()
            .map(|city| ListItem::new(city.clone()))
            .collect()
    };

    let focus_style = |focus: RegionFocus| {
        if app.region_focus == focus {
            Style::default().fg(Color::Green)
        } else {
            Style::default()
        }
    };
    let highlight = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let states_list = List::new(states)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(focus_style(RegionFocus::States))
                .title("State"),
        )
        .highlight_style(highlight)
        .highlight_symbol("> ");
    let mut states_state = ListState::default();
    if !app.states.is_empty() {
        states_state.select(Some(app.state_list_index));
    }
    frame.render_stateful_widget(states_list, *states_area, &mut states_state);

    let title = app.selected_state.as_ref().map_or_else(
        || "City".to_owned(),
        |state| format!("City in {state} (Enter to find points)"),
    );
    let cities_list = List::new(cities)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(focus_style(RegionFocus::Cities))
                .title(title),
        )
        .highlight_style(highlight)
        .highlight_symbol("> ");
    let mut cities_state = ListState::default();
    if !app.cities.is_empty() {
        cities_state.select(Some(app.city_list_index));
    }
    frame.render_stateful_widget(cities_list, *cities_area, &mut cities_state);
}

fn draw_points(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let Some(snapshot) = app.snapshot() else {
        return;
    };

    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(area);
    let chunks = layout_chunks.as_ref();
    let [upper_area, strip_area] = chunks else {
        return;
    };

    let upper_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(68), Constraint::Percentage(32)])
        .split(*upper_area);
    let upper = upper_chunks.as_ref();
    let [map_area, list_area] = upper else {
        return;
    };

    // The map only exists once the position is known.
    match app.viewport {
        Some(viewport) if snapshot.map_center().is_some() => {
            draw_map(frame, app, snapshot, viewport, *map_area);
        }
        _ => {
            let message = match snapshot.position {
                PositionState::Pending => "Locating you…",
                PositionState::Denied => "We need your permission to show your location.",
                PositionState::Unavailable | PositionState::Resolved(_) => {
                    "Could not determine your position."
                }
            };
            let paragraph = Paragraph::new(message)
                .block(Block::default().borders(Borders::ALL).title("Map"))
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, *map_area);
        }
    }

    draw_point_list(frame, app, snapshot, *list_area);
    draw_category_strip(frame, app, snapshot, *strip_area);
}

fn draw_map(frame: &mut Frame<'_>, app: &App, snapshot: &Snapshot, viewport: MapViewport, area: Rect) {
    let highlighted = app.highlighted_point().map(|point| point.id);
    let visible = viewport.visible(&snapshot.points).count();
    let title = format!(
        "Map · {visible}/{} points in view · span {:.3}°",
        snapshot.points.len(),
        viewport.latitude_span
    );

    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .marker(Marker::Braille)
        .x_bounds(viewport.longitude_bounds())
        .y_bounds(viewport.latitude_bounds())
        .paint(|ctx| {
            let center = viewport.center;
            ctx.draw(&Points {
                coords: &[(center.longitude, center.latitude)],
                color: Color::Cyan,
            });
            ctx.print(
                center.longitude,
                center.latitude,
                Line::styled("✚ you", Style::default().fg(Color::Cyan)),
            );

            for point in viewport.visible(&snapshot.points) {
                let style = if Some(point.id) == highlighted {
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Green)
                };
                ctx.print(
                    point.longitude,
                    point.latitude,
                    Line::styled(format!("● {}", point.name), style),
                );
            }
        });

    frame.render_widget(canvas, area);
}

fn draw_point_list(frame: &mut Frame<'_>, app: &App, snapshot: &Snapshot, area: Rect) {
    let items = if snapshot.points.is_empty() {
        let text = if snapshot.points_loading {
            "Loading collection points…"
        } else {
            "No collection points for this filter."
        };
        vec![ListItem::new(text)]
    } else {
        snapshot
            .points
            .iter()
            .map(|point| ListItem::new(point.name.clone()))
            .collect()
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Points (↑/↓, Enter)"),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !snapshot.points.is_empty() {
        state.select(Some(app.point_list_index));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_category_strip(frame: &mut Frame<'_>, app: &App, snapshot: &Snapshot, area: Rect) {
    let title = match snapshot.phase {
        Phase::Activating if snapshot.categories.is_empty() => "Categories (loading…)".to_owned(),
        _ => format!("Categories · {} selected", snapshot.filter.len()),
    };
    let block = Block::default().borders(Borders::ALL).title(title);
    let inner_width = usize::from(block.inner(area).width);

    let labels: Vec<String> = snapshot
        .categories
        .iter()
        .map(|category| category_label(category, snapshot.is_selected(category.id)))
        .collect();
    let widths: Vec<usize> = labels.iter().map(|label| label.chars().count()).collect();
    let first = strip_start(&widths, app.category_index, inner_width);

    let mut spans = Vec::new();
    let mut used = 0;
    for (idx, (category, label)) in snapshot.categories.iter().zip(labels).enumerate().skip(first) {
        let width = label.chars().count();
        if used > 0 && used + width > inner_width {
            break;
        }
        let mut style = if snapshot.is_selected(category.id) {
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        if idx == app.category_index {
            style = style.add_modifier(Modifier::REVERSED);
        }
        spans.push(Span::styled(label, style));
        spans.push(Span::raw(" ".repeat(CATEGORY_GAP)));
        used += width + CATEGORY_GAP;
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn draw_point_detail(frame: &mut Frame<'_>, app: &App, point_id: PointId, area: Rect) {
    let title = format!("Collection point #{point_id} (Esc/←/b to go back)");
    let text = match app.snapshot().and_then(|snapshot| snapshot.point(point_id)) {
        Some(point) => vec![
            Line::styled(
                point.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Line::from(""),
            Line::from(format!("Position: {}", point.position())),
            Line::from(format!("Photo:    {}", point.image_url)),
        ],
        None => vec![Line::from(
            "This point is no longer part of the current results.",
        )],
    };

    let paragraph = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn category_label(category: &Category, selected: bool) -> String {
    let mark = if selected { "[x]" } else { "[ ]" };
    format!("{mark} {}", category.title)
}

/// First category to draw so the cursor stays visible in `width` columns.
fn strip_start(widths: &[usize], cursor: usize, width: usize) -> usize {
    let Some(cursor_width) = widths.get(cursor) else {
        return 0;
    };
    let mut start = cursor;
    let mut used = cursor_width + CATEGORY_GAP;
    while start > 0 {
        let Some(previous) = widths.get(start - 1) else {
            break;
        };
        if used + previous + CATEGORY_GAP > width {
            break;
        }
        used += previous + CATEGORY_GAP;
        start -= 1;
    }
    start
}
