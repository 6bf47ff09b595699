use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ecoponto_core::{discovery::Navigation, model::StateCode};

use crate::app::{App, RegionFocus, Screen};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Action {
    None,
    Quit,
    /// Run `service.cities`(...) for the chosen state
    LoadCities(StateCode),
    /// Switch screens
    Navigate(Navigation),
}

pub(crate) fn handle_key_event(key: KeyEvent, app: &mut App) -> Action {
    use KeyCode::{Backspace, Char, Down, Enter, Esc, Left, Right, Tab, Up};

    // Global quit shortcuts
    if key.code == Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }
    if key.code == Char('q') && key.modifiers.is_empty() {
        return Action::Quit;
    }

    let mut action = Action::None;

    match app.screen {
        Screen::RegionSelect => match (app.region_focus, key.code) {
            (RegionFocus::States, Up | Char('k')) => {
                app.state_list_index = app.state_list_index.saturating_sub(1);
            }
            (RegionFocus::States, Down | Char('j')) => {
                if app.state_list_index + 1 < app.states.len() {
                    app.state_list_index += 1;
                }
            }
            (RegionFocus::States, Enter | Char(' ') | Right | Tab) => {
                if let Some(state) = app.select_current_state() {
                    action = Action::LoadCities(state);
                }
            }
            (RegionFocus::Cities, Up | Char('k')) => {
                app.city_list_index = app.city_list_index.saturating_sub(1);
            }
            (RegionFocus::Cities, Down | Char('j')) => {
                if app.city_list_index + 1 < app.cities.len() {
                    app.city_list_index += 1;
                }
            }
            (RegionFocus::Cities, Enter | Char(' ')) => match app.current_region() {
                Some(region) => action = Action::Navigate(Navigation::Points(region)),
                None => app.error_message = Some("Select a state and a city first".into()),
            },
            (RegionFocus::Cities, Left | Esc | Tab) => {
                app.region_focus = RegionFocus::States;
            }
            _ => {}
        },

        Screen::Points => {
            let Some(session) = app.session.as_mut() else {
                return Action::Navigate(Navigation::Back);
            };
            let snapshot = session.snapshot();
            match key.code {
                Left | Char('h') => {
                    app.category_index = app.category_index.saturating_sub(1);
                }
                Right | Char('l') => {
                    if app.category_index + 1 < snapshot.categories.len() {
                        app.category_index += 1;
                    }
                }
                Char(' ') => {
                    if let Some(category) = snapshot.categories.get(app.category_index) {
                        let id = category.id;
                        session.toggle_category(id);
                    }
                }
                Up | Char('k') => {
                    app.point_list_index = app.point_list_index.saturating_sub(1);
                }
                Down | Char('j') => {
                    if app.point_list_index + 1 < snapshot.points.len() {
                        app.point_list_index += 1;
                    }
                }
                Enter => {
                    if let Some(point) = snapshot.points.get(app.point_list_index) {
                        action = Action::Navigate(session.select_point(point.id));
                    }
                }
                Char('+' | '=') => {
                    if let Some(viewport) = app.viewport.as_mut() {
                        viewport.zoom_in();
                    }
                }
                Char('-') => {
                    if let Some(viewport) = app.viewport.as_mut() {
                        viewport.zoom_out();
                    }
                }
                Char('x') => {
                    session.dismiss_errors();
                    app.error_message = None;
                }
                Esc | Backspace | Char('b') => {
                    action = Action::Navigate(session.go_back());
                }
                _ => {}
            }
        }

        Screen::PointDetail(_) => match key.code {
            Left | Esc | Backspace | Char('b') => {
                action = Action::Navigate(Navigation::Back);
            }
            _ => {}
        },
    }
    action
}
