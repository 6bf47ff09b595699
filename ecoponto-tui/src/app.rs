use std::sync::Arc;

use ecoponto_core::{
    discovery::{DiscoverySession, MapViewport, Navigation, Snapshot},
    model::{CollectionPoint, PointId, Region, StateCode},
    ports::PortError,
    service::EcopontoService,
};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    RegionSelect,
    Points,
    PointDetail(PointId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RegionFocus {
    States,
    Cities,
}

pub(crate) struct App {
    pub service: Arc<EcopontoService>,

    pub screen: Screen,

    pub states: Vec<StateCode>,
    pub state_list_index: usize,
    pub selected_state: Option<StateCode>,
    pub cities: Vec<String>,
    pub city_list_index: usize,
    pub region_focus: RegionFocus,

    pub session: Option<DiscoverySession>,
    pub category_index: usize,
    pub point_list_index: usize,
    pub viewport: Option<MapViewport>,

    pub is_loading: bool,
    pub error_message: Option<String>,
}

impl App {
    pub(crate) fn new(service: Arc<EcopontoService>) -> Self {
        Self {
            service,
            screen: Screen::RegionSelect,
            states: Vec::new(),
            state_list_index: 0,
            selected_state: None,
            cities: Vec::new(),
            city_list_index: 0,
            region_focus: RegionFocus::States,
            session: None,
            category_index: 0,
            point_list_index: 0,
            viewport: None,
            is_loading: false,
            error_message: None,
        }
    }

    pub(crate) fn snapshot(&self) -> Option<&Snapshot> {
        self.session.as_ref().map(DiscoverySession::snapshot)
    }

    /// Pick the highlighted state; returns it when the city list must be reloaded.
    pub(crate) fn select_current_state(&mut self) -> Option<StateCode> {
        let state = self.states.get(self.state_list_index).cloned()?;
        self.region_focus = RegionFocus::Cities;
        if self.selected_state.as_ref() == Some(&state) {
            return None;
        }
        self.selected_state = Some(state.clone());
        self.cities.clear();
        self.city_list_index = 0;
        Some(state)
    }

    /// Store the outcome of a city load started by [`Self::select_current_state`].
    pub(crate) fn finish_city_load(
        &mut self,
        state: &StateCode,
        result: Result<Vec<String>, PortError>,
    ) {
        self.is_loading = false;
        match result {
            Ok(cities) => {
                self.cities = cities;
                self.city_list_index = 0;
            }
            Err(err) => {
                warn!(%state, %err, "failed to load cities");
                // allow picking the same state again to retry
                self.selected_state = None;
                self.error_message = Some(format!("Failed to load cities: {err}"));
            }
        }
    }

    pub(crate) fn current_region(&self) -> Option<Region> {
        let state = self.selected_state.as_ref()?;
        let city = self.cities.get(self.city_list_index)?;
        Some(Region::new(state.0.as_str(), city.as_str()))
    }

    pub(crate) fn highlighted_point(&self) -> Option<&CollectionPoint> {
        self.snapshot()?.points.get(self.point_list_index)
    }

    pub(crate) fn navigate(&mut self, navigation: Navigation) {
        debug!(?navigation, screen = ?self.screen, "navigating");
        match navigation {
            Navigation::Points(region) => {
                self.close_session();
                self.session = Some(self.service.discover(region));
                self.category_index = 0;
                self.point_list_index = 0;
                self.screen = Screen::Points;
            }
            Navigation::PointDetail { point_id } => {
                self.screen = Screen::PointDetail(point_id);
            }
            Navigation::Back => match self.screen {
                Screen::PointDetail(_) => self.screen = Screen::Points,
                Screen::Points => {
                    self.close_session();
                    self.screen = Screen::RegionSelect;
                }
                Screen::RegionSelect => {}
            },
        }
    }

    /// Fold finished loads into the session and keep cursors in range.
    pub(crate) fn sync_session(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.apply_pending();

        let snapshot = session.snapshot();
        if self.viewport.is_none()
            && let Some(center) = snapshot.map_center()
        {
            self.viewport = Some(MapViewport::around(center));
        }
        self.category_index = self
            .category_index
            .min(snapshot.categories.len().saturating_sub(1));
        self.point_list_index = self
            .point_list_index
            .min(snapshot.points.len().saturating_sub(1));
    }

    pub(crate) fn close_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.deactivate();
        }
        self.viewport = None;
    }
}

#[cfg(test)]
mod tests {
    use std::future;

    use async_trait::async_trait;
    use ecoponto_core::{
        backend::Backend,
        model::{Category, CategoryId, FilterSet, GeoPosition},
        ports::{CatalogPort, PointsPort, RegionDirectoryPort},
    };
    use ecoponto_provider_geo::FixedLocator;
    use pretty_assertions::assert_eq;

    use super::*;

    struct Directory;

    #[async_trait]
    impl RegionDirectoryPort for Directory {
        async fn states(&self) -> Result<Vec<StateCode>, PortError> {
            Ok(vec![state("RJ"), state("SP")])
        }

        async fn cities(&self, _state: &StateCode) -> Result<Vec<String>, PortError> {
            Ok(vec!["Santos".to_owned()])
        }
    }

    struct Catalog;

    #[async_trait]
    impl CatalogPort for Catalog {
        async fn categories(&self) -> Result<Vec<Category>, PortError> {
            Ok(vec![Category {
                id: CategoryId(1),
                title: "Glass".to_owned(),
                icon_url: "http://localhost:3333/uploads/1.svg".to_owned(),
            }])
        }
    }

    /// Points port that never answers.
    struct Unanswered;

    #[async_trait]
    impl PointsPort for Unanswered {
        async fn points(
            &self,
            _region: &Region,
            _filter: &FilterSet,
        ) -> Result<Vec<CollectionPoint>, PortError> {
            future::pending().await
        }
    }

    fn state(code: &str) -> StateCode {
        StateCode(code.to_owned())
    }

    fn app_with(points: &Arc<Unanswered>) -> App {
        let backend = Backend::new(
            Arc::new(Catalog),
            Arc::clone(points) as Arc<dyn PointsPort>,
            Arc::new(FixedLocator::new(GeoPosition::new(-23.96, -46.33))),
        );
        let mut app = App::new(Arc::new(EcopontoService::new(Arc::new(Directory), backend)));
        app.states = vec![state("RJ"), state("SP")];
        app
    }

    async fn settle(app: &mut App) {
        for _ in 0..20 {
            tokio::task::yield_now().await;
            app.sync_session();
        }
    }

    #[test]
    fn cities_reload_only_when_the_state_changes() {
        let mut app = app_with(&Arc::new(Unanswered));
        app.state_list_index = 1;

        assert_eq!(app.select_current_state(), Some(state("SP")));
        app.finish_city_load(&state("SP"), Ok(vec!["Santos".to_owned()]));
        assert_eq!(app.region_focus, RegionFocus::Cities);
        assert_eq!(app.select_current_state(), None);
        assert_eq!(app.cities, vec!["Santos".to_owned()]);

        app.state_list_index = 0;
        assert_eq!(app.select_current_state(), Some(state("RJ")));
        assert!(app.cities.is_empty());
    }

    #[test]
    fn failed_city_load_can_be_retried() {
        let mut app = app_with(&Arc::new(Unanswered));
        app.state_list_index = 1;

        assert_eq!(app.select_current_state(), Some(state("SP")));
        app.finish_city_load(&state("SP"), Err(PortError::Timeout));
        assert_eq!(
            app.error_message.as_deref(),
            Some("Failed to load cities: Request timed out")
        );
        assert_eq!(app.current_region(), None);

        assert_eq!(app.select_current_state(), Some(state("SP")));
        app.finish_city_load(&state("SP"), Ok(vec!["Santos".to_owned()]));
        assert_eq!(app.current_region(), Some(Region::new("SP", "Santos")));
    }

    #[tokio::test]
    async fn leaving_the_points_screen_tears_the_session_down() {
        let points = Arc::new(Unanswered);
        let mut app = app_with(&points);

        app.navigate(Navigation::Points(Region::new("SP", "Santos")));
        settle(&mut app).await;
        assert_eq!(app.screen, Screen::Points);
        assert!(app.viewport.is_some());
        assert_eq!(app.snapshot().map(|snapshot| snapshot.categories.len()), Some(1));
        // test, service backend, session backend, running query
        assert_eq!(Arc::strong_count(&points), 4);

        app.navigate(Navigation::PointDetail {
            point_id: PointId(3),
        });
        app.navigate(Navigation::Back);
        assert_eq!(app.screen, Screen::Points);
        assert!(app.session.is_some());

        app.navigate(Navigation::Back);
        settle(&mut app).await;
        assert_eq!(app.screen, Screen::RegionSelect);
        assert!(app.session.is_none());
        assert!(app.viewport.is_none());
        assert_eq!(Arc::strong_count(&points), 2);
    }
}
