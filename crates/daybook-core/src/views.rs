mod eod;
mod sod;
mod summary;

pub use self::eod::EodView;
pub use self::sod::SodView;
pub use self::summary::SummaryView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `/`, the SOD form.
    Root,
    /// `/eod`
    Eod,
    /// `/summary`
    Summary,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Root => "/",
            Route::Eod => "/eod",
            Route::Summary => "/summary",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        match path.trim().trim_end_matches('/') {
            "" | "sod" | "/sod" => Some(Route::Root),
            "eod" | "/eod" => Some(Route::Eod),
            "summary" | "/summary" => Some(Route::Summary),
            _ => None,
        }
    }
}

/// The choice offered on the home screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Sod,
    Eod,
}

impl Mode {
    pub fn route(self) -> Route {
        match self {
            Mode::Sod => Route::Root,
            Mode::Eod => Route::Eod,
        }
    }
}

/// What a view operation asks of its host: a blocking alert, a navigation,
/// or both (alert first). `failed` marks alerts that report a failed write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub alert: Option<String>,
    pub navigate: Option<Route>,
    pub failed: bool,
}

impl Outcome {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn alert(message: impl Into<String>) -> Self {
        Self {
            alert: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            alert: Some(message.into()),
            navigate: None,
            failed: true,
        }
    }

    pub fn then_navigate(mut self, route: Route) -> Self {
        self.navigate = Some(route);
        self
    }

    pub fn is_none(&self) -> bool {
        self.alert.is_none() && self.navigate.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::{Mode, Outcome, Route};

    #[test]
    fn paths_round_trip_through_routes() {
        for route in [Route::Root, Route::Eod, Route::Summary] {
            assert_eq!(Route::from_path(route.path()), Some(route));
        }
        assert_eq!(Route::from_path("sod"), Some(Route::Root));
        assert_eq!(Route::from_path("/calendar"), None);
        assert_eq!(Mode::Eod.route(), Route::Eod);
    }

    #[test]
    fn alert_then_navigation() {
        let outcome = Outcome::alert("saved").then_navigate(Route::Root);
        assert_eq!(outcome.alert.as_deref(), Some("saved"));
        assert_eq!(outcome.navigate, Some(Route::Root));
        assert!(!outcome.failed);
        assert!(Outcome::failure("nope").failed);
        assert!(Outcome::none().is_none());
    }
}
