//! Static registry of the built-in apps

use marquee_core::traits::{App, AppRegistry};

use crate::{ClockApp, ForecastApp, WeatherApp};

/// Every app this firmware ships, addressable by id
#[derive(Debug, Default)]
pub struct StandardApps {
    pub clock: ClockApp,
    pub weather: WeatherApp,
    pub forecast: ForecastApp,
}

impl StandardApps {
    pub const fn new() -> Self {
        Self {
            clock: ClockApp::new(),
            weather: WeatherApp::new(),
            forecast: ForecastApp::new(),
        }
    }

    /// Ids of all registered apps
    pub fn ids(&self) -> [&str; 3] {
        [self.clock.id(), self.weather.id(), self.forecast.id()]
    }
}

impl AppRegistry for StandardApps {
    fn contains(&self, id: &str) -> bool {
        self.ids().contains(&id)
    }

    fn app_mut(&mut self, id: &str) -> Option<&mut dyn App> {
        if id == self.clock.id() {
            Some(&mut self.clock)
        } else if id == self.weather.id() {
            Some(&mut self.weather)
        } else if id == self.forecast.id() {
            Some(&mut self.forecast)
        } else {
            None
        }
    }
}
