use gp_core::traits::Navigator;
use gp_core::transfer::{NavPayload, Screen};
use parking_lot::Mutex;

struct Route {
    screen: Screen,
    payload: Option<NavPayload>,
}

/// Screen stack kept in memory. `navigate` pushes, `back` pops.
#[derive(Default)]
pub struct StackNavigator {
    stack: Mutex<Vec<Route>>,
}

impl StackNavigator {
    /// Starts with `screen` as the only route.
    pub fn starting_at(screen: Screen) -> Self {
        let navigator = Self::default();
        navigator.stack.lock().push(Route {
            screen,
            payload: None,
        });
        navigator
    }

    /// Pops the current screen and returns the one now on top.
    pub fn back(&self) -> Option<Screen> {
        let mut stack = self.stack.lock();
        stack.pop();
        stack.last().map(|route| route.screen)
    }

    /// Screens from bottom to top.
    pub fn history(&self) -> Vec<Screen> {
        self.stack.lock().iter().map(|route| route.screen).collect()
    }
}

impl Navigator for StackNavigator {
    fn navigate(&self, screen: Screen, payload: Option<NavPayload>) {
        tracing::debug!(?screen, has_payload = payload.is_some(), "navigate");
        self.stack.lock().push(Route { screen, payload });
    }

    fn current_screen(&self) -> Option<Screen> {
        self.stack.lock().last().map(|route| route.screen)
    }

    fn current_payload(&self) -> Option<NavPayload> {
        self.stack
            .lock()
            .last()
            .and_then(|route| route.payload.clone())
    }

    fn take_payload(&self) -> Option<NavPayload> {
        self.stack
            .lock()
            .last_mut()
            .and_then(|route| route.payload.take())
    }
}
