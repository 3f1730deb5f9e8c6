//! Three-route navigation stack.

use crate::model::user::{UserHandle, UserId};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "name")]
pub enum Route {
    Login,
    Register,
    Home { owner_email: String, owner_id: UserId },
}

impl Route {
    /// Home for `user`, titled with the email as it was typed at login.
    pub fn home(user: &UserHandle, typed_email: impl Into<String>) -> Self {
        Self::Home {
            owner_email: typed_email.into(),
            owner_id: user.uid,
        }
    }

    /// Stable route name used by the UI shell.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Register => "register",
            Self::Home { .. } => "home",
        }
    }
}

/// Route stack. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
    stack: Vec<Route>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    /// Starts on `Login`.
    pub fn new() -> Self {
        Self {
            stack: vec![Route::Login],
        }
    }

    pub fn current(&self) -> &Route {
        // Stack is never empty; `Login` is only a fallback for the type.
        self.stack.last().unwrap_or(&Route::Login)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn navigate(&mut self, route: Route) {
        self.stack.push(route);
    }

    /// Resets the stack to exactly `route`.
    pub fn replace(&mut self, route: Route) {
        self.stack.clear();
        self.stack.push(route);
    }

    /// Pops one route. Returns `false` when already at the root.
    pub fn go_back(&mut self) -> bool {
        if self.stack.len() > 1 {
            self.stack.pop();
            true
        } else {
            false
        }
    }
}
