//! Route access rules
//!
//! Maps a destination and the current session onto what the app should do:
//! render it, wait for hydration, or redirect elsewhere.

use crate::session::state::SessionSnapshot;

/// Navigable screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Landing,
    Home,
    Login,
    Signup,
    ForgotPassword,
    ResetPassword,
    Watch(i64),
    Series(i64),
    WatchLater,
    WatchHistory,
    Profile,
    BecomeCreator,
    CreatorDashboard,
    Studio,
}

impl Route {
    /// Screens that need a logged-in user
    pub fn requires_login(self) -> bool {
        matches!(
            self,
            Route::Watch(_)
                | Route::Series(_)
                | Route::WatchLater
                | Route::WatchHistory
                | Route::Profile
                | Route::BecomeCreator
                | Route::CreatorDashboard
                | Route::Studio
        )
    }

    /// Screens that need a creator account
    pub fn requires_creator(self) -> bool {
        matches!(self, Route::CreatorDashboard | Route::Studio)
    }

    /// Screens that make no sense once logged in
    pub fn guest_only(self) -> bool {
        matches!(self, Route::Login | Route::Signup | Route::ForgotPassword)
    }
}

/// Outcome of guarding a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Render,
    Redirect(Route),
    /// Session hydration has not finished
    Wait,
}

/// Decide whether `route` may be shown for `session`
pub fn guard(route: Route, session: &SessionSnapshot) -> Navigation {
    let needs_decision = route.requires_login() || route.guest_only();
    if session.loading && needs_decision {
        return Navigation::Wait;
    }

    if route.guest_only() && session.is_logged_in() {
        return Navigation::Redirect(Route::Home);
    }
    if route.requires_login() && !session.is_logged_in() {
        return Navigation::Redirect(Route::Login);
    }
    if route.requires_creator() && !session.is_creator() {
        return Navigation::Redirect(Route::BecomeCreator);
    }

    Navigation::Render
}
