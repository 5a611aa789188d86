#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Root,
    SignIn,
    SignUp,
    TwoFactor,
    ForgotPassword,
    ChangePassword,
    Chat,
    NotFound,
}

impl Route {
    pub const ALL: [Route; 7] = [
        Route::Root,
        Route::SignIn,
        Route::SignUp,
        Route::TwoFactor,
        Route::ForgotPassword,
        Route::ChangePassword,
        Route::Chat,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Route::Root => "/",
            Route::SignIn => "/signin",
            Route::SignUp => "/signup",
            Route::TwoFactor => "/twofactorauth",
            Route::ForgotPassword => "/forgotpassword",
            Route::ChangePassword => "/resetpassword",
            Route::Chat => "/chatpage",
            Route::NotFound => "/*any",
        }
    }

    /// Resolves a location (query and fragment ignored) to its route.
    pub fn from_path(location: &str) -> Route {
        let path = location.split(&['?', '#'][..]).next().unwrap_or_default();
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        Self::ALL
            .into_iter()
            .find(|route| route.path() == path)
            .unwrap_or(Route::NotFound)
    }

    /// Views that must never be constructed without a session.
    pub fn is_protected(self) -> bool {
        matches!(self, Route::Chat | Route::ChangePassword)
    }

    /// Views that an authenticated user is forwarded away from.
    pub fn is_guest_only(self) -> bool {
        matches!(self, Route::Root | Route::SignIn)
    }
}
