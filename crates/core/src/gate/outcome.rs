/// Status codes a redirect can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectStatus {
    /// 302, used after a form action.
    Found,
    /// 303, used by the access gate.
    SeeOther,
}

impl RedirectStatus {
    pub fn code(self) -> u16 {
        match self {
            Self::Found => 302,
            Self::SeeOther => 303,
        }
    }
}

/// Instruction to abort rendering and navigate elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub status: RedirectStatus,
    pub location: String,
}

impl Redirect {
    pub fn found(location: impl Into<String>) -> Self {
        Self {
            status: RedirectStatus::Found,
            location: location.into(),
        }
    }

    pub fn see_other(location: impl Into<String>) -> Self {
        Self {
            status: RedirectStatus::SeeOther,
            location: location.into(),
        }
    }
}

/// Result of the gate or an action: carry on rendering, or redirect.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Proceed(T),
    Redirect(Redirect),
}

impl<T> Outcome<T> {
    pub fn redirect(&self) -> Option<&Redirect> {
        match self {
            Self::Proceed(_) => None,
            Self::Redirect(redirect) => Some(redirect),
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Proceed(data) => Outcome::Proceed(f(data)),
            Self::Redirect(redirect) => Outcome::Redirect(redirect),
        }
    }
}
