//! Access gate and root page form actions.
//!
//! Both return an [`Outcome`] instead of aborting: the web layer turns
//! `Outcome::Redirect` into a 302/303 response and renders `Outcome::Proceed`.

mod actions;
mod outcome;
mod policy;

pub use actions::{
    callback_url, log_out, run_action, sign_in_with_google, ActionContext, ActionData, FormAction,
    UnknownAction, CALLBACK_PATH,
};
pub use outcome::{Outcome, Redirect, RedirectStatus};
pub use policy::{access_redirect, load_layout, LayoutData, LoadContext, DASHBOARD_PATH, ROOT_PATH};
