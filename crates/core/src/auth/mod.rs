mod error;
mod functions;
mod traits;
mod types;
mod validation;

pub use error::AuthError;
pub use functions::{email_to_name, is_ignorable_sign_out_error, is_session_expiring, stamp_expiry};
pub use traits::{CookieSource, IdentityClient, Result, SessionAccessor};
pub use types::{
    CookiePair, OAuthInitiation, OAuthProvider, OAuthSignIn, Session, SessionContext, User,
};
pub use validation::validate_return_to;
