/// Name of the cookie carrying the session id, set by the auth frontend.
pub const COOKIE_NAME: &str = "session";
