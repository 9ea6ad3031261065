//! Storage key constants.

/// Storage keys used by the client.
pub struct StorageKeys;

impl StorageKeys {
    /// Access token (short-lived, attached to every authenticated request)
    pub const ACCESS_TOKEN: &'static str = "access_token";

    /// Refresh token (long-lived, sent only to the refresh endpoint)
    pub const REFRESH_TOKEN: &'static str = "refresh_token";

    /// Last successfully fetched user profile (JSON)
    pub const CACHED_USER: &'static str = "cached_user";

    /// All keys owned by a session, in clearing order.
    pub const SESSION_KEYS: [&'static str; 3] =
        [Self::ACCESS_TOKEN, Self::REFRESH_TOKEN, Self::CACHED_USER];
}
