//! Shared constants for the reCAPTCHA gate.

/// Body field carrying the client token
pub const RECAPTCHA_FIELD: &str = "g-recaptcha-response";

/// Token location used when none is configured
pub const DEFAULT_TOKEN_LOCATION: &str = "body.g-recaptcha-response";

/// Google siteverify endpoint
pub const DEFAULT_VERIFICATION_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

/// Default timeout for the siteverify call (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default role index treated as administrator
pub const DEFAULT_ADMIN_ROLE_INDEX: u32 = 1;

/// Default cap on buffered request bodies (1 MiB)
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Default HTTP listen address for the demo server
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8890";

/// Localisation keys carried by client-facing errors
pub mod message_keys {
    /// Service answered the token is not valid
    pub const INVALID_RECAPTCHA: &str = "server.error.invalidRecaptcha";

    /// Token missing or rejected by a gate
    pub const BAD_RECAPTCHA_TOKEN: &str = "server.error.badRecaptchaToken";

    /// Gate is misconfigured
    pub const CONFIGURATION: &str = "server.error.configuration";

    /// Verification service unreachable or malformed
    pub const VERIFICATION_UNAVAILABLE: &str = "server.error.verificationUnavailable";

    /// Anything else
    pub const INTERNAL: &str = "server.error.internal";
}

/// Flags raised to the client
pub mod flags {
    /// Future submissions to this endpoint must carry a token
    pub const CAPTCHA_REQUIRED: &str = "captcha-required";
}

/// HTTP header names
pub mod headers {
    /// Set on responses whose request passed verification
    pub const X_CAPTCHA_VERIFIED: &str = "x-captcha-verified";

    /// Prefix for client flags rendered as headers
    pub const FLAG_PREFIX: &str = "x-";

    /// Demo identity: authenticated user id
    pub const X_USER_ID: &str = "x-user-id";

    /// Demo identity: role index of the authenticated user
    pub const X_USER_ROLE: &str = "x-user-role";
}
