//! Service configuration defaults
//!
//! Default values used when a setting is absent from every configuration
//! source.

/// HTTP surface defaults
pub mod server {
    pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";

    pub const DEFAULT_PORT: u16 = 8080;

    /// Response header carrying the per-request id
    pub const REQUEST_ID_HEADER: &str = "RequestId";
}

/// Logging defaults
pub mod logging {
    pub const DEFAULT_LEVEL: &str = "info";

    /// `"text"` or `"json"`
    pub const DEFAULT_FORMAT: &str = "text";
}

/// Claim token defaults
pub mod claims {
    /// How long an estimate stays redeemable
    pub const DEFAULT_TTL_SECS: u64 = 90;

    /// Environment variable holding the hex-encoded 256-bit claim key
    pub const KEY_ENV_VAR: &str = "ORCHARD_CLAIM_KEY";
}

/// Pool creation bounds
pub mod pools {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    pub const MIN_PRICE: Decimal = dec!(0.01);

    pub const MAX_PRICE: Decimal = dec!(100000);

    pub const MIN_SUPPLY: Decimal = dec!(1);

    pub const MAX_SUPPLY: Decimal = dec!(1000000000);

    /// Relative tolerance for equal market caps
    pub const CAP_TOLERANCE: Decimal = dec!(0.000001);
}

/// Settlement worker defaults
pub mod settlement {
    /// Deliveries of one message before it is dead-lettered
    pub const MAX_DELIVERY_ATTEMPTS: u32 = 5;

    /// Bound on in-flight settlement messages for the in-process queue
    pub const QUEUE_CAPACITY: usize = 10_000;

    /// Delay before a nacked message becomes visible again (milliseconds)
    pub const REDELIVERY_DELAY_MS: u64 = 250;
}
