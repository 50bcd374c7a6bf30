//! Built-in constants for the bridge and its security lists.

/// Network identifier answered to `*_chainId`.
pub const CHAIN_ID: &str = "0x5ba3";

/// Atomic units per displayed coin (1 coin = 10^8 base units).
pub const ATOMIC_UNITS_PER_COIN: u64 = 100_000_000;

/// Decimal places shown for display amounts.
pub const DISPLAY_DECIMALS: usize = 8;

/// How long the provider waits for a response envelope.
pub const PROVIDER_TIMEOUT_MS: u64 = 30_000;

/// How long a transaction consent stays open.
pub const APPROVAL_TIMEOUT_MS: u64 = 5 * 60 * 1_000;

/// How long the connect prompt stays open before it counts as a denial.
pub const CONNECT_PROMPT_TIMEOUT_MS: u64 = 10_000;

/// Requests admitted per origin within one rate window.
pub const RATE_LIMIT_MAX_REQUESTS: u32 = 10;

/// Length of the trailing rate window.
pub const RATE_LIMIT_WINDOW_MS: u64 = 60_000;

/// Grace period after which the generic untrusted-site warning proceeds.
pub const UNTRUSTED_WARNING_GRACE_MS: u64 = 2_000;

/// Blob name of the persisted site permission table.
pub const SITE_PERMISSIONS_BLOB: &str = "site_permissions.json";

/// Domains that skip the generic untrusted-site warning.
pub const TRUSTED_DOMAINS: &[&str] = &[
    "zfnd.org",
    "zcashcommunity.com",
    "zcashblockexplorer.com",
    "z.cash",
];

/// URL patterns (host + path) that look like credential phishing.
pub const PHISHING_PATTERNS: &[&str] = &[
    r"zcash.*wallet.*login",
    r"zcash.*verify.*account",
    r"zcash.*recover.*funds",
    r"zcash.*suspended",
    r"zcash.*security.*alert",
];

/// Domains known to be malicious.
pub const MALICIOUS_DOMAINS: &[&str] = &[
    "zcash-wallet.com",
    "zcash-wallet.org",
    "zcash-recovery.com",
    "zcash-support.com",
];
