// Rust guideline compliant 2026-10-19

//! Shared domain types for the ledger service.
//!
//! Defines `UserId`, `Amount`, `User`, `TransactionRecord`, `FraudFlag` and
//! `LedgerError`, plus the hexagonal port traits `Clock` and `FraudObserver`.
//! All ledger components depend on this crate; it depends on none of them.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Monetary amount. Exact decimal arithmetic, never binary floating point.
pub type Amount = rust_decimal::Decimal;

/// Point in time used by rate windows and transaction records.
pub type Timestamp = DateTime<Utc>;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Opaque, globally unique user identifier (UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(uuid::Uuid);

impl UserId {
    /// Draw a fresh random identifier.
    #[must_use]
    pub fn new_random() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Return the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> uuid::Uuid {
        self.0
    }
}

impl From<uuid::Uuid> for UserId {
    fn from(id: uuid::Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s).map(Self)
    }
}

/// A registered user. Created once by `register`; never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// Unique identifier.
    pub id: UserId,
    /// Registration time.
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Transaction history
// ---------------------------------------------------------------------------

/// Kind of balance change recorded in a user's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Funds added by the user.
    Deposit,
    /// Funds removed by the user.
    Withdraw,
    /// Sender side of a transfer.
    TransferOut,
    /// Recipient side of a transfer.
    TransferIn,
}

impl Action {
    /// Wire name of the action (e.g. `"transfer_out"`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdraw => "withdraw",
            Self::TransferOut => "transfer_out",
            Self::TransferIn => "transfer_in",
        }
    }
}

/// Immutable history entry. Appended in application order, never edited.
///
/// Serializes as `{timestamp, action, amount, target}` with an ISO-8601
/// timestamp and a nullable `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRecord {
    /// When the change was applied.
    pub timestamp: Timestamp,
    /// What kind of change it was.
    pub action: Action,
    /// Always strictly positive.
    pub amount: Amount,
    /// Counterparty for transfers, `None` otherwise.
    pub target: Option<UserId>,
}

// ---------------------------------------------------------------------------
// Fraud flags
// ---------------------------------------------------------------------------

/// Advisory signal raised by a fraud heuristic. Never blocks a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FraudFlag {
    /// Too many transfers from one user inside the velocity window.
    RateLimitExceeded,
    /// A single withdrawal at or above the large-withdrawal threshold.
    LargeWithdrawal,
}

impl FraudFlag {
    /// Wire name of the flag (e.g. `"large_withdrawal"`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RateLimitExceeded => "rate_limit_exceeded",
            Self::LargeWithdrawal => "large_withdrawal",
        }
    }
}

impl fmt::Display for FraudFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by ledger operations.
///
/// All variants are local and recoverable by the caller; none leaves the
/// ledger partially updated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Unknown user, non-positive amount, self-transfer or arithmetic overflow.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// Human-readable description.
        reason: String,
    },
    /// The user's sliding request window is full.
    #[error("rate limit exceeded for user {user_id}")]
    RateLimited {
        /// User whose window is full.
        user_id: UserId,
    },
    /// Transfer amount above the per-transfer cap.
    #[error("transfer amount {amount} exceeds allowed limit {limit}")]
    LimitExceeded {
        /// Requested amount.
        amount: Amount,
        /// Configured cap.
        limit: Amount,
    },
    /// Balance lower than the requested debit.
    #[error("insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// Balance at the time of the request.
        balance: Amount,
        /// Amount that could not be debited.
        requested: Amount,
    },
    /// Query for a user that was never registered.
    #[error("user {user_id} not found")]
    NotFound {
        /// Identifier that was looked up.
        user_id: UserId,
    },
}

impl LedgerError {
    /// Shorthand for [`LedgerError::InvalidArgument`].
    #[must_use]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument { reason: reason.into() }
    }
}

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Hexagonal port: wall-clock time source.
///
/// Implementations live outside the domain crate (e.g. `SystemClock` in the
/// service binary). Rate windows and transaction records read time only
/// through this trait.
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> Timestamp;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// Hexagonal port: post-commit observer of ledger mutations.
///
/// The ledger calls these methods after a mutation has been applied and its
/// lock released. A returned flag is advisory: the ledger logs it and the
/// mutation result is unchanged.
pub trait FraudObserver: Send + Sync {
    /// Observe a committed transfer.
    fn on_transfer(&self, sender: UserId, recipient: UserId, amount: Amount) -> Option<FraudFlag>;

    /// Observe a committed withdrawal.
    fn on_withdrawal(&self, user_id: UserId, amount: Amount) -> Option<FraudFlag>;
}

impl<O: FraudObserver + ?Sized> FraudObserver for Arc<O> {
    fn on_transfer(&self, sender: UserId, recipient: UserId, amount: Amount) -> Option<FraudFlag> {
        (**self).on_transfer(sender, recipient, amount)
    }

    fn on_withdrawal(&self, user_id: UserId, amount: Amount) -> Option<FraudFlag> {
        (**self).on_withdrawal(user_id, amount)
    }
}

/// Observer that never flags anything. Default for a ledger built without
/// a fraud heuristic.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFraudObserver;

impl FraudObserver for NoFraudObserver {
    fn on_transfer(&self, _sender: UserId, _recipient: UserId, _amount: Amount) -> Option<FraudFlag> {
        None
    }

    fn on_withdrawal(&self, _user_id: UserId, _amount: Amount) -> Option<FraudFlag> {
        None
    }
}

/// Clock that only moves when told to. For tests of time-window behavior.
#[cfg(feature = "testing")]
#[derive(Debug)]
pub struct ManualClock {
    now: parking_lot::Mutex<Timestamp>,
}

#[cfg(feature = "testing")]
impl ManualClock {
    /// Create a clock frozen at `start`.
    #[must_use]
    pub fn new(start: Timestamp) -> Self {
        Self { now: parking_lot::Mutex::new(start) }
    }

    /// Create a clock frozen at a fixed, arbitrary instant (2026-01-01T00:00:00Z).
    #[must_use]
    pub fn at_epoch() -> Self {
        Self::new(DateTime::<Utc>::from_timestamp(1_767_225_600, 0).unwrap_or_default())
    }

    /// Move the clock forward (or backward, for a negative delta).
    pub fn advance(&self, by: chrono::TimeDelta) {
        let mut now = self.now.lock();
        *now += by;
    }

    /// Jump to an absolute instant.
    pub fn set(&self, at: Timestamp) {
        *self.now.lock() = at;
    }
}

#[cfg(feature = "testing")]
impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn user_id_display_parse_round_trip() {
        let id = UserId::new_random();
        let parsed: UserId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn user_id_rejects_garbage() {
        assert!("not-a-uuid".parse::<UserId>().is_err());
    }

    #[test]
    fn user_ids_are_unique() {
        let a = UserId::new_random();
        let b = UserId::new_random();
        assert_ne!(a, b);
    }

    #[test]
    fn action_wire_names() {
        assert_eq!(Action::Deposit.as_str(), "deposit");
        assert_eq!(Action::Withdraw.as_str(), "withdraw");
        assert_eq!(Action::TransferOut.as_str(), "transfer_out");
        assert_eq!(Action::TransferIn.as_str(), "transfer_in");
    }

    #[test]
    fn record_serializes_to_wire_shape() {
        let target = UserId::new_random();
        let timestamp = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let record = TransactionRecord {
            timestamp,
            action: Action::TransferOut,
            amount: dec!(12.5),
            target: Some(target),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["action"], "transfer_out");
        assert_eq!(json["amount"], 12.5);
        assert_eq!(json["target"], target.to_string());
        assert!(json["timestamp"].as_str().unwrap().starts_with("2023-11-14T22:13:20"));
    }

    #[test]
    fn record_without_target_serializes_null() {
        let record = TransactionRecord {
            timestamp: Utc::now(),
            action: Action::Deposit,
            amount: dec!(1),
            target: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json["target"].is_null());
    }

    #[test]
    fn fraud_flag_wire_names() {
        assert_eq!(FraudFlag::RateLimitExceeded.to_string(), "rate_limit_exceeded");
        assert_eq!(FraudFlag::LargeWithdrawal.to_string(), "large_withdrawal");
    }

    #[test]
    fn ledger_error_messages() {
        let id = UserId::new_random();
        assert_eq!(LedgerError::invalid("amount must be positive").to_string(), "invalid argument: amount must be positive");
        assert_eq!(LedgerError::RateLimited { user_id: id }.to_string(), format!("rate limit exceeded for user {id}"));
        assert_eq!(
            LedgerError::LimitExceeded { amount: dec!(1500), limit: dec!(1000) }.to_string(),
            "transfer amount 1500 exceeds allowed limit 1000"
        );
        assert_eq!(
            LedgerError::InsufficientFunds { balance: dec!(300), requested: dec!(1000) }.to_string(),
            "insufficient funds: balance 300, requested 1000"
        );
        assert_eq!(LedgerError::NotFound { user_id: id }.to_string(), format!("user {id} not found"));
    }

    #[test]
    fn no_fraud_observer_never_flags() {
        let observer = NoFraudObserver;
        let (a, b) = (UserId::new_random(), UserId::new_random());
        assert_eq!(observer.on_transfer(a, b, dec!(999)), None);
        assert_eq!(observer.on_withdrawal(a, dec!(1_000_000)), None);
    }

    /// Verify that a minimal `Clock` implementation works through an `Arc`.
    #[test]
    fn clock_impl_through_arc() {
        struct Fixed(Timestamp);

        impl Clock for Fixed {
            fn now(&self) -> Timestamp {
                self.0
            }
        }

        let at = DateTime::<Utc>::from_timestamp(42, 0).unwrap();
        let clock = Arc::new(Fixed(at));
        assert_eq!(clock.now(), at);
    }
}
