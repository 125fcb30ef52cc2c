// Rust guideline compliant 2026-10-19

//! Ledger component -- owns every balance, history and rate window, and
//! applies deposits, withdrawals and transfers atomically.
//!
//! Entry points: [`Ledger::register`], [`Ledger::deposit`], [`Ledger::withdraw`],
//! [`Ledger::transfer`], [`Ledger::balance`], [`Ledger::history`].
//! Configuration via [`LedgerConfig::builder`].
//!
//! One `parking_lot::Mutex` is the single exclusion domain: every public
//! method takes it for the whole logical operation, including the rate-window
//! test and record. The optional [`FraudObserver`] runs after the lock is
//! released and cannot alter a committed result.

use std::collections::HashMap;

use chrono::TimeDelta;
use domain::{
    Action, Amount, Clock, FraudObserver, LedgerError, NoFraudObserver, Timestamp,
    TransactionRecord, User, UserId,
};
use parking_lot::Mutex;
use rate_limiter::{RateLimiter, RateLimiterConfig, RateLimiterError};
use rust_decimal::Decimal;

/// Per-transfer cap when not overridden.
pub const DEFAULT_TRANSFER_LIMIT: i64 = 1_000;

// ---------------------------------------------------------------------------
// LedgerConfigError
// ---------------------------------------------------------------------------

/// Errors raised while configuring a [`Ledger`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerConfigError {
    /// The supplied configuration is invalid.
    #[error("invalid ledger configuration: {reason}")]
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
    /// The embedded rate limiter configuration is invalid.
    #[error("rate limit: {0}")]
    RateLimit(#[from] RateLimiterError),
}

// ---------------------------------------------------------------------------
// LedgerConfig + builder
// ---------------------------------------------------------------------------

/// Policy for a [`Ledger`].
///
/// Construct via [`LedgerConfig::builder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Sliding-window limit applied to each user's mutations.
    pub rate_limit: RateLimiterConfig,
    /// Transfers strictly above this amount are rejected.
    pub transfer_limit: Amount,
}

/// Builder for [`LedgerConfig`].
///
/// Obtain via [`LedgerConfig::builder`]; finalize with [`build`](Self::build).
#[derive(Debug)]
pub struct LedgerConfigBuilder {
    max_requests: usize,
    window: TimeDelta,
    transfer_limit: Amount,
}

impl LedgerConfig {
    /// Create a builder.
    ///
    /// Default values: 10 mutations per user per 60 s, transfer cap 1000.
    #[must_use]
    pub fn builder() -> LedgerConfigBuilder {
        let rate_limit = RateLimiterConfig::default();
        LedgerConfigBuilder {
            max_requests: rate_limit.max_requests,
            window: rate_limit.window,
            transfer_limit: Decimal::from(DEFAULT_TRANSFER_LIMIT),
        }
    }
}

impl LedgerConfigBuilder {
    /// Override the number of mutations admitted per user per window.
    #[must_use]
    pub fn max_requests(mut self, max_requests: usize) -> Self {
        self.max_requests = max_requests;
        self
    }

    /// Override the rate window length.
    #[must_use]
    pub fn window(mut self, window: TimeDelta) -> Self {
        self.window = window;
        self
    }

    /// Override the per-transfer cap.
    #[must_use]
    pub fn transfer_limit(mut self, limit: Amount) -> Self {
        self.transfer_limit = limit;
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerConfigError::InvalidConfig`] when the transfer cap is
    /// not strictly positive, or [`LedgerConfigError::RateLimit`] when the
    /// rate limit settings are rejected.
    #[must_use = "the Result must be checked; use ? or unwrap"]
    pub fn build(self) -> Result<LedgerConfig, LedgerConfigError> {
        if self.transfer_limit <= Decimal::ZERO {
            return Err(LedgerConfigError::InvalidConfig {
                reason: "transfer_limit must be > 0".to_owned(),
            });
        }
        let rate_limit = RateLimiterConfig::builder()
            .max_requests(self.max_requests)
            .window(self.window)
            .build()?;
        Ok(LedgerConfig { rate_limit, transfer_limit: self.transfer_limit })
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// One user's balance and history.
#[derive(Debug)]
struct Account {
    user: User,
    /// Never negative.
    balance: Amount,
    /// Append-only, application order.
    history: Vec<TransactionRecord>,
}

/// Everything guarded by the ledger lock.
#[derive(Debug)]
struct LedgerState {
    accounts: HashMap<UserId, Account>,
    limiter: RateLimiter,
}

impl LedgerState {
    fn account(&self, user_id: UserId) -> Result<&Account, LedgerError> {
        self.accounts.get(&user_id).ok_or(LedgerError::NotFound { user_id })
    }
}

fn ensure_positive(amount: Amount) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::invalid(format!("amount must be positive, got {amount}")));
    }
    Ok(())
}

fn unknown_user(user_id: UserId) -> LedgerError {
    LedgerError::invalid(format!("unknown user {user_id}"))
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// In-memory ledger: users, balances, histories and per-user rate windows.
///
/// Generic over the `Clock` port and the `FraudObserver` port for static
/// dispatch. Build with [`Ledger::new`] and optionally attach an observer
/// with [`Ledger::with_observer`].
#[derive(Debug)]
pub struct Ledger<C: Clock, O: FraudObserver = NoFraudObserver> {
    transfer_limit: Amount,
    clock: C,
    observer: O,
    state: Mutex<LedgerState>,
}

impl<C: Clock> Ledger<C, NoFraudObserver> {
    /// Create an empty ledger with no fraud observer.
    #[must_use]
    pub fn new(config: LedgerConfig, clock: C) -> Self {
        Self {
            transfer_limit: config.transfer_limit,
            clock,
            observer: NoFraudObserver,
            state: Mutex::new(LedgerState {
                accounts: HashMap::new(),
                limiter: RateLimiter::new(config.rate_limit),
            }),
        }
    }
}

impl<C: Clock, O: FraudObserver> Ledger<C, O> {
    /// Replace the fraud observer, keeping all ledger state.
    #[must_use]
    pub fn with_observer<P: FraudObserver>(self, observer: P) -> Ledger<C, P> {
        Ledger {
            transfer_limit: self.transfer_limit,
            clock: self.clock,
            observer,
            state: self.state,
        }
    }

    /// Register a new user with a zero balance and an empty history.
    pub fn register(&self) -> UserId {
        let mut state = self.state.lock();
        let now = self.clock.now();
        let mut user_id = UserId::new_random();
        while state.accounts.contains_key(&user_id) {
            user_id = UserId::new_random();
        }
        state.accounts.insert(
            user_id,
            Account {
                user: User { id: user_id, created_at: now },
                balance: Decimal::ZERO,
                history: Vec::new(),
            },
        );
        tracing::info!(%user_id, "ledger.register");
        user_id
    }

    /// Credit `amount` to `user_id` and return the new balance.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidArgument`] for an unknown user, a non-positive
    /// amount or a balance overflow; [`LedgerError::RateLimited`] when the
    /// user's window is full.
    pub fn deposit(&self, user_id: UserId, amount: Amount) -> Result<Amount, LedgerError> {
        self.apply_deposit(user_id, amount)
            .inspect_err(|e| tracing::debug!(%user_id, %amount, error = %e, "ledger.deposit.rejected"))
    }

    /// Debit `amount` from `user_id` and return the new balance.
    ///
    /// # Errors
    ///
    /// As [`deposit`](Self::deposit), plus [`LedgerError::InsufficientFunds`]
    /// when the balance is lower than `amount`.
    pub fn withdraw(&self, user_id: UserId, amount: Amount) -> Result<Amount, LedgerError> {
        let balance = self
            .apply_withdraw(user_id, amount)
            .inspect_err(|e| tracing::debug!(%user_id, %amount, error = %e, "ledger.withdraw.rejected"))?;
        if let Some(flag) = self.observer.on_withdrawal(user_id, amount) {
            tracing::warn!(%user_id, %amount, %flag, "ledger.fraud.flagged");
        }
        Ok(balance)
    }

    /// Move `amount` from `sender` to `recipient` and return the sender's new balance.
    ///
    /// Checks run in this order, first failure wins: arguments
    /// ([`LedgerError::InvalidArgument`]), transfer cap
    /// ([`LedgerError::LimitExceeded`]), sender rate window
    /// ([`LedgerError::RateLimited`]), sender funds
    /// ([`LedgerError::InsufficientFunds`]).
    ///
    /// # Errors
    ///
    /// See above.
    pub fn transfer(
        &self,
        sender: UserId,
        recipient: UserId,
        amount: Amount,
    ) -> Result<Amount, LedgerError> {
        let balance = self
            .apply_transfer(sender, recipient, amount)
            .inspect_err(|e| {
                tracing::debug!(%sender, %recipient, %amount, error = %e, "ledger.transfer.rejected");
            })?;
        if let Some(flag) = self.observer.on_transfer(sender, recipient, amount) {
            tracing::warn!(user_id = %sender, %amount, %flag, "ledger.fraud.flagged");
        }
        Ok(balance)
    }

    /// Current balance of `user_id`.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`] for an unknown user.
    pub fn balance(&self, user_id: UserId) -> Result<Amount, LedgerError> {
        Ok(self.state.lock().account(user_id)?.balance)
    }

    /// History of `user_id`, oldest first.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`] for an unknown user.
    pub fn history(&self, user_id: UserId) -> Result<Vec<TransactionRecord>, LedgerError> {
        Ok(self.state.lock().account(user_id)?.history.clone())
    }

    /// Registration record of `user_id`.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`] for an unknown user.
    pub fn user(&self, user_id: UserId) -> Result<User, LedgerError> {
        Ok(self.state.lock().account(user_id)?.user.clone())
    }

    /// Sum of every balance, read in one critical section.
    #[must_use]
    pub fn total_balance(&self) -> Amount {
        self.state.lock().accounts.values().map(|a| a.balance).sum()
    }

    /// Number of committed mutations in `user_id`'s current rate window.
    #[must_use]
    pub fn requests_in_window(&self, user_id: UserId) -> usize {
        self.state.lock().limiter.requests_in_window(user_id)
    }

    // -- critical sections --------------------------------------------------

    fn apply_deposit(&self, user_id: UserId, amount: Amount) -> Result<Amount, LedgerError> {
        ensure_positive(amount)?;
        let mut guard = self.state.lock();
        let now = self.clock.now();
        let state = &mut *guard;

        let account = state.accounts.get_mut(&user_id).ok_or_else(|| unknown_user(user_id))?;
        if state.limiter.is_limited(user_id, now) {
            return Err(LedgerError::RateLimited { user_id });
        }
        let balance = account
            .balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::invalid("deposit would overflow balance"))?;

        account.balance = balance;
        account.history.push(record(now, Action::Deposit, amount, None));
        state.limiter.record(user_id, now);

        tracing::info!(%user_id, %amount, %balance, "ledger.deposit.applied");
        Ok(balance)
    }

    fn apply_withdraw(&self, user_id: UserId, amount: Amount) -> Result<Amount, LedgerError> {
        ensure_positive(amount)?;
        let mut guard = self.state.lock();
        let now = self.clock.now();
        let state = &mut *guard;

        let account = state.accounts.get_mut(&user_id).ok_or_else(|| unknown_user(user_id))?;
        if state.limiter.is_limited(user_id, now) {
            return Err(LedgerError::RateLimited { user_id });
        }
        if account.balance < amount {
            return Err(LedgerError::InsufficientFunds { balance: account.balance, requested: amount });
        }

        account.balance -= amount;
        account.history.push(record(now, Action::Withdraw, amount, None));
        state.limiter.record(user_id, now);

        let balance = account.balance;
        tracing::info!(%user_id, %amount, %balance, "ledger.withdraw.applied");
        Ok(balance)
    }

    fn apply_transfer(
        &self,
        sender: UserId,
        recipient: UserId,
        amount: Amount,
    ) -> Result<Amount, LedgerError> {
        ensure_positive(amount)?;
        if sender == recipient {
            return Err(LedgerError::invalid("sender and recipient must differ"));
        }
        let mut guard = self.state.lock();
        let now = self.clock.now();
        let state = &mut *guard;

        let sender_balance = state.accounts.get(&sender).ok_or_else(|| unknown_user(sender))?.balance;
        let recipient_balance =
            state.accounts.get(&recipient).ok_or_else(|| unknown_user(recipient))?.balance;
        if amount > self.transfer_limit {
            return Err(LedgerError::LimitExceeded { amount, limit: self.transfer_limit });
        }
        if state.limiter.is_limited(sender, now) {
            return Err(LedgerError::RateLimited { user_id: sender });
        }
        if sender_balance < amount {
            return Err(LedgerError::InsufficientFunds { balance: sender_balance, requested: amount });
        }
        let recipient_after = recipient_balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::invalid("transfer would overflow recipient balance"))?;
        let sender_after = sender_balance - amount;

        // All checks passed: nothing below can fail.
        if let Some(account) = state.accounts.get_mut(&sender) {
            account.balance = sender_after;
            account.history.push(record(now, Action::TransferOut, amount, Some(recipient)));
        }
        if let Some(account) = state.accounts.get_mut(&recipient) {
            account.balance = recipient_after;
            account.history.push(record(now, Action::TransferIn, amount, Some(sender)));
        }
        state.limiter.record(sender, now);

        tracing::info!(%sender, %recipient, %amount, balance = %sender_after, "ledger.transfer.applied");
        Ok(sender_after)
    }
}

fn record(timestamp: Timestamp, action: Action, amount: Amount, target: Option<UserId>) -> TransactionRecord {
    TransactionRecord { timestamp, action, amount, target }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
