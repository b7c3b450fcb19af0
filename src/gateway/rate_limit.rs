//! Fixed-window rate limiting keyed by `(route class, client key)`.
//!
//! Buckets live in a sharded concurrent map, so unrelated clients never
//! contend on one lock and a bucket's reset-or-increment is atomic under its
//! entry guard. The client key is derived from the verified token subject
//! when one exists, else from the socket peer address; spoofable
//! request-supplied values (unverified bearer headers, `X-Forwarded-For`)
//! are never consulted.

use dashmap::DashMap;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::Reject;
use crate::gateway::policy::RouteClass;

type HmacSha256 = Hmac<Sha256>;

/// Window budget for one route class.
#[derive(Debug, Clone, Copy)]
pub struct RateBudget {
    pub window: Duration,
    pub max_requests: u32,
}

/// Per-class budgets.
#[derive(Debug, Clone, Copy)]
pub struct RateBudgets {
    pub login: RateBudget,
    pub otp: RateBudget,
    pub api: RateBudget,
}

impl RateBudgets {
    fn for_class(&self, class: RouteClass) -> RateBudget {
        match class {
            RouteClass::AuthLogin => self.login,
            RouteClass::AuthOtp => self.otp,
            RouteClass::GenericApi => self.api,
        }
    }
}

/// Stable identifier for the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey(String);

#[derive(Debug)]
struct Bucket {
    window_start: Instant,
    count: u32,
}

/// Process-wide fixed-window limiter.
#[derive(Debug)]
pub struct RateLimiter {
    buckets: DashMap<(RouteClass, ClientKey), Bucket>,
    budgets: RateBudgets,
    /// Per-process random HMAC key for client-key derivation. Buckets never
    /// store a credential, and keys are unlinkable across restarts.
    hash_key: [u8; 32],
}

impl RateLimiter {
    pub fn new(budgets: RateBudgets) -> Self {
        let mut hash_key = [0u8; 32];
        rand::rng().fill_bytes(&mut hash_key);
        Self {
            buckets: DashMap::new(),
            budgets,
            hash_key,
        }
    }

    /// Derives the caller's bucket key: HMAC of the verified token subject
    /// when authentication succeeded, else the socket peer address. An
    /// unverified credential is attacker-controlled and never names a
    /// bucket; a flooder rotating garbage tokens would otherwise mint a
    /// fresh budget per request.
    pub fn client_key(&self, verified_user: Option<&str>, peer: Option<IpAddr>) -> ClientKey {
        if let Some(user) = verified_user {
            let mut mac = HmacSha256::new_from_slice(&self.hash_key)
                .expect("HMAC accepts any key length");
            mac.update(user.as_bytes());
            return ClientKey(format!("user:{}", hex::encode(mac.finalize().into_bytes())));
        }
        match peer {
            Some(ip) => ClientKey(format!("ip:{ip}")),
            None => ClientKey("anon".to_owned()),
        }
    }

    /// Reserves one request slot, or rejects with a retry-after hint.
    ///
    /// The returned [`RateSlot`] must be committed once the request has
    /// completed; dropping it uncommitted (timeout, cancellation) returns the
    /// slot so aborted requests do not burn the caller's budget.
    pub fn check(
        self: &Arc<Self>,
        class: RouteClass,
        client: ClientKey,
    ) -> Result<RateSlot, Reject> {
        let budget = self.budgets.for_class(class);
        let now = Instant::now();
        let key = (class, client);

        let mut bucket = self.buckets.entry(key.clone()).or_insert(Bucket {
            window_start: now,
            count: 0,
        });

        // Lazy eviction: an expired window resets in place under the
        // entry lock, so reset-then-increment is atomic.
        if now.duration_since(bucket.window_start) >= budget.window {
            bucket.window_start = now;
            bucket.count = 0;
        }

        if bucket.count >= budget.max_requests {
            let elapsed = now.duration_since(bucket.window_start);
            let retry_after = budget.window.saturating_sub(elapsed).as_secs().max(1);
            tracing::warn!(class = class.as_str(), "rate budget exhausted");
            return Err(Reject::rate_limited(retry_after));
        }

        bucket.count += 1;
        drop(bucket);

        Ok(RateSlot {
            limiter: Arc::clone(self),
            key: Some(key),
        })
    }

    /// Drops buckets whose window has fully expired.
    pub fn prune(&self) {
        let now = Instant::now();
        self.buckets.retain(|(class, _), bucket| {
            now.duration_since(bucket.window_start) < self.budgets.for_class(*class).window
        });
    }

    fn release(&self, key: &(RouteClass, ClientKey)) {
        if let Some(mut bucket) = self.buckets.get_mut(key) {
            bucket.count = bucket.count.saturating_sub(1);
        }
    }
}

/// A reserved slot in the current window.
#[derive(Debug)]
pub struct RateSlot {
    limiter: Arc<RateLimiter>,
    key: Option<(RouteClass, ClientKey)>,
}

impl RateSlot {
    /// Marks the request as completed; the slot stays consumed.
    pub fn commit(mut self) {
        self.key = None;
    }
}

impl Drop for RateSlot {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.limiter.release(&key);
        }
    }
}
