//! Upload rate limiting.
//!
//! Process-local keyed limiter; scoped to single-instance deployments. A
//! multi-instance deployment needs an externally shared counter instead.

use std::net::IpAddr;
use std::num::NonZeroU32;

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

use crate::error::ApiError;

pub type UploadRateLimiter = DefaultKeyedRateLimiter<IpAddr>;

/// Build the per-client-IP upload limiter.
pub fn upload_limiter(per_minute: u32) -> UploadRateLimiter {
    let per_minute = NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN);
    RateLimiter::keyed(Quota::per_minute(per_minute))
}

/// Check the limiter for a client address.
pub fn check(limiter: &UploadRateLimiter, ip: IpAddr) -> Result<(), ApiError> {
    limiter.check_key(&ip).map_err(|_| ApiError::RateLimited)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_limiter_rejects_after_quota() {
        let limiter = upload_limiter(2);
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));

        assert!(check(&limiter, ip).is_ok());
        assert!(check(&limiter, ip).is_ok());
        assert!(check(&limiter, ip).is_err());
    }

    #[test]
    fn test_limiter_is_keyed_per_client() {
        let limiter = upload_limiter(1);
        let first = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let second = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));

        assert!(check(&limiter, first).is_ok());
        assert!(check(&limiter, second).is_ok());
    }
}
