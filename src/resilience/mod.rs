//! Guards for outbound calls to place sources
//!
//! - `RateLimiter`: minimum spacing between primary-source requests
//! - `CircuitBreaker`: per-dependency failure counting with a cool-down window

pub mod circuit_breaker;
pub mod rate_limiter;

pub use circuit_breaker::{CircuitBreaker, CircuitStatus};
pub use rate_limiter::RateLimiter;
