//! The polity's economy.
//!
//! Prices come from the inflation curve in [`pricing`]; temporary
//! privileges bought at those prices lapse or renew through
//! [`positions`]. Income is paid once per lunar quarter by [`payroll`].

pub mod error;
pub mod market;
pub mod payroll;
pub mod positions;
pub mod pricing;

pub use error::EconomyError;
pub use market::{Market, Purchase, Transfer};
pub use payroll::{Payday, Payroll, RoleHoldings};
pub use positions::{Blessing, PositionEvent, PositionLifecycle, RevokeReason};
pub use pricing::{smooth, CivicActivity, PriceBreakdown, PricingEngine};
