//! `artmarket-navigation` — permission-gated navigation over an abstract
//! routing primitive.
//!
//! Policy truth comes from `artmarket-policy`; this crate only decides
//! whether a transition may happen, performs it through [`RoutePrimitive`],
//! and reports each attempt as its own [`NavigationAttempt`].

pub mod navigator;
pub mod route;
pub mod urls;

pub use navigator::{
    NavigationAttempt, NavigationOptions, NavigationOutcome, Navigator, UnauthorizedCallback,
};
pub use route::{RouteError, RoutePrimitive};
