#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for the vend storefront client
//!
//! This crate provides the fundamental types used throughout the system:
//! download grants and their cloud/local classification, purchase records,
//! and checkout session data.

pub mod grant;
pub mod purchase;

// Re-export commonly used types
pub use grant::{CloudGrant, DeliveryRoute, DownloadGrant, GrantResponse, LocalGrant};
pub use purchase::{CheckoutRequest, CheckoutSession, PaymentStatus, PurchaseRecord};
