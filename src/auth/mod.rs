//! Auth feature module: the client side of sign-in, session hydration and
//! route gating. All credential checks happen at the external auth service;
//! this module only tracks the resulting user record and decides what a
//! request may see. It touches session tokens and passwords, so nothing here
//! may log them.
//!
//! Flow Overview: a request resolves its storage scope, the store hydrates the
//! user record from storage, and the guard optionally redeems a magic-link
//! token before deciding between allow, redirect and pending. Sign-in, sign-up
//! and sign-out write their results back through the store.

pub mod client;
pub mod guard;
pub mod service;
pub mod storage;
pub mod store;
pub mod types;
