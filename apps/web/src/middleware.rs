//! # ミドルウェア
//!
//! Web サーバー用のミドルウェアを提供する。

mod basic_auth;

pub use basic_auth::{BasicAuthState, require_basic_auth};
