//! # Tipster Web ライブラリ
//!
//! 予想記事サイトの Web サーバーのコアモジュール。
//!
//! ## モジュール構成
//!
//! - `app_builder`: DI とルーター構築
//! - `config`: 環境変数からの設定読み込み
//! - `error`: HTTP エラーレスポンス
//! - `handler`: HTTP ハンドラ
//! - `middleware`: Basic 認証
//! - `usecase`: キャンペーン配信・購読・予想記事/リーグ管理

pub mod app_builder;
pub mod config;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod usecase;
