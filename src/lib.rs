// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod metrics;
pub mod models;
pub mod schema;
pub mod social;
pub mod state;
pub mod storage;

#[macro_use]
extern crate diesel;
