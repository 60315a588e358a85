// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

pub mod admin;
pub mod engagement;
pub mod health;
pub mod metrics;
pub mod notifications;
pub mod posts;
pub mod social_graph;
pub mod uploads;
pub mod users;
