// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

//! Social graph and visibility engine: the relationship ledger, the
//! denormalized engagement counters, the per-viewer visibility filter, and
//! the notification fan-out.

pub mod counters;
pub mod fanout;
pub mod ledger;
pub mod visibility;
