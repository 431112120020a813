// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Transfer orchestration
//!
//! This module provides the withdrawal flow (Stellar to EVM/Solana), the
//! deposit planner (any supported chain to Stellar), settlement tracking and
//! the source/destination selection state.

mod config;
mod deposit;
mod selection;
mod settlement;
mod withdraw;

pub use config::PollingConfig;
pub use deposit::{DepositPlanner, DepositRequest};
pub use selection::{BridgeSelection, SELECTABLE_CHAINS};
pub use settlement::SettlementTracker;
pub use withdraw::{pay_amount, WithdrawFlow, WithdrawReceipt, WithdrawRequest, WithdrawStep};
