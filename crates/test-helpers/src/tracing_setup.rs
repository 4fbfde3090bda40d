// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use tracing::subscriber::DefaultGuard;
use tracing_subscriber::{fmt, EnvFilter};

/// Routes tracing output through the test harness for the lifetime of the guard.
pub fn init_test_tracing(filter: &str) -> DefaultGuard {
    let subscriber = fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_test_writer()
        .finish();
    tracing::subscriber::set_default(subscriber)
}
