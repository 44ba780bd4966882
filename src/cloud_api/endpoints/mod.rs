//! Endpoint modules
//!
//! One module per API family, each a thin mapping layer over the shared
//! [`CloudContext`](crate::cloud_api::CloudContext): validate arguments,
//! build the JSON body, assemble the request, dispatch, and wire the
//! session-updating pre-processing step for the endpoints that affect
//! session state.
//!
//! Every method returns an [`ApiResult`](crate::cloud_api::ApiResult).
//! Expected success codes are documented per method; the SDK forwards
//! whatever status the server produced and never checks it on the caller's
//! behalf.

pub mod accounts;
pub mod alerts;
pub mod auth;
pub mod devices;
pub mod observations;
pub mod rules;
pub mod users;

pub use accounts::Accounts;
pub use alerts::Alerts;
pub use auth::Authorization;
pub use devices::Devices;
pub use observations::Observations;
pub use rules::Rules;
pub use users::Users;

use std::collections::HashMap;

/// Build the explicit-parameter map for a URL resolution
pub(crate) fn params<const N: usize>(pairs: [(&str, &str); N]) -> HashMap<String, String> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// No explicit parameters; every slug resolves through session fallbacks
pub(crate) fn no_params() -> HashMap<String, String> {
    HashMap::new()
}
