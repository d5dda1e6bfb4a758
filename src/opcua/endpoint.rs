//! Endpoint selection.
//!
//! Without credentials the client needs an endpoint that accepts anonymous
//! tokens; with credentials, one that accepts user-name tokens. The first
//! match in server order wins.

use crate::config::Credentials;
use crate::{Error, Result};

use super::types::{EndpointDescription, UserTokenType};

/// Pick the endpoint to connect to.
pub fn select_endpoint<'a>(
    endpoints: &'a [EndpointDescription],
    credentials: Option<&Credentials>,
) -> Result<&'a EndpointDescription> {
    let wanted = match credentials {
        Some(c) if !c.is_blank() => UserTokenType::UserName,
        _ => UserTokenType::Anonymous,
    };

    endpoints
        .iter()
        .find(|e| e.accepts(wanted))
        .ok_or_else(|| {
            Error::Connection(format!(
                "no endpoint out of {} accepts {wanted} user tokens",
                endpoints.len()
            ))
        })
}
