//! Subcommand implementations

pub mod costs;
pub mod history;
pub mod report;

use crate::client::ApiError;
use crate::output::print_warning;
use anyhow::Result;

/// Report "no scan cycle yet" as a warning instead of failing
pub(crate) fn unless_not_ready<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) => match e.downcast_ref::<ApiError>() {
            Some(api) if api.is_not_found() => {
                print_warning(&api.message);
                Ok(None)
            }
            _ => Err(e),
        },
    }
}
