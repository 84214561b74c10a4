//  STRATEGY.rs
//    by Lut99
//
//  Created:
//    07 Jan 2025, 10:09:31
//  Last edited:
//    03 Feb 2025, 09:58:40
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the [`Strategy`] trait, which can take an HTTP request and
//!   use it to authenticate it.
//

use std::error::Error;
use std::future::Future;

use http::StatusCode;

use crate::request::Request;


/***** AUXILLARY *****/
/// Extends an [`Error`] with the ability to associate status codes with it.
pub trait HttpError: Error {
    /// Returns the status code associated with this error.
    ///
    /// # Returns
    /// A [`StatusCode`].
    fn status_code(&self) -> StatusCode;
}





/***** LIBRARY *****/
/// A strategy that takes an HTTP request and (hopefully) authenticates it.
///
/// Note that strategies are intended to be shared across many concurrent requests. As such, any
/// reference to `self` is done immutably only.
pub trait Strategy {
    /// Something produced by the strategy that can later be used to identify the user (e.g., some
    /// account record).
    type Identity;
    /// Client-side errors produced by the Strategy.
    type ClientError: HttpError;
    /// Server-side errors produced by the Strategy.
    type ServerError: Error;

    /// The name under which this strategy is known to the host framework's registry.
    ///
    /// This is fixed per strategy type, not per instance.
    const NAME: &'static str;


    /// Authenticates the given HTTP request.
    ///
    /// # Arguments
    /// - `request`: The incoming [`Request`] to authenticate.
    ///
    /// # Returns
    /// A [`Strategy::Identity`] that can be used to identify the user later.
    ///
    /// # Errors
    /// This function can error when it fails to authenticate the user. There are two levels at
    /// which it can do so:
    /// - The _outer_ [`Result`] is used to indicate _server_ errors (e.g., database
    ///   unreachable, etc); and
    /// - The _inner_ [`Result`] is used to indicate _user_ errors (e.g., no token, unknown token,
    ///   etc).
    ///
    /// The first will always result in a (vague) 500 INTERNAL SERVER ERROR to the user, whereas
    /// the second may communicate custom status codes.
    fn authenticate(&self, request: &Request) -> impl Send + Future<Output = Result<Result<Self::Identity, Self::ClientError>, Self::ServerError>>;
}
