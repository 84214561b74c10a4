//  VERIFY.rs
//    by Lut99
//
//  Created:
//    09 Jan 2025, 11:44:03
//  Last edited:
//    30 Jan 2025, 15:12:47
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the verify callbacks that integrators hand to the
//!   [`CookieStrategy`](crate::CookieStrategy), in both of their calling
//!   conventions.
//

use std::fmt::{Debug, Formatter, Result as FResult};

use futures::future::BoxFuture;
use specifications::request::Request;


/***** AUXILLARY *****/
/// The future produced by a verify callback.
///
/// Its result encodes the three-way outcome of verification:
/// - `Ok(Some(identity))` means the token matched an identity;
/// - `Ok(None)` means the token matched nothing (an authentication failure, not an error); and
/// - `Err(err)` means verification itself broke down (e.g., the backing store is unreachable).
pub type VerifyFuture<'f, U, E> = BoxFuture<'f, Result<Option<U>, E>>;





/***** LIBRARY *****/
/// A verify callback together with its calling convention.
///
/// Which convention is used is fixed when the strategy is built and never re-examined per
/// request beyond dispatching on this enum.
pub(crate) enum Verify<U, E> {
    /// The callback receives the token only.
    Token(Box<dyn Fn(String) -> VerifyFuture<'static, U, E> + Send + Sync>),
    /// The callback receives the whole request before the token.
    WithRequest(Box<dyn for<'r> Fn(&'r Request, String) -> VerifyFuture<'r, U, E> + Send + Sync>),
}
impl<U, E> Verify<U, E> {
    /// Invokes the callback according to its convention.
    ///
    /// # Arguments
    /// - `request`: The [`Request`] that carried the token. Only handed to the callback in the
    ///   [`Verify::WithRequest`] convention.
    /// - `token`: The token to verify.
    ///
    /// # Returns
    /// The callback's [`VerifyFuture`]. Note that the callback owns the decision of when (and
    /// whether) that future resolves; a callback that never resolves leaves the authentication
    /// attempt pending.
    #[inline]
    pub(crate) fn call<'s>(&'s self, request: &'s Request, token: String) -> VerifyFuture<'s, U, E> {
        match self {
            Self::Token(verify) => verify(token),
            Self::WithRequest(verify) => verify(request, token),
        }
    }
}
impl<U, E> Debug for Verify<U, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        match self {
            Self::Token(_) => write!(f, "Verify::Token(..)"),
            Self::WithRequest(_) => write!(f, "Verify::WithRequest(..)"),
        }
    }
}
