//  STRATEGY.rs
//    by Lut99
//
//  Created:
//    09 Jan 2025, 11:58:26
//  Last edited:
//    03 Feb 2025, 10:17:33
//  Auto updated?
//    Yes
//
//  Description:
//!   Provides the actual [`Strategy`] implementation.
//

use std::any::Any;
use std::error::Error;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt as _;
use http::StatusCode;
use specifications::request::{Cookies, Request};
use specifications::strategy::{HttpError, Strategy};
use thiserror::Error;
use tracing::{debug, info, span, Level};

use crate::verify::{Verify, VerifyFuture};


/***** CONSTANTS *****/
/// The cookie that is consulted when the integrator doesn't name one.
pub const DEFAULT_COOKIE_NAME: &str = "token";





/***** ERRORS *****/
/// Represents errors when building a [`CookieStrategy`].
#[derive(Debug, Error)]
pub enum BuildError {
    /// No verify callback was given before `build()` was called.
    #[error("CookieStrategy requires a verify callback (call `verify()` or `verify_with_request()` first)")]
    MissingVerify,
}

/// Represents server-side errors which the client can't fix.
#[derive(Debug, Error)]
pub enum ServerError<E> {
    /// The verify callback reported an infrastructure error.
    #[error("Failed to verify token")]
    Verify {
        #[source]
        err: E,
    },
    /// The verify callback panicked instead of reporting through its result.
    #[error("Verify callback panicked: {msg}")]
    VerifyPanic { msg: String },
}

/// Represents client-side errors which the server can't fix.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The selected cookie container had no (non-empty) token in it.
    #[error("No token found in cookie {cookie:?} in request")]
    TokenNotFound { cookie: String },
    /// The verify callback did not know of any identity matching the token.
    #[error("No identity matches the token in cookie {cookie:?} in request")]
    IdentityNotFound { cookie: String },
}
impl HttpError for ClientError {
    #[inline]
    fn status_code(&self) -> StatusCode {
        use ClientError::*;
        match self {
            TokenNotFound { .. } | IdentityNotFound { .. } => StatusCode::UNAUTHORIZED,
        }
    }
}





/***** HELPER FUNCTIONS *****/
/// Renders the payload of a caught panic as something we can carry in an error.
///
/// # Arguments
/// - `payload`: The payload that [`catch_unwind`](futures::FutureExt::catch_unwind) handed us.
///
/// # Returns
/// The panic message if the payload carried one.
fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(msg) => *msg,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(msg) => (*msg).into(),
            Err(_) => "(non-string panic payload)".into(),
        },
    }
}





/***** LIBRARY *****/
/// Builds a [`CookieStrategy`] out of its configuration and a verify callback.
///
/// Obtained through [`CookieStrategy::builder()`].
#[derive(Debug)]
pub struct CookieStrategyBuilder<U, E> {
    /// The name of the cookie that carries the token.
    cookie_name: String,
    /// Whether to consult the signed cookie container instead of the unsigned one.
    signed: bool,
    /// The verify callback, in either calling convention. The one required ingredient.
    verify: Option<Verify<U, E>>,
}
impl<U, E> CookieStrategyBuilder<U, E> {
    /// Constructor for the CookieStrategyBuilder that initializes it to all defaults.
    ///
    /// # Returns
    /// A new CookieStrategyBuilder with no verify callback set yet.
    #[inline]
    fn new() -> Self { Self { cookie_name: DEFAULT_COOKIE_NAME.into(), signed: false, verify: None } }

    /// Changes which cookie is consulted for the token.
    ///
    /// Defaults to [`DEFAULT_COOKIE_NAME`].
    ///
    /// # Arguments
    /// - `name`: The name of the cookie carrying the token.
    ///
    /// # Returns
    /// Self, for chaining.
    #[inline]
    pub fn cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Changes whether the token is read from the signed cookie container instead of the
    /// unsigned one.
    ///
    /// Defaults to false.
    ///
    /// # Arguments
    /// - `signed`: True to read from the signed container.
    ///
    /// # Returns
    /// Self, for chaining.
    #[inline]
    pub fn signed(mut self, signed: bool) -> Self {
        self.signed = signed;
        self
    }

    /// Sets the verify callback, in the convention where it receives the token only.
    ///
    /// The callback resolves to `Ok(Some(identity))` when the token matches an identity,
    /// `Ok(None)` when it matches nothing and `Err(err)` when verification itself broke down.
    /// See [`VerifyFuture`].
    ///
    /// # Arguments
    /// - `verify`: The callback to verify tokens with.
    ///
    /// # Returns
    /// Self, for chaining.
    #[inline]
    pub fn verify<F, Fut>(mut self, verify: F) -> Self
    where
        F: 'static + Send + Sync + Fn(String) -> Fut,
        Fut: 'static + Send + Future<Output = Result<Option<U>, E>>,
    {
        self.verify = Some(Verify::Token(Box::new(move |token| verify(token).boxed())));
        self
    }

    /// Sets the verify callback, in the convention where it receives the whole [`Request`]
    /// before the token.
    ///
    /// Use this when verification needs more of the request than the token alone (e.g., other
    /// headers). Otherwise, prefer [`CookieStrategyBuilder::verify()`].
    ///
    /// # Arguments
    /// - `verify`: The callback to verify tokens with. Note that it returns a [`VerifyFuture`]
    ///   directly (e.g., through [`FutureExt::boxed()`](futures::FutureExt::boxed)), such that
    ///   the future may borrow from the request.
    ///
    /// # Returns
    /// Self, for chaining.
    #[inline]
    pub fn verify_with_request<F>(mut self, verify: F) -> Self
    where
        F: 'static + Send + Sync + for<'r> Fn(&'r Request, String) -> VerifyFuture<'r, U, E>,
    {
        self.verify = Some(Verify::WithRequest(Box::new(verify)));
        self
    }

    /// Finalizes the builder into a [`CookieStrategy`].
    ///
    /// # Returns
    /// The built CookieStrategy.
    ///
    /// # Errors
    /// This function fails with a [`BuildError::MissingVerify`] if neither
    /// [`verify()`](CookieStrategyBuilder::verify()) nor
    /// [`verify_with_request()`](CookieStrategyBuilder::verify_with_request()) was called.
    pub fn build(self) -> Result<CookieStrategy<U, E>, BuildError> {
        match self.verify {
            Some(verify) => Ok(CookieStrategy { cookie_name: self.cookie_name, signed: self.signed, verify }),
            None => Err(BuildError::MissingVerify),
        }
    }
}



/// Authenticates HTTP requests by finding a token in their cookies and handing it to an
/// integrator-supplied verify callback.
///
/// The strategy itself only decides _where_ the token comes from; _what_ it means is entirely up
/// to the callback (e.g., a lookup against a session store).
#[derive(Debug)]
pub struct CookieStrategy<U, E> {
    /// The name of the cookie that carries the token.
    cookie_name: String,
    /// Whether to consult the signed cookie container instead of the unsigned one.
    signed: bool,
    /// The verify callback, in either calling convention.
    verify: Verify<U, E>,
}
impl<U, E> CookieStrategy<U, E> {
    /// Convenience constructor for the CookieStrategy that takes the verify callback only and
    /// leaves every option at its default.
    ///
    /// Use [`CookieStrategy::builder()`] to change the cookie name, read signed cookies or hand
    /// the request to the callback.
    ///
    /// # Arguments
    /// - `verify`: The callback to verify tokens with, in the token-only convention (see
    ///   [`CookieStrategyBuilder::verify()`]).
    ///
    /// # Returns
    /// A new CookieStrategy reading tokens from the [`DEFAULT_COOKIE_NAME`] cookie.
    #[inline]
    pub fn new<F, Fut>(verify: F) -> Self
    where
        F: 'static + Send + Sync + Fn(String) -> Fut,
        Fut: 'static + Send + Future<Output = Result<Option<U>, E>>,
    {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.into(),
            signed: false,
            verify: Verify::Token(Box::new(move |token| verify(token).boxed())),
        }
    }

    /// Returns a builder for a CookieStrategy.
    ///
    /// # Returns
    /// A [`CookieStrategyBuilder`] initialized to all defaults.
    #[inline]
    pub fn builder() -> CookieStrategyBuilder<U, E> { CookieStrategyBuilder::new() }

    /// Returns the name of the cookie this strategy reads tokens from.
    #[inline]
    pub fn cookie_name(&self) -> &str { &self.cookie_name }

    /// Returns whether this strategy reads the signed cookie container.
    #[inline]
    pub fn signed(&self) -> bool { self.signed }
}
impl<U, E> Strategy for CookieStrategy<U, E>
where
    U: Send,
    E: 'static + Send + Error,
{
    type ClientError = ClientError;
    type Identity = U;
    type ServerError = ServerError<E>;

    const NAME: &'static str = "cookie";


    /// Authenticates the given request based on one of its cookies.
    ///
    /// # Panics
    /// This function panics when the cookie container it is configured to read
    /// ([`Request::cookies`], or [`Request::signed_cookies`] when
    /// [`signed`](CookieStrategyBuilder::signed()) is set) is absent from the request
    /// altogether. That is a deployment error, not a per-request outcome: it means the
    /// cookie-parsing middleware that should run before any strategy was never installed.
    fn authenticate(&self, request: &Request) -> impl Send + Future<Output = Result<Result<Self::Identity, Self::ClientError>, Self::ServerError>> {
        async move {
            let _span = span!(Level::INFO, "CookieStrategy::authenticate");
            info!("Handling cookie token authentication for incoming request");

            // Find the container that should be holding the token
            let container: Option<&Cookies> = if self.signed { request.signed_cookies.as_ref() } else { request.cookies.as_ref() };
            let cookies: &Cookies = match container {
                Some(cookies) => cookies,
                None => panic!(
                    "No {} cookie container on the request. Maybe you forgot to install the cookie-parsing middleware?",
                    if self.signed { "signed" } else { "unsigned" }
                ),
            };

            // Get the token itself. An empty value counts as no token at all.
            let token: String = match cookies.get(&self.cookie_name).filter(|token| !token.is_empty()) {
                Some(token) => token.into(),
                None => {
                    debug!("No token in cookie {:?}", self.cookie_name);
                    return Ok(Err(ClientError::TokenNotFound { cookie: self.cookie_name.clone() }));
                },
            };
            debug!("Received token from cookie {:?}", self.cookie_name);

            // Hand it to the verify callback. The callback is integrator code; if it panics
            // rather than reporting through its result, the panic must not reach the host.
            match AssertUnwindSafe(self.verify.call(request, token)).catch_unwind().await {
                Ok(Ok(Some(identity))) => Ok(Ok(identity)),
                Ok(Ok(None)) => Ok(Err(ClientError::IdentityNotFound { cookie: self.cookie_name.clone() })),
                Ok(Err(err)) => Err(ServerError::Verify { err }),
                Err(payload) => Err(ServerError::VerifyPanic { msg: panic_message(payload) }),
            }
        }
    }
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use futures::FutureExt as _;
    use http::HeaderValue;
    use specifications::metadata::User;
    use thiserror::Error;

    use super::*;


    /// Builds a request carrying the given unsigned cookies.
    fn request_with_cookies(cookies: &[(&str, &str)]) -> Request {
        let mut request = Request::new();
        request.cookies = Some(cookies.iter().copied().collect());
        request
    }

    /// The one user every test knows.
    fn amy() -> User { User { id: "amy".into(), name: "Amy Hacker".into() } }

    /// A verify callback that resolves "abc" to [`amy()`] and anything else to nobody.
    async fn verify_abc(token: String) -> Result<Option<User>, Infallible> { Ok(if token == "abc" { Some(amy()) } else { None }) }

    /// A verify callback that only resolves when the request carries an `x-internal` header.
    fn verify_internal_header<'r>(request: &'r Request, _token: String) -> VerifyFuture<'r, User, Infallible> {
        let internal: bool = request.headers.contains_key("x-internal");
        async move { Ok(if internal { Some(amy()) } else { None }) }.boxed()
    }

    /// A verify callback with a bug in it.
    async fn exploding_verify(_token: String) -> Result<Option<User>, Infallible> { panic!("kaboom") }

    /// Mimics a backing store that is unreachable.
    #[derive(Debug, Error)]
    #[error("database down")]
    struct DatabaseDown;


    #[test]
    fn building_without_verify_fails() {
        let err = CookieStrategy::<User, Infallible>::builder().cookie_name("sid").build().unwrap_err();
        assert!(matches!(err, BuildError::MissingVerify));
    }

    #[test]
    fn registry_name_is_fixed() {
        assert_eq!(<CookieStrategy<User, Infallible> as Strategy>::NAME, "cookie");
    }

    #[tokio::test]
    async fn authenticates_token_from_named_cookie() {
        let strategy = CookieStrategy::builder().cookie_name("sid").verify(verify_abc).build().unwrap();
        let request = request_with_cookies(&[("sid", "abc"), ("theme", "dark")]);
        assert_eq!(strategy.authenticate(&request).await.unwrap().unwrap(), amy());
    }

    #[tokio::test]
    async fn authenticates_token_from_default_cookie() {
        let strategy = CookieStrategy::new(verify_abc);
        let request = request_with_cookies(&[(DEFAULT_COOKIE_NAME, "abc")]);
        assert_eq!(strategy.authenticate(&request).await.unwrap().unwrap(), amy());
    }

    #[tokio::test]
    async fn missing_token_fails_without_calling_verify() {
        let called = Arc::new(AtomicBool::new(false));
        let strategy = {
            let called = called.clone();
            CookieStrategy::builder()
                .cookie_name("sid")
                .verify(move |token| {
                    called.store(true, Ordering::SeqCst);
                    verify_abc(token)
                })
                .build()
                .unwrap()
        };

        // The request has cookies, just not the one we're after.
        let err = strategy.authenticate(&request_with_cookies(&[("theme", "dark")])).await.unwrap().unwrap_err();
        assert!(matches!(err, ClientError::TokenNotFound { .. }));
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn empty_token_counts_as_missing() {
        let strategy = CookieStrategy::new(verify_abc);
        let err = strategy.authenticate(&request_with_cookies(&[(DEFAULT_COOKIE_NAME, "")])).await.unwrap().unwrap_err();
        assert!(matches!(err, ClientError::TokenNotFound { .. }));
    }

    #[tokio::test]
    async fn unknown_token_fails_with_unauthorized() {
        let strategy = CookieStrategy::new(verify_abc);
        let err = strategy.authenticate(&request_with_cookies(&[(DEFAULT_COOKIE_NAME, "stolen")])).await.unwrap().unwrap_err();
        assert!(matches!(err, ClientError::IdentityNotFound { .. }));
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    #[should_panic(expected = "cookie-parsing middleware")]
    async fn missing_unsigned_container_panics() {
        let strategy = CookieStrategy::new(verify_abc);
        let _ = strategy.authenticate(&Request::new()).await;
    }

    #[tokio::test]
    #[should_panic(expected = "cookie-parsing middleware")]
    async fn missing_signed_container_panics() {
        let strategy = CookieStrategy::builder().signed(true).verify(verify_abc).build().unwrap();
        // Unsigned cookies alone don't help a strategy configured for signed ones.
        let _ = strategy.authenticate(&request_with_cookies(&[(DEFAULT_COOKIE_NAME, "abc")])).await;
    }

    #[tokio::test]
    async fn signed_strategy_reads_signed_container() {
        let strategy = CookieStrategy::builder().signed(true).verify(verify_abc).build().unwrap();
        let mut request = request_with_cookies(&[(DEFAULT_COOKIE_NAME, "forged")]);
        request.signed_cookies = Some([(DEFAULT_COOKIE_NAME, "abc")].into_iter().collect());
        assert_eq!(strategy.authenticate(&request).await.unwrap().unwrap(), amy());
    }

    #[tokio::test]
    async fn verify_error_is_reported_unmodified() {
        let strategy = CookieStrategy::builder().verify(|_token| async move { Err::<Option<User>, _>(DatabaseDown) }).build().unwrap();
        match strategy.authenticate(&request_with_cookies(&[(DEFAULT_COOKIE_NAME, "abc")])).await {
            Err(ServerError::Verify { err }) => assert_eq!(err.to_string(), "database down"),
            other => panic!("expected a ServerError::Verify, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn verify_panic_is_caught() {
        let strategy = CookieStrategy::new(exploding_verify);
        match strategy.authenticate(&request_with_cookies(&[(DEFAULT_COOKIE_NAME, "abc")])).await {
            Err(ServerError::VerifyPanic { msg }) => assert!(msg.contains("kaboom"), "unexpected panic message {msg:?}"),
            other => panic!("expected a ServerError::VerifyPanic, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn request_reaches_verify_when_asked() {
        let strategy = CookieStrategy::builder().verify_with_request(verify_internal_header).build().unwrap();

        // Without the header the callback declines...
        let request = request_with_cookies(&[(DEFAULT_COOKIE_NAME, "abc")]);
        let err = strategy.authenticate(&request).await.unwrap().unwrap_err();
        assert!(matches!(err, ClientError::IdentityNotFound { .. }));

        // ...with it, the same token passes.
        let mut request = request_with_cookies(&[(DEFAULT_COOKIE_NAME, "abc")]);
        request.headers.insert("x-internal", HeaderValue::from_static("1"));
        assert_eq!(strategy.authenticate(&request).await.unwrap().unwrap(), amy());
    }
}
