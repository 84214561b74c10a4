//  REQUEST.rs
//    by Lut99
//
//  Created:
//    07 Jan 2025, 10:21:17
//  Last edited:
//    03 Feb 2025, 10:04:26
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the [`Request`] that strategies authenticate, including the
//!   cookie containers left behind by cookie-parsing middleware.
//

use std::collections::HashMap;

use http::HeaderMap;


/***** AUXILLARY *****/
/// A container of parsed cookies, mapping cookie names to their values.
///
/// Strategies never parse `Cookie`-headers themselves; whatever middleware runs before them is
/// expected to do so and attach the result to the [`Request`].
#[derive(Clone, Debug, Default)]
pub struct Cookies(HashMap<String, String>);
impl Cookies {
    /// Constructor for an empty set of Cookies.
    ///
    /// # Returns
    /// A new Cookies without any cookies in it.
    #[inline]
    pub fn new() -> Self { Self(HashMap::new()) }

    /// Adds a cookie to this container.
    ///
    /// # Arguments
    /// - `name`: The name of the cookie to add.
    /// - `value`: The value of the cookie to add.
    ///
    /// # Returns
    /// The previous value of the cookie if there already was one with this `name`.
    #[inline]
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> { self.0.insert(name.into(), value.into()) }

    /// Retrieves the value of the cookie with the given name.
    ///
    /// # Arguments
    /// - `name`: The name of the cookie to look for.
    ///
    /// # Returns
    /// The value of the cookie, or [`None`] if no such cookie is in the container.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&str> { self.0.get(name).map(String::as_str) }

    /// Returns the number of cookies in this container.
    #[inline]
    pub fn len(&self) -> usize { self.0.len() }

    /// Returns true if there are no cookies in this container.
    #[inline]
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}
impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Cookies {
    #[inline]
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(name, value)| (name.into(), value.into())).collect())
    }
}





/***** LIBRARY *****/
/// An incoming HTTP request as the strategies get to see it.
///
/// The cookie containers are [`None`] until some middleware has parsed the request's
/// `Cookie`-headers and attached the result. The signed container is only populated by middleware
/// that also verifies cookie signatures.
#[derive(Clone, Debug, Default)]
pub struct Request {
    /// The headers of the request.
    pub headers: HeaderMap,
    /// The unsigned cookies sent with the request, if any middleware parsed them.
    pub cookies: Option<Cookies>,
    /// The signed cookies sent with the request, if any middleware parsed (and verified) them.
    pub signed_cookies: Option<Cookies>,
}
impl Request {
    /// Constructor for a Request without headers or parsed cookies.
    ///
    /// # Returns
    /// A new Request that middleware can populate further.
    #[inline]
    pub fn new() -> Self { Self::default() }
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookies_insert_then_get() {
        let mut cookies = Cookies::new();
        assert!(cookies.is_empty());
        assert_eq!(cookies.insert("token", "abc"), None);
        assert_eq!(cookies.insert("token", "def"), Some("abc".into()));
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies.get("token"), Some("def"));
        assert_eq!(cookies.get("sid"), None);
    }

    #[test]
    fn fresh_request_has_no_containers() {
        let request = Request::new();
        assert!(request.headers.is_empty());
        assert!(request.cookies.is_none());
        assert!(request.signed_cookies.is_none());
    }
}
