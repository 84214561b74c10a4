//  LIB.rs
//    by Lut99
//
//  Created:
//    07 Jan 2025, 09:48:12
//  Last edited:
//    03 Feb 2025, 10:21:55
//  Auto updated?
//    Yes
//
//  Description:
//!   Provides pluggable authentication strategies for
//!   request-authenticating middleware.
//

// Import the libraries
pub mod auth {
    #[cfg(feature = "cookie-auth")]
    pub use cookie_auth as cookie;
}

pub use specifications as spec;
