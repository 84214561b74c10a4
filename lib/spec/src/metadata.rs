//  METADATA.rs
//    by Lut99
//
//  Created:
//    07 Jan 2025, 10:17:02
//  Last edited:
//    28 Jan 2025, 11:16:31
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines metadata that is associated with authenticated users.
//

use serde::{Deserialize, Serialize};


/***** LIBRARY *****/
/// Defines what is known about a user once a strategy has authenticated them.
///
/// Strategies are generic over the identity they produce; this record is the stock choice for
/// integrations that don't bring their own.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct User {
    /// The identifier of the user.
    pub id: String,
    /// Some name for the user to recognise them later. Doesn't have to be unique.
    pub name: String,
}
