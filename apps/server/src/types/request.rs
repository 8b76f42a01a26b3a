// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request types for the API.

use serde::Deserialize;

/// Body of `POST /api/v1/models/from-cache/:hash`.
///
/// The payload lives in the cache keyed by content hash; the client
/// supplies the file name it was originally uploaded under, which
/// determines the model identifier and source kind.
#[derive(Debug, Deserialize)]
pub struct FromCacheRequest {
    /// File name, including extension.
    pub name: String,
}
