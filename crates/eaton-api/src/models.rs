// Device API wire types
//
// Only the envelope shapes shared by every resource live here. Resource
// bodies (inputs, phases, branches) are modelled by the probes that read them.

use serde::Deserialize;

/// Body returned by the token endpoint.
#[derive(Debug, Deserialize)]
pub struct OAuthToken {
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub access_token: String,
}

/// A link to another resource: `{"@id": "/rest/.../phases/1"}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Reference {
    #[serde(rename = "@id")]
    pub id: String,
}

/// A resource that lists child resources instead of carrying data:
/// ```json
/// { "members": [ { "@id": "/rest/.../branches/1" }, ... ] }
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct Collection {
    #[serde(default)]
    pub members: Vec<Reference>,
}
