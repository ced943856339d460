// Collection traversal
//
// The device exposes lists (branches, phases) as `{ "members": [{"@id"}] }`
// documents. Expansion fetches the list, then each member in listed order.
// A document without members is its own single leaf.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::client::{DeviceClient, decode};
use crate::error::Error;
use crate::models::{Collection, Reference};

/// A fetched document, classified by shape.
#[derive(Debug)]
pub enum Resource {
    /// A non-empty `members` list.
    Collection(Vec<Reference>),
    /// Anything else, kept raw for the caller to decode.
    Leaf(Bytes),
}

/// One leaf produced by [`DeviceClient::expand`], with the path it was
/// fetched from.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: String,
    pub body: Bytes,
}

impl Resource {
    /// Try the collection shape first; fall back to treating the body as a leaf.
    pub fn classify(body: Bytes) -> Self {
        match serde_json::from_slice::<Collection>(&body) {
            Ok(collection) if !collection.members.is_empty() => {
                Self::Collection(collection.members)
            }
            _ => Self::Leaf(body),
        }
    }
}

impl DeviceClient {
    /// Fetch `root` and resolve it into leaf documents.
    ///
    /// Members are fetched one at a time in listed order, duplicates
    /// included. The first failed fetch aborts the whole expansion.
    pub async fn expand(&self, root: &str) -> Result<Vec<Document>, Error> {
        let body = self.fetch(root).await?;

        match Resource::classify(body) {
            Resource::Leaf(body) => {
                debug!(root, "no members, treating document as leaf");
                Ok(vec![Document {
                    path: root.to_owned(),
                    body,
                }])
            }
            Resource::Collection(members) => {
                debug!(root, count = members.len(), "expanding collection");
                let mut leaves = Vec::with_capacity(members.len());
                for member in members {
                    let body = self.fetch(&member.id).await?;
                    leaves.push(Document {
                        path: member.id,
                        body,
                    });
                }
                Ok(leaves)
            }
        }
    }

    /// [`expand`](Self::expand), decoding every leaf as `T`. Decode errors
    /// name the member that failed, not the root.
    pub async fn expand_as<T: DeserializeOwned>(&self, root: &str) -> Result<Vec<T>, Error> {
        self.expand(root)
            .await?
            .iter()
            .map(|doc| decode(&doc.path, &doc.body))
            .collect()
    }
}
