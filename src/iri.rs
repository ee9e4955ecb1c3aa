//! IRI handling shared by every term in the bridge's graph model.
//!
//! IRIs are interned behind a process-wide cache so that equal strings
//! collapse to the same allocation; terms are compared and hashed via the
//! pre-computed hash carried alongside the string rather than by rehashing
//! on every lookup.

use crate::error::{BridgeError, BridgeResult};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::{Arc, Mutex};

static GLOBAL_IRI_CACHE: Lazy<Mutex<HashMap<String, IRI>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Clear the global IRI cache. Mainly useful between independent pipeline
/// runs inside the same process (e.g. tests).
pub fn clear_global_iri_cache() {
    GLOBAL_IRI_CACHE.lock().unwrap().clear();
}

/// An internationalised resource identifier.
///
/// Mirrors [RFC 3987](https://tools.ietf.org/html/rfc3987) loosely: this
/// crate only needs enough structure to split an IRI into namespace and
/// local name at its last `#` or `/`, so validation is limited to requiring
/// a non-empty string containing a scheme separator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct IRI {
    iri: Arc<str>,
    hash: u64,
}

impl serde::Serialize for IRI {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for IRI {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        IRI::new(s).map_err(serde::de::Error::custom)
    }
}

impl IRI {
    /// Create a new IRI, interning it in the global cache.
    pub fn new<S: Into<String>>(iri: S) -> BridgeResult<Self> {
        let iri_str = iri.into();

        if iri_str.is_empty() {
            return Err(BridgeError::InvalidIri("IRI cannot be empty".to_string()));
        }
        if !iri_str.contains(':') {
            return Err(BridgeError::InvalidIri(format!(
                "IRI '{iri_str}' must contain ':' separating scheme from path"
            )));
        }

        let mut cache = GLOBAL_IRI_CACHE.lock().unwrap();
        if let Some(cached) = cache.get(&iri_str) {
            return Ok(cached.clone());
        }

        let hash = {
            let mut hasher = DefaultHasher::new();
            iri_str.hash(&mut hasher);
            hasher.finish()
        };
        let iri = IRI {
            iri: Arc::from(iri_str.as_str()),
            hash,
        };
        cache.insert(iri_str, iri.clone());
        Ok(iri)
    }

    /// Get the IRI as a string slice.
    #[inline(always)]
    pub fn as_str(&self) -> &str {
        &self.iri
    }

    /// Get the pre-computed hash value.
    #[inline(always)]
    pub fn hash_value(&self) -> u64 {
        self.hash
    }

    /// Get the local name part (after the last `#` or `/`).
    pub fn local_name(&self) -> &str {
        let iri = self.as_str();
        if let Some(hash_pos) = iri.rfind('#') {
            &iri[hash_pos + 1..]
        } else if let Some(slash_pos) = iri.rfind('/') {
            &iri[slash_pos + 1..]
        } else {
            iri
        }
    }

    /// Get the namespace part (up to and including the last `#` or `/`).
    pub fn namespace(&self) -> &str {
        let iri = self.as_str();
        if let Some(hash_pos) = iri.rfind('#') {
            &iri[..hash_pos + 1]
        } else if let Some(slash_pos) = iri.rfind('/') {
            &iri[..slash_pos + 1]
        } else {
            ""
        }
    }
}

impl fmt::Display for IRI {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.iri)
    }
}

impl Hash for IRI {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

/// Note: panics on invalid IRIs; prefer [`IRI::new`] at system boundaries.
impl From<&str> for IRI {
    fn from(s: &str) -> Self {
        Self::new(s).expect("invalid IRI")
    }
}

impl From<String> for IRI {
    fn from(s: String) -> Self {
        Self::new(s).expect("invalid IRI")
    }
}
