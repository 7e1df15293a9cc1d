//! Remote manifest — load the last published deploy state, publish the next.
//!
//! The manifest is a flat JSON object of relative path → fingerprint, stored
//! directly under the deploy root. It is the commit point of a run: it is
//! written last, fully replacing the previous content, so an interrupted run
//! leaves the previous manifest in charge.

use std::io::Cursor;

use hashsync_core::{validate_rel_path, Manifest};

use crate::error::SyncError;
use crate::remote::{RemoteError, RemoteStore};

/// Canonical text form: pretty-printed, sorted by path, trailing newline.
pub fn to_canonical_json(manifest: &Manifest) -> Result<String, SyncError> {
    let mut json = serde_json::to_string_pretty(manifest)?;
    json.push('\n');
    Ok(json)
}

/// Parse and validate manifest bytes fetched from the remote store.
///
/// Every key must be a normalized relative path and every value a
/// well-formed fingerprint; anything else is rejected so no later delete can
/// be aimed at the deploy root or outside it.
pub fn parse(bytes: &[u8], name: &str) -> Result<Manifest, SyncError> {
    let manifest: Manifest =
        serde_json::from_slice(bytes).map_err(|e| SyncError::MalformedManifest {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

    for (path, fingerprint) in manifest.iter() {
        validate_rel_path(path).map_err(|reason| SyncError::MalformedManifest {
            name: name.to_string(),
            reason,
        })?;
        if !fingerprint.is_well_formed() {
            return Err(SyncError::MalformedManifest {
                name: name.to_string(),
                reason: format!("'{path}' has fingerprint '{fingerprint}'"),
            });
        }
    }
    Ok(manifest)
}

/// Load the remote manifest.
///
/// Returns an empty manifest if the object does not exist yet (first deploy
/// or a cleared target). Any other failure aborts the run.
pub fn load_remote<S>(store: &mut S, name: &str) -> Result<Manifest, SyncError>
where
    S: RemoteStore + ?Sized,
{
    match store.get(name) {
        Ok(bytes) => parse(&bytes, name),
        Err(RemoteError::NotFound { .. }) => {
            tracing::info!("no remote manifest '{name}'; treating remote as empty");
            Ok(Manifest::new())
        }
        Err(source) => Err(SyncError::LoadManifest {
            name: name.to_string(),
            source,
        }),
    }
}

/// Publish `manifest` as the new deployed state, replacing the previous one.
pub fn publish<S>(store: &mut S, name: &str, manifest: &Manifest) -> Result<(), SyncError>
where
    S: RemoteStore + ?Sized,
{
    let json = to_canonical_json(manifest)?;
    store
        .put(name, &mut Cursor::new(json.into_bytes()))
        .map_err(|source| SyncError::Publish {
            name: name.to_string(),
            source,
        })?;
    tracing::info!("published manifest '{name}' ({} entries)", manifest.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    const NAME: &str = "_hashes.json";

    #[test]
    fn missing_manifest_loads_as_empty() {
        let mut store = MemoryStore::new();
        let manifest = load_remote(&mut store, NAME).unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn publish_then_load_roundtrips() {
        let mut store = MemoryStore::new();
        let manifest: Manifest = [("a.txt", "deadbeef"), ("b/c.txt", "cafebabe")]
            .into_iter()
            .collect();

        publish(&mut store, NAME, &manifest).unwrap();
        assert_eq!(load_remote(&mut store, NAME).unwrap(), manifest);
    }

    #[test]
    fn published_form_is_sorted_pretty_json() {
        let mut store = MemoryStore::new();
        let manifest: Manifest = [("z.txt", "00000001"), ("a.txt", "00000002")]
            .into_iter()
            .collect();
        publish(&mut store, NAME, &manifest).unwrap();

        let text = String::from_utf8(store.file(NAME).unwrap()).unwrap();
        assert_eq!(
            text,
            "{\n  \"a.txt\": \"00000002\",\n  \"z.txt\": \"00000001\"\n}\n"
        );
    }

    #[test]
    fn publish_replaces_previous_content() {
        let mut store = MemoryStore::new().with_file(NAME, r#"{"old.txt":"11111111"}"#);
        let manifest: Manifest = [("new.txt", "22222222")].into_iter().collect();
        publish(&mut store, NAME, &manifest).unwrap();

        let loaded = load_remote(&mut store, NAME).unwrap();
        assert!(!loaded.contains("old.txt"));
        assert!(loaded.contains("new.txt"));
    }

    #[test]
    fn legacy_manifest_written_by_older_deploys_loads() {
        let mut store = MemoryStore::new().with_file(
            NAME,
            "{\n  \"index.html\": \"1a2b3c4d\",\n  \"css/site.css\": \"0badf00d\"\n}",
        );
        let loaded = load_remote(&mut store, NAME).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get("css/site.css").unwrap().as_str(), "0badf00d");
    }

    #[test]
    fn garbage_content_is_fatal() {
        let mut store = MemoryStore::new().with_file(NAME, "not json");
        let err = load_remote(&mut store, NAME).unwrap_err();
        assert!(matches!(err, SyncError::MalformedManifest { .. }));
    }

    #[test]
    fn key_escaping_the_root_is_fatal() {
        let mut store = MemoryStore::new().with_file(NAME, r#"{"../etc/passwd":"deadbeef"}"#);
        let err = load_remote(&mut store, NAME).unwrap_err();
        assert!(matches!(err, SyncError::MalformedManifest { .. }));
    }

    #[test]
    fn non_hex_fingerprint_is_fatal() {
        let mut store = MemoryStore::new().with_file(NAME, r#"{"a.txt":"not-hex!"}"#);
        let err = load_remote(&mut store, NAME).unwrap_err();
        assert!(matches!(err, SyncError::MalformedManifest { .. }));
    }
}
