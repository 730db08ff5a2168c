use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use sha2::{Digest, Sha256};
use shared::Label;

pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[derive(Default)]
struct Seen {
    cancerous: HashSet<String>,
    normal: HashSet<String>,
}

/// Fingerprints of every upload that produced a verdict since startup, split
/// by label. Only the health endpoint reads it.
#[derive(Clone, Default)]
pub struct SeenFingerprints {
    inner: Arc<Mutex<Seen>>,
}

impl SeenFingerprints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the fingerprint was not yet known for this label.
    pub fn record(&self, label: Label, fingerprint: &str) -> bool {
        let mut seen = self.lock();
        let set = match label {
            Label::Cancerous => &mut seen.cancerous,
            Label::Normal => &mut seen.normal,
        };
        set.insert(fingerprint.to_string())
    }

    /// `(cancerous, normal)` sample counts.
    pub fn counts(&self) -> (usize, usize) {
        let seen = self.lock();
        (seen.cancerous.len(), seen.normal.len())
    }

    fn lock(&self) -> MutexGuard<'_, Seen> {
        // A panic while holding the lock cannot leave the sets inconsistent.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_hex_sha256() {
        assert_eq!(
            fingerprint(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(fingerprint(b"abc"), fingerprint(b"abc"));
        assert_ne!(fingerprint(b"abc"), fingerprint(b"abd"));
    }

    #[test]
    fn records_are_deduplicated_per_label() {
        let seen = SeenFingerprints::new();
        assert_eq!(seen.counts(), (0, 0));
        assert!(seen.record(Label::Cancerous, "aa"));
        assert!(!seen.record(Label::Cancerous, "aa"));
        assert!(seen.record(Label::Normal, "aa"));
        assert!(seen.record(Label::Normal, "bb"));
        assert_eq!(seen.counts(), (1, 2));
    }

    #[test]
    fn clones_share_state_across_threads() {
        let seen = SeenFingerprints::new();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let seen = seen.clone();
                std::thread::spawn(move || {
                    seen.record(Label::Normal, &format!("f{i}"));
                    seen.record(Label::Normal, "shared");
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(seen.counts(), (0, 5));
    }
}
