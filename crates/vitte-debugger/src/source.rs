//! source.rs — Catalogue des sources (§4.12)
//!
//! Deux catégories de source :
//! - **réelle** : identifiée par un chemin de fichier, dont le contenu est
//!   lu par l'appelant (ce module ne touche pas au système de fichiers) ;
//!   reçoit un `sourceReference` alloué à la demande.
//! - **synthétique** : un nom entre chevrons (`<eval>`, `<string>`, …) dont le
//!   texte est fourni directement (code `eval`/REPL), toujours doté d'une
//!   référence.
//!
//! Une référence, une fois allouée, reste stable même si le contenu est
//! ensuite remplacé via `update_content`.

use std::collections::HashMap;

pub type SourceRef = u64;

fn is_synthetic_name(name: &str) -> bool {
    name.starts_with('<') && name.ends_with('>')
}

/// Origine d'une entrée du catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOrigin {
    File,
    Synthetic,
}

#[derive(Debug, Clone)]
struct SourceEntry {
    key: String,
    origin: SourceOrigin,
    content: Option<String>,
    reference: SourceRef,
}

/// Catalogue des sources connues de la session de débogage.
#[derive(Debug, Default)]
pub struct SourceCatalog {
    by_key: HashMap<String, SourceEntry>,
    by_ref: HashMap<SourceRef, String>,
    next_ref: SourceRef,
}

impl SourceCatalog {
    pub fn new() -> Self {
        Self { next_ref: 1, ..Default::default() }
    }

    /// Enregistre (ou retrouve) l'entrée pour un fichier réel. Ne lui alloue
    /// une référence que lorsqu'elle est explicitement demandée via
    /// `reference_for`, puisque la plupart des fichiers sont résolus par
    /// chemin et n'ont pas besoin de `sourceReference` côté DAP.
    pub fn register_file(&mut self, path: &str) {
        self.by_key.entry(path.to_string()).or_insert_with(|| SourceEntry {
            key: path.to_string(),
            origin: SourceOrigin::File,
            content: None,
            reference: 0,
        });
    }

    /// Enregistre une source synthétique avec son contenu, allouant
    /// immédiatement une référence (ces sources n'ont pas de chemin disque
    /// pour s'identifier autrement).
    pub fn register_synthetic(&mut self, name: &str, content: String) -> SourceRef {
        debug_assert!(is_synthetic_name(name), "synthetic source name must be wrapped in <...>");
        if let Some(existing) = self.by_key.get(name) {
            return existing.reference;
        }
        let r = self.next_ref;
        self.next_ref += 1;
        self.by_key.insert(
            name.to_string(),
            SourceEntry { key: name.to_string(), origin: SourceOrigin::Synthetic, content: Some(content), reference: r },
        );
        self.by_ref.insert(r, name.to_string());
        r
    }

    /// Retourne la référence DAP pour `key`, allouant une nouvelle référence
    /// au premier appel si elle n'en avait pas encore.
    pub fn reference_for(&mut self, key: &str) -> Option<SourceRef> {
        let needs_alloc = matches!(self.by_key.get(key), Some(e) if e.reference == 0);
        if needs_alloc {
            let r = self.next_ref;
            self.next_ref += 1;
            if let Some(e) = self.by_key.get_mut(key) {
                e.reference = r;
            }
            self.by_ref.insert(r, key.to_string());
        }
        self.by_key.get(key).map(|e| e.reference).filter(|r| *r != 0)
    }

    pub fn content_for_ref(&self, reference: SourceRef) -> Option<&str> {
        let key = self.by_ref.get(&reference)?;
        self.by_key.get(key)?.content.as_deref()
    }

    pub fn content_for_key(&self, key: &str) -> Option<&str> {
        self.by_key.get(key)?.content.as_deref()
    }

    pub fn origin(&self, key: &str) -> Option<SourceOrigin> {
        self.by_key.get(key).map(|e| e.origin)
    }

    /// Remplace le contenu d'une entrée existante sans changer sa référence.
    pub fn update_content(&mut self, key: &str, content: String) {
        if let Some(e) = self.by_key.get_mut(key) {
            e.content = Some(content);
        }
    }

    pub fn is_known(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    pub fn clear(&mut self) {
        self.by_key.clear();
        self.by_ref.clear();
        self.next_ref = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_have_no_reference_until_requested() {
        let mut cat = SourceCatalog::new();
        cat.register_file("/app/main.vt");
        assert_eq!(cat.origin("/app/main.vt"), Some(SourceOrigin::File));
    }

    #[test]
    fn reference_is_allocated_once_and_stable() {
        let mut cat = SourceCatalog::new();
        cat.register_file("/app/main.vt");
        let r1 = cat.reference_for("/app/main.vt").unwrap();
        let r2 = cat.reference_for("/app/main.vt").unwrap();
        assert_eq!(r1, r2);
    }

    #[test]
    fn synthetic_sources_get_immediate_reference() {
        let mut cat = SourceCatalog::new();
        let r = cat.register_synthetic("<eval>", "x + 1".into());
        assert!(r >= 1);
        assert_eq!(cat.content_for_ref(r), Some("x + 1"));
        assert_eq!(cat.origin("<eval>"), Some(SourceOrigin::Synthetic));
    }

    #[test]
    fn update_content_preserves_reference() {
        let mut cat = SourceCatalog::new();
        let r = cat.register_synthetic("<eval>", "old".into());
        cat.update_content("<eval>", "new".into());
        assert_eq!(cat.content_for_ref(r), Some("new"));
    }

    #[test]
    fn unknown_key_is_not_known() {
        let cat = SourceCatalog::new();
        assert!(!cat.is_known("/nope.vt"));
    }

    #[test]
    fn registering_synthetic_twice_returns_same_ref() {
        let mut cat = SourceCatalog::new();
        let r1 = cat.register_synthetic("<eval>", "a".into());
        let r2 = cat.register_synthetic("<eval>", "b".into());
        assert_eq!(r1, r2);
    }
}
