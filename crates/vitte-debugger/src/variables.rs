//! variables.rs — Allocation de références et construction de `Variable` (§4.9)
//!
//! Porté depuis le gestionnaire de variables historique : alloue des IDs de
//! référence pour les valeurs expansibles (seules les valeurs composites ont
//! droit à une référence non nulle ; les primitives ont toujours `0`), et
//! construit la représentation DAP `Variable` avec `presentationHint`.

use crate::eval::Value;
use std::collections::HashMap;

pub type VarRef = i64;

/// Point d'entrée stocké pour une référence allouée : soit un objet
/// expansible directement, soit une portée de frame (`locals`/`globals`).
#[derive(Debug, Clone)]
pub enum VarRefEntry {
    Object(Value),
    Scope { frame_id: i64, scope: ScopeKind },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Locals,
    Globals,
}

/// Visibilité DAP d'une variable, dérivée de son nom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

/// Catégorie de présentation DAP (`kind`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationKind {
    Data,
    Method,
    Class,
    /// Champ d'une instance de modèle structuré, exposé lors de son
    /// expansion (§4.9 : `presentationHint.kind = property`).
    Property,
}

impl PresentationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::Method => "method",
            Self::Class => "class",
            Self::Property => "property",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresentationHint {
    pub kind: &'static str,
    pub attributes: Vec<&'static str>,
    pub visibility: &'static str,
}

/// Structure DAP `Variable`.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub value: String,
    pub type_name: String,
    pub variables_reference: VarRef,
    pub presentation_hint: PresentationHint,
    pub named_variables: Option<u32>,
}

const DEFAULT_START_REF: VarRef = 1000;
const DEFAULT_MAX_STRING_LENGTH: usize = 1000;

/// Gère l'allocation de références de variables et la construction de
/// structures `Variable` prêtes pour le protocole.
#[derive(Debug)]
pub struct VariableManager {
    next_ref: VarRef,
    refs: HashMap<VarRef, VarRefEntry>,
}

impl Default for VariableManager {
    fn default() -> Self {
        Self::new(DEFAULT_START_REF)
    }
}

impl VariableManager {
    pub fn new(start_ref: VarRef) -> Self {
        Self { next_ref: start_ref, refs: HashMap::new() }
    }

    fn is_expandable(value: &Value) -> bool {
        matches!(value, Value::Array(_) | Value::Map(_) | Value::Record { .. })
    }

    /// Alloue une référence pour une valeur expansible ; retourne `0` sinon.
    pub fn allocate_ref(&mut self, value: &Value) -> VarRef {
        if !Self::is_expandable(value) {
            return 0;
        }
        let r = self.next_ref;
        self.next_ref += 1;
        self.refs.insert(r, VarRefEntry::Object(value.clone()));
        r
    }

    pub fn allocate_scope_ref(&mut self, frame_id: i64, scope: ScopeKind) -> VarRef {
        let r = self.next_ref;
        self.next_ref += 1;
        self.refs.insert(r, VarRefEntry::Scope { frame_id, scope });
        r
    }

    pub fn get_ref(&self, ref_id: VarRef) -> Option<&VarRefEntry> {
        self.refs.get(&ref_id)
    }

    pub fn has_ref(&self, ref_id: VarRef) -> bool {
        self.refs.contains_key(&ref_id)
    }

    pub fn clear(&mut self) {
        self.refs.clear();
        self.next_ref = DEFAULT_START_REF;
    }

    fn format_value(value: &Value, max_length: usize) -> String {
        let s = value.to_string();
        if s.chars().count() > max_length {
            let truncated: String = s.chars().take(max_length).collect();
            format!("{truncated}...")
        } else {
            s
        }
    }

    fn detect_kind_and_attrs(value: &Value) -> (PresentationKind, Vec<&'static str>) {
        match value {
            Value::Array(_) | Value::Map(_) => (PresentationKind::Data, Vec::new()),
            Value::Str(s) if s.len() > DEFAULT_MAX_STRING_LENGTH || s.contains('\n') => {
                (PresentationKind::Data, vec!["rawString"])
            }
            _ => (PresentationKind::Data, Vec::new()),
        }
    }

    fn visibility_for(name: &str) -> Visibility {
        if name.starts_with('_') { Visibility::Private } else { Visibility::Public }
    }

    /// Construit une `Variable` DAP-compatible à partir d'un nom et d'une valeur.
    ///
    /// `has_data_breakpoint` permet à l'appelant (Core Debugger) de poser
    /// l'attribut `hasDataBreakpoint` sans que ce module connaisse le moteur
    /// de data-watch.
    pub fn make_variable(&mut self, name: &str, value: &Value, has_data_breakpoint: bool) -> Variable {
        let val_str = Self::format_value(value, DEFAULT_MAX_STRING_LENGTH);
        let var_ref = self.allocate_ref(value);
        let (kind, mut attrs) = Self::detect_kind_and_attrs(value);
        if has_data_breakpoint && !attrs.contains(&"hasDataBreakpoint") {
            attrs.push("hasDataBreakpoint");
        }

        // Instance de modèle structuré : `namedVariables` prend le nombre de
        // champs déclarés, et `type` est décoré avec l'étiquette du modèle.
        let (type_name, named_variables) = match value.structured_model() {
            Some((tag, field_count)) => (tag.to_string(), Some(field_count as u32)),
            None => (value.type_name().to_string(), None),
        };

        Variable {
            name: name.to_string(),
            value: val_str,
            type_name,
            variables_reference: var_ref,
            presentation_hint: PresentationHint {
                kind: kind.as_str(),
                attributes: attrs,
                visibility: Self::visibility_for(name).as_str(),
            },
            named_variables,
        }
    }

    /// Étend une instance de modèle structuré en ses `Variable` de champ,
    /// chacune marquée `presentationHint.kind = property`. Retourne une
    /// liste vide pour toute valeur qui n'est pas un modèle structuré.
    pub fn expand_record_fields(&mut self, record: &Value) -> Vec<Variable> {
        let Some(fields) = record.record_fields() else {
            return Vec::new();
        };
        let mut names: Vec<&String> = fields.keys().collect();
        names.sort();
        names
            .into_iter()
            .map(|name| {
                let mut v = self.make_variable(name, &fields[name], false);
                v.presentation_hint.kind = PresentationKind::Property.as_str();
                v
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_get_zero_reference() {
        let mut m = VariableManager::default();
        assert_eq!(m.allocate_ref(&Value::Int(5)), 0);
        assert_eq!(m.allocate_ref(&Value::Str("hi".into())), 0);
        assert_eq!(m.allocate_ref(&Value::Bool(true)), 0);
    }

    #[test]
    fn composites_get_nonzero_reference() {
        let mut m = VariableManager::default();
        let arr = Value::Array(vec![Value::Int(1)]);
        let r = m.allocate_ref(&arr);
        assert!(r >= 1000);
        assert!(m.has_ref(r));
    }

    #[test]
    fn clear_resets_counter() {
        let mut m = VariableManager::default();
        m.allocate_ref(&Value::Array(vec![]));
        m.clear();
        let r = m.allocate_ref(&Value::Array(vec![]));
        assert_eq!(r, 1000);
    }

    #[test]
    fn private_name_visibility() {
        let mut m = VariableManager::default();
        let v = m.make_variable("_secret", &Value::Int(1), false);
        assert_eq!(v.presentation_hint.visibility, "private");
        let v2 = m.make_variable("public_field", &Value::Int(1), false);
        assert_eq!(v2.presentation_hint.visibility, "public");
    }

    #[test]
    fn data_breakpoint_attribute_set_once() {
        let mut m = VariableManager::default();
        let v = m.make_variable("x", &Value::Int(1), true);
        assert!(v.presentation_hint.attributes.contains(&"hasDataBreakpoint"));
    }

    #[test]
    fn long_string_gets_raw_string_attr() {
        let mut m = VariableManager::default();
        let long = "a".repeat(DEFAULT_MAX_STRING_LENGTH + 1);
        let v = m.make_variable("s", &Value::Str(long), false);
        assert!(v.presentation_hint.attributes.contains(&"rawString"));
    }

    #[test]
    fn value_truncated_past_max_length() {
        let mut m = VariableManager::default();
        let long = "a".repeat(2000);
        let v = m.make_variable("s", &Value::Str(long), false);
        assert!(v.value.ends_with("..."));
    }

    fn point() -> Value {
        let mut fields = HashMap::new();
        fields.insert("x".into(), Value::Int(1));
        fields.insert("y".into(), Value::Int(2));
        Value::Record { type_tag: "Point".into(), fields }
    }

    #[test]
    fn structured_model_gets_named_variables_and_type_tag() {
        let mut m = VariableManager::default();
        let v = m.make_variable("p", &point(), false);
        assert_eq!(v.type_name, "Point");
        assert_eq!(v.named_variables, Some(2));
        assert!(v.variables_reference >= 1000);
    }

    #[test]
    fn structured_model_field_expansion_uses_property_kind() {
        let mut m = VariableManager::default();
        let fields = m.expand_record_fields(&point());
        assert_eq!(fields.len(), 2);
        assert!(fields.iter().all(|f| f.presentation_hint.kind == "property"));
        assert!(fields.iter().any(|f| f.name == "x" && f.value == "1"));
    }

    #[test]
    fn non_record_expansion_is_empty() {
        let mut m = VariableManager::default();
        assert!(m.expand_record_fields(&Value::Int(1)).is_empty());
    }
}
