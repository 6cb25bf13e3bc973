//! Key conversions for both wire schemas.
//!
//! Keys convert root-first. The legacy schema names the scope by app id;
//! the public schema names it by project id, resolved through `AppContext`.

use crate::{
    context::{AppContext, AppNamespace},
    key::{Key, KeyError, KeyId},
    translate::TranslateError,
};
use nimbus_proto::{legacy, public};

///
/// LEGACY
///

fn element_id(key: &Key) -> (Option<i64>, Option<String>) {
    match key.key_id() {
        KeyId::Incomplete(_) => (None, None),
        KeyId::Id(id) => (Some(*id), None),
        KeyId::Name(name) => (None, Some(name.clone())),
    }
}

pub(crate) fn namespace_field(scope: &AppNamespace) -> Option<String> {
    (!scope.namespace.is_empty()).then(|| scope.namespace.clone())
}

// Rebuild a key from root-first (kind, id, name) triples. An element with
// neither id nor name gets a fresh incomplete id.
fn key_from_elements<'a>(
    scope: &AppNamespace,
    elements: impl IntoIterator<Item = (&'a str, Option<i64>, Option<&'a str>)>,
) -> Result<Key, KeyError> {
    let mut key: Option<Key> = None;

    for (kind, id, name) in elements {
        let key_id = match (id.filter(|id| *id != 0), name) {
            (Some(_), Some(_)) => return Err(KeyError::AmbiguousElement),
            (Some(id), None) => KeyId::Id(id),
            (None, Some(name)) => KeyId::Name(name.to_string()),
            (None, None) => Key::fresh_incomplete_id(),
        };
        key = Some(Key::from_parts(scope.clone(), key, kind, key_id)?);
    }

    key.ok_or(KeyError::EmptyPath)
}

/// Legacy entity or request key.
pub fn key_to_reference(key: &Key) -> legacy::Reference {
    legacy::Reference {
        app: key.app_id().to_string(),
        name_space: namespace_field(key.scope()),
        path: Some(key_to_path(key)),
    }
}

/// Root-first legacy path of a key; also the entity group of a root key.
pub(crate) fn key_to_path(key: &Key) -> legacy::Path {
    let element = key
        .path()
        .into_iter()
        .map(|k| {
            let (id, name) = element_id(k);
            legacy::PathElement {
                kind: k.kind().to_string(),
                id,
                name,
            }
        })
        .collect();

    legacy::Path { element }
}

pub fn reference_to_key(reference: &legacy::Reference) -> Result<Key, KeyError> {
    let scope = AppNamespace::new(
        reference.app.clone(),
        reference.name_space.clone().unwrap_or_default(),
    );
    let elements = reference
        .path
        .iter()
        .flat_map(|path| path.element.iter())
        .map(|e| (e.kind.as_str(), e.id, e.name.as_deref()));

    key_from_elements(&scope, elements)
}

/// Key stored as a legacy property value.
pub(crate) fn key_to_reference_value(key: &Key) -> legacy::ReferenceValue {
    let path_element = key
        .path()
        .into_iter()
        .map(|k| {
            let (id, name) = element_id(k);
            legacy::ReferenceElement {
                kind: k.kind().to_string(),
                id,
                name,
            }
        })
        .collect();

    legacy::ReferenceValue {
        app: key.app_id().to_string(),
        name_space: namespace_field(key.scope()),
        path_element,
    }
}

pub(crate) fn reference_value_to_key(value: &legacy::ReferenceValue) -> Result<Key, KeyError> {
    let scope = AppNamespace::new(
        value.app.clone(),
        value.name_space.clone().unwrap_or_default(),
    );
    let elements = value
        .path_element
        .iter()
        .map(|e| (e.kind.as_str(), e.id, e.name.as_deref()));

    key_from_elements(&scope, elements)
}

///
/// PUBLIC
///

/// Public key. Fails when the key's app has no registered project.
pub fn key_to_public(key: &Key, context: &AppContext) -> Result<public::Key, TranslateError> {
    let project_id = context.project_id_for_app(key.app_id())?;
    let path = key
        .path()
        .into_iter()
        .map(|k| {
            let id_type = match k.key_id() {
                KeyId::Incomplete(_) => None,
                KeyId::Id(id) => Some(public::key::path_element::IdType::Id(*id)),
                KeyId::Name(name) => Some(public::key::path_element::IdType::Name(name.clone())),
            };
            public::key::PathElement {
                kind: k.kind().to_string(),
                id_type,
            }
        })
        .collect();

    Ok(public::Key {
        partition_id: Some(public::PartitionId {
            project_id,
            namespace_id: key.namespace().to_string(),
        }),
        path,
    })
}

/// Key from its public form. The partition's project must resolve to an
/// app id through `context`; a missing partition means the current app.
pub fn public_to_key(key: &public::Key, context: &AppContext) -> Result<Key, TranslateError> {
    let scope = match &key.partition_id {
        Some(partition) if !partition.project_id.is_empty() => AppNamespace::new(
            context.app_id_for_project(&partition.project_id)?,
            partition.namespace_id.clone(),
        ),
        Some(partition) => AppNamespace::new(context.app_id.clone(), partition.namespace_id.clone()),
        None => AppNamespace::app(context.app_id.clone()),
    };

    let elements = key.path.iter().map(|e| match &e.id_type {
        Some(public::key::path_element::IdType::Id(id)) => (e.kind.as_str(), Some(*id), None),
        Some(public::key::path_element::IdType::Name(name)) => {
            (e.kind.as_str(), None, Some(name.as_str()))
        }
        None => (e.kind.as_str(), None, None),
    });

    Ok(key_from_elements(&scope, elements)?)
}
