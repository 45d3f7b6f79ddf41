//! Narrow reflection interface the surface engine is written against.
//!
//! The engine never touches a host object model directly. Anything that can
//! enumerate members, fetch attributes, classify objects and hand out an
//! identity token can be fingerprinted.

use crate::model::{DocText, Member, ObjectGraph, ObjectId, ObjectKind};
use thiserror::Error;

/// Opaque per-run identity key. Equal iff the two handles name the same object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityToken(u64);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReflectError {
    #[error("attribute `{name}` is unavailable: {reason}")]
    AttributeUnavailable { name: String, reason: String },
}

pub trait Reflect {
    type Object: Copy;

    /// Attribute names in sorted order, followed by well-formed declared
    /// export names that are not attributes.
    fn member_names(&self, obj: Self::Object) -> Vec<String>;

    /// The declared public-export list, if the object has one.
    fn exports(&self, obj: Self::Object) -> Option<&[String]>;

    fn get_attr(&self, obj: Self::Object, name: &str) -> Result<Self::Object, ReflectError>;

    fn is_module(&self, obj: Self::Object) -> bool;

    fn is_class(&self, obj: Self::Object) -> bool;

    /// The name the object declares for itself, if any. For modules this is
    /// the fully qualified dotted name.
    fn declared_name(&self, obj: Self::Object) -> Option<&str>;

    fn doc(&self, obj: Self::Object) -> Option<&DocText>;

    fn identity(&self, obj: Self::Object) -> IdentityToken;

    fn type_name(&self, obj: Self::Object) -> &str;

    /// Bound members of a class, in name order.
    fn class_members(&self, obj: Self::Object) -> Vec<(String, Self::Object)>;

    /// Every importable module at or under `root`, found by path discovery
    /// rather than by following attributes.
    fn discover_modules(&self, root: &str) -> Vec<(String, Self::Object)>;
}

/// Export entries that cannot name a public attribute. They are dropped
/// without a diagnostic.
pub fn is_malformed_export(api: &str) -> bool {
    api.is_empty() || api.starts_with('_') || api.contains(',')
}

impl Reflect for ObjectGraph {
    type Object = ObjectId;

    fn member_names(&self, obj: ObjectId) -> Vec<String> {
        let object = self.get(obj);
        let mut names: Vec<String> = object.members.keys().cloned().collect();
        if let Some(exports) = &object.exports {
            for export in exports {
                if !object.members.contains_key(export)
                    && !is_malformed_export(export)
                    && !names.contains(export)
                {
                    names.push(export.clone());
                }
            }
        }
        names
    }

    fn exports(&self, obj: ObjectId) -> Option<&[String]> {
        self.get(obj).exports.as_deref()
    }

    fn get_attr(&self, obj: ObjectId, name: &str) -> Result<ObjectId, ReflectError> {
        let object = self.get(obj);
        match object.members.get(name) {
            Some(Member::Bound(id)) => Ok(*id),
            Some(Member::Unavailable(reason)) => Err(ReflectError::AttributeUnavailable {
                name: name.to_string(),
                reason: reason.clone(),
            }),
            None => Err(ReflectError::AttributeUnavailable {
                name: name.to_string(),
                reason: format!(
                    "'{}' object has no attribute '{}'",
                    object.name.as_deref().unwrap_or(object.type_name()),
                    name
                ),
            }),
        }
    }

    fn is_module(&self, obj: ObjectId) -> bool {
        self.get(obj).is_module()
    }

    fn is_class(&self, obj: ObjectId) -> bool {
        self.get(obj).kind == ObjectKind::Class
    }

    fn declared_name(&self, obj: ObjectId) -> Option<&str> {
        self.get(obj).name.as_deref()
    }

    fn doc(&self, obj: ObjectId) -> Option<&DocText> {
        self.get(obj).doc.as_ref()
    }

    fn identity(&self, obj: ObjectId) -> IdentityToken {
        IdentityToken(obj.index() as u64)
    }

    fn type_name(&self, obj: ObjectId) -> &str {
        self.get(obj).type_name()
    }

    fn class_members(&self, obj: ObjectId) -> Vec<(String, ObjectId)> {
        self.get(obj)
            .members
            .iter()
            .filter_map(|(name, member)| match member {
                Member::Bound(id) => Some((name.clone(), *id)),
                Member::Unavailable(_) => None,
            })
            .collect()
    }

    fn discover_modules(&self, root: &str) -> Vec<(String, ObjectId)> {
        self.modules_under(root)
    }
}
