//! Collects type declarations and turns them into raw schemas.

use std::any::TypeId;
use std::collections::HashMap;

use crate::declare::{tag_schema_name, Declare, FieldDecl, Layout, TypeDesc};
use crate::error::{SchemaError, SchemaResult};
use crate::kind::{Kind, ReferenceKind};
use crate::schema::{Field, Schema};

/// Builder of a type vocabulary. Obtained from [`Registry::new`] and
/// consumed by it.
///
/// [`Registry::new`]: crate::Registry::new
#[derive(Debug, Default)]
pub struct Registrar {
    /// Registration order; names and types are unique.
    entries: Vec<(TypeDesc, String)>,
    names: HashMap<TypeId, String>,
}

impl Registrar {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register `T` under `name`.
    ///
    /// Fails if the name is empty or taken, if `T` already has a name, or if
    /// `T` is one of the reference marker types.
    pub fn register<T: Declare>(&mut self, name: &str) -> SchemaResult<()> {
        if name.is_empty() {
            return Err(SchemaError::EmptyName);
        }
        let ty = TypeDesc::of::<T>();
        if ty.layout().is_reference() {
            return Err(SchemaError::ReferenceType(ty.name()));
        }
        if self.entries.iter().any(|(_, n)| n == name) {
            return Err(SchemaError::DuplicateName(name.to_string()));
        }
        if let Some(existing) = self.names.get(&ty.id()) {
            return Err(SchemaError::DuplicateType {
                type_name: ty.name(),
                name: existing.clone(),
            });
        }
        self.names.insert(ty.id(), name.to_string());
        self.entries.push((ty, name.to_string()));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> &[(TypeDesc, String)] {
        &self.entries
    }

    /// The type → name table, kept by locally built registries.
    pub(crate) fn into_names(self) -> HashMap<TypeId, String> {
        self.names
    }

    /// Full schema of a type. Registered types nested inside it become
    /// placeholders.
    pub(crate) fn schema_of(&self, ty: TypeDesc) -> SchemaResult<Schema> {
        self.build(ty, &mut Vec::new())
    }

    fn build(&self, ty: TypeDesc, building: &mut Vec<TypeId>) -> SchemaResult<Schema> {
        let name = self.names.get(&ty.id()).cloned();
        if name.is_none() && building.contains(&ty.id()) {
            return Err(SchemaError::RecursiveType(ty.name()));
        }
        building.push(ty.id());
        let schema = self.build_layout(ty, name, building);
        building.pop();
        schema
    }

    fn build_layout(
        &self,
        ty: TypeDesc,
        name: Option<String>,
        building: &mut Vec<TypeId>,
    ) -> SchemaResult<Schema> {
        let schema = match ty.layout() {
            Layout::Scalar(kind) => Schema::Scalar { kind, name },
            Layout::Slice(elem) => Schema::Slice {
                name,
                elem: Box::new(self.nested(elem, building)?),
            },
            Layout::Array(length, elem) => Schema::Array {
                name,
                length,
                elem: Box::new(self.nested(elem, building)?),
            },
            Layout::Struct(decls) => {
                let mut fields = Vec::with_capacity(decls.len());
                for decl in decls.into_iter().filter(|d| !d.is_excluded()) {
                    fields.push(self.field(decl, building)?);
                }
                Schema::Struct { name, fields }
            }
            Layout::Ref | Layout::Refs | Layout::Dynamic => {
                return Err(SchemaError::NestedReference(ty.name()));
            }
        };
        Ok(schema)
    }

    /// Schema of an element or field type: a placeholder when the type is
    /// registered, the full schema otherwise.
    fn nested(&self, ty: TypeDesc, building: &mut Vec<TypeId>) -> SchemaResult<Schema> {
        let Some(name) = self.names.get(&ty.id()) else {
            return self.build(ty, building);
        };
        let kind = match ty.layout() {
            Layout::Scalar(kind) => kind,
            Layout::Slice(_) => Kind::Slice,
            Layout::Array(..) => Kind::Array,
            Layout::Struct(_) => Kind::Struct,
            Layout::Ref | Layout::Refs | Layout::Dynamic => {
                return Err(SchemaError::NestedReference(ty.name()));
            }
        };
        Ok(Schema::placeholder(kind, name.clone()))
    }

    fn field(&self, decl: FieldDecl, building: &mut Vec<TypeId>) -> SchemaResult<Field> {
        let schema = match decl.ty.layout() {
            Layout::Ref => Schema::reference(ReferenceKind::Single, Some(target(&decl)?)),
            Layout::Refs => Schema::reference(ReferenceKind::Slice, Some(target(&decl)?)),
            Layout::Dynamic => Schema::reference(ReferenceKind::Dynamic, None),
            _ => self.nested(decl.ty, building)?,
        };
        Ok(Field::new(decl.name, decl.tag, schema))
    }
}

fn target(decl: &FieldDecl) -> SchemaResult<&str> {
    tag_schema_name(&decl.tag).map_err(|reason| SchemaError::MissingReferenceTag {
        field: decl.name.clone(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{Dynamic, Refs};
    use cxo_types::Reference;

    struct User;
    impl Declare for User {
        fn layout() -> Layout {
            Layout::Struct(vec![
                FieldDecl::new::<String>("Name"),
                FieldDecl::new::<u32>("Age"),
                FieldDecl::new::<u64>("Secret").private(),
                FieldDecl::new::<u8>("_"),
                FieldDecl::new::<bool>("Skipped").tag("-"),
            ])
        }
    }

    struct Group;
    impl Declare for Group {
        fn layout() -> Layout {
            Layout::Struct(vec![
                FieldDecl::new::<String>("Name"),
                FieldDecl::references("Members", "cxo.User"),
                FieldDecl::reference("Leader", "cxo.User"),
                FieldDecl::dynamic("Extra"),
                FieldDecl::new::<Vec<User>>("Inline"),
            ])
        }
    }

    struct Untagged;
    impl Declare for Untagged {
        fn layout() -> Layout {
            Layout::Struct(vec![FieldDecl::new::<Reference>("Target")])
        }
    }

    struct RefList;
    impl Declare for RefList {
        fn layout() -> Layout {
            Layout::Struct(vec![FieldDecl::new::<Vec<Dynamic>>("Items")])
        }
    }

    struct Node;
    impl Declare for Node {
        fn layout() -> Layout {
            Layout::Struct(vec![FieldDecl::new::<Vec<Node>>("Children")])
        }
    }

    #[test]
    fn register_validates() {
        let mut r = Registrar::new();
        assert_eq!(r.register::<User>(""), Err(SchemaError::EmptyName));
        r.register::<User>("cxo.User").unwrap();
        assert_eq!(
            r.register::<Group>("cxo.User"),
            Err(SchemaError::DuplicateName("cxo.User".into()))
        );
        assert!(matches!(
            r.register::<User>("cxo.Other"),
            Err(SchemaError::DuplicateType { .. })
        ));
        assert!(matches!(
            r.register::<Refs>("cxo.Refs"),
            Err(SchemaError::ReferenceType(_))
        ));
        assert!(matches!(
            r.register::<Reference>("cxo.Ref"),
            Err(SchemaError::ReferenceType(_))
        ));
        assert!(matches!(
            r.register::<Dynamic>("cxo.Dyn"),
            Err(SchemaError::ReferenceType(_))
        ));
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn struct_fields_skip_excluded() {
        let mut r = Registrar::new();
        r.register::<User>("cxo.User").unwrap();
        let schema = r.schema_of(TypeDesc::of::<User>()).unwrap();
        let Schema::Struct { name, fields } = schema else {
            panic!("expected struct");
        };
        assert_eq!(name.as_deref(), Some("cxo.User"));
        let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Name", "Age"]);
        assert_eq!(fields[0].schema, Schema::scalar(Kind::String));
    }

    #[test]
    fn registered_nested_types_become_placeholders() {
        let mut r = Registrar::new();
        r.register::<User>("cxo.User").unwrap();
        r.register::<Group>("cxo.Group").unwrap();
        let Schema::Struct { fields, .. } = r.schema_of(TypeDesc::of::<Group>()).unwrap() else {
            panic!("expected struct");
        };
        assert_eq!(
            fields[1].schema,
            Schema::reference(ReferenceKind::Slice, Some("cxo.User"))
        );
        assert_eq!(fields[1].tag, "schema=cxo.User");
        assert_eq!(
            fields[2].schema,
            Schema::reference(ReferenceKind::Single, Some("cxo.User"))
        );
        assert_eq!(fields[3].schema, Schema::reference(ReferenceKind::Dynamic, None));
        assert_eq!(
            fields[4].schema,
            Schema::Slice {
                name: None,
                elem: Box::new(Schema::placeholder(Kind::Struct, "cxo.User")),
            }
        );
    }

    #[test]
    fn unregistered_nested_types_are_inlined() {
        let mut r = Registrar::new();
        r.register::<Group>("cxo.Group").unwrap();
        let Schema::Struct { fields, .. } = r.schema_of(TypeDesc::of::<Group>()).unwrap() else {
            panic!("expected struct");
        };
        let Schema::Slice { elem, .. } = &fields[4].schema else {
            panic!("expected slice");
        };
        assert!(matches!(elem.as_ref(), Schema::Struct { name: None, fields } if fields.len() == 2));
    }

    #[test]
    fn reference_field_needs_tag() {
        let mut r = Registrar::new();
        r.register::<Untagged>("cxo.Untagged").unwrap();
        let err = r.schema_of(TypeDesc::of::<Untagged>()).unwrap_err();
        assert!(matches!(err, SchemaError::MissingReferenceTag { field, .. } if field == "Target"));
    }

    #[test]
    fn references_rejected_as_elements() {
        let mut r = Registrar::new();
        r.register::<RefList>("cxo.RefList").unwrap();
        assert!(matches!(
            r.schema_of(TypeDesc::of::<RefList>()),
            Err(SchemaError::NestedReference(_))
        ));
    }

    #[test]
    fn self_reference_is_fine_when_registered() {
        let mut r = Registrar::new();
        r.register::<Node>("cxo.Node").unwrap();
        let Schema::Struct { fields, .. } = r.schema_of(TypeDesc::of::<Node>()).unwrap() else {
            panic!("expected struct");
        };
        assert_eq!(
            fields[0].schema,
            Schema::Slice {
                name: None,
                elem: Box::new(Schema::placeholder(Kind::Struct, "cxo.Node")),
            }
        );
    }

    #[test]
    fn unregistered_recursion_is_an_error() {
        struct Outer;
        impl Declare for Outer {
            fn layout() -> Layout {
                Layout::Struct(vec![FieldDecl::new::<Node>("Tree")])
            }
        }
        let mut r = Registrar::new();
        r.register::<Outer>("cxo.Outer").unwrap();
        assert!(matches!(
            r.schema_of(TypeDesc::of::<Outer>()),
            Err(SchemaError::RecursiveType(_))
        ));
    }
}
