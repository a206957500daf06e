//! Built-in sample vocabulary used by `cxo sample`.

use cxo_schema::{Declare, Encode, FieldDecl, Layout, Registry, SchemaResult};

pub const USER: &str = "cxo.User";
pub const GROUP: &str = "cxo.Group";

pub struct User;

impl Declare for User {
    fn layout() -> Layout {
        Layout::Struct(vec![
            FieldDecl::new::<String>("Name"),
            FieldDecl::new::<u32>("Age"),
            FieldDecl::new::<Vec<String>>("Tags"),
        ])
    }
}

pub struct Group;

impl Declare for Group {
    fn layout() -> Layout {
        Layout::Struct(vec![
            FieldDecl::new::<String>("Name"),
            FieldDecl::references("Members", USER),
            FieldDecl::reference("Leader", USER),
            FieldDecl::dynamic("Meta"),
        ])
    }
}

pub fn registry() -> SchemaResult<Registry> {
    Registry::new(|r| {
        r.register::<User>(USER)?;
        r.register::<Group>(GROUP)
    })
}

/// Encoded `cxo.User` value.
pub fn user(name: &str, age: u32, tags: &[&str]) -> Vec<u8> {
    let mut buf = Vec::new();
    name.encode(&mut buf);
    age.encode(&mut buf);
    tags.iter().map(|t| t.to_string()).collect::<Vec<_>>().encode(&mut buf);
    buf
}
