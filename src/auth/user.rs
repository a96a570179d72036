use oso::PolarClass;
use serde::{Deserialize, Serialize};

/// The authenticated caller, as handed over by the transport boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub roles: Vec<String>,
}

impl User {
    pub fn new(id: String, roles: Vec<String>) -> Self {
        Self {
            id,
            roles: roles
                .into_iter()
                .map(|role| role.trim().to_ascii_lowercase())
                .filter(|role| !role.is_empty())
                .collect(),
        }
    }

    fn id_equals_nullable_id(&self, optional_id: Option<String>) -> bool {
        if let Some(id) = optional_id {
            if self.id == id {
                return true;
            }
        }

        false
    }

    pub fn has_role(&self, role: String) -> bool {
        self.roles.iter().any(|x| x == &role)
    }
}

impl PolarClass for User {
    fn get_polar_class_builder() -> oso::ClassBuilder<User> {
        oso::Class::builder()
            .name("User")
            .add_attribute_getter("id", |recv: &User| recv.id.clone())
            .add_attribute_getter("roles", |recv: &User| recv.roles.clone())
            .add_method("id_equals_nullable_id", User::id_equals_nullable_id)
            .add_method("has_role", User::has_role)
    }

    fn get_polar_class() -> oso::Class {
        let builder = User::get_polar_class_builder();
        builder.build()
    }
}

#[test]
fn roles_are_normalized() {
    let user = User::new("u1".into(), vec![" Driver".into(), "".into(), "ADMIN".into()]);

    assert_eq!(user.roles, vec!["driver".to_string(), "admin".to_string()]);
    assert!(user.has_role("driver".into()));
    assert!(!user.has_role("student".into()));
}

#[test]
fn nullable_id_comparison() {
    let user = User::new("u1".into(), vec![]);

    assert!(user.id_equals_nullable_id(Some("u1".into())));
    assert!(!user.id_equals_nullable_id(Some("u2".into())));
    assert!(!user.id_equals_nullable_id(None));
}
