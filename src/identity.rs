pub const ANONYMOUS: &str = "Anonymous";

/// Supplies the name posts are signed with
pub trait IdentityProvider {
    fn display_name(&self) -> Option<String>;
}

pub struct FixedIdentity(pub Option<String>);

impl IdentityProvider for FixedIdentity {
    fn display_name(&self) -> Option<String> {
        self.0.clone()
    }
}

/// The user running the program: real name, or user name when the real name is not set
pub struct OsIdentity;

impl IdentityProvider for OsIdentity {
    fn display_name(&self) -> Option<String> {
        let name = whoami::realname();
        if name.trim().is_empty() {
            return Some(whoami::username());
        }
        Some(name)
    }
}

pub fn resolve_author(name: Option<&str>) -> String {
    match name.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => ANONYMOUS.to_string(),
    }
}
