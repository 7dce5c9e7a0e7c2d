//! Permission codes and the role catalogue

pub const MOVIES_READ: &str = "movies:read";
pub const MOVIES_WRITE: &str = "movies:write";
pub const USERS_READ: &str = "users:read";
pub const USERS_WRITE: &str = "users:write";

pub const KNOWN_PERMISSIONS: &[&str] = &[MOVIES_READ, MOVIES_WRITE, USERS_READ, USERS_WRITE];

/// Roles and the permissions each one bundles; mirrors the seed migration
pub const ROLE_PERMISSIONS: &[(&str, &[&str])] = &[
    ("user", &[MOVIES_READ]),
    ("subscriber", &[MOVIES_READ]),
    ("manager", &[MOVIES_READ, MOVIES_WRITE]),
    ("admin", &[MOVIES_READ, MOVIES_WRITE, USERS_READ, USERS_WRITE]),
];

/// Grants every new account receives directly
pub const DEFAULT_PERMISSIONS: &[&str] = &[MOVIES_READ];

/// Role every new account joins
pub const DEFAULT_ROLE: &str = "user";

pub fn is_known_role(code: &str) -> bool {
    ROLE_PERMISSIONS.iter().any(|(role, _)| *role == code)
}

pub fn is_known_permission(code: &str) -> bool {
    KNOWN_PERMISSIONS.contains(&code)
}

/// Type-level permission requirement for [`RequirePermission`](crate::RequirePermission)
pub trait PermissionCode: Send + Sync + 'static {
    const CODE: &'static str;
}

macro_rules! permission_code {
    ($(#[$meta:meta])* $name:ident => $code:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl PermissionCode for $name {
            const CODE: &'static str = $code;
        }
    };
}

permission_code!(
    /// `movies:read`
    MoviesRead => MOVIES_READ
);
permission_code!(
    /// `movies:write`
    MoviesWrite => MOVIES_WRITE
);
permission_code!(
    /// `users:read`
    UsersRead => USERS_READ
);
permission_code!(
    /// `users:write`
    UsersWrite => USERS_WRITE
);
