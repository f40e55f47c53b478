use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Role {
    Student,
    Admin,
}

/// An authenticated roster member: the role is resolved once at login and
/// carried through request context.
#[derive(Debug, Clone)]
pub(crate) struct Principal {
    pub(crate) username: String,
    pub(crate) role: Role,
}

#[derive(Debug, Clone, Deserialize)]
struct RosterEntry {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct RosterFile {
    students: Vec<RosterEntry>,
    admins: Vec<RosterEntry>,
}

#[derive(Debug, Error)]
pub(crate) enum RosterError {
    #[error("failed to read roster file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse roster file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("duplicate roster username: {0}")]
    DuplicateUsername(String),
}

/// Static credential list loaded once at startup; read-only afterwards.
#[derive(Debug, Clone)]
pub(crate) struct Roster {
    students: Vec<RosterEntry>,
    admins: Vec<RosterEntry>,
}

impl Roster {
    pub(crate) fn load(path: &Path) -> Result<Self, RosterError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| RosterError::Read { path: path.display().to_string(), source })?;
        let file: RosterFile = serde_json::from_str(&raw)
            .map_err(|source| RosterError::Parse { path: path.display().to_string(), source })?;

        let roster = Self { students: file.students, admins: file.admins };
        roster.check_duplicates()?;
        Ok(roster)
    }

    fn check_duplicates(&self) -> Result<(), RosterError> {
        let mut seen = std::collections::HashSet::new();
        for entry in self.students.iter().chain(self.admins.iter()) {
            if !seen.insert(entry.username.as_str()) {
                return Err(RosterError::DuplicateUsername(entry.username.clone()));
            }
        }
        Ok(())
    }

    pub(crate) fn verify(&self, username: &str, password: &str) -> Option<Principal> {
        let principal = self.lookup(username)?;
        let entry = match principal.role {
            Role::Student => self.students.iter().find(|e| e.username == username)?,
            Role::Admin => self.admins.iter().find(|e| e.username == username)?,
        };

        if entry.password == password {
            Some(principal)
        } else {
            None
        }
    }

    pub(crate) fn lookup(&self, username: &str) -> Option<Principal> {
        if self.students.iter().any(|e| e.username == username) {
            return Some(Principal { username: username.to_string(), role: Role::Student });
        }
        if self.admins.iter().any(|e| e.username == username) {
            return Some(Principal { username: username.to_string(), role: Role::Admin });
        }
        None
    }

    pub(crate) fn student_names(&self) -> impl Iterator<Item = &str> {
        self.students.iter().map(|e| e.username.as_str())
    }

    pub(crate) fn student_count(&self) -> usize {
        self.students.len()
    }

    pub(crate) fn admin_count(&self) -> usize {
        self.admins.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Roster {
        let file: RosterFile = serde_json::from_str(
            r#"{
                "students": [
                    {"username": "alice", "password": "alice-pass"},
                    {"username": "bob", "password": "bob-pass"}
                ],
                "admins": [
                    {"username": "admin", "password": "admin-pass"}
                ]
            }"#,
        )
        .unwrap();
        Roster { students: file.students, admins: file.admins }
    }

    #[test]
    fn verify_accepts_matching_credentials() {
        let roster = sample();

        let principal = roster.verify("alice", "alice-pass").expect("principal");
        assert_eq!(principal.username, "alice");
        assert_eq!(principal.role, Role::Student);

        let principal = roster.verify("admin", "admin-pass").expect("principal");
        assert_eq!(principal.role, Role::Admin);
    }

    #[test]
    fn verify_rejects_bad_password_and_unknown_user() {
        let roster = sample();
        assert!(roster.verify("alice", "wrong").is_none());
        assert!(roster.verify("mallory", "alice-pass").is_none());
    }

    #[test]
    fn lookup_resolves_role_without_password() {
        let roster = sample();
        assert_eq!(roster.lookup("bob").unwrap().role, Role::Student);
        assert_eq!(roster.lookup("admin").unwrap().role, Role::Admin);
        assert!(roster.lookup("mallory").is_none());
    }

    #[test]
    fn duplicate_usernames_are_rejected() {
        let file: RosterFile = serde_json::from_str(
            r#"{
                "students": [{"username": "alice", "password": "a"}],
                "admins": [{"username": "alice", "password": "b"}]
            }"#,
        )
        .unwrap();
        let roster = Roster { students: file.students, admins: file.admins };
        assert!(matches!(
            roster.check_duplicates(),
            Err(RosterError::DuplicateUsername(name)) if name == "alice"
        ));
    }

    #[test]
    fn student_names_lists_roster_order() {
        let roster = sample();
        let names: Vec<&str> = roster.student_names().collect();
        assert_eq!(names, vec!["alice", "bob"]);
    }
}
