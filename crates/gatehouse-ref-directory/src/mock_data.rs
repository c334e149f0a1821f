//! Simulated user directory for the Gatehouse reference runtime.
//!
//! All data in this module is hardcoded and fictional. No external systems are
//! contacted. `Directory` stands in for the organisation's user-management API
//! and is mutable, so approved updates are visible to later lookups.

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gatehouse_contracts::error::{GatehouseError, GatehouseResult};

// ── Records ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub user_name: String,
    pub email: String,
    pub job_title: String,
    /// `USER` or `WORKER`.
    pub user_type: String,
    pub supervisor: bool,
    /// `ACTIVE` or `INACTIVE`.
    pub status: String,
    pub updated_on: Option<DateTime<Utc>>,
}

impl UserRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub status: String,
}

/// A partial update: `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub user_name: Option<String>,
    pub email: Option<String>,
    pub job_title: Option<String>,
    #[serde(rename = "type")]
    pub user_type: Option<String>,
    pub supervisor: Option<bool>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ── Seed data ─────────────────────────────────────────────────────────────────

fn user(id: u64, first: &str, last: &str, title: &str, user_type: &str, supervisor: bool) -> UserRecord {
    let user_name = format!("{}.{}", first.to_lowercase(), last.to_lowercase());
    UserRecord {
        id,
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: format!("{user_name}@example.org"),
        user_name,
        job_title: title.to_string(),
        user_type: user_type.to_string(),
        supervisor,
        status: "ACTIVE".to_string(),
        updated_on: None,
    }
}

fn role(id: u64, name: &str, description: &str) -> RoleRecord {
    RoleRecord {
        id,
        name: name.to_string(),
        description: description.to_string(),
        status: "ACTIVE".to_string(),
    }
}

fn seed_users() -> Vec<UserRecord> {
    vec![
        user(1196, "Amara", "Okafor", "Operations Manager", "USER", true),
        user(1201, "Jane", "Doe", "Field Technician", "WORKER", false),
        user(1207, "Tomasz", "Nowak", "Safety Inspector", "WORKER", false),
        user(1213, "Priya", "Raman", "Site Supervisor", "USER", true),
        user(1220, "Lucas", "Moreau", "Quality Analyst", "USER", false),
        user(1226, "Hana", "Sato", "Maintenance Planner", "WORKER", false),
    ]
}

fn seed_roles() -> Vec<RoleRecord> {
    vec![
        role(11, "Administrator", "Full access to organisation settings"),
        role(12, "Inspector", "Can execute and sign inspection forms"),
        role(13, "Technician", "Can execute assigned work orders"),
        role(14, "Viewer", "Read-only access to dashboards"),
    ]
}

/// `(user_id, role_id)` pairs.
const ROLE_ASSIGNMENTS: &[(u64, u64)] = &[
    (1196, 11),
    (1196, 14),
    (1201, 13),
    (1207, 12),
    (1207, 13),
    (1213, 12),
    (1220, 14),
    (1226, 13),
];

// ── Directory ─────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Directory {
    users: RwLock<Vec<UserRecord>>,
    roles: Vec<RoleRecord>,
}

impl Directory {
    /// A directory populated with the fictional seed data.
    pub fn seeded() -> Self {
        Self {
            users: RwLock::new(seed_users()),
            roles: seed_roles(),
        }
    }

    fn poisoned(operation: &str) -> GatehouseError {
        GatehouseError::OperationFailed {
            name: operation.to_string(),
            reason: "directory lock poisoned".to_string(),
        }
    }

    /// Active users, newest id first, optionally filtered by a
    /// case-insensitive match on name, user name, or email.
    pub fn search_users(&self, size: usize, search: Option<&str>) -> GatehouseResult<Vec<UserRecord>> {
        let users = self.users.read().map_err(|_| Self::poisoned("search_users"))?;
        let needle = search.map(str::to_lowercase).filter(|s| !s.trim().is_empty());

        let mut found: Vec<UserRecord> = users
            .iter()
            .filter(|u| u.status == "ACTIVE")
            .filter(|u| match &needle {
                None => true,
                Some(n) => {
                    u.full_name().to_lowercase().contains(n.as_str())
                        || u.user_name.contains(n.as_str())
                        || u.email.contains(n.as_str())
                }
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| b.id.cmp(&a.id));
        found.truncate(size);
        Ok(found)
    }

    pub fn user_by_id(&self, user_id: u64) -> GatehouseResult<Option<UserRecord>> {
        let users = self.users.read().map_err(|_| Self::poisoned("get_user_by_id"))?;
        Ok(users.iter().find(|u| u.id == user_id).cloned())
    }

    /// Apply `update` to the user and return the updated record.
    pub fn update_user(&self, user_id: u64, update: &UserUpdate) -> GatehouseResult<UserRecord> {
        let mut users = self.users.write().map_err(|_| Self::poisoned("update_user"))?;
        let user = users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| GatehouseError::OperationFailed {
                name: "update_user".to_string(),
                reason: format!("no user with ID {user_id}"),
            })?;

        if let Some(v) = &update.first_name {
            user.first_name = v.clone();
        }
        if let Some(v) = &update.last_name {
            user.last_name = v.clone();
        }
        if let Some(v) = &update.user_name {
            user.user_name = v.clone();
        }
        if let Some(v) = &update.email {
            user.email = v.clone();
        }
        if let Some(v) = &update.job_title {
            user.job_title = v.clone();
        }
        if let Some(v) = &update.user_type {
            user.user_type = v.clone();
        }
        if let Some(v) = update.supervisor {
            user.supervisor = v;
        }
        user.updated_on = Some(Utc::now());

        Ok(user.clone())
    }

    /// Roles whose name or description contains `search`, by id.
    pub fn roles(&self, search: &str, size: usize) -> Vec<RoleRecord> {
        let needle = search.to_lowercase();
        self.roles
            .iter()
            .filter(|r| {
                needle.is_empty()
                    || r.name.to_lowercase().contains(&needle)
                    || r.description.to_lowercase().contains(&needle)
            })
            .take(size)
            .cloned()
            .collect()
    }

    pub fn roles_for_user(&self, user_id: u64) -> Vec<RoleRecord> {
        ROLE_ASSIGNMENTS
            .iter()
            .filter(|(u, _)| *u == user_id)
            .filter_map(|(_, r)| self.roles.iter().find(|role| role.id == *r))
            .cloned()
            .collect()
    }
}

impl Default for Directory {
    fn default() -> Self {
        Self::seeded()
    }
}

// ── Formatting ────────────────────────────────────────────────────────────────

pub fn format_user(user: &UserRecord) -> String {
    let updated = user
        .updated_on
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "Never".to_string());
    format!(
        "User ID: {}\nName: {}\nUser Name: {}\nEmail: {}\nJob Title: {}\nType: {}\nSupervisor: {}\nStatus: {}\nUpdated On: {}\n",
        user.id,
        user.full_name(),
        user.user_name,
        user.email,
        user.job_title,
        user.user_type,
        user.supervisor,
        user.status,
        updated,
    )
}

pub fn format_users(users: &[UserRecord]) -> String {
    if users.is_empty() {
        return "No users found.".to_string();
    }
    users.iter().map(format_user).collect::<Vec<_>>().join("\n---\n")
}

pub fn format_roles(roles: &[RoleRecord]) -> String {
    if roles.is_empty() {
        return "No roles found.".to_string();
    }
    roles
        .iter()
        .map(|r| {
            format!(
                "Role ID: {}\nName: {}\nDescription: {}\nStatus: {}\n",
                r.id, r.name, r.description, r.status
            )
        })
        .collect::<Vec<_>>()
        .join("\n---\n")
}
