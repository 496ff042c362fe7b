//! Prints an `[[admins]]` entry for the server config.
//!
//! Usage: `hash_password <username> <department_admin|photo_admin> [department]`
//! with the password read from stdin.

use std::io::{self, Write};

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use regdesk_core::{Department, Role, Scope};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (username, role) = match (args.first(), args.get(1)) {
        (Some(u), Some(r)) => (u.clone(), r.as_str()),
        _ => anyhow::bail!(
            "usage: hash_password <username> <department_admin|photo_admin> [department]"
        ),
    };
    let role = match role {
        "department_admin" => Role::DepartmentAdmin,
        "photo_admin" => Role::PhotoAdmin,
        other => anyhow::bail!("unknown role: {other}"),
    };
    let department = args
        .get(2)
        .map(|d| d.parse::<Department>())
        .transpose()?;
    if role == Role::PhotoAdmin && department.is_some() {
        anyhow::bail!("photo admins are not tied to a department");
    }
    Scope::for_role(role, department)?;

    eprint!("Enter password: ");
    io::stderr().flush()?;

    let mut password = String::new();
    io::stdin().read_line(&mut password)?;
    let password = password.trim();

    if password.is_empty() {
        anyhow::bail!("Password cannot be empty");
    }

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    println!("[[admins]]");
    println!("username = \"{username}\"");
    println!("password_hash = \"{hash}\"");
    println!("role = \"{role}\"");
    if let Some(department) = department {
        println!("department = \"{department}\"");
    }
    Ok(())
}
