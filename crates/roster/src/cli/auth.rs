//! Account command handlers.
//!
//! Handles signup, login, logout and whoami.

use roster_core::accounts;
use roster_core::store::{Credentials, Role};

use crate::cli::util::{self, describe_session, report_error};

/// Handle the signup command - create an account and cache its session.
pub fn handle_signup(email: &str, discord: Option<&str>, password: Option<String>) -> bool {
    let Some(mut config) = util::load_config() else {
        return false;
    };
    let Some(client) = util::client(&config) else {
        return false;
    };
    let Some(password) = util::read_password(password) else {
        return false;
    };

    println!("Creating account for {}...", email);
    let credentials = Credentials::new(email, password);
    match accounts::register(&client, &client, &credentials, discord) {
        Ok(session) => {
            config.session = Some(session);
            if !util::save_config(&config) {
                return false;
            }
            println!("✓ Account created");
            println!();
            println!("An administrator has to verify the account before it can");
            println!("read or change the roster. Run 'roster login' once that is done.");
            true
        }
        Err(e) => {
            report_error(&e);
            false
        }
    }
}

/// Handle the login command - authenticate, fetch the role and cache the session.
pub fn handle_login(email: &str, password: Option<String>) -> bool {
    let Some(mut config) = util::load_config() else {
        return false;
    };
    let Some(client) = util::client(&config) else {
        return false;
    };
    let Some(password) = util::read_password(password) else {
        return false;
    };

    let credentials = Credentials::new(email, password);
    match accounts::sign_in(&client, &client, &credentials) {
        Ok(session) => {
            let role = session.role;
            println!("✓ Signed in as {}", describe_session(&session));
            config.session = Some(session);
            if !util::save_config(&config) {
                return false;
            }
            if role != Role::User {
                println!();
                println!("Your account is not verified yet; roster commands will be refused.");
            }
            true
        }
        Err(e) => {
            report_error(&e);
            false
        }
    }
}

/// Handle the logout command - drop the cached session.
pub fn handle_logout() -> bool {
    let Some(mut config) = util::load_config() else {
        return false;
    };
    match config.session.take() {
        Some(session) => {
            if !util::save_config(&config) {
                return false;
            }
            println!("✓ Signed out {}", session.email);
        }
        None => println!("Not signed in."),
    }
    true
}

/// Handle the whoami command.
pub fn handle_whoami() -> bool {
    let Some(config) = util::load_config() else {
        return false;
    };
    let Some(session) = config.session else {
        println!("Not signed in.");
        return true;
    };

    println!("Email:   {}", session.email);
    println!("User id: {}", session.user_id);
    println!("Role:    {}", session.role);
    if let Some(expires_at) = session.expires_at {
        println!("Expires: {}", util::format_time(Some(expires_at)));
    }
    if let Err(e) = session.ensure_valid() {
        println!();
        report_error(&e);
    }
    true
}
