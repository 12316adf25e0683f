//! Sign-in, registration and profile commands.

use fitwear_client::error::ValidationError;
use fitwear_client::models::{Credentials, PasswordChange, ProfileUpdate, Registration};
use fitwear_client::state::AppState;
use fitwear_core::Email;

use super::CommandError;

pub async fn login(app: &AppState, username: String, password: String) -> Result<(), CommandError> {
    let user = app
        .session()
        .login(&Credentials::new(username, password))
        .await?;
    println!("Signed in as {} ({})", user.full_name(), user.role);
    Ok(())
}

pub async fn register(app: &AppState, form: &Registration) -> Result<(), CommandError> {
    let user = app.session().register(form).await?;
    println!("Welcome, {}! Your account is ready.", user.first_name);
    Ok(())
}

pub fn logout(app: &AppState) {
    app.session().logout();
    println!("Signed out");
}

pub fn whoami(app: &AppState) {
    match app.session().current_user() {
        Some(user) => {
            println!("{} <{}>", user.full_name(), user.email);
            println!("  username: {}", user.username);
            println!("  role:     {}", user.role);
            if let Some(phone) = &user.phone {
                println!("  phone:    {phone}");
            }
            if let Some(address) = &user.address {
                println!("  address:  {address}");
            }
        }
        None => println!("Not signed in"),
    }
}

pub async fn update_profile(
    app: &AppState,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
) -> Result<(), CommandError> {
    let email = email
        .as_deref()
        .map(Email::parse)
        .transpose()
        .map_err(ValidationError::from)?;
    let update = ProfileUpdate {
        first_name,
        last_name,
        email,
        phone,
        address,
    };
    if update.is_empty() {
        println!("Nothing to update");
        return Ok(());
    }

    let user = app.session().update_profile(&update).await?;
    println!("Profile updated for {}", user.full_name());
    Ok(())
}

pub async fn change_password(
    app: &AppState,
    current: String,
    new: String,
) -> Result<(), CommandError> {
    app.session()
        .change_password(&PasswordChange::new(current, new))
        .await?;
    println!("Password changed");
    Ok(())
}
