//! Account commands.
//!
//! # Usage
//!
//! ```bash
//! petalshop login -e ayse@example.com
//! petalshop register --first-name Ayşe --last-name Yılmaz -e ayse@example.com \
//!     --city İzmir --postal-code 35000 --country TR
//! petalshop whoami
//! petalshop logout
//! ```

use std::io::{BufRead, Write};

use clap::Args;
use secrecy::SecretString;

use petalshop_storefront::Storefront;
use petalshop_storefront::api::RegisterRequest;

use super::{CommandError, print_notification};

/// Fields of the registration form.
#[derive(Debug, Args)]
pub struct RegisterArgs {
    #[arg(long)]
    pub first_name: String,

    #[arg(long)]
    pub last_name: String,

    #[arg(short, long)]
    pub email: String,

    /// Password (read from stdin when omitted)
    #[arg(short, long)]
    pub password: Option<String>,

    #[arg(long, default_value = "")]
    pub phone: String,

    #[arg(long, default_value = "")]
    pub address: String,

    #[arg(long, default_value = "")]
    pub city: String,

    #[arg(long, default_value = "")]
    pub postal_code: String,

    #[arg(long, default_value = "")]
    pub country: String,
}

/// Sign in and remember the identity.
///
/// # Errors
///
/// Returns `CommandError` if the password cannot be read or the login fails.
#[allow(clippy::print_stdout)]
pub async fn login(
    store: &Storefront,
    email: &str,
    password: Option<String>,
) -> Result<(), CommandError> {
    let password = password_or_prompt(password)?;
    let result = store.auth().login(email, password).await;
    print_notification(store);

    let identity = result?;
    println!("Signed in as {}", identity.display_name());
    Ok(())
}

/// Create an account.
///
/// # Errors
///
/// Returns `CommandError` if the password cannot be read or the server
/// refuses the registration.
pub async fn register(store: &Storefront, args: RegisterArgs) -> Result<(), CommandError> {
    let request = RegisterRequest {
        first_name: args.first_name,
        last_name: args.last_name,
        email: args.email,
        password: password_or_prompt(args.password)?,
        phone: args.phone,
        address: args.address,
        city: args.city,
        postal_code: args.postal_code,
        country: args.country,
    };

    let result = store.auth().register(request).await;
    print_notification(store);
    result?;
    Ok(())
}

/// Forget the signed-in identity.
///
/// # Errors
///
/// Returns `CommandError` if the session file cannot be removed.
#[allow(clippy::print_stdout)]
pub fn logout(store: &Storefront) -> Result<(), CommandError> {
    store.auth().logout()?;
    println!("Signed out");
    Ok(())
}

/// Print the signed-in shopper.
#[allow(clippy::print_stdout)]
pub fn whoami(store: &Storefront) {
    match store.current_identity() {
        Some(identity) => println!("{} <{}>", identity.display_name(), identity.email),
        None => println!("Not signed in"),
    }
}

#[allow(clippy::print_stderr)]
fn password_or_prompt(password: Option<String>) -> Result<SecretString, CommandError> {
    if let Some(password) = password {
        return Ok(SecretString::from(password));
    }

    eprint!("Password: ");
    std::io::stderr().flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(SecretString::from(line.trim_end_matches(['\r', '\n']).to_string()))
}
