use std::{
    error::Error,
    fs,
    io::{self, Write},
    path::Path,
    process::exit,
};

use bcrypt::DEFAULT_COST;
use clap::Parser;

/// A first-run utility that writes the server's credentials and cookie
/// secret to a .env file.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path the environment file is written to.
    #[arg(long, default_value = ".env")]
    env_path: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let env_path = Path::new(&args.env_path);

    if env_path.exists() {
        print_error(format!(
            "{env_path:?} already exists. Delete it first if you want to start over."
        ));
        exit(1);
    }

    let username = match prompt_username()? {
        Some(username) => username,
        None => return Ok(()),
    };

    let password_hash = match get_password_hash() {
        Some(password_hash) => password_hash,
        None => return Ok(()),
    };

    let secret = generate_secret()?;

    let contents = format!(
        "export LOGIN_USERNAME={username}\n\
        export LOGIN_PASSWORD_HASH='{password_hash}'\n\
        export SECRET={secret}\n"
    );
    fs::write(env_path, contents)?;

    println!("Wrote {env_path:?}. Source it before starting the server:");
    println!("    . {}", args.env_path);

    Ok(())
}

fn prompt_username() -> Result<Option<String>, io::Error> {
    loop {
        print!("Enter a username: ");
        io::stdout().flush()?;

        let mut username = String::new();
        if io::stdin().read_line(&mut username)? == 0 {
            return Ok(None);
        }

        let username = username.trim();
        if username.is_empty() {
            print_error("The username must not be empty, try again.");
            continue;
        }

        return Ok(Some(username.to_owned()));
    }
}

fn get_password_hash() -> Option<String> {
    loop {
        println!();

        let first_password = match rpassword::prompt_password("Enter a new password: ") {
            Ok(string) => string,
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
                return None;
            }
            Err(error) => {
                print_error(format!("Could not read password from stdin: {error}"));
                return None;
            }
        };

        if first_password.is_empty() {
            print_error("The password must not be empty, try again.");
            continue;
        }

        let second_password = match rpassword::prompt_password("Enter the same password again: ") {
            Ok(string) => string,
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
                return None;
            }
            Err(error) => {
                print_error(format!("Could not read password from stdin: {error}"));
                return None;
            }
        };

        if first_password != second_password {
            print_error("Passwords must match, try again.");
            continue;
        }

        match bcrypt::hash(&first_password, DEFAULT_COST) {
            Ok(password_hash) => return Some(password_hash),
            Err(error) => {
                print_error(format!("Could not hash password: {error}. Try again."));
                continue;
            }
        }
    }
}

/// Generate a 32-byte random secret, hex encoded, for signing the session
/// cookies.
fn generate_secret() -> Result<String, Box<dyn Error>> {
    let mut bytes = [0u8; 32];
    getrandom::fill(&mut bytes)?;

    let mut secret = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        secret.push_str(&format!("{byte:02x}"));
    }

    Ok(secret)
}

fn print_error(error: impl ToString) {
    eprintln!("\x1b[31;1m{}\x1b[0m", error.to_string())
}
