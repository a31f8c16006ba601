use std::io;
use std::io::Write;

use dpsync_core::config::ConnectionDetails;

use crate::error::Error;
use crate::navigator::FolderSelector;

/// Numbered selection on the terminal. Empty or invalid input cancels.
pub struct ConsoleSelector;

impl FolderSelector for ConsoleSelector {
    fn select(&self, prompt: &str, options: &[String]) -> Option<String> {
        println!("{}", prompt);
        for (index, option) in options.iter().enumerate() {
            println!("  {}. {}", index + 1, option);
        }
        print!("Choice ? ");
        if io::stdout().flush().is_err() {
            return None;
        }

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) | Err(_) => return None,
            Ok(_) => {}
        }

        let index: usize = line.trim().parse().ok()?;
        if index == 0 || index > options.len() {
            return None;
        }
        Some(options[index - 1].clone())
    }
}

pub fn prompt_for_credentials() -> Result<ConnectionDetails, Error> {
    let socket = read_input("DataPower full socket (e.g. https://host:5554) ? ")?;
    let username = read_input("Username ? ")?;
    let password = rpassword::prompt_password("Password ? ")?;

    if socket.is_empty() || username.is_empty() || password.is_empty() {
        return Err(Error::StartupError(
            "DataPower connection details are required".to_string(),
        ));
    }

    Ok(ConnectionDetails::from_credentials(
        &socket, &username, &password,
    ))
}

fn read_input(prompt: &str) -> Result<String, Error> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
