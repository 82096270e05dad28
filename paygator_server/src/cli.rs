use std::{env, env::VarError};

/// There's no real CLI for the server. Any argument prints the help text and the current configuration.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 15] = [
        "RUST_LOG",
        "PAYGATOR_HOST",
        "PAYGATOR_PORT",
        "PAYGATOR_DATABASE_URL",
        "PAYGATOR_RUN_MIGRATIONS",
        "PAYGATOR_USE_X_FORWARDED_FOR",
        "PAYGATOR_B2C_BASE_URL",
        "PAYGATOR_B2C_CLIENT_ID",
        "PAYGATOR_B2C_WALLET_ID",
        "PAYGATOR_B2C_TOKEN_PATH",
        "PAYGATOR_B2C_PAYMENT_PATH",
        "PAYGATOR_B2C_COUNTRY_CODE",
        "PAYGATOR_B2C_ACCEPTED_PREFIXES",
        "PAYGATOR_B2C_REFERENCE_MAX_LEN",
        "PAYGATOR_B2C_TIMEOUT_SECS",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
