use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;

use shopfloor_auth::authz::{permissions_for, Principal, Role};
use shopfloor_auth::jwt::JwtConfig;
use shopfloor_auth::password::{
    generate_strong_password, hash_password, password_feedback, validate_password, PasswordPolicy,
    DEFAULT_GENERATED_LENGTH,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "shopfloor auth tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign an access token with JWT_SECRET
    IssueToken {
        #[arg(long)]
        sub: String,
        /// Role name, e.g. CSR or QC_INSPECTOR
        #[arg(long)]
        role: Role,
        #[arg(long)]
        workspace: String,
        #[arg(long = "brand")]
        brands: Vec<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Verify a token and print its claims
    VerifyToken { token: String },
    /// Score a password and print feedback
    CheckPassword {
        password: String,
        #[arg(long)]
        min_length: Option<usize>,
        /// Also reject sequential, repeated and dictionary patterns
        #[arg(long)]
        strict: bool,
    },
    GeneratePassword {
        #[arg(long, default_value_t = DEFAULT_GENERATED_LENGTH)]
        length: usize,
    },
    /// Validate then Argon2-hash a password
    HashPassword { password: String },
    /// Print the role table
    Roles,
}

fn main() -> anyhow::Result<()> {
    // When running in Docker the binary CWD may differ, so fall back to the
    // crate-local `.env`.
    if dotenv().is_err() {
        let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(crate_env);
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::IssueToken {
            sub,
            role,
            workspace,
            brands,
            email,
        } => {
            let jwt = load_jwt()?;
            let mut principal = Principal::new(sub, role, workspace).with_brands(brands);
            if let Some(email) = email {
                principal = principal.with_email(email);
            }
            let (token, claims) = jwt.issue(&principal)?;
            println!("{token}");
            eprintln!("jti={} expires_at={}", claims.jti, claims.expires_at());
        }
        Commands::VerifyToken { token } => {
            let jwt = load_jwt()?;
            match jwt.verify_access_token(&token) {
                Some(claims) => println!("{}", serde_json::to_string_pretty(&claims)?),
                None => anyhow::bail!("token is invalid or expired"),
            }
        }
        Commands::CheckPassword {
            password,
            min_length,
            strict,
        } => {
            let mut policy = PasswordPolicy::default();
            if let Some(min_length) = min_length {
                policy.min_length = min_length;
            }
            policy.reject_weak_patterns = strict;

            let result = validate_password(&password, &policy);
            for line in password_feedback(&result) {
                println!("{line}");
            }
            if !result.valid {
                std::process::exit(1);
            }
        }
        Commands::GeneratePassword { length } => {
            println!("{}", generate_strong_password(length));
        }
        Commands::HashPassword { password } => {
            let hash = hash_password(&password, &PasswordPolicy::default())?;
            println!("{hash}");
        }
        Commands::Roles => print_roles(),
    }

    Ok(())
}

fn load_jwt() -> anyhow::Result<JwtConfig> {
    let secret = std::env::var("JWT_SECRET").context("JWT_SECRET not set")?;
    Ok(JwtConfig::with_system_clock(secret)?)
}

fn print_roles() {
    println!("{:<22} {:<6} {}", "Role", "Level", "Permissions");
    for role in Role::ALL {
        let grants: Vec<&str> = permissions_for(role).iter().map(|perm| perm.as_str()).collect();
        println!("{:<22} {:<6} {}", role.as_str(), role.level(), grants.join(", "));
    }
}
