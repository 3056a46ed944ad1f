//! StrataKV CLI Client
//!
//! Command-line interface for interacting with a StrataKV server.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use stratakv::protocol::{read_response, write_command, Command, Response, Status};
use stratakv::Result;

/// StrataKV CLI
#[derive(Parser, Debug)]
#[command(name = "stratakv-cli")]
#[command(about = "CLI for the StrataKV key-value store")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a database
    CreateDb {
        /// Database name
        database: String,
    },

    /// Create a table in a database
    CreateTable {
        /// Database name
        database: String,

        /// Table name
        table: String,
    },

    /// Get a value by key
    Get {
        database: String,
        table: String,
        key: String,
    },

    /// Set a key to a value (prints the previous value, if any)
    Set {
        database: String,
        table: String,
        key: String,
        value: String,
    },

    /// Delete a key (prints the removed value, if any)
    Del {
        database: String,
        table: String,
        key: String,
    },

    /// Ping the server
    Ping,
}

impl Commands {
    fn into_command(self) -> Command {
        match self {
            Commands::CreateDb { database } => Command::CreateDatabase { database },
            Commands::CreateTable { database, table } => {
                Command::CreateTable { database, table }
            }
            Commands::Get {
                database,
                table,
                key,
            } => Command::Get {
                database,
                table,
                key,
            },
            Commands::Set {
                database,
                table,
                key,
                value,
            } => Command::Set {
                database,
                table,
                key,
                value: value.into_bytes(),
            },
            Commands::Del {
                database,
                table,
                key,
            } => Command::Delete {
                database,
                table,
                key,
            },
            Commands::Ping => Command::Ping,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(&args.server, args.command.into_command()) {
        Ok(response) => print_response(&response),
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Open a connection, send one command, read one response
fn run(server: &str, command: Command) -> Result<Response> {
    let stream = TcpStream::connect(server)?;
    stream.set_nodelay(true)?;

    let mut writer = BufWriter::new(stream.try_clone()?);
    let mut reader = BufReader::new(stream);

    write_command(&mut writer, &command)?;
    read_response(&mut reader)
}

fn print_response(response: &Response) -> ExitCode {
    match response.status {
        Status::Ok => {
            match &response.payload {
                Some(payload) => println!("{}", String::from_utf8_lossy(payload)),
                None => println!("OK"),
            }
            ExitCode::SUCCESS
        }
        Status::NotFound => {
            println!("(not found)");
            ExitCode::SUCCESS
        }
        Status::Error => {
            let message = response
                .payload
                .as_ref()
                .map(|p| String::from_utf8_lossy(p).into_owned())
                .unwrap_or_else(|| "unknown error".to_string());
            eprintln!("error: {}", message);
            ExitCode::FAILURE
        }
    }
}
